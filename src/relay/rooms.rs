use std::collections::BTreeMap;
use crate::relay::clients::ClientHandle;

/// Room that exists from server start with no members.
pub const DEFAULT_ROOM_ID: u64 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub id: u64,
    members: Vec<ClientHandle>,
}

impl Room {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            members: Vec::new(),
        }
    }

    pub fn with_member(id: u64, member: ClientHandle) -> Self {
        Self {
            id,
            members: vec![member],
        }
    }

    /// Appends a member, keeping insertion order.
    /// Returns false if the handle is already a member.
    pub fn add_member(&mut self, handle: ClientHandle) -> bool {
        if self.contains(handle) {
            return false;
        }

        self.members.push(handle);
        true
    }

    pub fn remove_member(&mut self, handle: ClientHandle) -> bool {
        let before = self.members.len();
        self.members.retain(|&m| m != handle);
        self.members.len() != before
    }

    /// Members in the order they joined.
    pub fn members(&self) -> &[ClientHandle] {
        &self.members
    }

    pub fn contains(&self, handle: ClientHandle) -> bool {
        self.members.contains(&handle)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// All rooms, ordered by id so that scans are deterministic.
#[derive(Default)]
pub struct Rooms {
    by_id: BTreeMap<u64, Room>,
}

impl Rooms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a room, replacing any room under the same id.
    /// Returns the replaced room.
    pub fn insert(&mut self, room: Room) -> Option<Room> {
        self.by_id.insert(room.id, room)
    }

    /// Gets an iterator for all `Room`'s stored, in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Room> {
        self.by_id.values()
    }

    pub fn get(&self, id: u64) -> Option<&Room> {
        self.by_id.get(&id)
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut Room> {
        self.by_id.get_mut(&id)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Removes `handle` from every room it appears in.
    pub fn remove_member_everywhere(&mut self, handle: ClientHandle) {
        for room in self.by_id.values_mut() {
            room.remove_member(handle);
        }
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
