//! The room/client directory: the only shared mutable state of the relay.
//!
//! Clients live in an arena keyed by `ClientHandle`; rooms hold handles.
//! A client is either pending, a member of exactly one room, or orphaned.
//! Pending and orphaned clients may enter a room; members may not move.

use std::net::{IpAddr, SocketAddr};
use tracing::{debug, warn};
use crate::relay::clients::{Client, ClientHandle, ClientState, Clients};
use crate::relay::error::RoomError;
use crate::relay::rooms::{Room, Rooms, DEFAULT_ROOM_ID};

pub struct Directory {
    clients: Clients,
    rooms: Rooms,
}

impl Default for Directory {
    fn default() -> Self {
        Self::new()
    }
}

impl Directory {
    /// Creates a directory holding only the empty default room.
    pub fn new() -> Self {
        let mut rooms = Rooms::new();
        rooms.insert(Room::new(DEFAULT_ROOM_ID));

        Self {
            clients: Clients::new(),
            rooms,
        }
    }

    /// Registers a new reliable connection in the pending set.
    pub fn connect(&mut self, peer: SocketAddr) -> ClientHandle {
        self.clients.create(peer)
    }

    /// Creates `room_id` with `creator` as its only member.
    ///
    /// A room already stored under `room_id` is replaced. Its members are
    /// orphaned: they stay connected but belong to no room.
    pub fn create_room(&mut self, room_id: u64, creator: ClientHandle) -> Result<&Room, RoomError> {
        self.ensure_unplaced(creator)?;
        let id = self.clients.assign_id(creator)?;

        if let Some(old) = self.rooms.insert(Room::with_member(room_id, creator)) {
            if !old.is_empty() {
                warn!("room {} replaced, orphaning {} member(s)", room_id, old.len());
            }

            for &member in old.members() {
                self.clients.orphan(member);
            }
        }

        self.enter(creator, room_id);
        debug!("client {} (id {}) created room {}", creator, id, room_id);

        self.rooms.get(room_id).ok_or(RoomError::RoomNotFound(room_id))
    }

    /// Appends `member` to an existing room.
    /// Nothing is mutated when the room does not exist.
    pub fn join_room(&mut self, room_id: u64, member: ClientHandle) -> Result<u32, RoomError> {
        self.ensure_unplaced(member)?;

        if !self.rooms.contains(room_id) {
            return Err(RoomError::RoomNotFound(room_id));
        }

        let id = self.clients.assign_id(member)?;
        if let Some(room) = self.rooms.get_mut(room_id) {
            room.add_member(member);
        }

        self.enter(member, room_id);
        debug!("client {} (id {}) joined room {}", member, id, room_id);

        Ok(id)
    }

    /// Purges a connection from every room, the pending set and the
    /// endpoint index. Removing an unknown handle is a no-op.
    pub fn remove_member(&mut self, handle: ClientHandle) -> Option<Client> {
        self.rooms.remove_member_everywhere(handle);
        self.clients.remove(handle)
    }

    pub fn find_by_data_endpoint(&self, endpoint: SocketAddr) -> Option<&Client> {
        self.clients.by_endpoint(endpoint)
    }

    /// First room member whose reliable peer address is `address` and whose
    /// data endpoint has not been learned yet. Rooms are scanned in id order,
    /// members in join order; clients sharing an address cannot be told apart.
    pub fn find_unlearned_by_address(&self, address: IpAddr) -> Option<ClientHandle> {
        let address = address.to_canonical();

        self.rooms.iter()
            .flat_map(|room| room.members().iter().copied())
            .find(|&handle| {
                self.clients.get(handle).is_some_and(|c| {
                    !c.is_learned() && c.peer().ip().to_canonical() == address
                })
            })
    }

    /// Binds the data endpoint of `handle`. A client learns at most once.
    pub fn learn_endpoint(&mut self, handle: ClientHandle, endpoint: SocketAddr) -> Result<(), RoomError> {
        self.clients.learn(handle, endpoint)
    }

    pub fn room_of(&self, handle: ClientHandle) -> Option<&Room> {
        let ClientState::Active { room_id } = self.clients.get(handle)?.state else {
            return None;
        };

        self.rooms.get(room_id).filter(|room| room.contains(handle))
    }

    pub fn room_of_endpoint(&self, endpoint: SocketAddr) -> Option<&Room> {
        let client = self.clients.by_endpoint(endpoint)?;
        self.room_of(client.handle())
    }

    pub fn client(&self, handle: ClientHandle) -> Option<&Client> {
        self.clients.get(handle)
    }

    pub fn client_mut(&mut self, handle: ClientHandle) -> Option<&mut Client> {
        self.clients.get_mut(handle)
    }

    pub fn room(&self, room_id: u64) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.iter()
    }

    pub fn is_pending(&self, handle: ClientHandle) -> bool {
        self.clients.get(handle).is_some_and(Client::is_pending)
    }

    pub fn pending_count(&self) -> usize {
        self.clients.pending().count()
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    fn ensure_unplaced(&self, handle: ClientHandle) -> Result<(), RoomError> {
        let client = self.clients.get(handle).ok_or(RoomError::UnknownClient(handle))?;

        match client.state {
            ClientState::Pending | ClientState::Orphaned => Ok(()),
            ClientState::Active { .. } => Err(RoomError::AlreadyInRoom(handle)),
        }
    }

    fn enter(&mut self, handle: ClientHandle, room_id: u64) {
        let Some(client) = self.clients.get_mut(handle) else {
            return;
        };

        let was_orphaned = client.state == ClientState::Orphaned;
        client.state = ClientState::Active { room_id };

        if was_orphaned {
            self.clients.restore_endpoint(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> SocketAddr {
        s.parse().unwrap()
    }

    #[test]
    fn default_room_exists_and_is_empty() {
        let dir = Directory::new();
        let room = dir.room(DEFAULT_ROOM_ID).unwrap();

        assert!(room.is_empty());
        assert_eq!(dir.rooms().count(), 1);
    }

    #[test]
    fn join_unknown_room_fails_without_mutation() {
        let mut dir = Directory::new();
        let a = dir.connect(addr("10.0.0.1:5000"));

        assert_eq!(dir.join_room(99, a), Err(RoomError::RoomNotFound(99)));
        assert!(dir.room(99).is_none());
        assert_eq!(dir.rooms().count(), 1);
        assert!(dir.is_pending(a));
        assert_eq!(dir.client(a).unwrap().id(), None);
    }

    #[test]
    fn create_then_join_gives_two_members() {
        let mut dir = Directory::new();
        let a = dir.connect(addr("10.0.0.1:5000"));
        let b = dir.connect(addr("10.0.0.2:5000"));

        dir.create_room(42, a).unwrap();
        assert_eq!(dir.join_room(42, b), Ok(2));

        assert_eq!(dir.room(42).unwrap().members(), &[a, b]);
        assert_eq!(dir.client(a).unwrap().id(), Some(1));
        assert_eq!(dir.pending_count(), 0);
        assert_eq!(dir.room_of(b).map(|r| r.id), Some(42));
    }

    #[test]
    fn room_members_cannot_move() {
        let mut dir = Directory::new();
        let a = dir.connect(addr("10.0.0.1:5000"));

        dir.create_room(1, a).unwrap();
        assert!(matches!(dir.create_room(2, a), Err(RoomError::AlreadyInRoom(h)) if h == a));
        assert_eq!(dir.join_room(DEFAULT_ROOM_ID, a), Err(RoomError::AlreadyInRoom(a)));
        assert!(dir.room(2).is_none());
        assert_eq!(dir.room_of(a).map(|r| r.id), Some(1));
    }

    #[test]
    fn disconnect_purges_rooms_and_pending() {
        let mut dir = Directory::new();
        let a = dir.connect(addr("10.0.0.1:5000"));
        let b = dir.connect(addr("10.0.0.2:5000"));
        let pending = dir.connect(addr("10.0.0.3:5000"));

        dir.create_room(42, a).unwrap();
        dir.join_room(42, b).unwrap();
        dir.learn_endpoint(b, addr("10.0.0.2:7000")).unwrap();

        assert!(dir.remove_member(b).is_some());
        assert!(dir.remove_member(pending).is_some());
        assert!(dir.remove_member(pending).is_none());

        assert_eq!(dir.room(42).unwrap().members(), &[a]);
        assert!(dir.rooms().all(|r| !r.contains(b) && !r.contains(pending)));
        assert_eq!(dir.pending_count(), 0);
        assert!(dir.find_by_data_endpoint(addr("10.0.0.2:7000")).is_none());
    }

    #[test]
    fn empty_rooms_persist() {
        let mut dir = Directory::new();
        let a = dir.connect(addr("10.0.0.1:5000"));
        dir.create_room(5, a).unwrap();
        dir.remove_member(a);

        assert!(dir.room(5).unwrap().is_empty());
    }

    #[test]
    fn create_with_existing_id_orphans_previous_members() {
        let mut dir = Directory::new();
        let a = dir.connect(addr("10.0.0.1:5000"));
        let b = dir.connect(addr("10.0.0.2:5000"));
        let c = dir.connect(addr("10.0.0.3:5000"));

        dir.create_room(42, a).unwrap();
        dir.join_room(42, b).unwrap();
        dir.learn_endpoint(b, addr("10.0.0.2:7000")).unwrap();

        let room = dir.create_room(42, c).unwrap();
        assert_eq!(room.members(), &[c]);

        for orphan in [a, b] {
            assert_eq!(dir.client(orphan).unwrap().state, ClientState::Orphaned);
            assert!(dir.room_of(orphan).is_none());
        }
        assert!(dir.find_by_data_endpoint(addr("10.0.0.2:7000")).is_none());
        assert!(dir.room_of_endpoint(addr("10.0.0.2:7000")).is_none());
        assert_eq!(dir.client_count(), 3);
    }

    #[test]
    fn first_unlearned_match_by_address_wins() {
        let mut dir = Directory::new();
        let a = dir.connect(addr("192.168.1.10:4000"));
        let b = dir.connect(addr("192.168.1.10:4001"));
        let other = dir.connect(addr("192.168.1.11:4000"));

        dir.create_room(3, a).unwrap();
        dir.join_room(3, b).unwrap();
        dir.join_room(3, other).unwrap();

        let ip: IpAddr = "192.168.1.10".parse().unwrap();
        assert_eq!(dir.find_unlearned_by_address(ip), Some(a));

        dir.learn_endpoint(a, addr("192.168.1.10:9000")).unwrap();
        assert_eq!(dir.find_unlearned_by_address(ip), Some(b));

        dir.learn_endpoint(b, addr("192.168.1.10:9001")).unwrap();
        assert_eq!(dir.find_unlearned_by_address(ip), None);
    }

    #[test]
    fn pending_clients_are_never_learned() {
        let mut dir = Directory::new();
        dir.connect(addr("192.168.1.10:4000"));

        assert_eq!(dir.find_unlearned_by_address("192.168.1.10".parse().unwrap()), None);
    }

    #[test]
    fn mapped_ipv6_peer_matches_ipv4_datagram() {
        let mut dir = Directory::new();
        let a = dir.connect(addr("[::ffff:10.0.0.1]:4000"));
        dir.join_room(DEFAULT_ROOM_ID, a).unwrap();

        assert_eq!(dir.find_unlearned_by_address("10.0.0.1".parse().unwrap()), Some(a));
    }

    #[test]
    fn room_of_endpoint_follows_learned_binding() {
        let mut dir = Directory::new();
        let a = dir.connect(addr("10.0.0.1:5000"));
        dir.create_room(8, a).unwrap();
        dir.learn_endpoint(a, addr("10.0.0.1:6000")).unwrap();

        assert_eq!(dir.room_of_endpoint(addr("10.0.0.1:6000")).map(|r| r.id), Some(8));
        assert_eq!(dir.find_by_data_endpoint(addr("10.0.0.1:6000")).map(|c| c.handle()), Some(a));
    }

    #[test]
    fn orphan_can_join_again_and_keeps_its_id() {
        let mut dir = Directory::new();
        let a = dir.connect(addr("10.0.0.1:5000"));
        let b = dir.connect(addr("10.0.0.2:5000"));

        dir.create_room(7, a).unwrap();
        dir.learn_endpoint(a, addr("10.0.0.1:6000")).unwrap();
        dir.create_room(7, b).unwrap();
        assert_eq!(dir.client(a).unwrap().state, ClientState::Orphaned);

        assert_eq!(dir.join_room(DEFAULT_ROOM_ID, a), Ok(1));
        assert_eq!(dir.client(a).unwrap().id(), Some(1));
        assert_eq!(dir.room_of(a).map(|r| r.id), Some(DEFAULT_ROOM_ID));
        assert_eq!(dir.room_of_endpoint(addr("10.0.0.1:6000")).map(|r| r.id), Some(DEFAULT_ROOM_ID));
    }

    #[test]
    fn orphan_can_create_a_new_room() {
        let mut dir = Directory::new();
        let a = dir.connect(addr("10.0.0.1:5000"));
        let b = dir.connect(addr("10.0.0.2:5000"));

        dir.create_room(7, a).unwrap();
        dir.create_room(7, b).unwrap();

        assert_eq!(dir.create_room(9, a).unwrap().members(), &[a]);
        assert_eq!(dir.client(a).unwrap().state, ClientState::Active { room_id: 9 });
        assert_eq!(dir.client(a).unwrap().id(), Some(1));
    }
}
