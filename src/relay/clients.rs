use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use crate::relay::error::RoomError;

/// Stable handle of a reliable connection. Handles are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientHandle(pub u64);

impl fmt::Display for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An enum to store different states that a client can be in.
/// Defaults to `Pending`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientState {
    #[default]
    Pending,
    Active { room_id: u64 },
    /// The client's room was replaced by a newer room with the same id.
    Orphaned,
}

/// Who the client is on the reliable channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlIdentity {
    pub handle: ClientHandle,
    pub peer: SocketAddr,
}

/// Stores data about a client.
/// See: `ClientState`
#[derive(Debug)]
pub struct Client {
    pub control: ControlIdentity,
    pub display_name: String,
    pub state: ClientState,
    data_endpoint: Option<SocketAddr>,
    id: Option<u32>,
}

impl Client {
    fn new(control: ControlIdentity) -> Self {
        Self {
            control,
            display_name: String::new(),
            state: ClientState::Pending,
            data_endpoint: None,
            id: None,
        }
    }

    pub fn handle(&self) -> ClientHandle {
        self.control.handle
    }

    pub fn peer(&self) -> SocketAddr {
        self.control.peer
    }

    /// Server-assigned id, set once the client enters its first room.
    pub fn id(&self) -> Option<u32> {
        self.id
    }

    pub fn data_endpoint(&self) -> Option<SocketAddr> {
        self.data_endpoint
    }

    pub fn is_learned(&self) -> bool {
        self.data_endpoint.is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.state == ClientState::Pending
    }
}

/// Stores all clients that hold a reliable connection to the server.
/// Data endpoints are indexed as they are learned.
pub struct Clients {
    by_handle: HashMap<ClientHandle, Client>,
    by_endpoint: HashMap<SocketAddr, ClientHandle>,
    next_handle: u64,
    next_client_id: u32,
}

impl Default for Clients {
    fn default() -> Self {
        Self {
            by_handle: HashMap::new(),
            by_endpoint: HashMap::new(),
            next_handle: 1,
            next_client_id: 1,
        }
    }
}

impl Clients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new pending client for a reliable connection from `peer`.
    pub fn create(&mut self, peer: SocketAddr) -> ClientHandle {
        let handle = ClientHandle(self.next_handle);
        self.next_handle += 1;

        self.by_handle.insert(handle, Client::new(ControlIdentity { handle, peer }));
        handle
    }

    /// Removes a client and its endpoint index entry.
    /// Returns the removed client (if it existed).
    pub fn remove(&mut self, handle: ClientHandle) -> Option<Client> {
        let client = self.by_handle.remove(&handle)?;

        if let Some(endpoint) = client.data_endpoint {
            self.by_endpoint.remove(&endpoint);
        }

        Some(client)
    }

    pub fn get(&self, handle: ClientHandle) -> Option<&Client> {
        self.by_handle.get(&handle)
    }

    pub fn get_mut(&mut self, handle: ClientHandle) -> Option<&mut Client> {
        self.by_handle.get_mut(&handle)
    }

    pub fn by_endpoint(&self, endpoint: SocketAddr) -> Option<&Client> {
        let handle = self.by_endpoint.get(&endpoint)?;
        self.by_handle.get(handle)
    }

    /// Gives the client its id, unless it already has one.
    pub fn assign_id(&mut self, handle: ClientHandle) -> Result<u32, RoomError> {
        let client = self.by_handle.get_mut(&handle)
            .ok_or(RoomError::UnknownClient(handle))?;

        if let Some(id) = client.id {
            return Ok(id);
        }

        let id = self.next_client_id;
        self.next_client_id = id.checked_add(1).ok_or(RoomError::IdsExhausted)?;
        client.id = Some(id);

        Ok(id)
    }

    /// Binds the client's data endpoint. The binding is permanent.
    pub fn learn(&mut self, handle: ClientHandle, endpoint: SocketAddr) -> Result<(), RoomError> {
        if self.by_endpoint.contains_key(&endpoint) {
            return Err(RoomError::EndpointInUse(endpoint));
        }

        let client = self.by_handle.get_mut(&handle)
            .ok_or(RoomError::UnknownClient(handle))?;

        if client.data_endpoint.is_some() {
            return Err(RoomError::AlreadyLearned(handle));
        }

        client.data_endpoint = Some(endpoint);
        self.by_endpoint.insert(endpoint, handle);

        Ok(())
    }

    /// Detaches a client from every room-scoped lookup without closing it.
    pub fn orphan(&mut self, handle: ClientHandle) {
        let Some(client) = self.by_handle.get_mut(&handle) else {
            return;
        };

        client.state = ClientState::Orphaned;
        if let Some(endpoint) = client.data_endpoint {
            self.by_endpoint.remove(&endpoint);
        }
    }

    /// Re-indexes the endpoint an orphaned client kept. If another client
    /// took that endpoint in the meantime the binding is dropped and the
    /// client learns again on its next datagram.
    pub fn restore_endpoint(&mut self, handle: ClientHandle) {
        let Some(client) = self.by_handle.get_mut(&handle) else {
            return;
        };
        let Some(endpoint) = client.data_endpoint else {
            return;
        };

        if self.by_endpoint.contains_key(&endpoint) {
            client.data_endpoint = None;
        } else {
            self.by_endpoint.insert(endpoint, handle);
        }
    }

    pub fn pending(&self) -> impl Iterator<Item = ClientHandle> + '_ {
        self.by_handle.values()
            .filter(|c| c.is_pending())
            .map(|c| c.handle())
    }

    pub fn len(&self) -> usize {
        self.by_handle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_handle.is_empty()
    }
}
