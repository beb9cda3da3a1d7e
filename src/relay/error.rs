use std::net::SocketAddr;
use thiserror::Error;
use crate::relay::clients::ClientHandle;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoomError {
    #[error("room {0} does not exist")]
    RoomNotFound(u64),

    #[error("no client registered under handle {0}")]
    UnknownClient(ClientHandle),

    #[error("client {0} is already in a room")]
    AlreadyInRoom(ClientHandle),

    #[error("client {0} already has a learned data endpoint")]
    AlreadyLearned(ClientHandle),

    #[error("data endpoint {0} is already bound to another client")]
    EndpointInUse(SocketAddr),

    #[error("client id space exhausted")]
    IdsExhausted,
}
