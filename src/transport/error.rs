use std::net::SocketAddr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to bind TCP listener on {addr}: {source}")]
    ListenError { addr: SocketAddr, source: std::io::Error },

    #[error("failed to bind UDP socket on {addr}: {source}")]
    BindError { addr: SocketAddr, source: std::io::Error },

    #[error("failed to recv datagram: {0}")]
    RecvError(std::io::Error),

    #[error("failed to read local address: {0}")]
    LocalAddr(std::io::Error),
}
