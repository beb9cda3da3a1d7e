use std::fmt;
use std::net::SocketAddr;
use tokio::net::TcpStream;
use crate::protocol::error::ProtocolError;
use crate::protocol::packet::Packet;
use crate::relay::clients::ClientHandle;

/// Everything the relay server reacts to, from either channel.
#[derive(Debug)]
pub enum ServerEvent {
    ClientConnected { stream: TcpStream, peer: SocketAddr },
    ClientDisconnected { handle: ClientHandle, reason: DisconnectReason },
    PacketReceived { handle: ClientHandle, packet: Packet },
    DatagramReceived { from: SocketAddr, data: Vec<u8> },
}

#[derive(Debug)]
pub enum DisconnectReason {
    /// The peer closed the stream.
    Closed,
    /// The stream could not be read or decoded; it is not resynchronized.
    Failed(ProtocolError),
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisconnectReason::Closed => write!(f, "closed by peer"),
            DisconnectReason::Failed(e) => write!(f, "{}", e),
        }
    }
}
