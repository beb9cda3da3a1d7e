use std::io::ErrorKind;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use crate::transport::common::ServerEvent;
use crate::transport::error::TransportError;

const MAX_DATAGRAM_SIZE: usize = 65535;

/// The unreliable channel: one packet per datagram, no framing.
pub struct DatagramSocket {
    socket: UdpSocket,
    buf: Box<[u8]>,
}

impl DatagramSocket {
    pub async fn bind(addr: SocketAddr) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(addr).await
            .map_err(|source| TransportError::BindError { addr, source })?;

        Ok(Self {
            socket,
            buf: vec![0u8; MAX_DATAGRAM_SIZE].into_boxed_slice(),
        })
    }

    /// Waits for the next non-empty datagram.
    /// Errors caused by ICMP replies to earlier sends are skipped.
    pub async fn recv(&mut self) -> Result<ServerEvent, TransportError> {
        loop {
            match self.socket.recv_from(&mut self.buf).await {
                Ok((0, _)) => continue,
                Ok((len, from)) => {
                    return Ok(ServerEvent::DatagramReceived {
                        from,
                        data: self.buf[..len].to_vec(),
                    });
                }
                Err(e) if matches!(
                    e.kind(),
                    ErrorKind::Interrupted
                        | ErrorKind::ConnectionReset
                        | ErrorKind::ConnectionRefused
                        | ErrorKind::ConnectionAborted
                ) => continue,
                Err(e) => return Err(TransportError::RecvError(e)),
            }
        }
    }

    pub async fn send_to(&self, data: &[u8], target: SocketAddr) -> std::io::Result<usize> {
        self.socket.send_to(data, target).await
    }
}
