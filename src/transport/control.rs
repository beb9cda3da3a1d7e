use std::net::SocketAddr;
use futures::{SinkExt, StreamExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, warn};
use crate::protocol::frame::FrameCodec;
use crate::protocol::packet::Packet;
use crate::relay::clients::ClientHandle;
use crate::transport::common::{DisconnectReason, ServerEvent};
use crate::transport::error::TransportError;

/// Accepts reliable-channel connections.
pub struct ControlListener {
    listener: TcpListener,
}

impl ControlListener {
    pub async fn bind(addr: SocketAddr) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr).await
            .map_err(|source| TransportError::ListenError { addr, source })?;

        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        self.listener.local_addr().map_err(TransportError::LocalAddr)
    }

    pub async fn accept(&self) -> std::io::Result<ServerEvent> {
        let (stream, peer) = self.listener.accept().await?;
        Ok(ServerEvent::ClientConnected { stream, peer })
    }
}

/// Starts the reader and writer tasks of one connection.
///
/// Decoded packets are forwarded to `events` in arrival order, followed by a
/// single `ClientDisconnected` once the stream ends or fails. Packets sent on
/// the returned channel are framed onto the stream; dropping the channel
/// closes the connection.
pub fn spawn_connection(
    handle: ClientHandle,
    stream: TcpStream,
    max_frame_size: usize,
    events: mpsc::Sender<ServerEvent>,
) -> mpsc::UnboundedSender<Packet> {
    let (read, write) = stream.into_split();
    let (outbound, rx) = mpsc::unbounded_channel();

    tokio::spawn(read_frames(
        handle,
        FramedRead::new(read, FrameCodec::new(max_frame_size)),
        events,
    ));

    tokio::spawn(write_frames(
        handle,
        FramedWrite::new(write, FrameCodec::new(max_frame_size)),
        rx,
    ));

    outbound
}

async fn read_frames(
    handle: ClientHandle,
    mut reader: FramedRead<OwnedReadHalf, FrameCodec>,
    events: mpsc::Sender<ServerEvent>,
) {
    let reason = loop {
        match reader.next().await {
            Some(Ok(packet)) => {
                if events.send(ServerEvent::PacketReceived { handle, packet }).await.is_err() {
                    // server loop is gone
                    return;
                }
            }
            Some(Err(e)) => break DisconnectReason::Failed(e),
            None => break DisconnectReason::Closed,
        }
    };

    // the socket stays open until the server has purged the client and
    // dropped the outbound sender
    let _ = events.send(ServerEvent::ClientDisconnected { handle, reason }).await;
    drop(reader);
}

async fn write_frames(
    handle: ClientHandle,
    mut writer: FramedWrite<OwnedWriteHalf, FrameCodec>,
    mut outbound: mpsc::UnboundedReceiver<Packet>,
) {
    while let Some(packet) = outbound.recv().await {
        if let Err(e) = writer.send(packet).await {
            warn!("failed to send packet to {}: {}", handle, e);
            return;
        }
    }

    debug!("writer for {} finished", handle);
}
