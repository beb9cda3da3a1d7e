use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use crate::config::loader::Config;
use crate::protocol::packet::Packet;
use crate::relay::clients::ClientHandle;
use crate::relay::directory::Directory;
use crate::relay::handlers::control::ControlHandler;
use crate::relay::handlers::voice::VoiceHandler;
use crate::transport::common::{DisconnectReason, ServerEvent};
use crate::transport::control::{spawn_connection, ControlListener};
use crate::transport::datagram::DatagramSocket;
use crate::transport::error::TransportError;

/// Owns the directory and runs every handler to completion on one task.
/// Connection tasks only talk to it through `ServerEvent`s.
pub struct RelayServer {
    listener: ControlListener,
    socket: DatagramSocket,
    events_tx: mpsc::Sender<ServerEvent>,
    events_rx: mpsc::Receiver<ServerEvent>,

    max_frame_size: usize,
    directory: Directory,
    outbound: HashMap<ClientHandle, mpsc::UnboundedSender<Packet>>,
}

impl RelayServer {
    /// Binds the TCP listener and the UDP socket to the same address and port.
    pub async fn bind(addr: SocketAddr, config: &Config) -> Result<Self, TransportError> {
        let listener = ControlListener::bind(addr).await?;
        // resolves port 0 to the port the listener got
        let socket = DatagramSocket::bind(listener.local_addr()?).await?;
        let (events_tx, events_rx) = mpsc::channel(config.event_queue_size.max(1));

        Ok(Self {
            listener,
            socket,
            events_tx,
            events_rx,
            max_frame_size: config.max_frame_size,
            directory: Directory::new(),
            outbound: HashMap::new(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        self.listener.local_addr()
    }

    /// Serves both channels until `shutdown` resolves.
    pub async fn run_until<F: Future<Output = ()>>(&mut self, shutdown: F) -> Result<(), TransportError> {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(
                        "shutting down with {} client(s) in {} room(s)",
                        self.directory.client_count(),
                        self.directory.rooms().count()
                    );
                    return Ok(());
                }

                accepted = self.listener.accept() => {
                    match accepted {
                        Ok(event) => self.handle_event(event).await,
                        Err(e) => warn!("failed to accept connection: {}", e),
                    }
                }

                received = self.socket.recv() => {
                    let event = received?;
                    self.handle_event(event).await;
                }

                Some(event) = self.events_rx.recv() => {
                    self.handle_event(event).await;
                }
            }
        }
    }

    /// --------------
    /// Event Handling
    /// --------------

    async fn handle_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::ClientConnected { stream, peer } => {
                let handle = self.directory.connect(peer);
                let outbound = spawn_connection(handle, stream, self.max_frame_size, self.events_tx.clone());
                self.outbound.insert(handle, outbound);
                info!("{} connected from {}", handle, peer);
            }
            ServerEvent::ClientDisconnected { handle, reason } => {
                self.handle_disconnect(handle, reason);
            }
            ServerEvent::PacketReceived { handle, packet } => {
                debug!("got {:?} from {}", packet.command(), handle);
                self.handle_packet(handle, &packet);
            }
            ServerEvent::DatagramReceived { from, data } => {
                self.handle_datagram(from, &data).await;
            }
        }
    }

    fn handle_packet(&mut self, handle: ClientHandle, packet: &Packet) {
        let reply = ControlHandler::new(&mut self.directory).handle_packet(handle, packet);

        if let Some(reply) = reply {
            self.send_packet(handle, reply);
        }
    }

    async fn handle_datagram(&mut self, from: SocketAddr, data: &[u8]) {
        let Some(relay) = VoiceHandler::new(&mut self.directory).route_voice(from, data) else {
            return;
        };

        for target in relay.targets {
            if let Err(e) = self.socket.send_to(&relay.datagram, target).await {
                warn!("failed to relay voice to {}: {}", target, e);
            }
        }
    }

    /// -------------------
    /// Disconnect Handling
    /// -------------------

    fn handle_disconnect(&mut self, handle: ClientHandle, reason: DisconnectReason) {
        match &reason {
            DisconnectReason::Closed => info!("{} disconnected", handle),
            DisconnectReason::Failed(e) => warn!("dropping {}: {}", handle, e),
        }

        // purge before the writer is released
        if self.directory.remove_member(handle).is_none() {
            warn!("unregistered client {} disconnected", handle);
        }
        self.outbound.remove(&handle);
    }

    /// --------------
    /// Packet Helpers
    /// --------------

    fn send_packet(&mut self, target: ClientHandle, packet: Packet) {
        let Some(outbound) = self.outbound.get(&target) else {
            warn!("no connection for {}", target);
            return;
        };

        if outbound.send(packet).is_err() {
            warn!("failed to send packet to {}: connection closed", target);
        }
    }
}
