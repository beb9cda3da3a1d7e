use std::net::SocketAddr;
use tracing::{debug, warn};
use crate::protocol::packet::{Body, Packet};
use crate::relay::clients::ClientHandle;
use crate::relay::directory::Directory;

/// A voice frame ready to be fanned out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relay {
    pub sender: ClientHandle,
    pub room_id: u64,
    pub datagram: Vec<u8>,
    pub targets: Vec<SocketAddr>,
}

/// Handles datagrams that arrive on the unreliable channel.
pub struct VoiceHandler<'a> {
    directory: &'a mut Directory,
}

impl<'a> VoiceHandler<'a> {
    pub fn new(directory: &'a mut Directory) -> Self {
        Self { directory }
    }

    /// Identifies the sender of `data`, stamps the voice frame with its id and
    /// returns where to send it. `None` means the datagram is dropped.
    pub fn route_voice(&mut self, from: SocketAddr, data: &[u8]) -> Option<Relay> {
        let sender = self.identify(from)?;

        let Some(room) = self.directory.room_of(sender) else {
            debug!("{} is in no room, dropping datagram", sender);
            return None;
        };

        let mut packet = match Packet::from_bytes(data) {
            Ok(p) => p,
            Err(e) => {
                debug!("dropping undecodable datagram from {}: {}", from, e);
                return None;
            }
        };

        let sender_id = self.directory.client(sender)?.id()?;

        let Body::VoiceMessage { sender_id: stamped, .. } = &mut packet.body else {
            debug!("dropping {:?} datagram from {}", packet.command(), from);
            return None;
        };
        *stamped = sender_id;

        let targets: Vec<SocketAddr> = room.members()
            .iter()
            .filter(|&&member| member != sender)
            .filter_map(|&member| self.directory.client(member)?.data_endpoint())
            .collect();

        Some(Relay {
            sender,
            room_id: room.id,
            datagram: packet.to_bytes(),
            targets,
        })
    }

    /// Returns the sender's handle, learning its endpoint on first contact.
    fn identify(&mut self, from: SocketAddr) -> Option<ClientHandle> {
        if let Some(client) = self.directory.find_by_data_endpoint(from) {
            return Some(client.handle());
        }

        let Some(handle) = self.directory.find_unlearned_by_address(from.ip()) else {
            warn!("unknown datagram sender {}", from);
            return None;
        };

        if let Err(e) = self.directory.learn_endpoint(handle, from) {
            warn!("could not learn endpoint {} for {}: {}", from, handle, e);
            return None;
        }

        debug!("learned data endpoint {} for {}", from, handle);
        Some(handle)
    }
}
