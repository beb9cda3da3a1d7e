use tracing::{debug, info, warn};
use crate::protocol::packet::{Body, Packet, Status};
use crate::relay::clients::ClientHandle;
use crate::relay::directory::Directory;
use crate::relay::error::RoomError;

/// Handles packets that arrive on a client's reliable connection.
pub struct ControlHandler<'a> {
    directory: &'a mut Directory,
}

impl<'a> ControlHandler<'a> {
    pub fn new(directory: &'a mut Directory) -> Self {
        Self { directory }
    }

    /// Applies `packet` to the directory and returns the reply to send back
    /// on the same connection, if any.
    pub fn handle_packet(&mut self, sender: ClientHandle, packet: &Packet) -> Option<Packet> {
        match &packet.body {
            Body::CreateRoom { room_id } =>
                Some(self.create_room(sender, packet.sequence_id, *room_id)),
            Body::JoinRoom { room_id, display_name } =>
                Some(self.join_room(sender, packet.sequence_id, *room_id, display_name)),
            Body::VoiceMessage { .. } => {
                debug!("ignoring voice message from {} on the reliable channel", sender);
                None
            }
            Body::Ack { .. } => {
                debug!("ignoring ack from {}", sender);
                None
            }
        }
    }

    fn create_room(&mut self, sender: ClientHandle, sequence_id: u32, room_id: u64) -> Packet {
        match self.directory.create_room(room_id, sender) {
            Ok(_) => {
                info!("{} created room {}", sender, room_id);
                Packet::ack(sequence_id, Status::Ok)
            }
            Err(e) => {
                warn!("{} could not create room {}: {}", sender, room_id, e);
                Packet::ack(sequence_id, Status::Fail)
            }
        }
    }

    fn join_room(&mut self, sender: ClientHandle, sequence_id: u32, room_id: u64, display_name: &str) -> Packet {
        match self.directory.join_room(room_id, sender) {
            Ok(id) => {
                if let Some(client) = self.directory.client_mut(sender) {
                    client.display_name = display_name.to_string();
                }

                info!("{:?} ({}, id {}) joined room {}", display_name, sender, id, room_id);
                Packet::ack(sequence_id, Status::Ok)
            }
            Err(RoomError::RoomNotFound(_)) => {
                warn!("{} tried to join missing room {}", sender, room_id);
                Packet::ack(sequence_id, Status::Fail)
            }
            Err(e) => {
                warn!("{} could not join room {}: {}", sender, room_id, e);
                Packet::ack(sequence_id, Status::Fail)
            }
        }
    }
}
