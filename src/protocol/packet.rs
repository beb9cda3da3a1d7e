use crate::protocol::error::ProtocolError;
use crate::protocol::ids::*;
use crate::protocol::serialize::{push_byte_vec, push_string, push_u16, push_u32, push_u64, push_u8, read_byte_vec, read_string, read_u16, read_u32, read_u64, read_u8};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    V1,
}

impl Version {
    pub fn from_wire(value: u8) -> Result<Self, ProtocolError> {
        match value {
            VERSION_V1 => Ok(Version::V1),
            v => Err(ProtocolError::UnsupportedVersion(v)),
        }
    }

    pub fn to_wire(self) -> u8 {
        match self {
            Version::V1 => VERSION_V1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    CreateRoom,
    JoinRoom,
    VoiceMsg,
    Ack,
}

impl Command {
    pub fn from_wire(value: u16) -> Result<Self, ProtocolError> {
        Ok(match value {
            CREATE_ROOM => Command::CreateRoom,
            JOIN_ROOM => Command::JoinRoom,
            VOICE_MSG => Command::VoiceMsg,
            ACK => Command::Ack,
            c => return Err(ProtocolError::UnknownCommand(c)),
        })
    }

    pub fn to_wire(self) -> u16 {
        match self {
            Command::CreateRoom => CREATE_ROOM,
            Command::JoinRoom => JOIN_ROOM,
            Command::VoiceMsg => VOICE_MSG,
            Command::Ack => ACK,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Fail,
}

impl Status {
    pub fn from_wire(value: u8) -> Result<Self, ProtocolError> {
        match value {
            STATUS_OK => Ok(Status::Ok),
            STATUS_FAIL => Ok(Status::Fail),
            s => Err(ProtocolError::UnknownStatus(s)),
        }
    }

    pub fn to_wire(self) -> u8 {
        match self {
            Status::Ok => STATUS_OK,
            Status::Fail => STATUS_FAIL,
        }
    }
}

/// Fixed-width prefix of every packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: Version,
    pub command: Command,
    pub sequence_id: u32,
}

impl Header {
    pub fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), ProtocolError> {
        let (version, r) = read_u8(bytes)?;
        let (command, r) = read_u16(r)?;
        let (sequence_id, r) = read_u32(r)?;

        let header = Header {
            version: Version::from_wire(version)?,
            command: Command::from_wire(command)?,
            sequence_id,
        };

        Ok((header, r))
    }

    pub fn push(&self, buf: &mut Vec<u8>) {
        push_u8(buf, self.version.to_wire());
        push_u16(buf, self.command.to_wire());
        push_u32(buf, self.sequence_id);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    CreateRoom { room_id: u64 },
    JoinRoom { room_id: u64, display_name: String },
    /// `sender_id` is stamped by the server on relay; whatever the client sends is discarded.
    VoiceMessage { timestamp: u64, sender_id: u32, samples: Vec<u8> },
    Ack { original_sequence_id: u32, status: Status },
}

impl Body {
    pub fn command(&self) -> Command {
        match self {
            Body::CreateRoom { .. } => Command::CreateRoom,
            Body::JoinRoom { .. } => Command::JoinRoom,
            Body::VoiceMessage { .. } => Command::VoiceMsg,
            Body::Ack { .. } => Command::Ack,
        }
    }
}

/// A decoded protocol packet. The header command is derived from the body,
/// so the two can never disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub sequence_id: u32,
    pub body: Body,
}

impl Packet {
    pub fn new(sequence_id: u32, body: Body) -> Self {
        Self { sequence_id, body }
    }

    /// Builds the acknowledgement the server sends in reply to `sequence_id`.
    pub fn ack(original_sequence_id: u32, status: Status) -> Self {
        Self::new(0, Body::Ack { original_sequence_id, status })
    }

    pub fn header(&self) -> Header {
        Header {
            version: Version::V1,
            command: self.command(),
            sequence_id: self.sequence_id,
        }
    }

    pub fn command(&self) -> Command {
        self.body.command()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let (header, rest) = Header::from_bytes(bytes)?;

        let body = match header.command {
            Command::CreateRoom => {
                let (room_id, _) = read_u64(rest)?;
                Body::CreateRoom { room_id }
            }

            Command::JoinRoom => {
                let (room_id, r) = read_u64(rest)?;
                let (display_name, _) = read_string(r)?;
                Body::JoinRoom { room_id, display_name }
            }

            Command::VoiceMsg => {
                let (timestamp, r) = read_u64(rest)?;
                let (sender_id, r) = read_u32(r)?;
                let (samples, _) = read_byte_vec(r)?;
                Body::VoiceMessage { timestamp, sender_id, samples }
            }

            Command::Ack => {
                let (original_sequence_id, r) = read_u32(rest)?;
                let (status, _) = read_u8(r)?;
                Body::Ack { original_sequence_id, status: Status::from_wire(status)? }
            }
        };

        Ok(Packet { sequence_id: header.sequence_id, body })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN + 16);
        self.header().push(&mut buf);

        match &self.body {
            Body::CreateRoom { room_id } => {
                push_u64(&mut buf, *room_id);
            }

            Body::JoinRoom { room_id, display_name } => {
                push_u64(&mut buf, *room_id);
                push_string(&mut buf, display_name);
            }

            Body::VoiceMessage { timestamp, sender_id, samples } => {
                push_u64(&mut buf, *timestamp);
                push_u32(&mut buf, *sender_id);
                push_byte_vec(&mut buf, samples);
            }

            Body::Ack { original_sequence_id, status } => {
                push_u32(&mut buf, *original_sequence_id);
                push_u8(&mut buf, status.to_wire());
            }
        }

        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(packet: Packet) {
        let bytes = packet.to_bytes();
        let decoded = Packet::from_bytes(&bytes).expect("decodes");
        assert_eq!(decoded, packet);
        assert_eq!(decoded.to_bytes(), bytes);
    }

    #[test]
    fn every_body_round_trips() {
        round_trip(Packet::new(1, Body::CreateRoom { room_id: u64::MAX }));
        round_trip(Packet::new(2, Body::JoinRoom { room_id: 7, display_name: "Ana".into() }));
        round_trip(Packet::new(3, Body::VoiceMessage { timestamp: 99, sender_id: 4, samples: vec![1, 2, 3] }));
        round_trip(Packet::new(u32::MAX, Body::Ack { original_sequence_id: 5, status: Status::Fail }));
    }

    #[test]
    fn empty_name_and_empty_samples_round_trip() {
        round_trip(Packet::new(0, Body::JoinRoom { room_id: 0, display_name: String::new() }));
        round_trip(Packet::new(0, Body::VoiceMessage { timestamp: 0, sender_id: 0, samples: vec![] }));
    }

    #[test]
    fn header_layout_is_big_endian() {
        let bytes = Packet::new(0x01020304, Body::CreateRoom { room_id: 42 }).to_bytes();

        assert_eq!(&bytes[..HEADER_LEN], &[VERSION_V1, 0x00, 0x00, 0x01, 0x02, 0x03, 0x04]);
        assert_eq!(&bytes[HEADER_LEN..], &42u64.to_be_bytes());
    }

    #[test]
    fn voice_message_layout() {
        let bytes = Packet::new(9, Body::VoiceMessage { timestamp: 1, sender_id: 2, samples: vec![0xAA, 0xBB] }).to_bytes();

        let mut expected = vec![VERSION_V1, 0x00, 0x02, 0, 0, 0, 9];
        expected.extend(1u64.to_be_bytes());
        expected.extend(2u32.to_be_bytes());
        expected.extend(2u32.to_be_bytes());
        expected.extend([0xAA, 0xBB]);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn server_ack_carries_zero_sequence_id() {
        let ack = Packet::ack(17, Status::Ok);
        assert_eq!(ack.sequence_id, 0);
        assert_eq!(ack.command(), Command::Ack);
        assert_eq!(ack.to_bytes(), vec![VERSION_V1, 0, 3, 0, 0, 0, 0, 0, 0, 0, 17, STATUS_OK]);
    }

    #[test]
    fn unknown_command_is_an_error() {
        let bytes = [VERSION_V1, 0x00, 0x09, 0, 0, 0, 1];
        assert!(matches!(Packet::from_bytes(&bytes), Err(ProtocolError::UnknownCommand(9))));
    }

    #[test]
    fn unknown_version_is_an_error() {
        let mut bytes = Packet::new(1, Body::CreateRoom { room_id: 1 }).to_bytes();
        bytes[0] = 5;
        assert!(matches!(Packet::from_bytes(&bytes), Err(ProtocolError::UnsupportedVersion(5))));
    }

    #[test]
    fn unknown_status_is_an_error() {
        let mut bytes = Packet::ack(1, Status::Ok).to_bytes();
        let last = bytes.len() - 1;
        bytes[last] = 2;
        assert!(matches!(Packet::from_bytes(&bytes), Err(ProtocolError::UnknownStatus(2))));
    }

    #[test]
    fn truncated_body_is_an_error() {
        let bytes = Packet::new(1, Body::VoiceMessage { timestamp: 1, sender_id: 0, samples: vec![1; 8] }).to_bytes();
        assert!(matches!(Packet::from_bytes(&bytes[..bytes.len() - 1]), Err(ProtocolError::NotEnoughBytes(_))));
        assert!(Packet::from_bytes(&[]).is_err());
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let packet = Packet::new(3, Body::CreateRoom { room_id: 3 });
        let mut bytes = packet.to_bytes();
        bytes.extend([0, 0, 0]);
        assert_eq!(Packet::from_bytes(&bytes).unwrap(), packet);
    }
}
