//! Wire values of the packet header and body fields.

pub const VERSION_V1: u8 = 0;

pub const CREATE_ROOM: u16 = 0;
pub const JOIN_ROOM: u16 = 1;
pub const VOICE_MSG: u16 = 2;
pub const ACK: u16 = 3;

pub const STATUS_OK: u8 = 0;
pub const STATUS_FAIL: u8 = 1;

/// Length prefix marking a null string in the name encoding.
pub const NULL_STRING_LEN: u32 = u32::MAX;

/// version (1) + command (2) + sequence id (4)
pub const HEADER_LEN: usize = 7;
