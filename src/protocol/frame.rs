//! Length-prefixed framing for the reliable channel.
//!
//! ```text
//! +----------------+-----------------------+
//! | length (u32 BE)| encoded packet        |
//! +----------------+-----------------------+
//! ```
//!
//! The length counts only the packet bytes. A frame that fails to decode
//! leaves the stream desynchronized, so the codec surfaces it as an error
//! and the caller drops the connection.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use crate::protocol::error::ProtocolError;
use crate::protocol::packet::Packet;

pub const LENGTH_FIELD_SIZE: usize = 4;

pub const DEFAULT_MAX_FRAME_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct FrameCodec {
    max_frame_size: usize,
}

impl FrameCodec {
    pub fn new(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }
}

impl Decoder for FrameCodec {
    type Item = Packet;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < LENGTH_FIELD_SIZE {
            return Ok(None);
        }

        let len = u32::from_be_bytes([src[0], src[1], src[2], src[3]]) as usize;

        if len > self.max_frame_size {
            return Err(ProtocolError::FrameTooLarge { len, max: self.max_frame_size });
        }

        let total = LENGTH_FIELD_SIZE + len;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        src.advance(LENGTH_FIELD_SIZE);
        let body = src.split_to(len);

        Packet::from_bytes(&body).map(Some)
    }
}

impl Encoder<Packet> for FrameCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: Packet, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let body = item.to_bytes();

        if body.len() > self.max_frame_size {
            return Err(ProtocolError::FrameTooLarge { len: body.len(), max: self.max_frame_size });
        }

        dst.reserve(LENGTH_FIELD_SIZE + body.len());
        dst.put_u32(body.len() as u32);
        dst.put_slice(&body);

        Ok(())
    }
}
