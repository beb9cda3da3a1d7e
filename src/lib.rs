//! Voice relay server.
//!
//! Clients create or join rooms over TCP, then stream voice frames over UDP.
//! The server learns each client's UDP endpoint from its first datagram and
//! relays every frame to the other members of the sender's room.

pub mod config;
pub mod protocol;
pub mod relay;
pub mod transport;
