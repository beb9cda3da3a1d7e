pub mod common;
pub mod control;
pub mod datagram;
pub mod error;
