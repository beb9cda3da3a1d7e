pub mod error;
pub mod frame;
pub mod ids;
pub mod packet;
pub mod serialize;
