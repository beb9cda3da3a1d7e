pub mod clients;
pub mod directory;
pub mod error;
pub mod handlers;
pub mod rooms;
pub mod server;
