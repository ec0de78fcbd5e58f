pub mod client;
pub mod protocol;
pub mod server;

pub use client::GameClient;
pub use protocol::{ClientMessage, FrameError, ServerMessage};
pub use server::GameServer;
