pub mod error;
pub mod progress;
pub mod server;
pub mod types;

pub use server::SubpulseServer;
pub use types::*;
