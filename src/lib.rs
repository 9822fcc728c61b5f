pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod init;
pub mod mcp;
pub mod models;
pub mod services;
pub mod source;

pub use error::SubpulseError;
