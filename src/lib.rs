// Library module for dirmirror
// Re-exports modules for use in integration tests and the binary

pub mod config;
pub mod error;
pub mod fs;
pub mod hash;
pub mod log;
pub mod sync;

pub use config::{Cli, SyncConfig};
pub use error::SyncError;
