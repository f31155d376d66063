//! Schema module - Configuration types for HMICB playback.

mod config;

pub use config::*;
