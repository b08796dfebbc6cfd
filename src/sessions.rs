//! Encrypted per-browser session storage

pub use tofu_sessions::*;
