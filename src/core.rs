//! Form registry, submission state machine and endpoint

pub use tofu_core::*;
