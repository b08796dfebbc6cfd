//! Field values, validation, uploads and anti-forgery tokens

pub use tofu_forms::*;
