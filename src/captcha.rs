//! Challenge token verification

pub use tofu_captcha::*;
