//! Notification mail

pub use tofu_mail::*;
