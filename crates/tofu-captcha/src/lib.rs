//! # tofu-captcha
//!
//! Verifies challenge tokens submitted with a form against a
//! reCAPTCHA-compatible `siteverify` endpoint and turns the provider's answer
//! into user-facing error messages.
//!
//! Verification never fails the request outright: transport problems,
//! provider error codes and low scores all come back as a failed
//! [`CaptchaVerdict`] carrying messages the form can show next to its fields.
//!
//! ## Example
//!
//! ```rust
//! use tofu_captcha::{CaptchaConfig, SiteVerifyResponse, evaluate};
//!
//! let config = CaptchaConfig::new("site-key", "secret-key").with_threshold(0.5);
//! let response = SiteVerifyResponse {
//!     success: true,
//!     score: Some(0.3),
//!     ..Default::default()
//! };
//!
//! let verdict = evaluate(&response, config.threshold);
//! assert!(!verdict.passed);
//! assert_eq!(verdict.errors.len(), 1);
//! ```

pub mod config;
pub mod verdict;
pub mod verifier;

use thiserror::Error;

pub use config::CaptchaConfig;
pub use verdict::{CaptchaVerdict, SiteVerifyResponse, evaluate, messages};
#[cfg(feature = "recaptcha")]
pub use verifier::RecaptchaVerifier;
pub use verifier::{CaptchaVerifier, FixedResponseVerifier};

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CaptchaError {
	#[error("Invalid captcha configuration: {0}")]
	Configuration(String),

	#[error("Failed to create HTTP client: {0}")]
	Client(String),
}

pub type CaptchaResult<T> = std::result::Result<T, CaptchaError>;
