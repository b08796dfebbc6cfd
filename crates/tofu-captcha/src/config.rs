use crate::{CaptchaError, CaptchaResult};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// Score threshold used when a form does not set one
pub const DEFAULT_THRESHOLD: f64 = 0.5;

fn default_threshold() -> f64 {
	DEFAULT_THRESHOLD
}

/// Captcha keys and score threshold declared by a form
///
/// ```toml
/// [captcha]
/// site_key = "6Lc..."
/// secret_key = "6Lc..."
/// threshold = 0.7
/// ```
///
/// A threshold of `0` disables the score check.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaptchaConfig {
	pub site_key: String,
	pub secret_key: SecretString,
	#[serde(default = "default_threshold")]
	pub threshold: f64,
}

impl CaptchaConfig {
	pub fn new(site_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
		Self {
			site_key: site_key.into(),
			secret_key: SecretString::from(secret_key.into()),
			threshold: DEFAULT_THRESHOLD,
		}
	}

	pub fn with_threshold(mut self, threshold: f64) -> Self {
		self.threshold = threshold;
		self
	}

	pub fn validate(&self) -> CaptchaResult<()> {
		if self.site_key.trim().is_empty() {
			return Err(CaptchaError::Configuration("site_key is empty".to_string()));
		}
		if self.secret_key.expose_secret().trim().is_empty() {
			return Err(CaptchaError::Configuration("secret_key is empty".to_string()));
		}
		if !(0.0..=1.0).contains(&self.threshold) {
			return Err(CaptchaError::Configuration(format!(
				"threshold must be between 0 and 1, got {}",
				self.threshold
			)));
		}
		Ok(())
	}
}
