//! Settings errors and startup validation

use crate::settings::TofuSettings;
use secrecy::ExposeSecret;
use std::path::PathBuf;

/// Minimum accepted length of the site secret, in bytes
pub const MIN_SECRET_KEY_LEN: usize = 32;

pub type SettingsResult<T> = Result<T, SettingsError>;

/// Settings error
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	#[error("Failed to read settings file {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse settings: {0}")]
	Parse(#[from] toml::de::Error),

	#[error("Missing required setting: {0}")]
	MissingRequired(String),

	#[error("Invalid value for '{key}': {message}")]
	InvalidValue { key: String, message: String },

	#[error("Multiple settings errors: {0:?}")]
	Multiple(Vec<SettingsError>),
}

impl SettingsError {
	fn invalid(key: &str, message: impl Into<String>) -> Self {
		Self::InvalidValue {
			key: key.to_string(),
			message: message.into(),
		}
	}
}

impl TofuSettings {
	/// Check cross-field constraints. All violations are reported together.
	pub fn validate(&self) -> SettingsResult<()> {
		let mut errors = Vec::new();

		let secret = self.secret_key.expose_secret();
		if secret.is_empty() {
			errors.push(SettingsError::MissingRequired("secret_key".to_string()));
		} else if secret.len() < MIN_SECRET_KEY_LEN {
			errors.push(SettingsError::invalid(
				"secret_key",
				format!("must be at least {} bytes", MIN_SECRET_KEY_LEN),
			));
		}

		if self.session.ttl_secs == 0 {
			errors.push(SettingsError::invalid("session.ttl_secs", "must be positive"));
		}
		if self.session.cookie_name.trim().is_empty() {
			errors.push(SettingsError::invalid("session.cookie_name", "must not be empty"));
		}
		if !(0.0..=1.0).contains(&self.session.gc_probability) {
			errors.push(SettingsError::invalid(
				"session.gc_probability",
				"must be between 0 and 1",
			));
		}

		// A temp file must never disappear while a live session still references it
		let upload_ttl = self.uploads.effective_ttl_secs(&self.session);
		if upload_ttl < self.session.ttl_secs {
			errors.push(SettingsError::invalid(
				"uploads.ttl_secs",
				format!(
					"{} is shorter than the session ttl of {}",
					upload_ttl, self.session.ttl_secs
				),
			));
		}

		if self.captcha.timeout_secs == 0 {
			errors.push(SettingsError::invalid("captcha.timeout_secs", "must be positive"));
		}
		if self.database.max_connections == 0 {
			errors.push(SettingsError::invalid(
				"database.max_connections",
				"must be positive",
			));
		}

		match errors.len() {
			0 => Ok(()),
			1 => Err(errors.remove(0)),
			_ => Err(SettingsError::Multiple(errors)),
		}
	}
}
