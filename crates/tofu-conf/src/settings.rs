//! Settings structures
//!
//! Every section has serde defaults so a minimal document only needs
//! `secret_key`.

use crate::validation::{SettingsError, SettingsResult};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default session lifetime (one hour)
pub const DEFAULT_SESSION_TTL_SECS: u64 = 3600;

/// Name of the cookie carrying the browser's session identity
pub const DEFAULT_SESSION_COOKIE: &str = "_tofu_session_key";

/// Provider endpoint used when none is configured
pub const DEFAULT_CAPTCHA_ENDPOINT: &str = "https://www.google.com/recaptcha/api/siteverify";

/// Top-level settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TofuSettings {
	/// Site secret the session encryption key and anti-forgery tokens derive from
	pub secret_key: SecretString,
	pub session: SessionSettings,
	pub uploads: UploadSettings,
	pub database: DatabaseSettings,
	pub email: EmailSettings,
	pub captcha: CaptchaSettings,
	pub templates: TemplateSettings,
}

impl Default for TofuSettings {
	fn default() -> Self {
		Self {
			secret_key: SecretString::from(String::new()),
			session: SessionSettings::default(),
			uploads: UploadSettings::default(),
			database: DatabaseSettings::default(),
			email: EmailSettings::default(),
			captcha: CaptchaSettings::default(),
			templates: TemplateSettings::default(),
		}
	}
}

impl TofuSettings {
	/// Parse settings from a TOML document without validating them
	pub fn from_toml_str(source: &str) -> SettingsResult<Self> {
		Ok(toml::from_str(source)?)
	}

	/// Read and parse a TOML settings file without validating it
	pub fn from_file(path: impl AsRef<Path>) -> SettingsResult<Self> {
		let path = path.as_ref();
		let source = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		Self::from_toml_str(&source)
	}

	/// Read a settings file, apply `TOFU_*` environment overrides and validate.
	pub fn load(path: impl AsRef<Path>) -> SettingsResult<Self> {
		let mut settings = Self::from_file(path)?;
		settings.apply_process_env();
		settings.validate()?;
		tracing::info!(
			session_ttl_secs = settings.session.ttl_secs,
			upload_dir = %settings.uploads.temp_dir.display(),
			email_backend = ?settings.email.backend,
			"tofu settings loaded"
		);
		Ok(settings)
	}

	pub fn session_ttl(&self) -> Duration {
		Duration::from_secs(self.session.ttl_secs)
	}

	pub fn upload_ttl(&self) -> Duration {
		Duration::from_secs(self.uploads.effective_ttl_secs(&self.session))
	}
}

/// What happens to the flush marker once the result page has verified it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushPolicy {
	/// The marker stays valid for the whole window, so reloading the result page works
	#[default]
	Reusable,
	/// The marker is cleared after the first successful verification
	SingleUse,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
	pub ttl_secs: u64,
	pub cookie_name: String,
	/// Chance in `[0, 1]` that a request triggers the expired-row sweep
	pub gc_probability: f64,
	/// How long a flush marker proves a recent submission
	pub flush_window_secs: u64,
	pub flush_policy: FlushPolicy,
}

impl Default for SessionSettings {
	fn default() -> Self {
		Self {
			ttl_secs: DEFAULT_SESSION_TTL_SECS,
			cookie_name: DEFAULT_SESSION_COOKIE.to_string(),
			gc_probability: 0.01,
			flush_window_secs: 3600,
			flush_policy: FlushPolicy::Reusable,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
	pub temp_dir: PathBuf,
	/// Temp file lifetime. Defaults to twice the session lifetime.
	pub ttl_secs: Option<u64>,
}

impl Default for UploadSettings {
	fn default() -> Self {
		Self {
			temp_dir: std::env::temp_dir().join("tofu-uploads"),
			ttl_secs: None,
		}
	}
}

impl UploadSettings {
	pub fn effective_ttl_secs(&self, session: &SessionSettings) -> u64 {
		self.ttl_secs
			.unwrap_or_else(|| session.ttl_secs.saturating_mul(2))
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
	/// e.g. `sqlite://tofu.db?mode=rwc`. Without a URL sessions live in memory.
	pub url: Option<String>,
	pub max_connections: u32,
}

impl Default for DatabaseSettings {
	fn default() -> Self {
		Self {
			url: None,
			max_connections: 5,
		}
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailBackendKind {
	Smtp,
	#[default]
	Memory,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmtpSecurity {
	None,
	#[default]
	StartTls,
	Tls,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EmailSettings {
	pub backend: EmailBackendKind,
	pub host: String,
	pub port: u16,
	pub username: Option<String>,
	pub password: Option<SecretString>,
	pub security: SmtpSecurity,
	pub timeout_secs: u64,
}

impl Default for EmailSettings {
	fn default() -> Self {
		Self {
			backend: EmailBackendKind::Memory,
			host: "localhost".to_string(),
			port: 587,
			username: None,
			password: None,
			security: SmtpSecurity::StartTls,
			timeout_secs: 30,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptchaSettings {
	pub endpoint: String,
	pub timeout_secs: u64,
}

impl Default for CaptchaSettings {
	fn default() -> Self {
		Self {
			endpoint: DEFAULT_CAPTCHA_ENDPOINT.to_string(),
			timeout_secs: 5,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TemplateSettings {
	/// Directory that relative subject/body template paths resolve against
	pub root: PathBuf,
}

impl Default for TemplateSettings {
	fn default() -> Self {
		Self {
			root: PathBuf::from("."),
		}
	}
}
