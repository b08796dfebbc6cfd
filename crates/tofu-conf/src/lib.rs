//! # tofu-conf
//!
//! Process-wide settings for tofu form workflows.
//!
//! Settings are read from a TOML document, optionally overridden from the
//! environment and validated once at startup:
//!
//! ```
//! use tofu_conf::TofuSettings;
//!
//! let settings = TofuSettings::from_toml_str(r#"
//! secret_key = "0123456789abcdef0123456789abcdef"
//!
//! [session]
//! ttl_secs = 1800
//! "#).unwrap();
//!
//! assert!(settings.validate().is_ok());
//! assert_eq!(settings.session.ttl_secs, 1800);
//! // Uploads outlive sessions unless configured otherwise
//! assert_eq!(settings.uploads.effective_ttl_secs(&settings.session), 3600);
//! ```
//!
//! Secrets (`secret_key`, SMTP password) are held in [`secrecy::SecretString`]
//! and never appear in `Debug` output.

pub mod env;
pub mod settings;
pub mod validation;

pub use settings::{
	CaptchaSettings, DatabaseSettings, EmailBackendKind, EmailSettings, FlushPolicy,
	SessionSettings, SmtpSecurity, TemplateSettings, TofuSettings, UploadSettings,
};
pub use validation::{SettingsError, SettingsResult};
