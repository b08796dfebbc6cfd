//! Environment variable overrides
//!
//! Deployment secrets usually arrive through the environment rather than the
//! settings file. Recognised variables:
//!
//! | Variable | Setting |
//! |---|---|
//! | `TOFU_SECRET_KEY` | `secret_key` |
//! | `TOFU_DATABASE_URL` | `database.url` |
//! | `TOFU_UPLOAD_DIR` | `uploads.temp_dir` |
//! | `TOFU_SMTP_PASSWORD` | `email.password` |

use crate::settings::TofuSettings;
use secrecy::SecretString;
use std::path::PathBuf;

pub const SECRET_KEY_VAR: &str = "TOFU_SECRET_KEY";
pub const DATABASE_URL_VAR: &str = "TOFU_DATABASE_URL";
pub const UPLOAD_DIR_VAR: &str = "TOFU_UPLOAD_DIR";
pub const SMTP_PASSWORD_VAR: &str = "TOFU_SMTP_PASSWORD";

impl TofuSettings {
	/// Apply overrides from the process environment
	pub fn apply_process_env(&mut self) {
		self.apply_env(|name| std::env::var(name).ok());
	}

	/// Apply overrides from an arbitrary lookup. Empty values are ignored.
	pub fn apply_env<F>(&mut self, lookup: F)
	where
		F: Fn(&str) -> Option<String>,
	{
		let lookup = |name: &str| lookup(name).filter(|value| !value.is_empty());

		if let Some(secret) = lookup(SECRET_KEY_VAR) {
			tracing::debug!(variable = SECRET_KEY_VAR, "overriding secret key from environment");
			self.secret_key = SecretString::from(secret);
		}
		if let Some(url) = lookup(DATABASE_URL_VAR) {
			self.database.url = Some(url);
		}
		if let Some(dir) = lookup(UPLOAD_DIR_VAR) {
			self.uploads.temp_dir = PathBuf::from(dir);
		}
		if let Some(password) = lookup(SMTP_PASSWORD_VAR) {
			self.email.password = Some(SecretString::from(password));
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use secrecy::ExposeSecret;
	use std::collections::HashMap;

	#[rstest]
	fn test_env_overrides_replace_file_values() {
		// Arrange
		let mut settings = TofuSettings::from_toml_str(
			r#"
secret_key = "from-file"

[database]
url = "sqlite://file.db"
"#,
		)
		.unwrap();
		let env: HashMap<&str, &str> = [
			(SECRET_KEY_VAR, "from-environment"),
			(DATABASE_URL_VAR, "sqlite::memory:"),
			(UPLOAD_DIR_VAR, ""),
		]
		.into_iter()
		.collect();

		// Act
		settings.apply_env(|name| env.get(name).map(|v| v.to_string()));

		// Assert
		assert_eq!(settings.secret_key.expose_secret(), "from-environment");
		assert_eq!(settings.database.url.as_deref(), Some("sqlite::memory:"));
		// Empty variable leaves the default in place
		assert!(settings.uploads.temp_dir.ends_with("tofu-uploads"));
	}
}
