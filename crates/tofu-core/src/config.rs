//! Form declarations
//!
//! Forms are declared once at startup, usually from a TOML file:
//!
//! ```toml
//! [[forms]]
//! key = "contact"
//! name = "Contact"
//! save_to_database = true
//!
//! [forms.templates]
//! input = "/contact/"
//! confirm = "/contact/confirm/"
//! result = "/contact/thanks/"
//!
//! [forms.mail]
//! from_email = "noreply@example.com"
//!
//! [[forms.mail.recipients]]
//! to = "office@example.com"
//! subject = "New contact from {name}"
//! body_path = "mail/contact_admin.txt"
//!
//! [forms.validation.rules]
//! name = "required|max_len,100"
//! email = "required|valid_email"
//!
//! [forms.captcha]
//! site_key = "..."
//! secret_key = "..."
//! threshold = 0.5
//! ```

use crate::error::{TofuError, TofuResult};
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use tofu_captcha::CaptchaConfig;
use tofu_forms::ValidationConfig;
use tofu_mail::MailConfig;

static FORM_KEY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^[A-Za-z0-9_-]{1,128}$").expect("FORM_KEY_REGEX: invalid regex pattern")
});

/// Where the browser is sent after each step
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateConfig {
	pub input: String,
	/// Without a confirm page, a valid input submission is sent right away
	#[serde(default)]
	pub confirm: Option<String>,
	pub result: String,
	/// Shown instead of a plain error response when a submission fails
	#[serde(default)]
	pub error: Option<String>,
}

impl TemplateConfig {
	pub fn new(input: impl Into<String>, result: impl Into<String>) -> Self {
		Self {
			input: input.into(),
			confirm: None,
			result: result.into(),
			error: None,
		}
	}

	pub fn with_confirm(mut self, confirm: impl Into<String>) -> Self {
		self.confirm = Some(confirm.into());
		self
	}

	pub fn with_error(mut self, error: impl Into<String>) -> Self {
		self.error = Some(error.into());
		self
	}

	pub fn confirm(&self) -> Option<&str> {
		self.confirm.as_deref().filter(|path| !path.trim().is_empty())
	}
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormConfig {
	pub key: String,
	#[serde(default)]
	pub name: String,
	pub templates: TemplateConfig,
	pub mail: MailConfig,
	#[serde(default)]
	pub validation: ValidationConfig,
	#[serde(default)]
	pub captcha: Option<CaptchaConfig>,
	#[serde(default)]
	pub save_to_database: bool,
}

#[derive(Deserialize)]
struct FormsFile {
	#[serde(default)]
	forms: Vec<FormConfig>,
}

impl FormConfig {
	pub fn new(
		key: impl Into<String>,
		name: impl Into<String>,
		templates: TemplateConfig,
		mail: MailConfig,
	) -> Self {
		Self {
			key: key.into(),
			name: name.into(),
			templates,
			mail,
			validation: ValidationConfig::default(),
			captcha: None,
			save_to_database: false,
		}
	}

	pub fn with_validation(mut self, validation: ValidationConfig) -> Self {
		self.validation = validation;
		self
	}

	pub fn with_captcha(mut self, captcha: CaptchaConfig) -> Self {
		self.captcha = Some(captcha);
		self
	}

	pub fn save_to_database(mut self, save: bool) -> Self {
		self.save_to_database = save;
		self
	}

	/// Parse every `[[forms]]` entry of a TOML document
	pub fn list_from_toml_str(source: &str) -> TofuResult<Vec<Self>> {
		let file: FormsFile = toml::from_str(source)
			.map_err(|e| TofuError::Configuration(format!("Failed to parse forms: {}", e)))?;
		Ok(file.forms)
	}

	pub fn validate(&self) -> TofuResult<()> {
		if !FORM_KEY_REGEX.is_match(&self.key) {
			return Err(TofuError::Configuration(format!(
				"form key '{}' must be 1-128 characters of letters, digits, '_' or '-'",
				self.key
			)));
		}
		if self.templates.input.trim().is_empty() {
			return Err(self.invalid("templates.input is required"));
		}
		if self.templates.result.trim().is_empty() {
			return Err(self.invalid("templates.result is required"));
		}
		self.mail
			.validate()
			.map_err(|e| self.invalid(&format!("mail: {}", e)))?;
		if let Some(captcha) = &self.captcha {
			captcha
				.validate()
				.map_err(|e| self.invalid(&format!("captcha: {}", e)))?;
		}
		Ok(())
	}

	fn invalid(&self, message: &str) -> TofuError {
		TofuError::Configuration(format!("form '{}': {}", self.key, message))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use tofu_mail::MailRecipientConfig;

	fn mail() -> MailConfig {
		MailConfig::new("noreply@example.com").recipient(
			MailRecipientConfig::to("office@example.com")
				.subject("New")
				.body("{message}"),
		)
	}

	#[rstest]
	fn test_list_from_toml() {
		// Arrange
		let source = r#"
[[forms]]
key = "contact"
name = "Contact"

[forms.templates]
input = "/contact/"
result = "/contact/thanks/"

[forms.mail]
from_email = "noreply@example.com"

[[forms.mail.recipients]]
to = "{email}"
subject = "Thanks"
body = "Hello {name}"

[forms.validation.rules]
email = "required|valid_email"

[forms.captcha]
site_key = "site"
secret_key = "secret"
"#;

		// Act
		let forms = FormConfig::list_from_toml_str(source).unwrap();

		// Assert
		assert_eq!(forms.len(), 1);
		let form = &forms[0];
		assert!(form.validate().is_ok());
		assert_eq!(form.templates.confirm(), None);
		assert_eq!(form.captcha.as_ref().map(|c| c.threshold), Some(0.5));
		assert!(!form.save_to_database);
	}

	#[rstest]
	#[case("")]
	#[case("has space")]
	#[case("slash/key")]
	fn test_invalid_keys(#[case] key: &str) {
		// Arrange
		let form = FormConfig::new(key, "Form", TemplateConfig::new("/in", "/done"), mail());

		// Act & Assert
		assert!(matches!(form.validate(), Err(TofuError::Configuration(_))));
	}

	#[rstest]
	fn test_missing_result_template() {
		// Arrange
		let form = FormConfig::new("contact", "Contact", TemplateConfig::new("/in", " "), mail());

		// Act
		let result = form.validate();

		// Assert
		match result {
			Err(TofuError::Configuration(message)) => assert!(message.contains("templates.result")),
			other => panic!("unexpected: {:?}", other),
		}
	}

	#[rstest]
	fn test_empty_confirm_path_means_no_confirm_step() {
		let templates = TemplateConfig::new("/in", "/done").with_confirm("");
		assert_eq!(templates.confirm(), None);
	}
}
