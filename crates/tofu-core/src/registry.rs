//! Forms known to the engine

use crate::config::FormConfig;
use crate::error::{TofuError, TofuResult};
use indexmap::IndexMap;
use std::sync::Arc;
use tofu_forms::Validator;

/// A validated form declaration with its compiled validator
#[derive(Debug)]
pub struct RegisteredForm {
	config: FormConfig,
	validator: Validator,
}

impl RegisteredForm {
	pub fn config(&self) -> &FormConfig {
		&self.config
	}

	pub fn key(&self) -> &str {
		&self.config.key
	}

	pub fn validator(&self) -> &Validator {
		&self.validator
	}
}

/// Built once at startup and shared by every request handler
#[derive(Debug, Default)]
pub struct FormRegistry {
	forms: IndexMap<String, Arc<RegisteredForm>>,
}

impl FormRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register every form of a TOML document
	///
	/// Registration stops at the first invalid or duplicate form.
	pub fn from_toml_str(source: &str) -> TofuResult<Self> {
		let mut registry = Self::new();
		for config in FormConfig::list_from_toml_str(source)? {
			registry.register(config)?;
		}
		Ok(registry)
	}

	/// Validate, compile and add a form
	///
	/// A duplicate key is rejected and leaves the registry unchanged.
	pub fn register(&mut self, config: FormConfig) -> TofuResult<Arc<RegisteredForm>> {
		if self.forms.contains_key(&config.key) {
			tracing::error!(form = %config.key, "Form is already registered");
			return Err(TofuError::DuplicateForm(config.key));
		}
		config.validate()?;
		let validator = config.validation.compile()?;

		let key = config.key.clone();
		let form = Arc::new(RegisteredForm { config, validator });
		self.forms.insert(key.clone(), Arc::clone(&form));
		tracing::info!(form = %key, "Registered form");
		Ok(form)
	}

	pub fn get(&self, key: &str) -> Option<Arc<RegisteredForm>> {
		self.forms.get(key).cloned()
	}

	pub fn contains(&self, key: &str) -> bool {
		self.forms.contains_key(key)
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.forms.keys().map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.forms.len()
	}

	pub fn is_empty(&self) -> bool {
		self.forms.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::TemplateConfig;
	use rstest::rstest;
	use tofu_forms::ValidationConfig;
	use tofu_mail::{MailConfig, MailRecipientConfig};

	fn form(key: &str, name: &str) -> FormConfig {
		FormConfig::new(
			key,
			name,
			TemplateConfig::new("/in/", "/done/"),
			MailConfig::new("noreply@example.com").recipient(
				MailRecipientConfig::to("office@example.com")
					.subject("s")
					.body("b"),
			),
		)
	}

	#[rstest]
	fn test_duplicate_key_leaves_registry_unchanged() {
		// Arrange
		let mut registry = FormRegistry::new();
		registry.register(form("contact", "First")).unwrap();

		// Act
		let result = registry.register(form("contact", "Second"));

		// Assert
		assert!(matches!(result, Err(TofuError::DuplicateForm(key)) if key == "contact"));
		assert_eq!(registry.len(), 1);
		assert_eq!(registry.get("contact").unwrap().config().name, "First");
	}

	#[rstest]
	fn test_bad_rule_fails_registration() {
		// Arrange
		let mut registry = FormRegistry::new();
		let config = form("contact", "Contact")
			.with_validation(ValidationConfig::new().rule("email", "required|no_such_rule"));

		// Act
		let result = registry.register(config);

		// Assert
		assert!(matches!(result, Err(TofuError::Forms(_))));
		assert!(registry.is_empty());
	}

	#[rstest]
	fn test_keys_keep_registration_order() {
		// Arrange
		let mut registry = FormRegistry::new();

		// Act
		registry.register(form("b", "B")).unwrap();
		registry.register(form("a", "A")).unwrap();

		// Assert
		assert_eq!(registry.keys().collect::<Vec<_>>(), vec!["b", "a"]);
		assert!(registry.get("missing").is_none());
	}
}
