//! Field validation and sanitization
//!
//! A [`ValidationConfig`] is declared per form and compiled once into a
//! [`Validator`]. Validating a submission:
//!
//! 1. runs each field's filters over the raw input to produce sanitized values,
//! 2. checks each field's rules against the raw (unfiltered) input, recording
//!    the first failing rule of a field in the [`ErrorSet`],
//! 3. calls the after-hook with the sanitized values and the errors, whether
//!    or not errors were found.
//!
//! Rules other than `required` and `required_file` accept empty values, and
//! file rules accept fields without a file.

pub mod checks;
pub mod filters;
pub mod messages;
pub mod rules;

use crate::error::{FormsError, FormsResult};
use crate::errors::ErrorSet;
use crate::files::FileSet;
use crate::values::FieldValueSet;
use filters::Filter;
use indexmap::IndexMap;
use rules::{FieldRule, RuleKind};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Called after rule checks with the sanitized values and collected errors
pub type AfterHook = Arc<dyn Fn(&mut FieldValueSet, &mut ErrorSet) + Send + Sync>;

/// A project-specific rule, referenced by name from rule strings
///
/// Custom rules see every value, including empty ones.
pub trait CustomRule: Send + Sync {
	/// `param` is the text after the comma in `name,param`
	fn check(&self, value: Option<&Value>, param: Option<&str>, input: &FieldValueSet) -> bool;

	fn message(&self) -> &str {
		"The {field} field is invalid"
	}
}

struct FnRule<F>(F);

impl<F> CustomRule for FnRule<F>
where
	F: Fn(Option<&Value>, Option<&str>, &FieldValueSet) -> bool + Send + Sync,
{
	fn check(&self, value: Option<&Value>, param: Option<&str>, input: &FieldValueSet) -> bool {
		(self.0)(value, param, input)
	}
}

/// Declarative validation settings of a form
///
/// ```toml
/// [validation.rules]
/// email = "required|valid_email"
/// message = "required|max_len,2000"
///
/// [validation.filters]
/// email = "trim|sanitize_email"
///
/// [validation.messages.email]
/// required = "Please tell us how to reach you"
/// ```
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
	/// Field name to pipe-separated rules
	pub rules: IndexMap<String, String>,
	/// Field name to pipe-separated filters
	pub filters: IndexMap<String, String>,
	/// Field name to rule name to message template
	pub messages: IndexMap<String, IndexMap<String, String>>,
	#[serde(skip)]
	pub after: Option<AfterHook>,
	#[serde(skip)]
	pub custom_rules: IndexMap<String, Arc<dyn CustomRule>>,
}

impl ValidationConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn rule(mut self, field: impl Into<String>, rules: impl Into<String>) -> Self {
		self.rules.insert(field.into(), rules.into());
		self
	}

	pub fn filter(mut self, field: impl Into<String>, filters: impl Into<String>) -> Self {
		self.filters.insert(field.into(), filters.into());
		self
	}

	pub fn message(
		mut self,
		field: impl Into<String>,
		rule: impl Into<String>,
		message: impl Into<String>,
	) -> Self {
		self.messages
			.entry(field.into())
			.or_default()
			.insert(rule.into(), message.into());
		self
	}

	pub fn after<F>(mut self, hook: F) -> Self
	where
		F: Fn(&mut FieldValueSet, &mut ErrorSet) + Send + Sync + 'static,
	{
		self.after = Some(Arc::new(hook));
		self
	}

	pub fn custom_rule(mut self, name: impl Into<String>, rule: impl CustomRule + 'static) -> Self {
		self.custom_rules.insert(name.into(), Arc::new(rule));
		self
	}

	/// Register a closure as a custom rule
	///
	/// # Examples
	///
	/// ```
	/// use tofu_forms::{FieldValueSet, FileSet, ValidationConfig};
	///
	/// let validator = ValidationConfig::new()
	///     .rule("password_confirm", "same_as,password")
	///     .custom_rule_fn("same_as", |value, param, input| {
	///         let other = param.and_then(|p| input.get(p));
	///         value == other
	///     })
	///     .compile()
	///     .unwrap();
	///
	/// let input: FieldValueSet = [("password", "a"), ("password_confirm", "b")]
	///     .into_iter()
	///     .collect();
	/// let outcome = validator.validate(&input, &FileSet::new());
	/// assert!(outcome.errors.has_error("password_confirm"));
	/// ```
	pub fn custom_rule_fn<F>(self, name: impl Into<String>, rule: F) -> Self
	where
		F: Fn(Option<&Value>, Option<&str>, &FieldValueSet) -> bool + Send + Sync + 'static,
	{
		self.custom_rule(name, FnRule(rule))
	}

	/// Parse every rule and filter string, failing on unknown names or bad parameters
	pub fn compile(&self) -> FormsResult<Validator> {
		let mut rules = Vec::with_capacity(self.rules.len());
		for (field, specs) in &self.rules {
			let parsed = FieldRule::parse_all(field, specs)?;
			if let Some(unknown) = parsed
				.iter()
				.find(|r| r.kind == RuleKind::Custom && !self.custom_rules.contains_key(&r.name))
			{
				return Err(FormsError::UnknownRule {
					field: field.clone(),
					rule: unknown.name.clone(),
				});
			}
			rules.push((field.clone(), parsed));
		}

		let mut filters = IndexMap::with_capacity(self.filters.len());
		for (field, specs) in &self.filters {
			filters.insert(field.clone(), Filter::parse_all(field, specs)?);
		}

		Ok(Validator {
			rules,
			filters,
			messages: self.messages.clone(),
			custom_rules: self.custom_rules.clone(),
			after: self.after.clone(),
		})
	}
}

impl fmt::Debug for ValidationConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ValidationConfig")
			.field("rules", &self.rules)
			.field("filters", &self.filters)
			.field("messages", &self.messages)
			.field("after", &self.after.is_some())
			.field("custom_rules", &self.custom_rules.keys().collect::<Vec<_>>())
			.finish()
	}
}

/// Result of validating one submission
#[derive(Debug, Clone, Default)]
pub struct ValidationOutcome {
	pub values: FieldValueSet,
	pub errors: ErrorSet,
	/// Fields whose file failed a `max_mb` or `mime` rule; the file must be discarded
	pub rejected_files: Vec<String>,
}

/// Compiled [`ValidationConfig`]
#[derive(Clone)]
pub struct Validator {
	rules: Vec<(String, Vec<FieldRule>)>,
	filters: IndexMap<String, Vec<Filter>>,
	messages: IndexMap<String, IndexMap<String, String>>,
	custom_rules: IndexMap<String, Arc<dyn CustomRule>>,
	after: Option<AfterHook>,
}

impl Validator {
	pub fn validate(&self, input: &FieldValueSet, files: &FileSet) -> ValidationOutcome {
		let mut values = FieldValueSet::new();
		for (field, value) in input.iter() {
			let sanitized = match self.filters.get(field) {
				Some(chain) => filters::apply_all(chain, value.clone()),
				None => value.clone(),
			};
			values.add(field, sanitized);
		}

		let mut errors = ErrorSet::new();
		let mut rejected_files = Vec::new();
		for (field, rules) in &self.rules {
			let value = input.get(field);
			let file = files.get(field);

			let failed = rules.iter().find(|rule| match rule.kind {
				RuleKind::Custom => self
					.custom_rules
					.get(&rule.name)
					.is_none_or(|custom| !custom.check(value, rule.param.as_deref(), input)),
				_ => !rule.check(value, file),
			});

			if let Some(rule) = failed {
				let template = self
					.messages
					.get(field)
					.and_then(|by_rule| by_rule.get(&rule.name))
					.map(String::as_str)
					.unwrap_or_else(|| match rule.kind {
						RuleKind::Custom => self
							.custom_rules
							.get(&rule.name)
							.map(|custom| custom.message())
							.unwrap_or_else(|| messages::default_message(&rule.kind)),
						_ => messages::default_message(&rule.kind),
					});
				errors.add(field.clone(), messages::render(template, field, rule));

				if matches!(rule.kind, RuleKind::MaxMb(_) | RuleKind::Mime(_)) {
					rejected_files.push(field.clone());
				}
			}
		}

		if let Some(after) = &self.after {
			after(&mut values, &mut errors);
		}

		ValidationOutcome {
			values,
			errors,
			rejected_files,
		}
	}

	/// Fields that carry at least one file rule
	pub fn file_fields(&self) -> impl Iterator<Item = &str> {
		self.rules
			.iter()
			.filter(|(_, rules)| rules.iter().any(FieldRule::is_file_rule))
			.map(|(field, _)| field.as_str())
	}
}

impl fmt::Debug for Validator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Validator")
			.field("rules", &self.rules)
			.field("filters", &self.filters)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::files::UploadedFile;
	use rstest::rstest;
	use std::sync::atomic::{AtomicBool, Ordering};

	#[rstest]
	fn test_rules_see_raw_values_while_filters_produce_sanitized_ones() {
		// Arrange
		let validator = ValidationConfig::new()
			.rule("code", "numeric_code")
			.filter("code", "sanitize_numbers")
			.compile()
			.unwrap();
		let input: FieldValueSet = [("code", "12a3")].into_iter().collect();

		// Act
		let outcome = validator.validate(&input, &FileSet::new());

		// Assert
		assert!(outcome.errors.has_error("code"));
		assert_eq!(outcome.values.get_str("code"), Some("123"));
	}

	#[rstest]
	fn test_only_first_failing_rule_is_reported() {
		// Arrange
		let validator = ValidationConfig::new()
			.rule("email", "required|valid_email")
			.compile()
			.unwrap();

		// Act
		let outcome = validator.validate(&FieldValueSet::new(), &FileSet::new());

		// Assert
		assert_eq!(outcome.errors.len(), 1);
		assert_eq!(
			outcome.errors.first("email"),
			Some("The Email field is required")
		);
	}

	#[rstest]
	#[case("", true)]
	#[case("alice@example.com", false)]
	fn test_required_email_rejects_only_empty_value(#[case] email: &str, #[case] has_error: bool) {
		// Arrange
		let validator = ValidationConfig::new()
			.rule("email", "required|valid_email")
			.compile()
			.unwrap();
		let input: FieldValueSet = [("email", email)].into_iter().collect();

		// Act
		let outcome = validator.validate(&input, &FileSet::new());

		// Assert
		assert_eq!(outcome.errors.has_error("email"), has_error);
	}

	#[rstest]
	#[case("4", false)]
	#[case("5", true)]
	fn test_custom_rule_reports_only_failures(#[case] value: &str, #[case] has_error: bool) {
		// Arrange
		let validator = ValidationConfig::new()
			.rule("count", "even")
			.custom_rule_fn("even", |value, _, _| {
				value
					.and_then(Value::as_str)
					.and_then(|text| text.parse::<u32>().ok())
					.is_some_and(|n| n % 2 == 0)
			})
			.compile()
			.unwrap();
		let input: FieldValueSet = [("count", value)].into_iter().collect();

		// Act
		let outcome = validator.validate(&input, &FileSet::new());

		// Assert
		assert_eq!(outcome.errors.has_error("count"), has_error);
		assert!(outcome.rejected_files.is_empty());
	}

	#[rstest]
	fn test_configured_message_overrides_default() {
		// Arrange
		let validator = ValidationConfig::new()
			.rule("name", "max_len,3")
			.message("name", "max_len", "{field}: {param} chars max")
			.compile()
			.unwrap();
		let input: FieldValueSet = [("name", "Alexander")].into_iter().collect();

		// Act
		let outcome = validator.validate(&input, &FileSet::new());

		// Assert
		assert_eq!(outcome.errors.first("name"), Some("Name: 3 chars max"));
	}

	#[rstest]
	fn test_after_hook_runs_even_with_errors() {
		// Arrange
		let called = Arc::new(AtomicBool::new(false));
		let seen = called.clone();
		let validator = ValidationConfig::new()
			.rule("email", "required")
			.after(move |values, errors| {
				seen.store(true, Ordering::SeqCst);
				values.add("normalized", true);
				errors.add("form", "hook error");
			})
			.compile()
			.unwrap();

		// Act
		let outcome = validator.validate(&FieldValueSet::new(), &FileSet::new());

		// Assert
		assert!(called.load(Ordering::SeqCst));
		assert_eq!(outcome.errors.len(), 2);
		assert_eq!(outcome.values.get("normalized"), Some(&Value::Bool(true)));
	}

	#[rstest]
	fn test_unregistered_custom_rule_fails_compilation() {
		// Act
		let result = ValidationConfig::new().rule("x", "required|luhn").compile();

		// Assert
		assert!(matches!(result, Err(FormsError::UnknownRule { rule, .. }) if rule == "luhn"));
	}

	#[rstest]
	fn test_oversized_file_is_rejected() {
		// Arrange
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("big");
		std::fs::write(&path, vec![0u8; 16]).unwrap();
		let mut files = FileSet::new();
		files.add(UploadedFile::new("doc", "big.bin", "application/octet-stream", &path, 2 * 1024 * 1024).unwrap());
		let validator = ValidationConfig::new()
			.rule("doc", "required_file|max_mb,1")
			.compile()
			.unwrap();

		// Act
		let outcome = validator.validate(&FieldValueSet::new(), &files);

		// Assert
		assert_eq!(outcome.rejected_files, vec!["doc".to_string()]);
		assert_eq!(
			outcome.errors.first("doc"),
			Some("The Doc file must be 1 MB or smaller")
		);
	}

	#[rstest]
	fn test_deserializes_from_toml_shape() {
		// Arrange
		let json = serde_json::json!({
			"rules": {"email": "required|valid_email"},
			"messages": {"email": {"required": "Tell us your email"}}
		});

		// Act
		let config: ValidationConfig = serde_json::from_value(json).unwrap();
		let validator = config.compile().unwrap();
		let outcome = validator.validate(&FieldValueSet::new(), &FileSet::new());

		// Assert
		assert_eq!(outcome.errors.first("email"), Some("Tell us your email"));
	}
}
