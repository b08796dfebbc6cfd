//! Rule specifications
//!
//! Rules are written as pipe-separated strings, each rule optionally taking a
//! parameter after a comma: `"required|max_len,100|one_of,red;green;blue"`.
//! List parameters use `;` as separator.

use super::checks;
use crate::error::FormsError;
use crate::files::UploadedFile;
use crate::values::{is_empty_value, value_to_text};
use serde_json::Value;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Parsed form of a single rule
#[derive(Debug, Clone, PartialEq)]
pub enum RuleKind {
	Required,
	ValidEmail,
	Numeric,
	Integer,
	MinLen(usize),
	MaxLen(usize),
	ExactLen(usize),
	Phone,
	NumericCode,
	OneOf(Vec<String>),
	RequiredFile,
	MaxMb(f64),
	Mime(Vec<String>),
	/// Looked up among the form's registered custom rules
	Custom,
}

/// A rule attached to a field, with its name and raw parameter
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
	pub name: String,
	pub param: Option<String>,
	pub kind: RuleKind,
}

impl FieldRule {
	/// Parse one `name[,param]` rule for `field`
	pub fn parse(field: &str, spec: &str) -> Result<Self, FormsError> {
		let (name, param) = match spec.split_once(',') {
			Some((name, param)) => (name.trim(), Some(param.trim().to_string())),
			None => (spec.trim(), None),
		};

		let invalid = |message: &str| FormsError::InvalidRuleParameter {
			field: field.to_string(),
			rule: name.to_string(),
			message: message.to_string(),
		};
		let count = || -> Result<usize, FormsError> {
			param
				.as_deref()
				.ok_or_else(|| invalid("a length is required"))?
				.parse::<usize>()
				.map_err(|_| invalid("expected a non-negative integer"))
		};
		let list = || -> Result<Vec<String>, FormsError> {
			let items: Vec<String> = param
				.as_deref()
				.unwrap_or_default()
				.split(';')
				.map(str::trim)
				.filter(|item| !item.is_empty())
				.map(str::to_string)
				.collect();
			if items.is_empty() {
				Err(invalid("at least one value is required"))
			} else {
				Ok(items)
			}
		};

		let kind = match name {
			"required" => RuleKind::Required,
			"valid_email" => RuleKind::ValidEmail,
			"numeric" => RuleKind::Numeric,
			"integer" => RuleKind::Integer,
			"min_len" => RuleKind::MinLen(count()?),
			"max_len" => RuleKind::MaxLen(count()?),
			"exact_len" => RuleKind::ExactLen(count()?),
			"phone" => RuleKind::Phone,
			"numeric_code" => RuleKind::NumericCode,
			"one_of" => RuleKind::OneOf(list()?),
			"required_file" => RuleKind::RequiredFile,
			"max_mb" => {
				let limit = param
					.as_deref()
					.ok_or_else(|| invalid("a size in megabytes is required"))?
					.parse::<f64>()
					.ok()
					.filter(|mb| mb.is_finite() && *mb > 0.0)
					.ok_or_else(|| invalid("expected a positive number"))?;
				RuleKind::MaxMb(limit)
			}
			"mime" => RuleKind::Mime(list()?),
			"" => {
				return Err(FormsError::UnknownRule {
					field: field.to_string(),
					rule: spec.to_string(),
				});
			}
			_ => RuleKind::Custom,
		};

		Ok(Self {
			name: name.to_string(),
			param,
			kind,
		})
	}

	/// Parse a full pipe-separated rule string
	///
	/// # Examples
	///
	/// ```
	/// use tofu_forms::validation::rules::{FieldRule, RuleKind};
	///
	/// let rules = FieldRule::parse_all("name", "required|max_len,50").unwrap();
	/// assert_eq!(rules[0].kind, RuleKind::Required);
	/// assert_eq!(rules[1].kind, RuleKind::MaxLen(50));
	///
	/// assert!(FieldRule::parse_all("name", "max_len,many").is_err());
	/// ```
	pub fn parse_all(field: &str, specs: &str) -> Result<Vec<Self>, FormsError> {
		specs
			.split('|')
			.filter(|spec| !spec.trim().is_empty())
			.map(|spec| Self::parse(field, spec))
			.collect()
	}

	/// Rules that inspect the uploaded file rather than the text value
	pub fn is_file_rule(&self) -> bool {
		matches!(
			self.kind,
			RuleKind::RequiredFile | RuleKind::MaxMb(_) | RuleKind::Mime(_)
		)
	}

	/// Check a built-in rule. Custom rules are evaluated by the validator.
	pub(crate) fn check(&self, value: Option<&Value>, file: Option<&UploadedFile>) -> bool {
		match &self.kind {
			RuleKind::Required => !is_empty_value(value),
			RuleKind::RequiredFile => file.is_some(),
			RuleKind::MaxMb(limit) => file.is_none_or(|f| f.size() as f64 <= limit * BYTES_PER_MB),
			RuleKind::Mime(allowed) => file.is_none_or(|f| mime_allowed(f.mime_type(), allowed)),
			RuleKind::OneOf(allowed) => match value {
				None | Some(Value::Null) => true,
				Some(Value::Array(items)) => items.iter().all(|item| {
					let text = value_to_text(item);
					text.is_empty() || allowed.contains(&text)
				}),
				Some(other) => {
					let text = value_to_text(other);
					text.is_empty() || allowed.contains(&text)
				}
			},
			RuleKind::Custom => true,
			kind => {
				let text = value.map(value_to_text).unwrap_or_default();
				match kind {
					RuleKind::ValidEmail => checks::is_valid_email(&text),
					RuleKind::Numeric => checks::is_valid_number(&text),
					RuleKind::Integer => checks::is_valid_integer(&text),
					RuleKind::MinLen(min) => checks::is_valid_length(&text, Some(*min), None),
					RuleKind::MaxLen(max) => checks::is_valid_length(&text, None, Some(*max)),
					RuleKind::ExactLen(len) => {
						checks::is_valid_length(&text, Some(*len), Some(*len))
					}
					RuleKind::Phone => checks::is_valid_phone(&text),
					RuleKind::NumericCode => checks::is_valid_code(&text),
					_ => true,
				}
			}
		}
	}
}

fn mime_allowed(mime_type: &str, allowed: &[String]) -> bool {
	allowed.iter().any(|pattern| match pattern.strip_suffix("/*") {
		Some(prefix) => mime_type
			.split_once('/')
			.is_some_and(|(major, _)| major.eq_ignore_ascii_case(prefix)),
		None => pattern.eq_ignore_ascii_case(mime_type),
	})
}
