//! Sanitizing filters
//!
//! Filters are written like rules: `"trim|sanitize_string|lower_case"`.
//! They apply to strings and to each string inside an array; other values
//! pass through untouched.

use crate::error::FormsError;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static TAG_REGEX: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"<[^>]*>").expect("TAG_REGEX: invalid regex pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
	Trim,
	Ltrim,
	Rtrim,
	LowerCase,
	UpperCase,
	/// Remove HTML tags and control characters, then trim
	SanitizeString,
	/// Keep only characters allowed in an e-mail address
	SanitizeEmail,
	/// Keep digits, `+` and `-`
	SanitizeNumbers,
	/// Parse as a number and truncate to an integer; unparseable input becomes empty
	WholeNumber,
}

impl Filter {
	pub fn parse(field: &str, name: &str) -> Result<Self, FormsError> {
		Ok(match name.trim() {
			"trim" => Self::Trim,
			"ltrim" => Self::Ltrim,
			"rtrim" => Self::Rtrim,
			"lower_case" => Self::LowerCase,
			"upper_case" => Self::UpperCase,
			"sanitize_string" => Self::SanitizeString,
			"sanitize_email" => Self::SanitizeEmail,
			"sanitize_numbers" => Self::SanitizeNumbers,
			"whole_number" => Self::WholeNumber,
			other => {
				return Err(FormsError::UnknownFilter {
					field: field.to_string(),
					filter: other.to_string(),
				});
			}
		})
	}

	pub fn parse_all(field: &str, specs: &str) -> Result<Vec<Self>, FormsError> {
		specs
			.split('|')
			.filter(|spec| !spec.trim().is_empty())
			.map(|spec| Self::parse(field, spec))
			.collect()
	}

	fn apply_str(self, input: &str) -> String {
		match self {
			Self::Trim => input.trim().to_string(),
			Self::Ltrim => input.trim_start().to_string(),
			Self::Rtrim => input.trim_end().to_string(),
			Self::LowerCase => input.to_lowercase(),
			Self::UpperCase => input.to_uppercase(),
			Self::SanitizeString => TAG_REGEX
				.replace_all(input, "")
				.chars()
				.filter(|c| !c.is_control() || matches!(c, '\n' | '\t'))
				.collect::<String>()
				.trim()
				.to_string(),
			Self::SanitizeEmail => input
				.chars()
				.filter(|c| c.is_ascii_alphanumeric() || "!#$%&'*+-=?^_`{|}~@.[]".contains(*c))
				.collect(),
			Self::SanitizeNumbers => input
				.chars()
				.filter(|c| c.is_ascii_digit() || matches!(c, '+' | '-'))
				.collect(),
			Self::WholeNumber => input
				.trim()
				.parse::<f64>()
				.ok()
				.filter(|n| n.is_finite())
				.map(|n| (n.trunc() as i64).to_string())
				.unwrap_or_default(),
		}
	}

	pub fn apply(self, value: Value) -> Value {
		match value {
			Value::String(s) => Value::String(self.apply_str(&s)),
			Value::Array(items) => Value::Array(items.into_iter().map(|item| self.apply(item)).collect()),
			other => other,
		}
	}
}

/// Run a chain of filters in order
pub fn apply_all(filters: &[Filter], value: Value) -> Value {
	filters.iter().fold(value, |value, filter| filter.apply(value))
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	#[case("trim", json!("  a b  "), json!("a b"))]
	#[case("lower_case", json!("MiXeD"), json!("mixed"))]
	#[case("sanitize_string", json!(" <b>bold</b> text\u{0007} "), json!("bold text"))]
	#[case("sanitize_email", json!("a b(c)@ex ample.com"), json!("abc@example.com"))]
	#[case("sanitize_numbers", json!("+81 (3) 1234"), json!("+8131234"))]
	#[case("whole_number", json!("12.9"), json!("12"))]
	#[case("whole_number", json!("abc"), json!(""))]
	#[case("trim", json!(["  x ", " y"]), json!(["x", "y"]))]
	#[case("trim", json!(5), json!(5))]
	fn test_filters(#[case] name: &str, #[case] input: Value, #[case] expected: Value) {
		// Arrange
		let filter = Filter::parse("field", name).unwrap();

		// Act & Assert
		assert_eq!(filter.apply(input), expected);
	}

	#[rstest]
	fn test_unknown_filter_is_rejected() {
		assert!(matches!(
			Filter::parse_all("field", "trim|rot13"),
			Err(FormsError::UnknownFilter { filter, .. }) if filter == "rot13"
		));
	}

	#[rstest]
	fn test_chain_applies_in_order() {
		// Arrange
		let filters = Filter::parse_all("field", "trim|upper_case").unwrap();

		// Act
		let result = apply_all(&filters, json!("  abc "));

		// Assert
		assert_eq!(result, json!("ABC"));
	}
}
