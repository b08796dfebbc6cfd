//! Error message templates
//!
//! Messages may contain `{field}` (the humanized field name) and `{param}`
//! (the rule parameter, with list separators shown as commas).

use super::rules::{FieldRule, RuleKind};

pub fn default_message(kind: &RuleKind) -> &'static str {
	match kind {
		RuleKind::Required | RuleKind::RequiredFile => "The {field} field is required",
		RuleKind::ValidEmail => "The {field} field must be a valid email address",
		RuleKind::Numeric => "The {field} field must be a number",
		RuleKind::Integer => "The {field} field must be a whole number",
		RuleKind::MinLen(_) => "The {field} field needs to be at least {param} characters",
		RuleKind::MaxLen(_) => "The {field} field needs to be {param} characters or less",
		RuleKind::ExactLen(_) => "The {field} field needs to be exactly {param} characters",
		RuleKind::Phone => "The {field} field must be a valid phone number",
		RuleKind::NumericCode => "The {field} field may only contain digits",
		RuleKind::OneOf(_) => "The {field} field must be one of: {param}",
		RuleKind::MaxMb(_) => "The {field} file must be {param} MB or smaller",
		RuleKind::Mime(_) => "The {field} file must be one of these types: {param}",
		RuleKind::Custom => "The {field} field is invalid",
	}
}

/// Turn `first_name` or `first-name` into `First Name`
///
/// # Examples
///
/// ```
/// use tofu_forms::validation::messages::humanize;
///
/// assert_eq!(humanize("first_name"), "First Name");
/// assert_eq!(humanize("e-mail"), "E Mail");
/// ```
pub fn humanize(field: &str) -> String {
	field
		.split(['_', '-'])
		.filter(|word| !word.is_empty())
		.map(|word| {
			let mut chars = word.chars();
			match chars.next() {
				Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
				None => String::new(),
			}
		})
		.collect::<Vec<_>>()
		.join(" ")
}

/// Fill `{field}` and `{param}` into a message template
pub fn render(template: &str, field: &str, rule: &FieldRule) -> String {
	let param = rule
		.param
		.as_deref()
		.map(|p| p.split(';').map(str::trim).collect::<Vec<_>>().join(", "))
		.unwrap_or_default();
	template
		.replace("{field}", &humanize(field))
		.replace("{param}", &param)
}
