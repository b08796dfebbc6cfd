//! Mail addresses and recipient lists from configuration
//!
//! A recipient list in a form file may be a single string, a structured
//! `{ email, name }` table, or an array mixing both:
//!
//! ```toml
//! to = "{email}"
//! cc = "office@example.com, sales@example.com"
//! bcc = [{ email = "audit@example.com", name = "Audit" }]
//! ```

use crate::templates::{TemplateContext, render_placeholders};
use crate::validation::validate_email;
use crate::{EmailError, EmailResult};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailAddress {
	email: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	name: Option<String>,
}

impl MailAddress {
	/// Address without a display name. Validation happens when the
	/// address is resolved or put into a message.
	pub fn new(email: impl Into<String>) -> Self {
		Self {
			email: email.into(),
			name: None,
		}
	}

	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		let name = name.into();
		self.name = (!name.trim().is_empty()).then_some(name);
		self
	}

	/// Parse `user@example.com` or `Name <user@example.com>`
	///
	/// # Examples
	///
	/// ```
	/// use tofu_mail::MailAddress;
	///
	/// let addr = MailAddress::parse("Support Team <support@example.com>").unwrap();
	/// assert_eq!(addr.email(), "support@example.com");
	/// assert_eq!(addr.name(), Some("Support Team"));
	///
	/// assert!(MailAddress::parse("not an address").is_err());
	/// ```
	pub fn parse(input: &str) -> EmailResult<Self> {
		let input = input.trim();
		let address = match (input.rfind('<'), input.ends_with('>')) {
			(Some(open), true) => {
				let name = input[..open].trim().trim_matches('"').trim();
				Self::new(input[open + 1..input.len() - 1].trim()).with_name(name)
			}
			_ => Self::new(input),
		};
		address.validate()?;
		Ok(address)
	}

	pub fn validate(&self) -> EmailResult<()> {
		validate_email(&self.email)?;
		if let Some(name) = &self.name {
			crate::validation::check_header_injection(name)?;
		}
		Ok(())
	}

	pub fn email(&self) -> &str {
		&self.email
	}

	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}
}

impl fmt::Display for MailAddress {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.name {
			Some(name) => write!(f, "\"{}\" <{}>", name.replace('"', "'"), self.email),
			None => f.write_str(&self.email),
		}
	}
}

/// One entry of a recipient list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AddressSpec {
	/// Comma separated addresses; each item may be a `{field}` placeholder
	Literal(String),
	Structured(MailAddress),
}

impl AddressSpec {
	/// Expand into concrete addresses.
	///
	/// Literals are split on commas before placeholders are filled, so a
	/// submitted value always yields at most one address.
	fn resolve_into(&self, context: &TemplateContext, out: &mut Vec<MailAddress>) -> EmailResult<()> {
		match self {
			AddressSpec::Literal(list) => {
				for item in list.split(',') {
					let rendered = render_placeholders(item.trim(), context);
					let rendered = rendered.trim();
					if rendered.is_empty() {
						continue;
					}
					out.push(MailAddress::parse(rendered)?);
				}
			}
			AddressSpec::Structured(address) => {
				let email = render_placeholders(&address.email, context);
				let email = email.trim();
				if email.is_empty() {
					return Ok(());
				}
				let mut resolved = MailAddress::new(email);
				if let Some(name) = &address.name {
					resolved = resolved.with_name(render_placeholders(name, context));
				}
				resolved.validate()?;
				out.push(resolved);
			}
		}
		Ok(())
	}
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
	// Tried first: a struct also deserializes from a sequence
	Many(Vec<AddressSpec>),
	One(AddressSpec),
}

impl From<OneOrMany> for AddressList {
	fn from(value: OneOrMany) -> Self {
		match value {
			OneOrMany::One(spec) => Self(vec![spec]),
			OneOrMany::Many(specs) => Self(specs),
		}
	}
}

/// A configured To, CC or BCC list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "OneOrMany")]
pub struct AddressList(Vec<AddressSpec>);

impl AddressList {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, spec: AddressSpec) {
		self.0.push(spec);
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn specs(&self) -> &[AddressSpec] {
		&self.0
	}

	/// Resolve every entry against the submitted values
	///
	/// # Examples
	///
	/// ```
	/// use tofu_mail::{AddressList, AddressSpec};
	/// use tofu_mail::templates::TemplateContext;
	///
	/// let list = AddressList::from(AddressSpec::Literal("{email}, office@example.com".into()));
	/// let mut context = TemplateContext::new();
	/// context.insert("email".to_string(), "alice@example.com".into());
	///
	/// let addresses = list.resolve(&context).unwrap();
	/// assert_eq!(addresses.len(), 2);
	/// assert_eq!(addresses[0].email(), "alice@example.com");
	/// ```
	pub fn resolve(&self, context: &TemplateContext) -> EmailResult<Vec<MailAddress>> {
		let mut out = Vec::new();
		for spec in &self.0 {
			spec.resolve_into(context, &mut out)?;
		}
		Ok(out)
	}
}

impl From<AddressSpec> for AddressList {
	fn from(spec: AddressSpec) -> Self {
		Self(vec![spec])
	}
}

impl From<&str> for AddressList {
	fn from(list: &str) -> Self {
		Self(vec![AddressSpec::Literal(list.to_string())])
	}
}

impl From<MailAddress> for AddressList {
	fn from(address: MailAddress) -> Self {
		Self(vec![AddressSpec::Structured(address)])
	}
}

impl TryFrom<&str> for MailAddress {
	type Error = EmailError;

	fn try_from(value: &str) -> Result<Self, Self::Error> {
		Self::parse(value)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[derive(Deserialize)]
	struct Holder {
		to: AddressList,
	}

	#[rstest]
	#[case(r#"to = "a@example.com""#, 1)]
	#[case(r#"to = ["a@example.com", "b@example.com, c@example.com"]"#, 3)]
	#[case(r#"to = { email = "a@example.com", name = "A" }"#, 1)]
	#[case(r#"to = ["a@example.com", { email = "b@example.com" }]"#, 2)]
	fn test_deserialize_shapes(#[case] input: &str, #[case] expected: usize) {
		// Arrange
		let holder: Holder = toml::from_str(input).unwrap();

		// Act
		let resolved = holder.to.resolve(&TemplateContext::new()).unwrap();

		// Assert
		assert_eq!(resolved.len(), expected);
	}

	#[rstest]
	fn test_two_element_list_keeps_both_recipients() {
		// Arrange
		let holder: Holder = toml::from_str(r#"to = ["a@example.com", "b@example.com"]"#).unwrap();

		// Act
		let resolved = holder.to.resolve(&TemplateContext::new()).unwrap();

		// Assert
		assert_eq!(resolved.len(), 2);
		assert_eq!(resolved[0].email(), "a@example.com");
		assert_eq!(resolved[0].name(), None);
		assert_eq!(resolved[1].email(), "b@example.com");
	}

	#[rstest]
	fn test_submitted_value_cannot_add_recipients() {
		// Arrange
		let list = AddressList::from("{email}");
		let mut context = TemplateContext::new();
		context.insert(
			"email".to_string(),
			"alice@example.com, victim@example.com".into(),
		);

		// Act
		let result = list.resolve(&context);

		// Assert
		assert!(matches!(result, Err(EmailError::InvalidAddress(_))));
	}

	#[rstest]
	fn test_empty_placeholder_is_skipped() {
		// Arrange
		let list = AddressList::from("{cc_email}");
		let mut context = TemplateContext::new();
		context.insert("cc_email".to_string(), "".into());

		// Act
		let resolved = list.resolve(&context).unwrap();

		// Assert
		assert!(resolved.is_empty());
	}

	#[rstest]
	fn test_display_quotes_name() {
		let addr = MailAddress::new("a@example.com").with_name("Smith, \"Jo\"");
		assert_eq!(addr.to_string(), "\"Smith, 'Jo'\" <a@example.com>");
	}
}
