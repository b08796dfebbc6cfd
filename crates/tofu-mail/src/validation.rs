//! Address and header validation

use crate::{EmailError, EmailResult};
use regex::Regex;
use std::sync::LazyLock;

/// Longest address accepted (RFC 5321 path limit)
pub const MAX_EMAIL_LENGTH: usize = 254;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
	)
	.expect("EMAIL_REGEX: invalid regex pattern")
});

static HEADER_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^[!-9;-~]+$").expect("HEADER_NAME_REGEX: invalid regex pattern")
});

/// # Examples
///
/// ```
/// use tofu_mail::validation::validate_email;
///
/// assert!(validate_email("user@example.com").is_ok());
/// assert!(validate_email("user@example.com\r\nBcc: victim@example.com").is_err());
/// assert!(validate_email("").is_err());
/// ```
pub fn validate_email(email: &str) -> EmailResult<()> {
	check_header_injection(email)?;
	if email.is_empty() || email.len() > MAX_EMAIL_LENGTH || !EMAIL_REGEX.is_match(email) {
		return Err(EmailError::InvalidAddress(email.to_string()));
	}
	Ok(())
}

/// Reject values that could smuggle extra header lines
pub fn check_header_injection(value: &str) -> EmailResult<()> {
	if value.contains(['\r', '\n', '\0']) {
		return Err(EmailError::HeaderInjection(
			value.escape_debug().to_string(),
		));
	}
	Ok(())
}

/// Header field names are printable ASCII without `:` (RFC 5322)
pub fn validate_header_name(name: &str) -> EmailResult<()> {
	if !HEADER_NAME_REGEX.is_match(name) {
		return Err(EmailError::InvalidHeader(name.to_string()));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("X-Form-Key", true)]
	#[case("Bad:Name", false)]
	#[case("With Space", false)]
	#[case("", false)]
	fn test_header_names(#[case] name: &str, #[case] valid: bool) {
		assert_eq!(validate_header_name(name).is_ok(), valid);
	}

	#[rstest]
	fn test_overlong_address_is_rejected() {
		// Arrange
		let email = format!("{}@example.com", "a".repeat(MAX_EMAIL_LENGTH));

		// Act & Assert
		assert!(matches!(validate_email(&email), Err(EmailError::InvalidAddress(_))));
	}
}
