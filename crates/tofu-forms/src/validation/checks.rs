//! Predicates behind the built-in rules
//!
//! Every check treats an empty value as valid; presence is the job of
//! `required`. They are public so after-hooks can reuse them.

use regex::Regex;
use std::sync::LazyLock;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
	)
	.expect("EMAIL_REGEX: invalid regex pattern")
});

// Digits with optional leading '+', separated by spaces, dots, dashes or parentheses
static PHONE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^\+?[0-9(][0-9 ().\-]*[0-9]$").expect("PHONE_REGEX: invalid regex pattern")
});

fn is_blank(value: &str) -> bool {
	value.trim().is_empty()
}

/// # Examples
///
/// ```
/// use tofu_forms::checks::is_valid_email;
///
/// assert!(is_valid_email("user@example.com"));
/// assert!(is_valid_email(""));
/// assert!(!is_valid_email("user@"));
/// ```
pub fn is_valid_email(value: &str) -> bool {
	is_blank(value) || (value.len() <= 254 && EMAIL_REGEX.is_match(value.trim()))
}

pub fn is_valid_number(value: &str) -> bool {
	is_blank(value)
		|| value
			.trim()
			.parse::<f64>()
			.map(f64::is_finite)
			.unwrap_or(false)
}

pub fn is_valid_integer(value: &str) -> bool {
	is_blank(value) || value.trim().parse::<i64>().is_ok()
}

/// Length in characters within the optional bounds
pub fn is_valid_length(value: &str, min: Option<usize>, max: Option<usize>) -> bool {
	if value.is_empty() {
		return true;
	}
	let len = value.chars().count();
	min.is_none_or(|min| len >= min) && max.is_none_or(|max| len <= max)
}

/// Loose international phone format with 7 to 15 digits
///
/// # Examples
///
/// ```
/// use tofu_forms::checks::is_valid_phone;
///
/// assert!(is_valid_phone("+81 3-1234-5678"));
/// assert!(is_valid_phone("(555) 123-4567"));
/// assert!(!is_valid_phone("12-34"));
/// assert!(!is_valid_phone("call me"));
/// ```
pub fn is_valid_phone(value: &str) -> bool {
	if is_blank(value) {
		return true;
	}
	let value = value.trim();
	let digits = value.chars().filter(char::is_ascii_digit).count();
	PHONE_REGEX.is_match(value) && (7..=15).contains(&digits)
}

/// Digits only, such as postal or membership codes
pub fn is_valid_code(value: &str) -> bool {
	is_blank(value) || value.trim().chars().all(|c| c.is_ascii_digit())
}
