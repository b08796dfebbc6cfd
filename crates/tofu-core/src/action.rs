//! Action tokens carried in the form endpoint URL
//!
//! A form posts to `<base>?_tofu_key=<token>` where the token is base64 of
//! `{"key": <form key>, "action": "input" | "confirm"}`.

use crate::error::{TofuError, TofuResult};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Query parameter holding the action token
pub const QUERY_KEY: &str = "_tofu_key";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormAction {
	Input,
	Confirm,
}

impl FormAction {
	pub fn as_str(self) -> &'static str {
		match self {
			FormAction::Input => "input",
			FormAction::Confirm => "confirm",
		}
	}

	pub fn parse(action: &str) -> TofuResult<Self> {
		match action {
			"input" => Ok(FormAction::Input),
			"confirm" => Ok(FormAction::Confirm),
			other => Err(TofuError::UnknownAction(other.to_string())),
		}
	}
}

impl fmt::Display for FormAction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionToken {
	pub key: String,
	pub action: String,
}

impl ActionToken {
	pub fn new(key: impl Into<String>, action: FormAction) -> Self {
		Self {
			key: key.into(),
			action: action.as_str().to_string(),
		}
	}

	/// URL-safe base64 without padding, so it needs no percent-encoding
	pub fn encode(&self) -> String {
		let json = serde_json::json!({ "key": self.key, "action": self.action });
		URL_SAFE_NO_PAD.encode(json.to_string())
	}

	/// Accepts URL-safe and standard base64
	///
	/// # Examples
	///
	/// ```
	/// use tofu_core::action::{ActionToken, FormAction};
	///
	/// let token = ActionToken::new("contact", FormAction::Confirm).encode();
	/// let decoded = ActionToken::decode(&token).unwrap();
	/// assert_eq!(decoded.key, "contact");
	/// assert_eq!(decoded.form_action().unwrap(), FormAction::Confirm);
	///
	/// assert!(ActionToken::decode("not base64!").is_err());
	/// ```
	pub fn decode(token: &str) -> TofuResult<Self> {
		let token = token.trim();
		let bytes = URL_SAFE_NO_PAD
			.decode(token.trim_end_matches('='))
			.or_else(|_| STANDARD.decode(token))
			.map_err(|e| TofuError::MalformedActionToken(format!("invalid base64: {}", e)))?;
		let parsed: Self = serde_json::from_slice(&bytes)
			.map_err(|e| TofuError::MalformedActionToken(format!("invalid payload: {}", e)))?;
		if parsed.key.is_empty() {
			return Err(TofuError::MalformedActionToken("empty form key".to_string()));
		}
		Ok(parsed)
	}

	pub fn form_action(&self) -> TofuResult<FormAction> {
		FormAction::parse(&self.action)
	}
}

/// Endpoint URL for a form action
///
/// # Examples
///
/// ```
/// use tofu_core::action::{action_url, FormAction};
///
/// let url = action_url("https://example.com/", "contact", FormAction::Input);
/// assert!(url.starts_with("https://example.com/?_tofu_key="));
///
/// let url = action_url("https://example.com/?lang=en", "contact", FormAction::Input);
/// assert!(url.starts_with("https://example.com/?lang=en&_tofu_key="));
/// ```
pub fn action_url(base: &str, form_key: &str, action: FormAction) -> String {
	let separator = if base.contains('?') { '&' } else { '?' };
	format!(
		"{}{}{}={}",
		base,
		separator,
		QUERY_KEY,
		ActionToken::new(form_key, action).encode()
	)
}
