//! Interpreting a `siteverify` answer

use serde::Deserialize;

/// User-facing messages attached to a failed verification
pub mod messages {
	pub const UNAVAILABLE: &str = "Failed to verify reCAPTCHA at this time. Please try again later.";
	pub const UNEXPECTED_RESPONSE: &str =
		"Unexpected response from the reCAPTCHA service. Please try again later.";
	pub const MISSING_INPUT_SECRET: &str = "The secret parameter is missing.";
	pub const INVALID_INPUT_SECRET: &str = "The secret parameter is invalid or malformed.";
	pub const MISSING_INPUT_RESPONSE: &str = "The response parameter is missing.";
	pub const INVALID_INPUT_RESPONSE: &str = "The response parameter is invalid or malformed.";
	pub const BAD_REQUEST: &str = "The request is invalid or malformed.";
	pub const TIMEOUT_OR_DUPLICATE: &str =
		"The response is no longer valid: either is too old or has been used previously.";
	pub const MISSING_SCORE: &str = "Failed to verify reCAPTCHA score. Please try again later.";
	pub const LOW_SCORE: &str =
		"Failed to submit, please try again after some time or contact us by phone.";
	pub const REJECTED: &str = "The reCAPTCHA check was not passed. Please try again.";

	pub fn unknown_code(code: &str) -> String {
		format!(
			"An unknown reCAPTCHA error occurred (code: {}). Please try again later.",
			code
		)
	}
}

/// Body returned by the provider
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SiteVerifyResponse {
	#[serde(default)]
	pub success: bool,
	#[serde(default)]
	pub score: Option<f64>,
	#[serde(default)]
	pub action: Option<String>,
	#[serde(default)]
	pub hostname: Option<String>,
	#[serde(default, rename = "error-codes")]
	pub error_codes: Vec<String>,
}

/// Outcome of one verification; errors belong to this call only
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptchaVerdict {
	pub passed: bool,
	pub errors: Vec<String>,
}

impl CaptchaVerdict {
	pub fn failed(message: impl Into<String>) -> Self {
		Self {
			passed: false,
			errors: vec![message.into()],
		}
	}

	/// The provider could not be reached or answered with an error status
	pub fn unavailable() -> Self {
		Self::failed(messages::UNAVAILABLE)
	}

	/// The provider answered with something other than a verify response
	pub fn unexpected_response() -> Self {
		Self::failed(messages::UNEXPECTED_RESPONSE)
	}
}

fn code_message(code: &str) -> String {
	let known = match code {
		"missing-input-secret" => messages::MISSING_INPUT_SECRET,
		"invalid-input-secret" => messages::INVALID_INPUT_SECRET,
		"missing-input-response" => messages::MISSING_INPUT_RESPONSE,
		"invalid-input-response" => messages::INVALID_INPUT_RESPONSE,
		"bad-request" => messages::BAD_REQUEST,
		"timeout-or-duplicate" => messages::TIMEOUT_OR_DUPLICATE,
		_ => {
			tracing::error!(code = %code, "Unknown reCAPTCHA error code");
			return messages::unknown_code(code);
		}
	};
	known.to_string()
}

/// Turn a provider response into a verdict
///
/// Every error code becomes a message. With a positive `threshold` a
/// missing score and a score below the threshold are errors too. The
/// verdict passes only when the provider reports success and no error was
/// collected, so a failed verdict always carries at least one message.
pub fn evaluate(response: &SiteVerifyResponse, threshold: f64) -> CaptchaVerdict {
	let mut errors: Vec<String> = response
		.error_codes
		.iter()
		.map(|code| code_message(code))
		.collect();

	if threshold > 0.0 {
		match response.score {
			None => errors.push(messages::MISSING_SCORE.to_string()),
			Some(score) if score < threshold => {
				tracing::info!(score, threshold, "reCAPTCHA score below threshold");
				errors.push(messages::LOW_SCORE.to_string());
			}
			Some(_) => {}
		}
	}

	if !response.success && errors.is_empty() {
		errors.push(messages::REJECTED.to_string());
	}

	CaptchaVerdict {
		passed: errors.is_empty(),
		errors,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn response(success: bool, score: Option<f64>, codes: &[&str]) -> SiteVerifyResponse {
		SiteVerifyResponse {
			success,
			score,
			error_codes: codes.iter().map(|c| c.to_string()).collect(),
			..Default::default()
		}
	}

	#[rstest]
	#[case(response(true, Some(0.9), &[]), 0.5, true, 0)]
	#[case(response(true, Some(0.5), &[]), 0.5, true, 0)]
	#[case(response(true, Some(0.3), &[]), 0.5, false, 1)]
	#[case(response(true, None, &[]), 0.5, false, 1)]
	#[case(response(true, None, &[]), 0.0, true, 0)]
	#[case(response(false, Some(0.9), &[]), 0.5, false, 1)]
	#[case(response(false, None, &["invalid-input-response", "timeout-or-duplicate"]), 0.0, false, 2)]
	fn test_evaluate(
		#[case] response: SiteVerifyResponse,
		#[case] threshold: f64,
		#[case] passed: bool,
		#[case] error_count: usize,
	) {
		// Act
		let verdict = evaluate(&response, threshold);

		// Assert
		assert_eq!(verdict.passed, passed);
		assert_eq!(verdict.errors.len(), error_count);
	}

	#[rstest]
	fn test_low_score_and_missing_score_are_distinct() {
		// Act
		let low = evaluate(&response(true, Some(0.1), &[]), 0.5);
		let missing = evaluate(&response(true, None, &[]), 0.5);

		// Assert
		assert_eq!(low.errors, vec![messages::LOW_SCORE.to_string()]);
		assert_eq!(missing.errors, vec![messages::MISSING_SCORE.to_string()]);
	}

	#[rstest]
	fn test_unknown_code_keeps_code_in_message() {
		// Act
		let verdict = evaluate(&response(false, None, &["browser-error"]), 0.0);

		// Assert
		assert_eq!(verdict.errors, vec![messages::unknown_code("browser-error")]);
	}

	#[rstest]
	fn test_deserialize_provider_body() {
		// Arrange
		let body = r#"{"success":false,"error-codes":["bad-request"],"hostname":"example.com"}"#;

		// Act
		let parsed: SiteVerifyResponse = serde_json::from_str(body).unwrap();

		// Assert
		assert!(!parsed.success);
		assert_eq!(parsed.error_codes, vec!["bad-request".to_string()]);
		assert_eq!(parsed.score, None);
	}
}
