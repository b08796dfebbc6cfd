//! Verifiers that ask a provider about a token

use crate::config::CaptchaConfig;
use crate::verdict::{CaptchaVerdict, SiteVerifyResponse, evaluate};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// Checks a challenge token for one form
#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
	async fn verify(&self, config: &CaptchaConfig, token: &str) -> CaptchaVerdict;
}

#[async_trait]
impl<T: CaptchaVerifier + ?Sized> CaptchaVerifier for Arc<T> {
	async fn verify(&self, config: &CaptchaConfig, token: &str) -> CaptchaVerdict {
		(**self).verify(config, token).await
	}
}

/// Answers every token with the same provider response
///
/// `None` behaves like an unreachable provider. Tokens are recorded so tests
/// can assert what was submitted.
#[derive(Debug, Clone, Default)]
pub struct FixedResponseVerifier {
	response: Option<SiteVerifyResponse>,
	tokens: Arc<Mutex<Vec<String>>>,
}

impl FixedResponseVerifier {
	pub fn new(response: SiteVerifyResponse) -> Self {
		Self {
			response: Some(response),
			tokens: Arc::default(),
		}
	}

	/// Every call fails as if the provider were down
	pub fn unavailable() -> Self {
		Self::default()
	}

	/// Provider reports success with the given score
	pub fn passing(score: f64) -> Self {
		Self::new(SiteVerifyResponse {
			success: true,
			score: Some(score),
			..Default::default()
		})
	}

	pub fn tokens(&self) -> Vec<String> {
		self.tokens.lock().clone()
	}
}

#[async_trait]
impl CaptchaVerifier for FixedResponseVerifier {
	async fn verify(&self, config: &CaptchaConfig, token: &str) -> CaptchaVerdict {
		self.tokens.lock().push(token.to_string());
		match &self.response {
			Some(response) => evaluate(response, config.threshold),
			None => CaptchaVerdict::unavailable(),
		}
	}
}

#[cfg(feature = "recaptcha")]
mod recaptcha {
	use super::*;
	use crate::verdict::messages;
	use crate::{CaptchaError, CaptchaResult};
	use secrecy::ExposeSecret;
	use std::time::Duration;
	use tofu_conf::CaptchaSettings;

	/// Posts tokens to a `siteverify` endpoint over HTTPS
	#[derive(Debug, Clone)]
	pub struct RecaptchaVerifier {
		client: reqwest::Client,
		endpoint: String,
	}

	impl RecaptchaVerifier {
		/// A request that exceeds `timeout` is treated like an unreachable provider
		pub fn new(endpoint: impl Into<String>, timeout: Duration) -> CaptchaResult<Self> {
			let client = reqwest::Client::builder()
				.timeout(timeout)
				.build()
				.map_err(|e| CaptchaError::Client(e.to_string()))?;
			Ok(Self {
				client,
				endpoint: endpoint.into(),
			})
		}

		pub fn from_settings(settings: &CaptchaSettings) -> CaptchaResult<Self> {
			Self::new(
				settings.endpoint.as_str(),
				Duration::from_secs(settings.timeout_secs),
			)
		}

		pub fn endpoint(&self) -> &str {
			&self.endpoint
		}
	}

	#[async_trait]
	impl CaptchaVerifier for RecaptchaVerifier {
		async fn verify(&self, config: &CaptchaConfig, token: &str) -> CaptchaVerdict {
			if token.trim().is_empty() {
				return CaptchaVerdict::failed(messages::MISSING_INPUT_RESPONSE);
			}

			let params = [
				("secret", config.secret_key.expose_secret()),
				("response", token),
			];
			let response = match self.client.post(&self.endpoint).form(&params).send().await {
				Ok(response) => response,
				Err(e) => {
					tracing::warn!(endpoint = %self.endpoint, error = %e, "reCAPTCHA request failed");
					return CaptchaVerdict::unavailable();
				}
			};

			let status = response.status();
			if !status.is_success() {
				tracing::warn!(endpoint = %self.endpoint, status = %status, "reCAPTCHA endpoint returned an error status");
				return CaptchaVerdict::unavailable();
			}

			let body = match response.text().await {
				Ok(body) => body,
				Err(e) => {
					tracing::warn!(endpoint = %self.endpoint, error = %e, "Failed to read reCAPTCHA response");
					return CaptchaVerdict::unavailable();
				}
			};

			match serde_json::from_str::<SiteVerifyResponse>(&body) {
				Ok(parsed) => evaluate(&parsed, config.threshold),
				Err(e) => {
					tracing::warn!(error = %e, "Unparseable reCAPTCHA response");
					CaptchaVerdict::unexpected_response()
				}
			}
		}
	}
}

#[cfg(feature = "recaptcha")]
pub use recaptcha::RecaptchaVerifier;

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[tokio::test]
	async fn test_fixed_verifier_records_tokens() {
		// Arrange
		let verifier = FixedResponseVerifier::passing(0.9);
		let config = CaptchaConfig::new("site", "secret");

		// Act
		let verdict = verifier.verify(&config, "tok-1").await;

		// Assert
		assert!(verdict.passed);
		assert_eq!(verifier.tokens(), vec!["tok-1".to_string()]);
	}

	#[rstest]
	#[tokio::test]
	async fn test_unavailable_verifier_fails_with_retry_message() {
		// Act
		let verdict = FixedResponseVerifier::unavailable()
			.verify(&CaptchaConfig::new("site", "secret"), "tok")
			.await;

		// Assert
		assert!(!verdict.passed);
		assert_eq!(verdict.errors, vec![crate::messages::UNAVAILABLE.to_string()]);
	}
}
