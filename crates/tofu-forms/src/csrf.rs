//! Anti-forgery tokens
//!
//! A token is `hex(HMAC-SHA256(secret, form | action | session | tick))`
//! where `tick` counts fixed-length windows since the Unix epoch. A token is
//! accepted during its own tick and the following one, so with the default
//! 12-hour tick a rendered form stays submittable for 12 to 24 hours.

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use std::time::Duration;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Default tick length
pub const DEFAULT_TICK: Duration = Duration::from_secs(12 * 60 * 60);

/// Name of the hidden input carrying a form's token
///
/// # Examples
///
/// ```
/// assert_eq!(tofu_forms::csrf::field_name("contact"), "_tofu_contact_nonce");
/// ```
pub fn field_name(form_key: &str) -> String {
	format!("_tofu_{}_nonce", form_key)
}

/// Issues and verifies per-form, per-action request tokens
///
/// # Examples
///
/// ```
/// use tofu_forms::AntiForgery;
///
/// let guard = AntiForgery::new(b"site secret");
/// let token = guard.token("contact", "input", "session-id");
///
/// assert!(guard.verify(&token, "contact", "input", "session-id"));
/// assert!(!guard.verify(&token, "contact", "confirm", "session-id"));
/// assert!(!guard.verify(&token, "contact", "input", "another-session"));
/// ```
#[derive(Clone)]
pub struct AntiForgery {
	secret: Vec<u8>,
	tick: Duration,
}

impl AntiForgery {
	pub fn new(secret: &[u8]) -> Self {
		Self {
			secret: secret.to_vec(),
			tick: DEFAULT_TICK,
		}
	}

	pub fn with_tick(mut self, tick: Duration) -> Self {
		self.tick = tick.max(Duration::from_secs(1));
		self
	}

	/// Token for the current time
	pub fn token(&self, form_key: &str, action: &str, session: &str) -> String {
		self.token_at(form_key, action, session, Utc::now().timestamp())
	}

	/// Token for an explicit Unix timestamp
	pub fn token_at(&self, form_key: &str, action: &str, session: &str, now: i64) -> String {
		self.sign(form_key, action, session, self.tick_of(now))
	}

	pub fn verify(&self, token: &str, form_key: &str, action: &str, session: &str) -> bool {
		self.verify_at(token, form_key, action, session, Utc::now().timestamp())
	}

	/// Verify against an explicit Unix timestamp
	pub fn verify_at(
		&self,
		token: &str,
		form_key: &str,
		action: &str,
		session: &str,
		now: i64,
	) -> bool {
		if token.is_empty() {
			return false;
		}
		let tick = self.tick_of(now);
		[tick, tick - 1].into_iter().any(|candidate| {
			let expected = self.sign(form_key, action, session, candidate);
			bool::from(expected.as_bytes().ct_eq(token.as_bytes()))
		})
	}

	fn tick_of(&self, now: i64) -> i64 {
		let tick_secs = i64::try_from(self.tick.as_secs()).unwrap_or(i64::MAX);
		now.div_euclid(tick_secs)
	}

	fn sign(&self, form_key: &str, action: &str, session: &str, tick: i64) -> String {
		// HMAC accepts keys of any length
		let mut mac = match HmacSha256::new_from_slice(&self.secret) {
			Ok(mac) => mac,
			Err(_) => return String::new(),
		};
		for part in [form_key, action, session] {
			mac.update(part.as_bytes());
			mac.update(b"|");
		}
		mac.update(tick.to_string().as_bytes());
		hex::encode(mac.finalize().into_bytes())
	}
}

impl fmt::Debug for AntiForgery {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AntiForgery")
			.field("tick", &self.tick)
			.finish_non_exhaustive()
	}
}
