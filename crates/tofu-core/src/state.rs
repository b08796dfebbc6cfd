//! What a form keeps between requests
//!
//! The payload is serialized to JSON and encrypted with the session codec
//! before it reaches the session store.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tofu_forms::{ErrorSet, FieldValueSet, UploadedFileRecord};

/// Bumped whenever [`SessionPayload`] changes shape; older payloads are discarded
pub const PAYLOAD_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionPayload {
	pub version: u32,
	#[serde(default)]
	pub values: FieldValueSet,
	#[serde(default)]
	pub errors: ErrorSet,
	#[serde(default)]
	pub files: Vec<UploadedFileRecord>,
	/// Encrypted [`FlushMarker`] written after a completed submission
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub flush_token: Option<String>,
}

impl SessionPayload {
	pub fn new(
		values: FieldValueSet,
		errors: ErrorSet,
		files: Vec<UploadedFileRecord>,
		flush_token: Option<String>,
	) -> Self {
		Self {
			version: PAYLOAD_VERSION,
			values,
			errors,
			files,
			flush_token,
		}
	}
}

/// Proof that a form was just submitted, checked by the result page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlushMarker {
	pub form_key: String,
	/// Unix seconds
	pub timestamp: i64,
}

impl FlushMarker {
	pub fn new(form_key: impl Into<String>, timestamp: i64) -> Self {
		Self {
			form_key: form_key.into(),
			timestamp,
		}
	}

	/// Marker belongs to `form_key` and is at most `window` old
	///
	/// # Examples
	///
	/// ```
	/// use std::time::Duration;
	/// use tofu_core::state::FlushMarker;
	///
	/// let marker = FlushMarker::new("contact", 1_000);
	/// let hour = Duration::from_secs(3600);
	///
	/// assert!(marker.is_valid_for("contact", 1_000 + 3600, hour));
	/// assert!(!marker.is_valid_for("contact", 1_000 + 3601, hour));
	/// assert!(!marker.is_valid_for("survey", 1_000, hour));
	/// ```
	pub fn is_valid_for(&self, form_key: &str, now: i64, window: Duration) -> bool {
		let age = now - self.timestamp;
		self.form_key == form_key && age >= 0 && age <= window.as_secs() as i64
	}
}

/// Where a form session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
	/// Nothing stored for this browser
	Fresh,
	/// Values, errors or files from an input submission are stored
	Input,
	/// A submission just completed; only the flush marker is stored
	Confirmed,
}
