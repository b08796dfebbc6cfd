//! The per-request form session
//!
//! A [`FormSession`] is loaded from the session store at the start of a
//! request, driven through [`FormSession::action_input`] or
//! [`FormSession::action_confirm`], and written back before the browser is
//! redirected.
//!
//! ```text
//!   Fresh ──input──▶ Input ──confirm──▶ Confirmed
//!                    ▲   │
//!                    └───┘ errors
//! ```

use crate::action::{FormAction, QUERY_KEY, action_url};
use crate::error::{TofuError, TofuResult};
use crate::registry::RegisteredForm;
use crate::services::FormServices;
use crate::state::{FlushMarker, PAYLOAD_VERSION, SessionPayload, SessionState};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use std::time::SystemTime;
use tofu_captcha::CaptchaVerifier;
use tofu_conf::FlushPolicy;
use tofu_forms::{ErrorSet, FieldValueSet, FileSet, IncomingFile, csrf, escape_html};
use tofu_mail::{NotificationAttachment, TemplateContext};
use tofu_sessions::{SessionId, SessionStore};

/// Field that carries the reCAPTCHA token and its errors
pub const CAPTCHA_FIELD: &str = "_tofu_recaptcha_token";

/// Fields and files posted by the browser
#[derive(Debug, Clone, Default)]
pub struct FormSubmission {
	pub fields: FieldValueSet,
	pub files: Vec<IncomingFile>,
}

impl FormSubmission {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		self.fields.add(name, value);
		self
	}

	pub fn file(mut self, file: IncomingFile) -> Self {
		self.files.push(file);
		self
	}

	pub fn captcha_token(&self) -> &str {
		self.fields.get_str(CAPTCHA_FIELD).unwrap_or_default()
	}

	/// Posted values without the engine's own hidden fields
	pub fn user_values(&self, form_key: &str) -> FieldValueSet {
		let nonce = csrf::field_name(form_key);
		self.fields
			.iter()
			.filter(|(name, _)| *name != nonce && *name != CAPTCHA_FIELD && *name != QUERY_KEY)
			.map(|(name, value)| (name, value.clone()))
			.collect()
	}
}

/// Whether [`FormSession::action_confirm`] checks the request again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmMode {
	/// Check the confirm token, re-validate stored values and re-run the captcha
	Verify,
	/// Called straight from a successful input step
	SkipVerification,
}

/// Where to send the browser after an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
	Input(String),
	Confirm(String),
	Result(String),
}

impl ActionOutcome {
	pub fn location(&self) -> &str {
		match self {
			ActionOutcome::Input(path)
			| ActionOutcome::Confirm(path)
			| ActionOutcome::Result(path) => path,
		}
	}
}

pub struct FormSession {
	form: Arc<RegisteredForm>,
	services: Arc<FormServices>,
	session_id: SessionId,
	values: FieldValueSet,
	errors: ErrorSet,
	files: FileSet,
	flush_token: Option<String>,
}

impl std::fmt::Debug for FormSession {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FormSession")
			.field("form", &self.form.key())
			.field("state", &self.state())
			.field("errors", &self.errors.len())
			.field("files", &self.files.len())
			.finish_non_exhaustive()
	}
}

impl FormSession {
	/// Load the stored state of `form` for one browser.
	///
	/// Storage failures are fatal. A payload that cannot be decrypted or has
	/// an unknown version is discarded, as is a file entry whose temp file is
	/// gone; both are logged.
	pub async fn load(
		form: Arc<RegisteredForm>,
		services: Arc<FormServices>,
		session_id: SessionId,
	) -> TofuResult<Self> {
		let stored = services.store().get(form.key(), &session_id).await?;
		let mut session = Self {
			form,
			services,
			session_id,
			values: FieldValueSet::new(),
			errors: ErrorSet::new(),
			files: FileSet::new(),
			flush_token: None,
		};
		if let Some(encoded) = stored {
			session.restore(&encoded);
		}
		Ok(session)
	}

	fn restore(&mut self, encoded: &str) {
		let payload: SessionPayload = match self.services.codec().decrypt(encoded) {
			Ok(payload) => payload,
			Err(e) => {
				tracing::warn!(form = %self.key(), error = %e, "Discarding undecodable session payload");
				return;
			}
		};
		if payload.version != PAYLOAD_VERSION {
			tracing::warn!(
				form = %self.key(),
				version = payload.version,
				"Discarding session payload with unknown version"
			);
			return;
		}

		self.values = payload.values;
		self.errors = payload.errors;
		self.flush_token = payload.flush_token;
		for record in &payload.files {
			match self.services.uploader().restore(record) {
				Ok(file) => {
					self.files.add(file);
				}
				Err(e) => {
					tracing::warn!(
						form = %self.key(),
						field = %record.field,
						error = %e,
						"Dropping stored file entry"
					);
				}
			}
		}
	}

	pub fn key(&self) -> &str {
		self.form.key()
	}

	pub fn name(&self) -> &str {
		&self.form.config().name
	}

	pub fn session_id(&self) -> &SessionId {
		&self.session_id
	}

	pub fn state(&self) -> SessionState {
		if !self.values.is_empty() || self.errors.has_errors() || !self.files.is_empty() {
			SessionState::Input
		} else if self.flush_token.is_some() {
			SessionState::Confirmed
		} else {
			SessionState::Fresh
		}
	}

	pub fn values(&self) -> &FieldValueSet {
		&self.values
	}

	pub fn errors(&self) -> &ErrorSet {
		&self.errors
	}

	pub fn files(&self) -> &FileSet {
		&self.files
	}

	pub fn value(&self, field: &str) -> Option<&Value> {
		self.values.get(field)
	}

	/// Value as HTML-escaped text, ready to place in a page
	pub fn value_display(&self, field: &str) -> String {
		escape_html(&self.values.text(field))
	}

	/// Endpoint URL that runs `action` for this form
	pub fn action_url(&self, base: &str, action: FormAction) -> String {
		action_url(base, self.key(), action)
	}

	/// Name and value of the hidden anti-forgery field for `action`
	pub fn anti_forgery_field(&self, action: FormAction) -> (String, String) {
		let token = self.services.anti_forgery().token(
			self.key(),
			action.as_str(),
			self.session_id.as_str(),
		);
		(csrf::field_name(self.key()), token)
	}

	pub fn captcha_site_key(&self) -> Option<&str> {
		self.form
			.config()
			.captcha
			.as_ref()
			.map(|captcha| captcha.site_key.as_str())
	}

	/// Handle the input page submission
	pub async fn action_input(&mut self, submission: &FormSubmission) -> TofuResult<ActionOutcome> {
		self.verify_token(FormAction::Input, submission)?;

		let mut previous = std::mem::take(&mut self.files);
		self.values.clear();
		self.errors.clear();
		self.flush_token = None;

		for incoming in &submission.files {
			let Some(uploaded) = self.services.uploader().upload(incoming).await? else {
				continue;
			};
			let superseded = [previous.remove(uploaded.field()), self.files.add(uploaded)];
			for file in superseded.into_iter().flatten() {
				if let Err(e) = file.remove().await {
					tracing::warn!(field = %file.field(), error = %e, "Failed to delete superseded upload");
				}
			}
		}
		for file in previous {
			if !self.files.contains(file.field()) {
				self.files.add(file);
			}
		}

		let input = submission.user_values(self.key());
		self.check(&input, submission.captcha_token()).await;
		self.persist().await?;

		let form = Arc::clone(&self.form);
		let templates = &form.config().templates;
		if self.errors.has_errors() {
			tracing::debug!(form = %self.key(), errors = self.errors.len(), "Input has errors");
			return Ok(ActionOutcome::Input(templates.input.clone()));
		}
		match templates.confirm() {
			Some(confirm) => Ok(ActionOutcome::Confirm(confirm.to_string())),
			None => {
				self.action_confirm(submission, ConfirmMode::SkipVerification)
					.await
			}
		}
	}

	/// Send the stored submission and leave a flush marker for the result page
	pub async fn action_confirm(
		&mut self,
		submission: &FormSubmission,
		mode: ConfirmMode,
	) -> TofuResult<ActionOutcome> {
		let form = Arc::clone(&self.form);
		let config = form.config();

		if mode == ConfirmMode::Verify {
			self.verify_token(FormAction::Confirm, submission)?;
			if self.state() != SessionState::Input {
				tracing::debug!(form = %self.key(), "Nothing to confirm");
				return Ok(ActionOutcome::Input(config.templates.input.clone()));
			}

			let stored = self.values.clone();
			self.check(&stored, submission.captcha_token()).await;
			if self.errors.has_errors() {
				self.persist().await?;
				return Ok(ActionOutcome::Input(config.templates.input.clone()));
			}
		}

		let context = self.template_context();
		let attachments: Vec<NotificationAttachment> = self
			.files
			.iter()
			.map(|file| NotificationAttachment {
				path: file.path().to_path_buf(),
				filename: file.original_name().to_string(),
				mime_type: file.mime_type().to_string(),
			})
			.collect();
		let sent = self
			.services
			.notifier()
			.notify(&config.mail, &context, &attachments)
			.await
			.inspect_err(|e| {
				tracing::error!(form = %form.key(), error = %e, "Failed to send submission notifications");
			})?;

		if config.save_to_database {
			self.record_submission().await;
		}

		self.files.remove_all().await;
		self.services
			.store()
			.clear(form.key(), &self.session_id)
			.await?;
		self.values.clear();
		self.errors.clear();

		let marker = FlushMarker::new(form.key(), Utc::now().timestamp());
		self.flush_token = Some(self.services.codec().encrypt(&marker)?);
		self.persist().await?;

		tracing::info!(form = %self.key(), messages = sent, "Form submission completed");
		Ok(ActionOutcome::Result(config.templates.result.clone()))
	}

	/// Whether this browser completed the form within the flush window
	pub async fn verify_submit(&mut self) -> TofuResult<bool> {
		let Some(token) = self.flush_token.as_deref() else {
			return Ok(false);
		};
		let marker: FlushMarker = match self.services.codec().decrypt(token) {
			Ok(marker) => marker,
			Err(e) => {
				tracing::warn!(form = %self.key(), error = %e, "Invalid flush marker");
				return Ok(false);
			}
		};

		let valid = marker.is_valid_for(
			self.key(),
			Utc::now().timestamp(),
			self.services.flush_window(),
		);
		if valid && self.services.flush_policy() == FlushPolicy::SingleUse {
			self.services
				.store()
				.clear(self.form.key(), &self.session_id)
				.await?;
			self.flush_token = None;
		}
		Ok(valid)
	}

	fn verify_token(&self, action: FormAction, submission: &FormSubmission) -> TofuResult<()> {
		let token = submission
			.fields
			.get_str(&csrf::field_name(self.key()))
			.unwrap_or_default();
		let valid = self.services.anti_forgery().verify(
			token,
			self.key(),
			action.as_str(),
			self.session_id.as_str(),
		);
		if valid {
			return Ok(());
		}
		tracing::warn!(form = %self.key(), action = %action, "Anti-forgery token rejected");
		Err(TofuError::InvalidAntiForgeryToken {
			form: self.key().to_string(),
			action: action.to_string(),
		})
	}

	/// Validate `input` against the stored files and run the captcha
	async fn check(&mut self, input: &FieldValueSet, captcha_token: &str) {
		let outcome = self.form.validator().validate(input, &self.files);
		self.values = outcome.values;
		self.errors = outcome.errors;

		for field in &outcome.rejected_files {
			if let Some(file) = self.files.remove(field)
				&& let Err(e) = file.remove().await
			{
				tracing::warn!(field = %field, error = %e, "Failed to delete rejected upload");
			}
		}

		if let Some(captcha) = &self.form.config().captcha {
			let verdict = self.services.captcha().verify(captcha, captcha_token).await;
			if !verdict.passed {
				tracing::info!(form = %self.form.key(), "Captcha check failed");
			}
			for message in verdict.errors {
				self.errors.add(CAPTCHA_FIELD, message);
			}
		}
	}

	async fn record_submission(&self) {
		let Some(records) = self.services.records() else {
			tracing::warn!(form = %self.key(), "No record sink configured; submission not recorded");
			return;
		};
		if let Err(e) = records.record(self.key()).await {
			tracing::error!(form = %self.key(), error = %e, "Failed to record submission");
		}
	}

	/// Values plus the original names of uploaded files
	fn template_context(&self) -> TemplateContext {
		let mut context = self.values.as_map().clone();
		for file in self.files.iter() {
			context.insert(
				file.field().to_string(),
				Value::String(file.original_name().to_string()),
			);
		}
		context
	}

	async fn persist(&self) -> TofuResult<()> {
		let payload = SessionPayload::new(
			self.values.clone(),
			self.errors.clone(),
			self.files.to_records(),
			self.flush_token.clone(),
		);
		let encoded = self.services.codec().encrypt(&payload)?;
		self.files.touch_all(SystemTime::now()).await;
		self.services
			.store()
			.save(
				self.form.key(),
				&self.session_id,
				&encoded,
				self.services.session_ttl(),
			)
			.await?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::{FormConfig, TemplateConfig};
	use crate::registry::FormRegistry;
	use rstest::{fixture, rstest};
	use tempfile::TempDir;
	use tofu_conf::TofuSettings;
	use tofu_forms::ValidationConfig;
	use tofu_mail::{MailConfig, MailRecipientConfig, MemoryTransport};
	use tofu_sessions::SessionStore;

	struct Harness {
		_dir: TempDir,
		services: Arc<FormServices>,
		transport: MemoryTransport,
		form: Arc<RegisteredForm>,
	}

	#[fixture]
	fn harness() -> Harness {
		let dir = tempfile::tempdir().unwrap();
		let mut settings = TofuSettings::default();
		settings.uploads.temp_dir = dir.path().join("uploads");
		let transport = MemoryTransport::new();
		let services = FormServices::builder(&settings)
			.transport(Arc::new(transport.clone()))
			.build();
		let mut registry = FormRegistry::new();
		let form = registry
			.register(
				FormConfig::new(
					"contact",
					"Contact",
					TemplateConfig::new("/contact/", "/contact/thanks/")
						.with_confirm("/contact/confirm/"),
					MailConfig::new("noreply@example.com").recipient(
						MailRecipientConfig::to("office@example.com")
							.subject("From {name}")
							.body("{message}"),
					),
				)
				.with_validation(
					ValidationConfig::new()
						.rule("name", "required")
						.filter("name", "trim"),
				),
			)
			.unwrap();
		Harness {
			_dir: dir,
			services: Arc::new(services),
			transport,
			form,
		}
	}

	async fn open(harness: &Harness, id: &SessionId) -> FormSession {
		FormSession::load(Arc::clone(&harness.form), Arc::clone(&harness.services), id.clone())
			.await
			.unwrap()
	}

	fn signed(session: &FormSession, action: FormAction) -> FormSubmission {
		let (name, token) = session.anti_forgery_field(action);
		FormSubmission::new().field(name, token)
	}

	#[rstest]
	#[tokio::test]
	async fn test_input_then_confirm(harness: Harness) {
		// Arrange
		let id = SessionId::generate();
		let mut session = open(&harness, &id).await;
		let submission = signed(&session, FormAction::Input)
			.field("name", "  Alice ")
			.field("message", "Hi");

		// Act
		let first = session.action_input(&submission).await.unwrap();
		let mut reloaded = open(&harness, &id).await;
		let second = reloaded
			.action_confirm(&signed(&reloaded, FormAction::Confirm), ConfirmMode::Verify)
			.await
			.unwrap();

		// Assert
		assert_eq!(first, ActionOutcome::Confirm("/contact/confirm/".into()));
		assert_eq!(second, ActionOutcome::Result("/contact/thanks/".into()));
		assert_eq!(harness.transport.sent()[0].subject(), "From Alice");
		assert_eq!(reloaded.state(), SessionState::Confirmed);
		assert!(reloaded.verify_submit().await.unwrap());
	}

	#[rstest]
	#[tokio::test]
	async fn test_reserved_fields_are_not_stored(harness: Harness) {
		// Arrange
		let id = SessionId::generate();
		let mut session = open(&harness, &id).await;
		let submission = signed(&session, FormAction::Input)
			.field("name", "Alice")
			.field(CAPTCHA_FIELD, "token")
			.field(QUERY_KEY, "abc");

		// Act
		session.action_input(&submission).await.unwrap();

		// Assert
		let reloaded = open(&harness, &id).await;
		assert_eq!(reloaded.values().len(), 1);
		assert_eq!(reloaded.value("name"), Some(&Value::from("Alice")));
	}

	#[rstest]
	#[tokio::test]
	async fn test_confirm_without_stored_input_redirects_to_input(harness: Harness) {
		// Arrange
		let id = SessionId::generate();
		let mut session = open(&harness, &id).await;

		// Act
		let outcome = session
			.action_confirm(&signed(&session, FormAction::Confirm), ConfirmMode::Verify)
			.await
			.unwrap();

		// Assert
		assert_eq!(outcome, ActionOutcome::Input("/contact/".into()));
		assert!(harness.transport.is_empty());
	}

	#[rstest]
	#[tokio::test]
	async fn test_input_token_is_not_accepted_for_confirm(harness: Harness) {
		// Arrange
		let id = SessionId::generate();
		let mut session = open(&harness, &id).await;
		session
			.action_input(&signed(&session, FormAction::Input).field("name", "Alice"))
			.await
			.unwrap();

		// Act
		let result = session
			.action_confirm(&signed(&session, FormAction::Input), ConfirmMode::Verify)
			.await;

		// Assert
		assert!(matches!(result, Err(TofuError::InvalidAntiForgeryToken { .. })));
		assert!(harness.transport.is_empty());
	}

	#[rstest]
	#[tokio::test]
	async fn test_undecodable_payload_is_treated_as_fresh(harness: Harness) {
		// Arrange
		let id = SessionId::generate();
		harness
			.services
			.store()
			.save("contact", &id, "not-a-ciphertext", harness.services.session_ttl())
			.await
			.unwrap();

		// Act
		let session = open(&harness, &id).await;

		// Assert
		assert_eq!(session.state(), SessionState::Fresh);
	}

	#[rstest]
	#[tokio::test]
	async fn test_missing_temp_file_drops_only_that_entry(harness: Harness) {
		// Arrange
		let id = SessionId::generate();
		let mut session = open(&harness, &id).await;
		let submission = signed(&session, FormAction::Input)
			.field("name", "Alice")
			.file(IncomingFile::from_bytes("resume", "cv.txt", b"hello".to_vec()));
		session.action_input(&submission).await.unwrap();
		let path = session.files().get("resume").unwrap().path().to_path_buf();
		std::fs::remove_file(&path).unwrap();

		// Act
		let reloaded = open(&harness, &id).await;

		// Assert
		assert!(reloaded.files().is_empty());
		assert_eq!(reloaded.value("name"), Some(&Value::from("Alice")));
	}

	#[rstest]
	#[tokio::test]
	async fn test_previous_upload_is_kept_until_replaced(harness: Harness) {
		// Arrange
		let id = SessionId::generate();
		let mut session = open(&harness, &id).await;
		session
			.action_input(
				&signed(&session, FormAction::Input)
					.file(IncomingFile::from_bytes("resume", "v1.txt", b"one".to_vec())),
			)
			.await
			.unwrap();
		let first_path = session.files().get("resume").unwrap().path().to_path_buf();

		// Act
		let mut second = open(&harness, &id).await;
		second
			.action_input(&signed(&second, FormAction::Input).field("name", "Alice"))
			.await
			.unwrap();
		let kept = second.files().get("resume").unwrap().path().to_path_buf();
		let mut third = open(&harness, &id).await;
		third
			.action_input(
				&signed(&third, FormAction::Input)
					.field("name", "Alice")
					.file(IncomingFile::from_bytes("resume", "v2.txt", b"two".to_vec())),
			)
			.await
			.unwrap();

		// Assert
		assert_eq!(kept, first_path);
		assert!(!first_path.exists());
		assert_eq!(third.files().get("resume").unwrap().original_name(), "v2.txt");
	}

	#[rstest]
	#[tokio::test]
	async fn test_value_display_is_escaped(harness: Harness) {
		// Arrange
		let id = SessionId::generate();
		let mut session = open(&harness, &id).await;

		// Act
		session
			.action_input(
				&signed(&session, FormAction::Input).field("name", "<b>Alice</b>"),
			)
			.await
			.unwrap();

		// Assert
		assert_eq!(session.value_display("name"), "&lt;b&gt;Alice&lt;/b&gt;");
		assert_eq!(session.value_display("missing"), "");
	}
}
