//! The single form endpoint
//!
//! Every form posts to one URL. The `_tofu_key` query parameter names the
//! form and the action; [`FormEndpoint::handle`] runs the action and answers
//! with a `303 See Other` redirect to the next page.

use crate::action::{ActionToken, FormAction};
use crate::error::{TofuError, TofuResult};
use crate::housekeeping::Housekeeper;
use crate::registry::{FormRegistry, RegisteredForm};
use crate::services::FormServices;
use crate::session::{ActionOutcome, ConfirmMode, FormSession, FormSubmission};
use http::header::{CONTENT_TYPE, LOCATION, SET_COOKIE};
use http::{HeaderValue, Response, StatusCode};
use std::sync::Arc;
use tofu_sessions::{ResolvedIdentity, SessionId};

/// What the host extracted from one request
#[derive(Debug, Clone, Default)]
pub struct FormRequest {
	/// Value of the `_tofu_key` query parameter
	pub action_token: Option<String>,
	/// Raw `Cookie` request header
	pub cookie_header: Option<String>,
	pub submission: FormSubmission,
}

impl FormRequest {
	pub fn new(action_token: impl Into<String>) -> Self {
		Self {
			action_token: Some(action_token.into()),
			..Default::default()
		}
	}

	pub fn with_cookie_header(mut self, header: impl Into<String>) -> Self {
		self.cookie_header = Some(header.into());
		self
	}

	pub fn with_submission(mut self, submission: FormSubmission) -> Self {
		self.submission = submission;
		self
	}
}

pub struct FormEndpoint {
	registry: Arc<FormRegistry>,
	services: Arc<FormServices>,
	housekeeper: Housekeeper,
}

impl FormEndpoint {
	pub fn new(registry: Arc<FormRegistry>, services: Arc<FormServices>) -> Self {
		let housekeeper = services.housekeeper();
		Self {
			registry,
			services,
			housekeeper,
		}
	}

	pub fn registry(&self) -> &FormRegistry {
		&self.registry
	}

	/// Load a form session for rendering one of the form's pages.
	///
	/// The returned identity must be set on the response when it was issued.
	pub async fn open(
		&self,
		form_key: &str,
		cookie_header: Option<&str>,
	) -> TofuResult<(FormSession, ResolvedIdentity)> {
		let form = self
			.registry
			.get(form_key)
			.ok_or_else(|| TofuError::UnknownForm(form_key.to_string()))?;
		let identity = self.services.cookie().resolve(cookie_header);
		let session = FormSession::load(form, Arc::clone(&self.services), identity.id.clone()).await?;
		Ok((session, identity))
	}

	/// Decode the action token and find its form
	pub fn resolve(&self, action_token: Option<&str>) -> TofuResult<(Arc<RegisteredForm>, FormAction)> {
		let raw = action_token
			.filter(|token| !token.is_empty())
			.ok_or_else(|| TofuError::MalformedActionToken("missing action token".to_string()))?;
		let token = ActionToken::decode(raw)?;
		let form = self
			.registry
			.get(&token.key)
			.ok_or_else(|| TofuError::UnknownForm(token.key.clone()))?;
		let action = token.form_action()?;
		Ok((form, action))
	}

	/// Run the requested action for one browser
	pub async fn dispatch(
		&self,
		form: Arc<RegisteredForm>,
		action: FormAction,
		session_id: SessionId,
		submission: &FormSubmission,
	) -> TofuResult<ActionOutcome> {
		let mut session = FormSession::load(form, Arc::clone(&self.services), session_id).await?;
		match action {
			FormAction::Input => session.action_input(submission).await,
			FormAction::Confirm => session.action_confirm(submission, ConfirmMode::Verify).await,
		}
	}

	/// Handle a request and build the HTTP response
	pub async fn handle(&self, request: &FormRequest) -> Response<String> {
		let identity = self.services.cookie().resolve(request.cookie_header.as_deref());

		let mut response = match self.resolve(request.action_token.as_deref()) {
			Ok((form, action)) => {
				let error_page = form.config().templates.error.clone();
				match self
					.dispatch(form, action, identity.id.clone(), &request.submission)
					.await
				{
					Ok(outcome) => redirect(outcome.location()),
					Err(e) => error_response(&e, error_page.as_deref()),
				}
			}
			Err(e) => error_response(&e, None),
		};

		if let Err(e) = self.housekeeper.maybe_run().await {
			tracing::warn!(error = %e, "Housekeeping failed");
		}

		if identity.issued {
			match HeaderValue::from_str(&self.services.cookie().header_value(&identity.id)) {
				Ok(value) => {
					response.headers_mut().insert(SET_COOKIE, value);
				}
				Err(e) => tracing::error!(error = %e, "Invalid session cookie header"),
			}
		}
		response
	}
}

fn redirect(location: &str) -> Response<String> {
	match HeaderValue::from_str(location) {
		Ok(value) => {
			let mut response = Response::new(String::new());
			*response.status_mut() = StatusCode::SEE_OTHER;
			response.headers_mut().insert(LOCATION, value);
			response
		}
		Err(e) => {
			tracing::error!(location, error = %e, "Invalid redirect location");
			plain(StatusCode::INTERNAL_SERVER_ERROR, "The form is not available right now.")
		}
	}
}

fn plain(status: StatusCode, message: &str) -> Response<String> {
	let mut response = Response::new(message.to_string());
	*response.status_mut() = status;
	response.headers_mut().insert(
		CONTENT_TYPE,
		HeaderValue::from_static("text/plain; charset=utf-8"),
	);
	response
}

fn error_response(error: &TofuError, error_page: Option<&str>) -> Response<String> {
	let status = error.status_code();
	if status.is_server_error() {
		tracing::error!(error = %error, kind = ?error.kind(), "Form request failed");
		if let Some(page) = error_page.filter(|page| !page.trim().is_empty()) {
			return redirect(page);
		}
	} else {
		tracing::warn!(error = %error, status = status.as_u16(), "Form request rejected");
	}
	plain(status, error.public_message())
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_redirect_sets_location() {
		// Act
		let response = redirect("/contact/thanks/");

		// Assert
		assert_eq!(response.status(), StatusCode::SEE_OTHER);
		assert_eq!(response.headers()[LOCATION], "/contact/thanks/");
	}

	#[rstest]
	fn test_server_error_uses_error_page() {
		// Arrange
		let error = TofuError::Records("disk full".into());

		// Act
		let with_page = error_response(&error, Some("/contact/error/"));
		let without_page = error_response(&error, None);

		// Assert
		assert_eq!(with_page.status(), StatusCode::SEE_OTHER);
		assert_eq!(without_page.status(), StatusCode::INTERNAL_SERVER_ERROR);
		assert!(!without_page.body().contains("disk full"));
	}

	#[rstest]
	fn test_client_error_ignores_error_page() {
		// Arrange
		let error = TofuError::UnknownForm("nope".into());

		// Act
		let response = error_response(&error, Some("/error/"));

		// Assert
		assert_eq!(response.status(), StatusCode::NOT_FOUND);
		assert_eq!(response.body(), "Form not found.");
	}
}
