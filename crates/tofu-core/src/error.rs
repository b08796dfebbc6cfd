use http::StatusCode;
use tofu_captcha::CaptchaError;
use tofu_conf::SettingsError;
use tofu_forms::{FormsError, UploadError};
use tofu_mail::EmailError;
use tofu_sessions::{CodecError, SessionError};

pub type TofuResult<T> = Result<T, TofuError>;

/// How an error is handled at the request boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	/// Broken form or service setup, found while starting up
	Configuration,
	/// The request itself is unacceptable; nothing was changed
	ClientRequest,
	/// A third-party service failed
	Transport,
	/// State could not be persisted
	Storage,
	/// Stored state could not be read back
	DataIntegrity,
}

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum TofuError {
	#[error("Configuration error: {0}")]
	Configuration(String),

	#[error("Form '{0}' is already registered")]
	DuplicateForm(String),

	#[error("Anti-forgery token verification failed for form '{form}' ({action})")]
	InvalidAntiForgeryToken { form: String, action: String },

	#[error("Malformed action token: {0}")]
	MalformedActionToken(String),

	#[error("Form '{0}' is not registered")]
	UnknownForm(String),

	#[error("Unknown form action: {0}")]
	UnknownAction(String),

	#[error("Session storage error: {0}")]
	Storage(#[from] SessionError),

	#[error("Submission record error: {0}")]
	Records(String),

	#[error("Session payload error: {0}")]
	Codec(#[from] CodecError),

	#[error("Upload error: {0}")]
	Upload(#[from] UploadError),

	#[error("Notification failed: {0}")]
	Notification(#[from] EmailError),

	#[error(transparent)]
	Forms(#[from] FormsError),

	#[error(transparent)]
	Captcha(#[from] CaptchaError),

	#[error(transparent)]
	Settings(#[from] SettingsError),
}

impl TofuError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			TofuError::Configuration(_)
			| TofuError::DuplicateForm(_)
			| TofuError::Forms(_)
			| TofuError::Captcha(_)
			| TofuError::Settings(_) => ErrorKind::Configuration,
			TofuError::InvalidAntiForgeryToken { .. }
			| TofuError::MalformedActionToken(_)
			| TofuError::UnknownForm(_)
			| TofuError::UnknownAction(_) => ErrorKind::ClientRequest,
			TofuError::Notification(_) => ErrorKind::Transport,
			TofuError::Storage(_) | TofuError::Records(_) | TofuError::Upload(_) => {
				ErrorKind::Storage
			}
			TofuError::Codec(_) => ErrorKind::DataIntegrity,
		}
	}

	pub fn status_code(&self) -> StatusCode {
		match self {
			TofuError::InvalidAntiForgeryToken { .. } => StatusCode::FORBIDDEN,
			TofuError::MalformedActionToken(_) | TofuError::UnknownAction(_) => {
				StatusCode::BAD_REQUEST
			}
			TofuError::UnknownForm(_) => StatusCode::NOT_FOUND,
			_ => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	/// Message that is safe to show to the person submitting the form
	pub fn public_message(&self) -> &'static str {
		match self {
			TofuError::InvalidAntiForgeryToken { .. } => {
				"This form has expired. Please reload the page and try again."
			}
			TofuError::MalformedActionToken(_) | TofuError::UnknownAction(_) => {
				"Invalid form request."
			}
			TofuError::UnknownForm(_) => "Form not found.",
			TofuError::Notification(_) => {
				"Your submission could not be delivered. Please try again later."
			}
			TofuError::Storage(_) | TofuError::Records(_) | TofuError::Codec(_) => {
				"Your submission could not be saved. Please try again later."
			}
			TofuError::Upload(_) => "The uploaded file could not be processed.",
			_ => "The form is not available right now.",
		}
	}
}
