use std::path::PathBuf;

pub type FormsResult<T> = Result<T, FormsError>;

/// Form configuration error, raised when a form is registered
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum FormsError {
	#[error("Unknown validation rule '{rule}' for field '{field}'")]
	UnknownRule { field: String, rule: String },

	#[error("Invalid parameter for rule '{rule}' on field '{field}': {message}")]
	InvalidRuleParameter {
		field: String,
		rule: String,
		message: String,
	},

	#[error("Unknown filter '{filter}' for field '{field}'")]
	UnknownFilter { field: String, filter: String },
}

/// Upload lifecycle error
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
	#[error("Temporary file does not exist: {0}")]
	MissingTempFile(PathBuf),

	#[error("Invalid temporary file name: {0}")]
	InvalidTempName(String),

	#[error("Upload storage error: {0}")]
	Io(#[from] std::io::Error),
}
