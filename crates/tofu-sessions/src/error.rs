//! Session errors

pub type SessionResult<T> = Result<T, SessionError>;

/// Storage-level session error
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
	#[error("Session storage error: {0}")]
	Storage(String),

	#[error("Invalid session identity: {0}")]
	InvalidIdentity(String),
}

/// Failure to encrypt or decrypt a session payload
///
/// Decryption failures are expected (stale cookies, rotated secrets, tampering)
/// and callers treat them as "no prior state".
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
	#[error("Invalid payload encoding: {0}")]
	Encoding(String),

	#[error("Invalid encrypted data: too short")]
	Truncated,

	#[error("Payload failed authentication")]
	Authentication,

	#[error("Encryption failed")]
	Encryption,

	#[error("Payload serialization error: {0}")]
	Serialization(String),
}
