//! Per-browser session identity
//!
//! The identity is an opaque random token carried in a cookie. It links a
//! browser to its session rows and is never used for authentication.

use crate::error::{SessionError, SessionResult};
use rand::Rng;
use std::fmt;
use std::time::Duration;

const SESSION_ID_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of generated identities
pub const SESSION_ID_LENGTH: usize = 32;

/// Longest identity accepted from a cookie (matches the storage column)
pub const MAX_SESSION_ID_LENGTH: usize = 64;

/// Opaque session identity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
	/// Generate a new random identity
	///
	/// # Examples
	///
	/// ```
	/// use tofu_sessions::SessionId;
	///
	/// let id = SessionId::generate();
	/// assert_eq!(id.as_str().len(), 32);
	/// assert_ne!(id, SessionId::generate());
	/// ```
	pub fn generate() -> Self {
		let mut rng = rand::rng();
		let token = (0..SESSION_ID_LENGTH)
			.map(|_| SESSION_ID_CHARS[rng.random_range(0..SESSION_ID_CHARS.len())] as char)
			.collect();
		Self(token)
	}

	/// Accept an identity presented by a client
	pub fn parse(value: &str) -> SessionResult<Self> {
		if value.is_empty() {
			return Err(SessionError::InvalidIdentity("empty".to_string()));
		}
		if value.len() > MAX_SESSION_ID_LENGTH {
			return Err(SessionError::InvalidIdentity(format!(
				"longer than {} characters",
				MAX_SESSION_ID_LENGTH
			)));
		}
		if !value
			.bytes()
			.all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
		{
			return Err(SessionError::InvalidIdentity(
				"contains unsupported characters".to_string(),
			));
		}
		Ok(Self(value.to_string()))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for SessionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Cookie that carries the [`SessionId`]
#[derive(Debug, Clone)]
pub struct SessionCookie {
	name: String,
	max_age: Duration,
	path: String,
	secure: bool,
}

/// Outcome of [`SessionCookie::resolve`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
	pub id: SessionId,
	/// True when the identity was generated for this request and must be set
	pub issued: bool,
}

impl SessionCookie {
	pub fn new(name: impl Into<String>, max_age: Duration) -> Self {
		Self {
			name: name.into(),
			max_age,
			path: "/".to_string(),
			secure: false,
		}
	}

	pub fn with_path(mut self, path: impl Into<String>) -> Self {
		self.path = path.into();
		self
	}

	pub fn with_secure(mut self, secure: bool) -> Self {
		self.secure = secure;
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Find the identity in a `Cookie` request header, or issue a new one.
	///
	/// A malformed cookie value is replaced rather than rejected.
	///
	/// # Examples
	///
	/// ```
	/// use tofu_sessions::SessionCookie;
	/// use std::time::Duration;
	///
	/// let cookie = SessionCookie::new("_tofu_session_key", Duration::from_secs(3600));
	///
	/// let known = cookie.resolve(Some("theme=dark; _tofu_session_key=abc123"));
	/// assert_eq!(known.id.as_str(), "abc123");
	/// assert!(!known.issued);
	///
	/// let fresh = cookie.resolve(None);
	/// assert!(fresh.issued);
	/// ```
	pub fn resolve(&self, cookie_header: Option<&str>) -> ResolvedIdentity {
		let presented = cookie_header.and_then(|header| {
			header.split(';').find_map(|pair| {
				let (name, value) = pair.trim().split_once('=')?;
				(name.trim() == self.name).then(|| value.trim().trim_matches('"'))
			})
		});

		match presented.map(SessionId::parse) {
			Some(Ok(id)) => ResolvedIdentity { id, issued: false },
			Some(Err(e)) => {
				tracing::debug!(cookie = %self.name, error = %e, "replacing malformed session cookie");
				ResolvedIdentity {
					id: SessionId::generate(),
					issued: true,
				}
			}
			None => ResolvedIdentity {
				id: SessionId::generate(),
				issued: true,
			},
		}
	}

	/// `Set-Cookie` header value for an identity
	pub fn header_value(&self, id: &SessionId) -> String {
		let mut value = format!(
			"{}={}; Path={}; Max-Age={}; HttpOnly; SameSite=Lax",
			self.name,
			id,
			self.path,
			self.max_age.as_secs()
		);
		if self.secure {
			value.push_str("; Secure");
		}
		value
	}
}
