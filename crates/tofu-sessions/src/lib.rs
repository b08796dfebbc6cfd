//! # tofu-sessions
//!
//! Durable storage for in-progress form submissions.
//!
//! A session row is keyed by `(form id, session id)`, carries an encrypted
//! payload and expires a fixed time after its last save. Reads never return
//! an expired row, whether or not the sweep has run yet.
//!
//! ## Components
//!
//! - [`SessionCodec`]: AES-256-GCM encryption of serialized payloads
//! - [`SessionStore`]: storage trait with in-memory and SQL backends
//! - [`SessionId`] / [`SessionCookie`]: the opaque per-browser identity
//! - [`SessionCleanupTask`]: periodic sweep of expired rows
//!
//! ## Example
//!
//! ```rust
//! use tofu_sessions::{InMemorySessionStore, SessionCodec, SessionId, SessionStore};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let codec = SessionCodec::new(b"an example site secret of decent length");
//! let store = InMemorySessionStore::new();
//! let session = SessionId::generate();
//!
//! let payload = codec.encrypt(&vec!["hello"])?;
//! store.save("contact", &session, &payload, Duration::from_secs(3600)).await?;
//!
//! let stored = store.get("contact", &session).await?.unwrap();
//! let restored: Vec<String> = codec.decrypt(&stored)?;
//! assert_eq!(restored, vec!["hello"]);
//! # Ok(())
//! # }
//! # tokio::runtime::Runtime::new().unwrap().block_on(example()).unwrap();
//! ```

pub mod backends;
pub mod cleanup;
pub mod codec;
pub mod error;
pub mod identity;

pub use backends::{InMemorySessionStore, SessionStore};
#[cfg(feature = "database")]
pub use backends::DatabaseSessionStore;
pub use cleanup::SessionCleanupTask;
pub use codec::SessionCodec;
pub use error::{CodecError, SessionError, SessionResult};
pub use identity::{ResolvedIdentity, SessionCookie, SessionId};
