//! Session storage backends
//!
//! Rows are keyed by `(form id, session id)`. Saving upserts and pushes the
//! expiration to `now + ttl`; reading never returns an expired row.

#[cfg(feature = "database")]
pub mod database;
pub mod memory;

#[cfg(feature = "database")]
pub use database::DatabaseSessionStore;
pub use memory::InMemorySessionStore;

use crate::error::SessionResult;
use crate::identity::SessionId;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Durable storage for encrypted session payloads
#[async_trait]
pub trait SessionStore: Send + Sync {
	/// Insert or replace the row and extend its expiration to `now + ttl`
	async fn save(
		&self,
		form_id: &str,
		session: &SessionId,
		payload: &str,
		ttl: Duration,
	) -> SessionResult<()>;

	/// Payload of the unexpired row, if any
	async fn get(&self, form_id: &str, session: &SessionId) -> SessionResult<Option<String>>;

	/// Delete the row; no-op when absent
	async fn clear(&self, form_id: &str, session: &SessionId) -> SessionResult<()>;

	/// Delete every expired row and return how many were removed
	async fn clear_expired(&self) -> SessionResult<u64>;
}

#[async_trait]
impl<S: SessionStore + ?Sized> SessionStore for Arc<S> {
	async fn save(
		&self,
		form_id: &str,
		session: &SessionId,
		payload: &str,
		ttl: Duration,
	) -> SessionResult<()> {
		(**self).save(form_id, session, payload, ttl).await
	}

	async fn get(&self, form_id: &str, session: &SessionId) -> SessionResult<Option<String>> {
		(**self).get(form_id, session).await
	}

	async fn clear(&self, form_id: &str, session: &SessionId) -> SessionResult<()> {
		(**self).clear(form_id, session).await
	}

	async fn clear_expired(&self) -> SessionResult<u64> {
		(**self).clear_expired().await
	}
}
