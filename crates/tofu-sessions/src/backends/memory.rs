//! In-memory session storage
//!
//! Suitable for tests and single-process deployments. Rows do not survive a
//! restart.

use super::SessionStore;
use crate::error::SessionResult;
use crate::identity::SessionId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
struct StoredSession {
	payload: String,
	expires_at: DateTime<Utc>,
}

/// In-memory [`SessionStore`]
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
	rows: Arc<RwLock<HashMap<(String, String), StoredSession>>>,
}

impl InMemorySessionStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of rows held, expired or not
	pub fn len(&self) -> usize {
		self.rows.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.read().is_empty()
	}

	fn key(form_id: &str, session: &SessionId) -> (String, String) {
		(form_id.to_string(), session.as_str().to_string())
	}
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
	async fn save(
		&self,
		form_id: &str,
		session: &SessionId,
		payload: &str,
		ttl: Duration,
	) -> SessionResult<()> {
		let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
		let expires_at = Utc::now()
			.checked_add_signed(ttl)
			.unwrap_or(DateTime::<Utc>::MAX_UTC);
		self.rows.write().insert(
			Self::key(form_id, session),
			StoredSession {
				payload: payload.to_string(),
				expires_at,
			},
		);
		Ok(())
	}

	async fn get(&self, form_id: &str, session: &SessionId) -> SessionResult<Option<String>> {
		let now = Utc::now();
		Ok(self
			.rows
			.read()
			.get(&Self::key(form_id, session))
			.filter(|row| row.expires_at > now)
			.map(|row| row.payload.clone()))
	}

	async fn clear(&self, form_id: &str, session: &SessionId) -> SessionResult<()> {
		self.rows.write().remove(&Self::key(form_id, session));
		Ok(())
	}

	async fn clear_expired(&self) -> SessionResult<u64> {
		let now = Utc::now();
		let mut rows = self.rows.write();
		let before = rows.len();
		rows.retain(|_, row| row.expires_at > now);
		Ok((before - rows.len()) as u64)
	}
}
