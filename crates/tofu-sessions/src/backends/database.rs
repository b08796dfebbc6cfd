//! SQLite-backed session storage
//!
//! ## Database Schema
//!
//! ```sql
//! CREATE TABLE tofu_sessions (
//!     id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     form_id VARCHAR(128) NOT NULL,
//!     session_key VARCHAR(64) NOT NULL,
//!     session_value TEXT NOT NULL,
//!     expiration INTEGER NOT NULL,
//!     created_at INTEGER NOT NULL,
//!     UNIQUE (form_id, session_key)
//! );
//! CREATE INDEX idx_tofu_sessions_expiration ON tofu_sessions(expiration);
//! ```
//!
//! Timestamps are Unix epoch milliseconds (UTC).
//!
//! ## Example
//!
//! ```rust,no_run
//! use tofu_sessions::{DatabaseSessionStore, SessionId, SessionStore};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let store = DatabaseSessionStore::connect("sqlite://tofu.db?mode=rwc", 5).await.unwrap();
//! store.create_table().await.unwrap();
//!
//! let session = SessionId::generate();
//! store.save("contact", &session, "sealed", Duration::from_secs(3600)).await.unwrap();
//! assert!(store.get("contact", &session).await.unwrap().is_some());
//! # }
//! ```

use super::SessionStore;
use crate::error::{SessionError, SessionResult};
use crate::identity::SessionId;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use std::time::Duration;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS tofu_sessions (
	id INTEGER PRIMARY KEY AUTOINCREMENT,
	form_id VARCHAR(128) NOT NULL,
	session_key VARCHAR(64) NOT NULL,
	session_value TEXT NOT NULL,
	expiration INTEGER NOT NULL,
	created_at INTEGER NOT NULL,
	UNIQUE (form_id, session_key)
)";

const CREATE_INDEX: &str = "CREATE INDEX IF NOT EXISTS idx_tofu_sessions_expiration \
	ON tofu_sessions(expiration)";

const UPSERT: &str = "INSERT INTO tofu_sessions \
	(form_id, session_key, session_value, expiration, created_at) \
	VALUES (?, ?, ?, ?, ?) \
	ON CONFLICT(form_id, session_key) DO UPDATE SET \
	session_value = excluded.session_value, expiration = excluded.expiration";

/// Database-backed [`SessionStore`]
#[derive(Debug, Clone)]
pub struct DatabaseSessionStore {
	pool: SqlitePool,
}

impl DatabaseSessionStore {
	/// Open a connection pool to `database_url`
	pub async fn connect(database_url: &str, max_connections: u32) -> SessionResult<Self> {
		let pool = SqlitePoolOptions::new()
			.max_connections(max_connections)
			.connect(database_url)
			.await
			.map_err(|e| SessionError::Storage(format!("Database connection error: {}", e)))?;
		Ok(Self { pool })
	}

	/// Create a store over an existing pool
	pub fn from_pool(pool: SqlitePool) -> Self {
		Self { pool }
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}

	/// Create the sessions table and its expiration index if missing
	pub async fn create_table(&self) -> SessionResult<()> {
		sqlx::query(CREATE_TABLE)
			.execute(&self.pool)
			.await
			.map_err(|e| SessionError::Storage(format!("Failed to create table: {}", e)))?;

		// Index on expiration keeps the sweep cheap
		sqlx::query(CREATE_INDEX)
			.execute(&self.pool)
			.await
			.map_err(|e| SessionError::Storage(format!("Failed to create index: {}", e)))?;

		Ok(())
	}
}

fn now_millis() -> i64 {
	Utc::now().timestamp_millis()
}

#[async_trait]
impl SessionStore for DatabaseSessionStore {
	async fn save(
		&self,
		form_id: &str,
		session: &SessionId,
		payload: &str,
		ttl: Duration,
	) -> SessionResult<()> {
		let now = now_millis();
		let ttl_millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
		let expiration = now.saturating_add(ttl_millis);

		sqlx::query(UPSERT)
			.bind(form_id)
			.bind(session.as_str())
			.bind(payload)
			.bind(expiration)
			.bind(now)
			.execute(&self.pool)
			.await
			.map_err(|e| SessionError::Storage(format!("Failed to save session: {}", e)))?;

		Ok(())
	}

	async fn get(&self, form_id: &str, session: &SessionId) -> SessionResult<Option<String>> {
		sqlx::query_scalar::<_, String>(
			"SELECT session_value FROM tofu_sessions \
			WHERE form_id = ? AND session_key = ? AND expiration > ?",
		)
		.bind(form_id)
		.bind(session.as_str())
		.bind(now_millis())
		.fetch_optional(&self.pool)
		.await
		.map_err(|e| SessionError::Storage(format!("Failed to load session: {}", e)))
	}

	async fn clear(&self, form_id: &str, session: &SessionId) -> SessionResult<()> {
		sqlx::query("DELETE FROM tofu_sessions WHERE form_id = ? AND session_key = ?")
			.bind(form_id)
			.bind(session.as_str())
			.execute(&self.pool)
			.await
			.map_err(|e| SessionError::Storage(format!("Failed to delete session: {}", e)))?;

		Ok(())
	}

	async fn clear_expired(&self) -> SessionResult<u64> {
		let result = sqlx::query("DELETE FROM tofu_sessions WHERE expiration <= ?")
			.bind(now_millis())
			.execute(&self.pool)
			.await
			.map_err(|e| SessionError::Storage(format!("Failed to cleanup sessions: {}", e)))?;

		Ok(result.rows_affected())
	}
}
