//! SQLite session store against an in-memory database

#![cfg(feature = "database")]

use rstest::{fixture, rstest};
use sqlx::sqlite::SqlitePoolOptions;
use std::time::Duration;
use tofu_sessions::{DatabaseSessionStore, SessionCodec, SessionId, SessionStore};

#[fixture]
async fn store() -> DatabaseSessionStore {
	// A single connection keeps the in-memory database alive for the test
	let pool = SqlitePoolOptions::new()
		.max_connections(1)
		.idle_timeout(None)
		.max_lifetime(None)
		.connect("sqlite::memory:")
		.await
		.unwrap();
	let store = DatabaseSessionStore::from_pool(pool);
	store.create_table().await.unwrap();
	store
}

#[rstest]
#[tokio::test]
async fn test_create_table_is_idempotent(#[future] store: DatabaseSessionStore) {
	// Arrange
	let store = store.await;

	// Act & Assert
	assert!(store.create_table().await.is_ok());
}

#[rstest]
#[tokio::test]
async fn test_upsert_keeps_one_row_per_form_and_browser(#[future] store: DatabaseSessionStore) {
	// Arrange
	let store = store.await;
	let session = SessionId::generate();

	// Act
	store.save("contact", &session, "first", Duration::from_secs(60)).await.unwrap();
	store.save("contact", &session, "second", Duration::from_secs(60)).await.unwrap();
	store.save("survey", &session, "other form", Duration::from_secs(60)).await.unwrap();

	// Assert
	let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tofu_sessions")
		.fetch_one(store.pool())
		.await
		.unwrap();
	assert_eq!(count, 2);
	assert_eq!(
		store.get("contact", &session).await.unwrap().as_deref(),
		Some("second")
	);
	assert_eq!(
		store.get("survey", &session).await.unwrap().as_deref(),
		Some("other form")
	);
}

#[rstest]
#[tokio::test]
async fn test_expired_row_is_absent_before_sweep(#[future] store: DatabaseSessionStore) {
	// Arrange
	let store = store.await;
	let session = SessionId::generate();
	store.save("contact", &session, "stale", Duration::ZERO).await.unwrap();

	// Act
	let found = store.get("contact", &session).await.unwrap();

	// Assert
	assert_eq!(found, None);
}

#[rstest]
#[tokio::test]
async fn test_clear_expired_reports_removed_rows(#[future] store: DatabaseSessionStore) {
	// Arrange
	let store = store.await;
	let live = SessionId::generate();
	store.save("contact", &SessionId::generate(), "a", Duration::ZERO).await.unwrap();
	store.save("contact", &SessionId::generate(), "b", Duration::ZERO).await.unwrap();
	store.save("contact", &live, "c", Duration::from_secs(600)).await.unwrap();

	// Act
	let removed = store.clear_expired().await.unwrap();

	// Assert
	assert_eq!(removed, 2);
	assert!(store.get("contact", &live).await.unwrap().is_some());
}

#[rstest]
#[tokio::test]
async fn test_clear_removes_row(#[future] store: DatabaseSessionStore) {
	// Arrange
	let store = store.await;
	let session = SessionId::generate();
	store.save("contact", &session, "x", Duration::from_secs(60)).await.unwrap();

	// Act
	store.clear("contact", &session).await.unwrap();
	store.clear("contact", &session).await.unwrap();

	// Assert
	assert_eq!(store.get("contact", &session).await.unwrap(), None);
}

#[rstest]
#[tokio::test]
async fn test_encrypted_payload_survives_storage(#[future] store: DatabaseSessionStore) {
	// Arrange
	let store = store.await;
	let codec = SessionCodec::new(b"integration secret");
	let session = SessionId::generate();
	let sealed = codec.encrypt(&serde_json::json!({"name": "Alice"})).unwrap();

	// Act
	store.save("contact", &session, &sealed, Duration::from_secs(60)).await.unwrap();
	let loaded = store.get("contact", &session).await.unwrap().unwrap();
	let value: serde_json::Value = codec.decrypt(&loaded).unwrap();

	// Assert
	assert_eq!(value["name"], "Alice");
}
