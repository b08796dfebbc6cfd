//! Submission records
//!
//! Forms declared with `save_to_database = true` leave one row per completed
//! submission. Only the form key and the time are stored.

use crate::error::{TofuError, TofuResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRecord {
	pub id: i64,
	pub form_id: String,
	pub created_at: DateTime<Utc>,
}

/// Insert-only sink for completed submissions
#[async_trait]
pub trait SubmissionRecorder: Send + Sync {
	async fn record(&self, form_id: &str) -> TofuResult<SubmissionRecord>;

	async fn count(&self, form_id: &str) -> TofuResult<u64>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordSink {
	rows: Arc<Mutex<Vec<SubmissionRecord>>>,
}

impl InMemoryRecordSink {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn records(&self) -> Vec<SubmissionRecord> {
		self.rows.lock().clone()
	}
}

#[async_trait]
impl SubmissionRecorder for InMemoryRecordSink {
	async fn record(&self, form_id: &str) -> TofuResult<SubmissionRecord> {
		let mut rows = self.rows.lock();
		let record = SubmissionRecord {
			id: rows.len() as i64 + 1,
			form_id: form_id.to_string(),
			created_at: Utc::now(),
		};
		rows.push(record.clone());
		Ok(record)
	}

	async fn count(&self, form_id: &str) -> TofuResult<u64> {
		Ok(self
			.rows
			.lock()
			.iter()
			.filter(|row| row.form_id == form_id)
			.count() as u64)
	}
}

#[cfg(feature = "database")]
pub use database::DatabaseRecordSink;

#[cfg(feature = "database")]
mod database {
	use super::*;
	use sqlx::SqlitePool;

	const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS tofu_records (\
		id INTEGER PRIMARY KEY AUTOINCREMENT, \
		form_id VARCHAR(128) NOT NULL, \
		created_at INTEGER NOT NULL)";

	const CREATE_INDEX: &str =
		"CREATE INDEX IF NOT EXISTS idx_tofu_records_form_id ON tofu_records (form_id)";

	/// Records stored in the `tofu_records` table
	#[derive(Debug, Clone)]
	pub struct DatabaseRecordSink {
		pool: SqlitePool,
	}

	impl DatabaseRecordSink {
		pub fn from_pool(pool: SqlitePool) -> Self {
			Self { pool }
		}

		pub async fn create_table(&self) -> TofuResult<()> {
			sqlx::query(CREATE_TABLE)
				.execute(&self.pool)
				.await
				.map_err(|e| TofuError::Records(format!("Failed to create table: {}", e)))?;
			sqlx::query(CREATE_INDEX)
				.execute(&self.pool)
				.await
				.map_err(|e| TofuError::Records(format!("Failed to create index: {}", e)))?;
			Ok(())
		}
	}

	#[async_trait]
	impl SubmissionRecorder for DatabaseRecordSink {
		async fn record(&self, form_id: &str) -> TofuResult<SubmissionRecord> {
			let created_at = Utc::now();
			let result = sqlx::query("INSERT INTO tofu_records (form_id, created_at) VALUES (?, ?)")
				.bind(form_id)
				.bind(created_at.timestamp_millis())
				.execute(&self.pool)
				.await
				.map_err(|e| TofuError::Records(format!("Failed to insert record: {}", e)))?;

			Ok(SubmissionRecord {
				id: result.last_insert_rowid(),
				form_id: form_id.to_string(),
				created_at,
			})
		}

		async fn count(&self, form_id: &str) -> TofuResult<u64> {
			let count = sqlx::query_scalar::<_, i64>(
				"SELECT COUNT(*) FROM tofu_records WHERE form_id = ?",
			)
			.bind(form_id)
			.fetch_one(&self.pool)
			.await
			.map_err(|e| TofuError::Records(format!("Failed to count records: {}", e)))?;
			Ok(count.max(0) as u64)
		}
	}

	#[cfg(test)]
	mod tests {
		use super::*;
		use rstest::rstest;
		use sqlx::sqlite::SqlitePoolOptions;

		#[rstest]
		#[tokio::test]
		async fn test_records_are_counted_per_form() {
			// Arrange
			let pool = SqlitePoolOptions::new()
				.max_connections(1)
				.idle_timeout(None)
				.max_lifetime(None)
				.connect("sqlite::memory:")
				.await
				.unwrap();
			let sink = DatabaseRecordSink::from_pool(pool);
			sink.create_table().await.unwrap();
			sink.create_table().await.unwrap();

			// Act
			let first = sink.record("contact").await.unwrap();
			let second = sink.record("contact").await.unwrap();
			sink.record("survey").await.unwrap();

			// Assert
			assert!(second.id > first.id);
			assert_eq!(sink.count("contact").await.unwrap(), 2);
			assert_eq!(sink.count("survey").await.unwrap(), 1);
			assert_eq!(sink.count("other").await.unwrap(), 0);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[tokio::test]
	async fn test_in_memory_sink() {
		// Arrange
		let sink = InMemoryRecordSink::new();

		// Act
		sink.record("contact").await.unwrap();
		sink.record("contact").await.unwrap();

		// Assert
		assert_eq!(sink.count("contact").await.unwrap(), 2);
		assert_eq!(sink.records()[1].id, 2);
	}
}
