//! Periodic removal of expired session rows
//!
//! ```rust
//! use tofu_sessions::{InMemorySessionStore, SessionCleanupTask};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(InMemorySessionStore::new());
//! let cleanup = SessionCleanupTask::new(store, Duration::from_secs(600));
//!
//! let removed = cleanup.run_cleanup().await?;
//! assert_eq!(removed, 0);
//! # Ok(())
//! # }
//! # tokio::runtime::Runtime::new().unwrap().block_on(example()).unwrap();
//! ```

use crate::backends::SessionStore;
use crate::error::SessionResult;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Sweeps expired rows from a [`SessionStore`]
pub struct SessionCleanupTask {
	store: Arc<dyn SessionStore>,
	interval: Duration,
}

impl SessionCleanupTask {
	pub fn new(store: Arc<dyn SessionStore>, interval: Duration) -> Self {
		Self { store, interval }
	}

	pub fn interval(&self) -> Duration {
		self.interval
	}

	/// Run one sweep
	pub async fn run_cleanup(&self) -> SessionResult<u64> {
		let removed = self.store.clear_expired().await?;
		if removed > 0 {
			tracing::info!(removed, "expired form sessions removed");
		}
		Ok(removed)
	}

	/// Sweep on a fixed interval until the handle is aborted.
	///
	/// Failures are logged and the loop keeps going.
	pub fn spawn(self) -> JoinHandle<()> {
		tokio::spawn(async move {
			let mut ticker = tokio::time::interval(self.interval);
			ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
			loop {
				ticker.tick().await;
				if let Err(e) = self.run_cleanup().await {
					tracing::warn!(error = %e, "session cleanup failed");
				}
			}
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::backends::InMemorySessionStore;
	use crate::identity::SessionId;
	use rstest::rstest;

	#[rstest]
	#[tokio::test]
	async fn test_run_cleanup_removes_only_expired_rows() {
		// Arrange
		let store = Arc::new(InMemorySessionStore::new());
		store
			.save("contact", &SessionId::generate(), "old", Duration::ZERO)
			.await
			.unwrap();
		store
			.save("contact", &SessionId::generate(), "live", Duration::from_secs(60))
			.await
			.unwrap();
		let task = SessionCleanupTask::new(store.clone(), Duration::from_secs(60));

		// Act
		let removed = task.run_cleanup().await.unwrap();

		// Assert
		assert_eq!(removed, 1);
		assert_eq!(store.len(), 1);
	}
}
