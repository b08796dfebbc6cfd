//! Sweeping expired sessions and upload temp files
//!
//! Requests call [`Housekeeper::maybe_run`], which sweeps with the configured
//! probability. Deployments that prefer a fixed schedule can
//! [`Housekeeper::spawn`] a background task instead.

use crate::error::TofuResult;
use std::sync::Arc;
use std::time::Duration;
use tofu_forms::Uploader;
use tofu_sessions::SessionStore;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HousekeepingReport {
	pub sessions_removed: u64,
	pub files_removed: usize,
}

pub struct Housekeeper {
	store: Arc<dyn SessionStore>,
	uploader: Uploader,
	probability: f64,
}

impl Housekeeper {
	pub fn new(store: Arc<dyn SessionStore>, uploader: Uploader, probability: f64) -> Self {
		Self {
			store,
			uploader,
			probability: probability.clamp(0.0, 1.0),
		}
	}

	/// Sweep sessions first, then temp files older than the upload TTL
	pub async fn run(&self) -> TofuResult<HousekeepingReport> {
		let sessions_removed = self.store.clear_expired().await?;
		let files_removed = self.uploader.clear_expired().await;
		if sessions_removed > 0 || files_removed > 0 {
			tracing::info!(sessions_removed, files_removed, "Housekeeping removed expired data");
		}
		Ok(HousekeepingReport {
			sessions_removed,
			files_removed,
		})
	}

	/// Run with the configured probability
	pub async fn maybe_run(&self) -> TofuResult<Option<HousekeepingReport>> {
		if self.probability <= 0.0 || rand::random::<f64>() >= self.probability {
			return Ok(None);
		}
		self.run().await.map(Some)
	}

	/// Sweep every `interval` until the handle is aborted; failures are logged
	pub fn spawn(self, interval: Duration) -> JoinHandle<()> {
		tokio::spawn(async move {
			let mut ticker = tokio::time::interval(interval);
			ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
			loop {
				ticker.tick().await;
				if let Err(e) = self.run().await {
					tracing::warn!(error = %e, "Housekeeping failed");
				}
			}
		})
	}
}
