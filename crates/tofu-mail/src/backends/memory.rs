use super::MailTransport;
use crate::message::EmailMessage;
use crate::{EmailError, EmailResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// Keeps sent messages in memory
///
/// Clones share the same outbox. A failure can be armed to exercise error
/// paths; it stays armed until [`MemoryTransport::succeed`] is called.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
	outbox: Arc<Mutex<Vec<EmailMessage>>>,
	failure: Arc<Mutex<Option<String>>>,
}

impl MemoryTransport {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn sent(&self) -> Vec<EmailMessage> {
		self.outbox.lock().clone()
	}

	pub fn len(&self) -> usize {
		self.outbox.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.outbox.lock().is_empty()
	}

	pub fn clear(&self) {
		self.outbox.lock().clear();
	}

	pub fn fail_with(&self, reason: impl Into<String>) {
		*self.failure.lock() = Some(reason.into());
	}

	pub fn succeed(&self) {
		*self.failure.lock() = None;
	}
}

#[async_trait]
impl MailTransport for MemoryTransport {
	async fn send(&self, message: &EmailMessage) -> EmailResult<()> {
		if let Some(reason) = self.failure.lock().clone() {
			return Err(EmailError::TransportError(reason));
		}
		tracing::debug!(
			subject = %message.subject(),
			recipients = message.recipients().count(),
			"Stored message in memory outbox"
		);
		self.outbox.lock().push(message.clone());
		Ok(())
	}
}
