//! Mail transports

mod memory;
#[cfg(feature = "smtp")]
mod smtp;

pub use memory::MemoryTransport;
#[cfg(feature = "smtp")]
pub use smtp::{SmtpConfig, SmtpTransport};

use crate::message::EmailMessage;
use crate::EmailResult;
use async_trait::async_trait;
use std::sync::Arc;
use tofu_conf::{EmailBackendKind, EmailSettings};

/// Delivers a built message
#[async_trait]
pub trait MailTransport: Send + Sync {
	async fn send(&self, message: &EmailMessage) -> EmailResult<()>;
}

#[async_trait]
impl<T: MailTransport + ?Sized> MailTransport for Arc<T> {
	async fn send(&self, message: &EmailMessage) -> EmailResult<()> {
		(**self).send(message).await
	}
}

/// Build the transport selected by `[email] backend`
pub fn transport_from_settings(settings: &EmailSettings) -> EmailResult<Arc<dyn MailTransport>> {
	match settings.backend {
		EmailBackendKind::Memory => {
			tracing::debug!("Using in-memory mail transport");
			Ok(Arc::new(MemoryTransport::new()))
		}
		#[cfg(feature = "smtp")]
		EmailBackendKind::Smtp => Ok(Arc::new(SmtpTransport::new(SmtpConfig::from_settings(
			settings,
		))?)),
		#[cfg(not(feature = "smtp"))]
		EmailBackendKind::Smtp => Err(crate::EmailError::Configuration(
			"the smtp backend requires the `smtp` feature".to_string(),
		)),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_memory_backend_is_default() {
		let transport = transport_from_settings(&EmailSettings::default());
		assert!(transport.is_ok());
	}
}
