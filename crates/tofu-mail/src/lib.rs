//! # tofu-mail
//!
//! Notification mail sent when a form submission completes.
//!
//! ## Features
//!
//! - **Recipient configs**: one message per configured recipient, with To/CC/BCC
//!   lists that may reference submitted fields (`to = "{email}"`)
//! - **Templates**: subject and body given inline or as template files, with
//!   `{field}` placeholders filled from the submitted values
//! - **Attachments**: uploaded files attached under their original names
//! - **Transports**: SMTP through lettre, and an in-memory transport for tests
//!
//! ## Example
//!
//! ```rust
//! use indexmap::IndexMap;
//! use std::sync::Arc;
//! use tofu_mail::{MailConfig, MailRecipientConfig, MemoryTransport, Notifier};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = MemoryTransport::new();
//! let notifier = Notifier::new(Arc::new(transport.clone()), ".");
//!
//! let mail = MailConfig::new("noreply@example.com")
//!     .from_name("Example Site")
//!     .recipient(
//!         MailRecipientConfig::to("{email}")
//!             .subject("Thanks, {name}")
//!             .body("We received your message:\n{message}"),
//!     );
//!
//! let mut context = IndexMap::new();
//! context.insert("name".to_string(), "Alice".into());
//! context.insert("email".to_string(), "alice@example.com".into());
//! context.insert("message".to_string(), "Hello!".into());
//!
//! notifier.notify(&mail, &context, &[]).await?;
//!
//! let sent = transport.sent();
//! assert_eq!(sent[0].subject(), "Thanks, Alice");
//! assert_eq!(sent[0].to()[0].email(), "alice@example.com");
//! # Ok(())
//! # }
//! # tokio::runtime::Runtime::new().unwrap().block_on(example()).unwrap();
//! ```

pub mod address;
pub mod backends;
pub mod config;
pub mod message;
pub mod notifier;
pub mod templates;
pub mod validation;

use thiserror::Error;

pub use address::{AddressList, AddressSpec, MailAddress};
pub use backends::{MailTransport, MemoryTransport, transport_from_settings};
#[cfg(feature = "smtp")]
pub use backends::{SmtpConfig, SmtpTransport};
pub use config::{MailConfig, MailRecipientConfig};
pub use message::{Attachment, EmailMessage, EmailMessageBuilder};
pub use notifier::{NotificationAttachment, Notifier};
pub use templates::{TemplateContext, TemplateLoader, TemplateSource, render_placeholders};
pub use validation::MAX_EMAIL_LENGTH;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EmailError {
	#[error("Invalid email address: {0}")]
	InvalidAddress(String),

	#[error("Missing required field: {0}")]
	MissingField(String),

	#[error("Invalid mail configuration: {0}")]
	Configuration(String),

	#[error("Template error: {0}")]
	TemplateError(String),

	#[error("Attachment error: {0}")]
	AttachmentError(String),

	#[error("Invalid header: {0}")]
	InvalidHeader(String),

	#[error("Header injection attempt detected: {0}")]
	HeaderInjection(String),

	#[error("Transport error: {0}")]
	TransportError(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}

pub type EmailResult<T> = std::result::Result<T, EmailError>;
