//! # tofu-core
//!
//! The form workflow: a registry of declared forms, the per-browser
//! submission state machine (input, confirm, result) and the endpoint that
//! routes posted forms to it.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tofu_conf::TofuSettings;
//! use tofu_core::{FormAction, FormEndpoint, FormRegistry, FormServices};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = FormRegistry::from_toml_str(r#"
//! [[forms]]
//! key = "contact"
//! name = "Contact"
//!
//! [forms.templates]
//! input = "/contact/"
//! result = "/contact/thanks/"
//!
//! [forms.mail]
//! from_email = "noreply@example.com"
//!
//! [[forms.mail.recipients]]
//! to = "office@example.com"
//! subject = "New contact from {name}"
//! body = "{message}"
//!
//! [forms.validation.rules]
//! name = "required"
//! "#)?;
//!
//! let settings = TofuSettings::default();
//! let services = Arc::new(FormServices::from_settings(&settings).await?);
//! let endpoint = FormEndpoint::new(Arc::new(registry), services);
//!
//! let (session, identity) = endpoint.open("contact", None).await?;
//! let form_url = session.action_url("/tofu", FormAction::Input);
//! let (nonce_field, nonce) = session.anti_forgery_field(FormAction::Input);
//! # let _ = (form_url, nonce_field, nonce, identity);
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod housekeeping;
pub mod records;
pub mod registry;
pub mod services;
pub mod session;
pub mod state;

pub use action::{ActionToken, FormAction, QUERY_KEY, action_url};
pub use config::{FormConfig, TemplateConfig};
pub use endpoint::{FormEndpoint, FormRequest};
pub use error::{ErrorKind, TofuError, TofuResult};
pub use housekeeping::{Housekeeper, HousekeepingReport};
#[cfg(feature = "database")]
pub use records::DatabaseRecordSink;
pub use records::{InMemoryRecordSink, SubmissionRecord, SubmissionRecorder};
pub use registry::{FormRegistry, RegisteredForm};
pub use services::{FormServices, FormServicesBuilder};
pub use session::{ActionOutcome, CAPTCHA_FIELD, ConfirmMode, FormSession, FormSubmission};
pub use state::{FlushMarker, SessionPayload, SessionState};
