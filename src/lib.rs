//! # tofu
//!
//! Template-oriented multi-step forms for server-rendered sites.
//!
//! A site declares its forms once (templates, notification mail, validation
//! rules, optional reCAPTCHA). Each browser's in-progress submission is kept
//! in an encrypted session row between the input, confirm and result pages.
//! On confirmation the notification mail is sent with any uploaded files
//! attached, and the result page can check that the submission really
//! happened.
//!
//! ## Feature Flags
//!
//! - `full` (default) - Everything below
//! - `database` - SQLite session store and submission records (via `sqlx`)
//! - `smtp` - SMTP mail transport (via `lettre`)
//! - `recaptcha` - reCAPTCHA `siteverify` client (via `reqwest`)
//!
//! Without `database` sessions live in memory; without `smtp` only the
//! in-memory mail transport is available.
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tofu::prelude::*;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! tofu::logging::init("info,tofu=debug");
//!
//! let settings = TofuSettings::load("tofu.toml")?;
//! let registry = FormRegistry::from_toml_str(&std::fs::read_to_string("forms.toml")?)?;
//! let services = Arc::new(FormServices::from_settings(&settings).await?);
//! let endpoint = FormEndpoint::new(Arc::new(registry), services);
//!
//! // In the host's POST handler:
//! let request = FormRequest::new("eyJrZXkiOiJjb250YWN0IiwiYWN0aW9uIjoiaW5wdXQifQ")
//!     .with_cookie_header("_tofu_session_key=...")
//!     .with_submission(FormSubmission::new().field("name", "Alice"));
//! let response = endpoint.handle(&request).await;
//! # let _ = response;
//! # Ok(())
//! # }
//! ```

pub mod captcha;
pub mod conf;
pub mod core;
pub mod forms;
pub mod logging;
pub mod mail;
pub mod sessions;

// Re-export settings
pub use tofu_conf::{SettingsError, TofuSettings};

// Re-export the workflow
pub use tofu_core::{
	ActionOutcome, ConfirmMode, ErrorKind, FormAction, FormConfig, FormEndpoint, FormRegistry,
	FormRequest, FormServices, FormSession, FormSubmission, Housekeeper, SessionState,
	TemplateConfig, TofuError, TofuResult,
};

// Re-export form data types
pub use tofu_forms::{ErrorSet, FieldValueSet, FileSet, IncomingFile, UploadedFile, ValidationConfig};

// Re-export mail configuration
pub use tofu_mail::{MailConfig, MailRecipientConfig};

// Re-export captcha configuration
pub use tofu_captcha::CaptchaConfig;

pub mod prelude {
	pub use crate::{
		ActionOutcome, CaptchaConfig, FieldValueSet, FormAction, FormConfig, FormEndpoint,
		FormRegistry, FormRequest, FormServices, FormSession, FormSubmission, IncomingFile,
		MailConfig, MailRecipientConfig, TemplateConfig, TofuError, TofuResult, TofuSettings,
		ValidationConfig,
	};
}
