//! # tofu-forms
//!
//! Request-scoped building blocks of a form submission:
//!
//! - [`FieldValueSet`]: sanitized field values, one per field
//! - [`ErrorSet`]: ordered validation errors; any entry blocks progression
//! - [`FileSet`] / [`UploadedFile`]: uploads held in the managed temp directory
//! - [`Uploader`]: moves incoming files into temp storage and sweeps stale ones
//! - [`Validator`]: filters, rules, messages, custom rules and the after-hook
//! - [`AntiForgery`]: per-form, per-action request tokens
//!
//! ## Example
//!
//! ```
//! use tofu_forms::{FieldValueSet, FileSet, ValidationConfig};
//!
//! let validator = ValidationConfig::new()
//!     .rule("email", "required|valid_email")
//!     .filter("email", "trim|lower_case")
//!     .compile()
//!     .unwrap();
//!
//! let mut input = FieldValueSet::new();
//! input.add("email", " Alice@Example.COM ");
//!
//! let outcome = validator.validate(&input, &FileSet::new());
//! assert!(!outcome.errors.has_errors());
//! assert_eq!(outcome.values.get_str("email"), Some("alice@example.com"));
//! ```

pub mod csrf;
pub mod display;
pub mod error;
pub mod errors;
pub mod files;
pub mod uploader;
pub mod validation;
pub mod values;

pub use csrf::AntiForgery;
pub use display::escape_html;
pub use error::{FormsError, FormsResult, UploadError};
pub use errors::{ErrorSet, ValidationError};
pub use files::{FileSet, UploadedFile, UploadedFileRecord};
pub use uploader::{FilePayload, IncomingFile, Uploader};
pub use validation::{
	AfterHook, CustomRule, ValidationConfig, ValidationOutcome, Validator, checks,
};
pub use values::FieldValueSet;
