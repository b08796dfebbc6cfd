//! Placeholder substitution and template loading
//!
//! Templates use `{key}` placeholders, optionally padded with spaces
//! (`{ key }`). Keys without a value in the context are left untouched.

use crate::{EmailError, EmailResult};
use indexmap::IndexMap;
use regex::{Captures, Regex};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tofu_forms::values::value_to_text;

/// Values available to placeholders, usually the sanitized form values
pub type TemplateContext = IndexMap<String, Value>;

static PLACEHOLDER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"\{\s*([A-Za-z0-9_\-.\[\]]+)\s*\}").expect("PLACEHOLDER_REGEX: invalid regex pattern")
});

/// Replace `{key}` placeholders with context values
///
/// # Examples
///
/// ```
/// use tofu_mail::templates::{TemplateContext, render_placeholders};
///
/// let mut context = TemplateContext::new();
/// context.insert("name".to_string(), "Alice".into());
/// context.insert("topics".to_string(), serde_json::json!(["billing", "support"]));
///
/// let result = render_placeholders("Hi { name }, re: {topics}. {unknown}", &context);
/// assert_eq!(result, "Hi Alice, re: billing, support. {unknown}");
/// ```
pub fn render_placeholders(template: &str, context: &TemplateContext) -> String {
	PLACEHOLDER_REGEX
		.replace_all(template, |caps: &Captures<'_>| match context.get(&caps[1]) {
			Some(value) => value_to_text(value),
			None => caps[0].to_string(),
		})
		.into_owned()
}

/// Where a subject or body comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateSource<'a> {
	Literal(&'a str),
	File(&'a Path),
}

/// Reads template files relative to a root directory
#[derive(Debug, Clone)]
pub struct TemplateLoader {
	root: PathBuf,
}

impl TemplateLoader {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Template text for a source. A template file that is empty is an error.
	pub async fn load(&self, source: TemplateSource<'_>) -> EmailResult<String> {
		match source {
			TemplateSource::Literal(text) => Ok(text.to_string()),
			TemplateSource::File(path) => {
				let path = if path.is_absolute() {
					path.to_path_buf()
				} else {
					self.root.join(path)
				};
				let text = tokio::fs::read_to_string(&path).await.map_err(|e| {
					EmailError::TemplateError(format!(
						"Failed to read template {}: {}",
						path.display(),
						e
					))
				})?;
				if text.trim().is_empty() {
					return Err(EmailError::TemplateError(format!(
						"Template file is empty: {}",
						path.display()
					)));
				}
				Ok(text)
			}
		}
	}
}
