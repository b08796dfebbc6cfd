//! Per-form mail configuration
//!
//! ```toml
//! [mail]
//! from_email = "noreply@example.com"
//! from_name = "Example Site"
//!
//! [[mail.recipients]]
//! to = "{email}"
//! subject = "Thanks for contacting us, {name}"
//! body_path = "mail/contact_user.txt"
//! attach_files = false
//!
//! [[mail.recipients]]
//! to = "office@example.com"
//! reply_to = "{email}"
//! subject_path = "mail/contact_admin_subject.txt"
//! body_path = "mail/contact_admin.txt"
//! ```

use crate::address::{AddressList, MailAddress};
use crate::templates::TemplateSource;
use crate::{EmailError, EmailResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MailConfig {
	pub from_email: String,
	#[serde(default)]
	pub from_name: Option<String>,
	#[serde(default)]
	pub recipients: Vec<MailRecipientConfig>,
}

impl MailConfig {
	pub fn new(from_email: impl Into<String>) -> Self {
		Self {
			from_email: from_email.into(),
			..Default::default()
		}
	}

	pub fn from_name(mut self, name: impl Into<String>) -> Self {
		self.from_name = Some(name.into());
		self
	}

	pub fn recipient(mut self, recipient: MailRecipientConfig) -> Self {
		self.recipients.push(recipient);
		self
	}

	pub fn sender(&self) -> EmailResult<MailAddress> {
		let mut sender = MailAddress::new(self.from_email.trim());
		if let Some(name) = &self.from_name {
			sender = sender.with_name(name.as_str());
		}
		sender.validate()?;
		Ok(sender)
	}

	/// Check the static parts of the configuration
	pub fn validate(&self) -> EmailResult<()> {
		self.sender()
			.map_err(|e| EmailError::Configuration(format!("from_email: {}", e)))?;
		for (index, recipient) in self.recipients.iter().enumerate() {
			recipient
				.validate()
				.map_err(|e| EmailError::Configuration(format!("recipients[{}]: {}", index, e)))?;
		}
		Ok(())
	}
}

fn default_attach_files() -> bool {
	true
}

/// One message sent per submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MailRecipientConfig {
	#[serde(default)]
	pub to: AddressList,
	#[serde(default)]
	pub cc: AddressList,
	#[serde(default)]
	pub bcc: AddressList,
	#[serde(default)]
	pub reply_to: AddressList,
	#[serde(default)]
	pub subject: Option<String>,
	#[serde(default)]
	pub subject_path: Option<PathBuf>,
	#[serde(default)]
	pub body: Option<String>,
	#[serde(default)]
	pub body_path: Option<PathBuf>,
	/// Attach uploaded files to this message
	#[serde(default = "default_attach_files")]
	pub attach_files: bool,
}

impl Default for MailRecipientConfig {
	fn default() -> Self {
		Self {
			to: AddressList::default(),
			cc: AddressList::default(),
			bcc: AddressList::default(),
			reply_to: AddressList::default(),
			subject: None,
			subject_path: None,
			body: None,
			body_path: None,
			attach_files: default_attach_files(),
		}
	}
}

impl MailRecipientConfig {
	pub fn to(to: impl Into<AddressList>) -> Self {
		Self {
			to: to.into(),
			..Default::default()
		}
	}

	pub fn cc(mut self, cc: impl Into<AddressList>) -> Self {
		self.cc = cc.into();
		self
	}

	pub fn bcc(mut self, bcc: impl Into<AddressList>) -> Self {
		self.bcc = bcc.into();
		self
	}

	pub fn reply_to(mut self, reply_to: impl Into<AddressList>) -> Self {
		self.reply_to = reply_to.into();
		self
	}

	pub fn subject(mut self, subject: impl Into<String>) -> Self {
		self.subject = Some(subject.into());
		self
	}

	pub fn subject_path(mut self, path: impl Into<PathBuf>) -> Self {
		self.subject_path = Some(path.into());
		self
	}

	pub fn body(mut self, body: impl Into<String>) -> Self {
		self.body = Some(body.into());
		self
	}

	pub fn body_path(mut self, path: impl Into<PathBuf>) -> Self {
		self.body_path = Some(path.into());
		self
	}

	pub fn attach_files(mut self, attach: bool) -> Self {
		self.attach_files = attach;
		self
	}

	pub fn subject_source(&self) -> EmailResult<TemplateSource<'_>> {
		pick_source("subject", self.subject.as_deref(), self.subject_path.as_deref())
	}

	pub fn body_source(&self) -> EmailResult<TemplateSource<'_>> {
		pick_source("body", self.body.as_deref(), self.body_path.as_deref())
	}

	pub fn validate(&self) -> EmailResult<()> {
		if self.to.is_empty() && self.cc.is_empty() && self.bcc.is_empty() {
			return Err(EmailError::MissingField("to".to_string()));
		}
		self.subject_source()?;
		self.body_source()?;
		Ok(())
	}
}

fn pick_source<'a>(
	name: &str,
	literal: Option<&'a str>,
	path: Option<&'a std::path::Path>,
) -> EmailResult<TemplateSource<'a>> {
	let literal = literal.filter(|text| !text.trim().is_empty());
	match (literal, path) {
		(Some(text), None) => Ok(TemplateSource::Literal(text)),
		(None, Some(path)) => Ok(TemplateSource::File(path)),
		(Some(_), Some(_)) => Err(EmailError::Configuration(format!(
			"only one of {name} and {name}_path may be set"
		))),
		(None, None) => Err(EmailError::MissingField(name.to_string())),
	}
}
