//! Sends the configured notifications for one submission

use crate::backends::MailTransport;
use crate::config::{MailConfig, MailRecipientConfig};
use crate::message::{Attachment, EmailMessage};
use crate::templates::{TemplateContext, TemplateLoader, render_placeholders};
use crate::{EmailError, EmailResult};
use std::path::PathBuf;
use std::sync::Arc;

/// An uploaded file to attach under its original name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationAttachment {
	pub path: PathBuf,
	pub filename: String,
	pub mime_type: String,
}

pub struct Notifier {
	transport: Arc<dyn MailTransport>,
	templates: TemplateLoader,
}

impl std::fmt::Debug for Notifier {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Notifier")
			.field("templates", &self.templates)
			.finish_non_exhaustive()
	}
}

impl Notifier {
	/// Template paths in recipient configs are resolved against `template_root`
	pub fn new(transport: Arc<dyn MailTransport>, template_root: impl Into<PathBuf>) -> Self {
		Self {
			transport,
			templates: TemplateLoader::new(template_root),
		}
	}

	pub fn transport(&self) -> &Arc<dyn MailTransport> {
		&self.transport
	}

	/// Send one message per recipient config and return how many were sent.
	///
	/// The first failure aborts the run; messages already handed to the
	/// transport stay sent.
	pub async fn notify(
		&self,
		mail: &MailConfig,
		context: &TemplateContext,
		attachments: &[NotificationAttachment],
	) -> EmailResult<usize> {
		let sender = mail.sender()?;
		let needs_files = mail.recipients.iter().any(|r| r.attach_files);
		let loaded = if needs_files {
			load_attachments(attachments).await?
		} else {
			Vec::new()
		};

		let mut sent = 0;
		for recipient in &mail.recipients {
			let message = self
				.build_message(&sender, recipient, context, &loaded)
				.await?;
			self.transport.send(&message).await?;
			sent += 1;
		}
		tracing::info!(
			messages = sent,
			attachments = loaded.len(),
			"Sent submission notifications"
		);
		Ok(sent)
	}

	async fn build_message(
		&self,
		sender: &crate::MailAddress,
		recipient: &MailRecipientConfig,
		context: &TemplateContext,
		attachments: &[Attachment],
	) -> EmailResult<EmailMessage> {
		let subject_template = self.templates.load(recipient.subject_source()?).await?;
		let body_template = self.templates.load(recipient.body_source()?).await?;

		// A subject may come from a template file or user input; keep it on one line.
		let subject = render_placeholders(subject_template.trim(), context)
			.split(['\r', '\n'])
			.map(str::trim)
			.filter(|line| !line.is_empty())
			.collect::<Vec<_>>()
			.join(" ");
		let body = render_placeholders(&body_template, context);

		let mut builder = EmailMessage::builder()
			.from(sender.clone())
			.to(recipient.to.resolve(context)?)
			.cc(recipient.cc.resolve(context)?)
			.bcc(recipient.bcc.resolve(context)?)
			.reply_to(recipient.reply_to.resolve(context)?)
			.subject(subject)
			.body(body);
		if recipient.attach_files {
			builder = builder.attachments(attachments.iter().cloned());
		}
		builder.build()
	}
}

async fn load_attachments(files: &[NotificationAttachment]) -> EmailResult<Vec<Attachment>> {
	let mut loaded = Vec::with_capacity(files.len());
	for file in files {
		if file.filename.trim().is_empty() {
			return Err(EmailError::AttachmentError(format!(
				"missing file name for {}",
				file.path.display()
			)));
		}
		let attachment = Attachment::from_path(&file.path, file.filename.as_str())
			.await?
			.with_mime_type(file.mime_type.as_str());
		loaded.push(attachment);
	}
	Ok(loaded)
}
