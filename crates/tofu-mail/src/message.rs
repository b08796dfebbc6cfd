use crate::address::MailAddress;
use crate::validation::{check_header_injection, validate_header_name};
use crate::{EmailError, EmailResult};
use std::path::Path;

/// File attached to a notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
	filename: String,
	content: Vec<u8>,
	mime_type: String,
}

impl Attachment {
	/// MIME type defaults to one guessed from the file name
	///
	/// # Examples
	///
	/// ```
	/// use tofu_mail::Attachment;
	///
	/// let attachment = Attachment::new("report.pdf", b"%PDF-1.4".to_vec());
	/// assert_eq!(attachment.mime_type(), "application/pdf");
	/// ```
	pub fn new(filename: impl Into<String>, content: Vec<u8>) -> Self {
		let filename = filename.into();
		let mime_type = detect_mime_type(&filename);
		Self {
			filename,
			content,
			mime_type,
		}
	}

	pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
		self.mime_type = mime_type.into();
		self
	}

	/// Read a file from disk and attach it under `filename`
	pub async fn from_path(path: impl AsRef<Path>, filename: impl Into<String>) -> EmailResult<Self> {
		let path = path.as_ref();
		let content = tokio::fs::read(path).await.map_err(|e| {
			EmailError::AttachmentError(format!("Failed to read {}: {}", path.display(), e))
		})?;
		Ok(Self::new(filename, content))
	}

	pub fn filename(&self) -> &str {
		&self.filename
	}

	pub fn content(&self) -> &[u8] {
		&self.content
	}

	pub fn mime_type(&self) -> &str {
		&self.mime_type
	}
}

fn detect_mime_type(filename: &str) -> String {
	mime_guess::from_path(filename)
		.first_or_octet_stream()
		.essence_str()
		.to_string()
}

/// A plain text message ready for a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
	from: MailAddress,
	to: Vec<MailAddress>,
	cc: Vec<MailAddress>,
	bcc: Vec<MailAddress>,
	reply_to: Vec<MailAddress>,
	subject: String,
	body: String,
	attachments: Vec<Attachment>,
	headers: Vec<(String, String)>,
}

impl EmailMessage {
	pub fn builder() -> EmailMessageBuilder {
		EmailMessageBuilder::default()
	}

	pub fn from(&self) -> &MailAddress {
		&self.from
	}

	pub fn to(&self) -> &[MailAddress] {
		&self.to
	}

	pub fn cc(&self) -> &[MailAddress] {
		&self.cc
	}

	pub fn bcc(&self) -> &[MailAddress] {
		&self.bcc
	}

	pub fn reply_to(&self) -> &[MailAddress] {
		&self.reply_to
	}

	pub fn subject(&self) -> &str {
		&self.subject
	}

	pub fn body(&self) -> &str {
		&self.body
	}

	pub fn attachments(&self) -> &[Attachment] {
		&self.attachments
	}

	pub fn headers(&self) -> &[(String, String)] {
		&self.headers
	}

	/// Every envelope recipient: To, CC and BCC
	pub fn recipients(&self) -> impl Iterator<Item = &MailAddress> {
		self.to.iter().chain(&self.cc).chain(&self.bcc)
	}
}

#[derive(Debug, Default)]
pub struct EmailMessageBuilder {
	from: Option<MailAddress>,
	to: Vec<MailAddress>,
	cc: Vec<MailAddress>,
	bcc: Vec<MailAddress>,
	reply_to: Vec<MailAddress>,
	subject: String,
	body: String,
	attachments: Vec<Attachment>,
	headers: Vec<(String, String)>,
}

impl EmailMessageBuilder {
	pub fn from(mut self, from: MailAddress) -> Self {
		self.from = Some(from);
		self
	}

	pub fn to(mut self, to: impl IntoIterator<Item = MailAddress>) -> Self {
		self.to.extend(to);
		self
	}

	pub fn cc(mut self, cc: impl IntoIterator<Item = MailAddress>) -> Self {
		self.cc.extend(cc);
		self
	}

	pub fn bcc(mut self, bcc: impl IntoIterator<Item = MailAddress>) -> Self {
		self.bcc.extend(bcc);
		self
	}

	pub fn reply_to(mut self, reply_to: impl IntoIterator<Item = MailAddress>) -> Self {
		self.reply_to.extend(reply_to);
		self
	}

	pub fn subject(mut self, subject: impl Into<String>) -> Self {
		self.subject = subject.into();
		self
	}

	pub fn body(mut self, body: impl Into<String>) -> Self {
		self.body = body.into();
		self
	}

	pub fn attachment(mut self, attachment: Attachment) -> Self {
		self.attachments.push(attachment);
		self
	}

	pub fn attachments(mut self, attachments: impl IntoIterator<Item = Attachment>) -> Self {
		self.attachments.extend(attachments);
		self
	}

	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));
		self
	}

	/// Validate addresses and headers, then build the message
	///
	/// # Examples
	///
	/// ```
	/// use tofu_mail::{EmailMessage, MailAddress};
	///
	/// let message = EmailMessage::builder()
	///     .from(MailAddress::new("noreply@example.com"))
	///     .to([MailAddress::new("user@example.com")])
	///     .subject("Hello")
	///     .body("Body")
	///     .build()
	///     .unwrap();
	/// assert_eq!(message.recipients().count(), 1);
	///
	/// let missing = EmailMessage::builder()
	///     .from(MailAddress::new("noreply@example.com"))
	///     .subject("Hello")
	///     .build();
	/// assert!(missing.is_err());
	/// ```
	pub fn build(self) -> EmailResult<EmailMessage> {
		let from = self
			.from
			.ok_or_else(|| EmailError::MissingField("from".to_string()))?;
		from.validate()?;

		if self.to.is_empty() && self.cc.is_empty() && self.bcc.is_empty() {
			return Err(EmailError::MissingField("to".to_string()));
		}
		for address in self
			.to
			.iter()
			.chain(&self.cc)
			.chain(&self.bcc)
			.chain(&self.reply_to)
		{
			address.validate()?;
		}

		check_header_injection(&self.subject)?;
		for (name, value) in &self.headers {
			validate_header_name(name)?;
			check_header_injection(value)?;
		}
		for attachment in &self.attachments {
			check_header_injection(&attachment.filename)?;
		}

		Ok(EmailMessage {
			from,
			to: self.to,
			cc: self.cc,
			bcc: self.bcc,
			reply_to: self.reply_to,
			subject: self.subject,
			body: self.body,
			attachments: self.attachments,
			headers: self.headers,
		})
	}
}
