use super::MailTransport;
use crate::address::MailAddress;
use crate::message::EmailMessage;
use crate::{EmailError, EmailResult};
use async_trait::async_trait;
use lettre::message::header::{ContentType, HeaderName, HeaderValue};
use lettre::message::{Attachment as LettreAttachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tofu_conf::{EmailSettings, SmtpSecurity};

#[derive(Debug, Clone)]
pub struct SmtpConfig {
	pub host: String,
	pub port: u16,
	pub username: Option<String>,
	pub password: Option<SecretString>,
	pub security: SmtpSecurity,
	pub timeout: Duration,
}

impl SmtpConfig {
	pub fn new(host: impl Into<String>, port: u16) -> Self {
		Self {
			host: host.into(),
			port,
			username: None,
			password: None,
			security: SmtpSecurity::default(),
			timeout: Duration::from_secs(30),
		}
	}

	pub fn from_settings(settings: &EmailSettings) -> Self {
		Self {
			host: settings.host.clone(),
			port: settings.port,
			username: settings.username.clone(),
			password: settings
				.password
				.as_ref()
				.map(|p| SecretString::from(p.expose_secret().to_string())),
			security: settings.security,
			timeout: Duration::from_secs(settings.timeout_secs),
		}
	}

	pub fn with_credentials(mut self, username: impl Into<String>, password: SecretString) -> Self {
		self.username = Some(username.into());
		self.password = Some(password);
		self
	}

	pub fn with_security(mut self, security: SmtpSecurity) -> Self {
		self.security = security;
		self
	}
}

/// Sends messages through an SMTP relay
pub struct SmtpTransport {
	inner: AsyncSmtpTransport<Tokio1Executor>,
	host: String,
}

impl std::fmt::Debug for SmtpTransport {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SmtpTransport")
			.field("host", &self.host)
			.finish_non_exhaustive()
	}
}

impl SmtpTransport {
	pub fn new(config: SmtpConfig) -> EmailResult<Self> {
		let mut builder = match config.security {
			SmtpSecurity::None => {
				AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(config.host.as_str())
			}
			SmtpSecurity::StartTls => {
				AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
					.map_err(|e| EmailError::TransportError(format!("Invalid SMTP relay: {}", e)))?
			}
			SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
				.map_err(|e| EmailError::TransportError(format!("Invalid SMTP relay: {}", e)))?,
		};
		builder = builder.port(config.port).timeout(Some(config.timeout));
		if let (Some(username), Some(password)) = (config.username, config.password) {
			builder = builder.credentials(Credentials::new(
				username,
				password.expose_secret().to_string(),
			));
		}

		tracing::info!(
			host = %config.host,
			port = config.port,
			security = ?config.security,
			"Configured SMTP transport"
		);
		Ok(Self {
			inner: builder.build(),
			host: config.host,
		})
	}
}

fn mailbox(address: &MailAddress) -> EmailResult<Mailbox> {
	let email = address
		.email()
		.parse::<Address>()
		.map_err(|e| EmailError::InvalidAddress(format!("{}: {}", address.email(), e)))?;
	Ok(Mailbox::new(address.name().map(str::to_string), email))
}

fn to_lettre(message: &EmailMessage) -> EmailResult<Message> {
	let mut builder = Message::builder()
		.from(mailbox(message.from())?)
		.subject(message.subject());
	for address in message.to() {
		builder = builder.to(mailbox(address)?);
	}
	for address in message.cc() {
		builder = builder.cc(mailbox(address)?);
	}
	for address in message.bcc() {
		builder = builder.bcc(mailbox(address)?);
	}
	for address in message.reply_to() {
		builder = builder.reply_to(mailbox(address)?);
	}
	for (name, value) in message.headers() {
		let name = HeaderName::new_from_ascii(name.clone())
			.map_err(|_| EmailError::InvalidHeader(name.clone()))?;
		builder = builder.raw_header(HeaderValue::new(name, value.clone()));
	}

	let built = if message.attachments().is_empty() {
		builder
			.header(ContentType::TEXT_PLAIN)
			.body(message.body().to_string())
	} else {
		let mut parts = MultiPart::mixed().singlepart(SinglePart::plain(message.body().to_string()));
		for attachment in message.attachments() {
			let content_type = ContentType::parse(attachment.mime_type()).map_err(|e| {
				EmailError::AttachmentError(format!("{}: {}", attachment.filename(), e))
			})?;
			parts = parts.singlepart(
				LettreAttachment::new(attachment.filename().to_string())
					.body(attachment.content().to_vec(), content_type),
			);
		}
		builder.multipart(parts)
	};
	built.map_err(|e| EmailError::TransportError(format!("Failed to build message: {}", e)))
}

#[async_trait]
impl MailTransport for SmtpTransport {
	async fn send(&self, message: &EmailMessage) -> EmailResult<()> {
		let email = to_lettre(message)?;
		self.inner.send(email).await.map_err(|e| {
			tracing::error!(host = %self.host, error = %e, "SMTP delivery failed");
			EmailError::TransportError(format!("SMTP delivery failed: {}", e))
		})?;
		tracing::debug!(
			host = %self.host,
			recipients = message.recipients().count(),
			"Delivered message over SMTP"
		);
		Ok(())
	}
}
