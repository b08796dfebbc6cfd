//! Collaborators shared by every form session

use crate::error::TofuResult;
use crate::housekeeping::Housekeeper;
use crate::records::SubmissionRecorder;
use secrecy::ExposeSecret;
use std::sync::Arc;
use std::time::Duration;
use tofu_captcha::CaptchaVerifier;
use tofu_conf::{FlushPolicy, TofuSettings};
use tofu_forms::{AntiForgery, Uploader};
use tofu_mail::{MailTransport, MemoryTransport, Notifier};
use tofu_sessions::{InMemorySessionStore, SessionCodec, SessionCookie, SessionStore};

/// Storage, crypto, mail and captcha services used by [`crate::FormSession`]
pub struct FormServices {
	store: Arc<dyn SessionStore>,
	codec: SessionCodec,
	anti_forgery: AntiForgery,
	uploader: Uploader,
	notifier: Notifier,
	captcha: Arc<dyn CaptchaVerifier>,
	records: Option<Arc<dyn SubmissionRecorder>>,
	cookie: SessionCookie,
	session_ttl: Duration,
	flush_window: Duration,
	flush_policy: FlushPolicy,
	gc_probability: f64,
}

impl std::fmt::Debug for FormServices {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FormServices")
			.field("uploader", &self.uploader)
			.field("cookie", &self.cookie)
			.field("session_ttl", &self.session_ttl)
			.field("flush_policy", &self.flush_policy)
			.finish_non_exhaustive()
	}
}

impl FormServices {
	pub fn builder(settings: &TofuSettings) -> FormServicesBuilder {
		FormServicesBuilder::new(settings)
	}

	/// Wire every service from settings
	///
	/// With a `[database] url` (and the `database` feature) sessions and
	/// submission records live in SQLite; otherwise both are kept in memory.
	pub async fn from_settings(settings: &TofuSettings) -> TofuResult<Self> {
		let mut builder = Self::builder(settings)
			.transport(tofu_mail::transport_from_settings(&settings.email)?);

		#[cfg(feature = "database")]
		if let Some(url) = &settings.database.url {
			use crate::records::DatabaseRecordSink;
			use tofu_sessions::DatabaseSessionStore;

			let store = DatabaseSessionStore::connect(url, settings.database.max_connections).await?;
			store.create_table().await?;
			let records = DatabaseRecordSink::from_pool(store.pool().clone());
			records.create_table().await?;
			tracing::info!("Using database session store");
			builder = builder.store(Arc::new(store)).records(Arc::new(records));
		}

		#[cfg(feature = "recaptcha")]
		{
			let verifier = tofu_captcha::RecaptchaVerifier::from_settings(&settings.captcha)?;
			builder = builder.captcha(Arc::new(verifier));
		}

		let services = builder.build();
		services.uploader.ensure_dir().await?;
		Ok(services)
	}

	pub fn store(&self) -> &Arc<dyn SessionStore> {
		&self.store
	}

	pub fn codec(&self) -> &SessionCodec {
		&self.codec
	}

	pub fn anti_forgery(&self) -> &AntiForgery {
		&self.anti_forgery
	}

	pub fn uploader(&self) -> &Uploader {
		&self.uploader
	}

	pub fn notifier(&self) -> &Notifier {
		&self.notifier
	}

	pub fn captcha(&self) -> &Arc<dyn CaptchaVerifier> {
		&self.captcha
	}

	pub fn records(&self) -> Option<&Arc<dyn SubmissionRecorder>> {
		self.records.as_ref()
	}

	pub fn cookie(&self) -> &SessionCookie {
		&self.cookie
	}

	pub fn session_ttl(&self) -> Duration {
		self.session_ttl
	}

	pub fn flush_window(&self) -> Duration {
		self.flush_window
	}

	pub fn flush_policy(&self) -> FlushPolicy {
		self.flush_policy
	}

	pub fn housekeeper(&self) -> Housekeeper {
		Housekeeper::new(
			Arc::clone(&self.store),
			self.uploader.clone(),
			self.gc_probability,
		)
	}
}

/// Builder with in-memory defaults for every replaceable service
pub struct FormServicesBuilder {
	store: Arc<dyn SessionStore>,
	codec: SessionCodec,
	anti_forgery: AntiForgery,
	uploader: Uploader,
	transport: Arc<dyn MailTransport>,
	template_root: std::path::PathBuf,
	captcha: Arc<dyn CaptchaVerifier>,
	records: Option<Arc<dyn SubmissionRecorder>>,
	cookie: SessionCookie,
	session_ttl: Duration,
	flush_window: Duration,
	flush_policy: FlushPolicy,
	gc_probability: f64,
}

impl FormServicesBuilder {
	fn new(settings: &TofuSettings) -> Self {
		let secret = settings.secret_key.expose_secret().as_bytes();
		let session_ttl = settings.session_ttl();
		Self {
			store: Arc::new(InMemorySessionStore::new()),
			codec: SessionCodec::new(secret),
			anti_forgery: AntiForgery::new(secret),
			uploader: Uploader::new(settings.uploads.temp_dir.clone(), settings.upload_ttl()),
			transport: Arc::new(MemoryTransport::new()),
			template_root: settings.templates.root.clone(),
			captcha: Arc::new(tofu_captcha::FixedResponseVerifier::unavailable()),
			records: None,
			cookie: SessionCookie::new(settings.session.cookie_name.clone(), session_ttl),
			session_ttl,
			flush_window: Duration::from_secs(settings.session.flush_window_secs),
			flush_policy: settings.session.flush_policy,
			gc_probability: settings.session.gc_probability,
		}
	}

	pub fn store(mut self, store: Arc<dyn SessionStore>) -> Self {
		self.store = store;
		self
	}

	pub fn transport(mut self, transport: Arc<dyn MailTransport>) -> Self {
		self.transport = transport;
		self
	}

	pub fn captcha(mut self, captcha: Arc<dyn CaptchaVerifier>) -> Self {
		self.captcha = captcha;
		self
	}

	pub fn records(mut self, records: Arc<dyn SubmissionRecorder>) -> Self {
		self.records = Some(records);
		self
	}

	pub fn anti_forgery(mut self, anti_forgery: AntiForgery) -> Self {
		self.anti_forgery = anti_forgery;
		self
	}

	pub fn build(self) -> FormServices {
		FormServices {
			store: self.store,
			codec: self.codec,
			anti_forgery: self.anti_forgery,
			uploader: self.uploader,
			notifier: Notifier::new(self.transport, self.template_root),
			captcha: self.captcha,
			records: self.records,
			cookie: self.cookie,
			session_ttl: self.session_ttl,
			flush_window: self.flush_window,
			flush_policy: self.flush_policy,
			gc_probability: self.gc_probability,
		}
	}
}
