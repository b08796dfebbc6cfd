//! Temp storage for uploaded files
//!
//! Incoming files are moved into a private temp directory under random
//! names and described by an [`UploadedFile`]. The directory carries
//! deny-all sentinel files so that a misconfigured web server will not serve
//! it, and a TTL sweep removes anything left behind by abandoned sessions.

use crate::error::UploadError;
use crate::files::{UploadedFile, UploadedFileRecord};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::io::AsyncReadExt;
use uuid::Uuid;

/// Sentinel files written into the temp directory and never swept
pub const SENTINEL_FILES: [(&str, &str); 2] = [
	(".htaccess", "Require all denied\nDeny from all\n"),
	("index.html", ""),
];

const SNIFF_LEN: usize = 512;
const MAX_EXTENSION_LEN: usize = 10;

/// Where the uploaded content currently lives
#[derive(Debug, Clone)]
pub enum FilePayload {
	/// A file the host already spooled to disk; it is moved, not copied
	Path(PathBuf),
	/// The content in memory
	Bytes(Vec<u8>),
}

/// A file as received by the host for one form field
#[derive(Debug, Clone)]
pub struct IncomingFile {
	pub field: String,
	/// Client-supplied name
	pub name: String,
	pub payload: FilePayload,
	/// Transport error reported by the host, if the upload failed
	pub error: Option<String>,
}

impl IncomingFile {
	pub fn from_bytes(
		field: impl Into<String>,
		name: impl Into<String>,
		bytes: impl Into<Vec<u8>>,
	) -> Self {
		Self {
			field: field.into(),
			name: name.into(),
			payload: FilePayload::Bytes(bytes.into()),
			error: None,
		}
	}

	pub fn from_path(
		field: impl Into<String>,
		name: impl Into<String>,
		path: impl Into<PathBuf>,
	) -> Self {
		Self {
			field: field.into(),
			name: name.into(),
			payload: FilePayload::Path(path.into()),
			error: None,
		}
	}

	/// An upload the host could not receive
	pub fn failed(
		field: impl Into<String>,
		name: impl Into<String>,
		error: impl Into<String>,
	) -> Self {
		Self {
			field: field.into(),
			name: name.into(),
			payload: FilePayload::Bytes(Vec::new()),
			error: Some(error.into()),
		}
	}
}

/// Moves uploads into the temp directory and sweeps expired ones
#[derive(Debug, Clone)]
pub struct Uploader {
	temp_dir: PathBuf,
	ttl: Duration,
}

impl Uploader {
	pub fn new(temp_dir: impl Into<PathBuf>, ttl: Duration) -> Self {
		Self {
			temp_dir: temp_dir.into(),
			ttl,
		}
	}

	pub fn temp_dir(&self) -> &Path {
		&self.temp_dir
	}

	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	/// Create the temp directory and its sentinel files if missing
	pub async fn ensure_dir(&self) -> Result<(), UploadError> {
		tokio::fs::create_dir_all(&self.temp_dir).await?;
		for (name, contents) in SENTINEL_FILES {
			let path = self.temp_dir.join(name);
			if !tokio::fs::try_exists(&path).await? {
				tokio::fs::write(&path, contents).await?;
			}
		}
		Ok(())
	}

	/// Move an incoming file into temp storage.
	///
	/// Returns `Ok(None)` when the field carried no file, or when the host
	/// reported a transport error (logged).
	pub async fn upload(&self, incoming: &IncomingFile) -> Result<Option<UploadedFile>, UploadError> {
		if let Some(error) = &incoming.error {
			tracing::warn!(field = %incoming.field, error = %error, "file upload failed in transport");
			return Ok(None);
		}
		if incoming.name.trim().is_empty() {
			return Ok(None);
		}

		let head = match &incoming.payload {
			FilePayload::Bytes(bytes) => bytes[..bytes.len().min(SNIFF_LEN)].to_vec(),
			FilePayload::Path(path) => read_head(path).await?,
		};
		if head.is_empty() {
			return Ok(None);
		}

		self.ensure_dir().await?;

		let mime_type = sniff_mime(&head);
		let temp_name = match sanitize_extension(&incoming.name) {
			Some(ext) => format!("{}.{}", Uuid::new_v4().simple(), ext),
			None => Uuid::new_v4().simple().to_string(),
		};
		let destination = self.temp_dir.join(&temp_name);

		match &incoming.payload {
			FilePayload::Bytes(bytes) => tokio::fs::write(&destination, bytes).await?,
			FilePayload::Path(source) => move_file(source, &destination).await?,
		}
		let size = tokio::fs::metadata(&destination).await?.len();

		tracing::debug!(
			field = %incoming.field,
			mime_type,
			size,
			"uploaded file moved to temp storage"
		);

		UploadedFile::new(
			incoming.field.clone(),
			incoming.name.clone(),
			mime_type,
			destination,
			size,
		)
		.map(Some)
	}

	/// Rebuild a descriptor stored in a session payload
	pub fn restore(&self, record: &UploadedFileRecord) -> Result<UploadedFile, UploadError> {
		UploadedFile::from_record(record, &self.temp_dir)
	}

	/// Delete temp files older than the TTL and return how many were removed
	pub async fn clear_expired(&self) -> usize {
		self.sweep(SystemTime::now()).await
	}

	/// [`Uploader::clear_expired`] against an explicit clock.
	///
	/// Scan and delete failures are logged and skipped.
	pub async fn sweep(&self, now: SystemTime) -> usize {
		let mut entries = match tokio::fs::read_dir(&self.temp_dir).await {
			Ok(entries) => entries,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return 0,
			Err(e) => {
				tracing::warn!(dir = %self.temp_dir.display(), error = %e, "failed to scan upload directory");
				return 0;
			}
		};

		let mut removed = 0;
		loop {
			let entry = match entries.next_entry().await {
				Ok(Some(entry)) => entry,
				Ok(None) => break,
				Err(e) => {
					tracing::warn!(error = %e, "failed to read upload directory entry");
					break;
				}
			};

			let name = entry.file_name();
			if SENTINEL_FILES.iter().any(|(sentinel, _)| name == *sentinel) {
				continue;
			}

			let modified = match entry.metadata().await.and_then(|m| {
				if m.is_file() {
					m.modified().map(Some)
				} else {
					Ok(None)
				}
			}) {
				Ok(Some(modified)) => modified,
				Ok(None) => continue,
				Err(e) => {
					tracing::warn!(path = %entry.path().display(), error = %e, "failed to stat temp file");
					continue;
				}
			};

			let age = now.duration_since(modified).unwrap_or_default();
			if age <= self.ttl {
				continue;
			}
			match tokio::fs::remove_file(entry.path()).await {
				Ok(()) => removed += 1,
				Err(e) => {
					tracing::warn!(path = %entry.path().display(), error = %e, "failed to delete expired temp file");
				}
			}
		}

		if removed > 0 {
			tracing::info!(removed, "expired upload temp files removed");
		}
		removed
	}
}

async fn read_head(path: &Path) -> Result<Vec<u8>, UploadError> {
	let mut file = tokio::fs::File::open(path).await?;
	let mut head = vec![0u8; SNIFF_LEN];
	let mut filled = 0;
	while filled < SNIFF_LEN {
		let read = file.read(&mut head[filled..]).await?;
		if read == 0 {
			break;
		}
		filled += read;
	}
	head.truncate(filled);
	Ok(head)
}

async fn move_file(source: &Path, destination: &Path) -> Result<(), UploadError> {
	// rename fails across filesystems
	if tokio::fs::rename(source, destination).await.is_ok() {
		return Ok(());
	}
	tokio::fs::copy(source, destination).await?;
	if let Err(e) = tokio::fs::remove_file(source).await {
		tracing::debug!(path = %source.display(), error = %e, "could not remove upload source after copy");
	}
	Ok(())
}

/// Keep a short, lowercase, alphanumeric extension from a client file name
pub fn sanitize_extension(name: &str) -> Option<String> {
	let (stem, ext) = name.rsplit_once('.')?;
	if stem.is_empty() {
		return None;
	}
	let ext: String = ext
		.chars()
		.filter(char::is_ascii_alphanumeric)
		.map(|c| c.to_ascii_lowercase())
		.take(MAX_EXTENSION_LEN)
		.collect();
	(!ext.is_empty()).then_some(ext)
}

/// Determine a MIME type from the leading bytes of a file.
///
/// The client-declared type is never consulted.
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
	match bytes {
		[0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
		[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, ..] => "image/png",
		[0x47, 0x49, 0x46, 0x38, ..] => "image/gif",
		[0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => "image/webp",
		[0x42, 0x4D, ..] => "image/bmp",
		[0x49, 0x49, 0x2A, 0x00, ..] | [0x4D, 0x4D, 0x00, 0x2A, ..] => "image/tiff",
		[0x25, 0x50, 0x44, 0x46, 0x2D, ..] => "application/pdf",
		[0x50, 0x4B, 0x03, 0x04, ..] => "application/zip",
		[0x1F, 0x8B, ..] => "application/gzip",
		[_, _, _, _, 0x66, 0x74, 0x79, 0x70, ..] => "video/mp4",
		[0x49, 0x44, 0x33, ..] => "audio/mpeg",
		_ if looks_like_text(bytes) => "text/plain",
		_ => "application/octet-stream",
	}
}

fn looks_like_text(bytes: &[u8]) -> bool {
	if bytes.contains(&0) {
		return false;
	}
	match std::str::from_utf8(bytes) {
		Ok(_) => true,
		// The sniff window may cut a multi-byte character in half
		Err(e) => e.error_len().is_none() && e.valid_up_to() + 4 > bytes.len(),
	}
}
