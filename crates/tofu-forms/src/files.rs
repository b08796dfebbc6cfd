//! Uploaded files held between form steps
//!
//! An [`UploadedFile`] always points at an existing file inside the managed
//! temp directory. Construction fails otherwise, so a descriptor restored
//! from an old session whose temp file was swept is rejected up front.

use crate::error::UploadError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Descriptor of a file moved into the temp directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
	field: String,
	original_name: String,
	mime_type: String,
	path: PathBuf,
	size: u64,
}

impl UploadedFile {
	/// Build a descriptor for an existing temp file
	pub fn new(
		field: impl Into<String>,
		original_name: impl Into<String>,
		mime_type: impl Into<String>,
		path: impl Into<PathBuf>,
		size: u64,
	) -> Result<Self, UploadError> {
		let path = path.into();
		if !path.is_file() {
			return Err(UploadError::MissingTempFile(path));
		}
		Ok(Self {
			field: field.into(),
			original_name: original_name.into(),
			mime_type: mime_type.into(),
			path,
			size,
		})
	}

	/// Rebuild a descriptor from its session record
	///
	/// The record only carries a bare file name, resolved against `temp_dir`.
	pub fn from_record(record: &UploadedFileRecord, temp_dir: &Path) -> Result<Self, UploadError> {
		let name = record.temp_name.as_str();
		let is_bare_name = !name.is_empty()
			&& !name.starts_with('.')
			&& Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name);
		if !is_bare_name {
			return Err(UploadError::InvalidTempName(name.to_string()));
		}
		Self::new(
			record.field.clone(),
			record.name.clone(),
			record.mime_type.clone(),
			temp_dir.join(name),
			record.size,
		)
	}

	pub fn to_record(&self) -> UploadedFileRecord {
		UploadedFileRecord {
			field: self.field.clone(),
			name: self.original_name.clone(),
			mime_type: self.mime_type.clone(),
			temp_name: self
				.path
				.file_name()
				.map(|n| n.to_string_lossy().into_owned())
				.unwrap_or_default(),
			size: self.size,
		}
	}

	pub fn field(&self) -> &str {
		&self.field
	}

	/// Client-supplied file name, used as the attachment name
	pub fn original_name(&self) -> &str {
		&self.original_name
	}

	/// MIME type sniffed from the content
	pub fn mime_type(&self) -> &str {
		&self.mime_type
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn size(&self) -> u64 {
		self.size
	}

	/// Delete the temp file. A file that is already gone is not an error.
	pub async fn remove(&self) -> Result<(), UploadError> {
		match tokio::fs::remove_file(&self.path).await {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(e.into()),
		}
	}

	/// Set the temp file's modification time, which the upload sweep ages from
	pub async fn touch(&self, at: SystemTime) -> Result<(), UploadError> {
		let path = self.path.clone();
		tokio::task::spawn_blocking(move || {
			std::fs::OpenOptions::new()
				.write(true)
				.open(&path)?
				.set_modified(at)
		})
		.await
		.map_err(std::io::Error::other)??;
		Ok(())
	}
}

/// Serialized form of an [`UploadedFile`] inside the session payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFileRecord {
	pub field: String,
	pub name: String,
	pub mime_type: String,
	pub temp_name: String,
	pub size: u64,
}

/// Uploaded files keyed by field; adding to a field replaces its file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
	files: IndexMap<String, UploadedFile>,
}

impl FileSet {
	pub fn new() -> Self {
		Self::default()
	}

	/// Add a file under its field and return the replaced descriptor.
	///
	/// The replaced temp file is left on disk; deleting it is the caller's call.
	pub fn add(&mut self, file: UploadedFile) -> Option<UploadedFile> {
		self.files.insert(file.field.clone(), file)
	}

	pub fn get(&self, field: &str) -> Option<&UploadedFile> {
		self.files.get(field)
	}

	pub fn contains(&self, field: &str) -> bool {
		self.files.contains_key(field)
	}

	pub fn remove(&mut self, field: &str) -> Option<UploadedFile> {
		self.files.shift_remove(field)
	}

	pub fn len(&self) -> usize {
		self.files.len()
	}

	pub fn is_empty(&self) -> bool {
		self.files.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &UploadedFile> {
		self.files.values()
	}

	pub fn clear(&mut self) {
		self.files.clear();
	}

	pub fn to_records(&self) -> Vec<UploadedFileRecord> {
		self.files.values().map(UploadedFile::to_record).collect()
	}

	/// Delete every temp file, logging failures, and empty the set
	/// Refresh every file so the sweep does not outpace the session holding it
	pub async fn touch_all(&self, at: SystemTime) {
		for file in self.files.values() {
			if let Err(e) = file.touch(at).await {
				tracing::warn!(
					path = %file.path().display(),
					error = %e,
					"failed to refresh uploaded temp file"
				);
			}
		}
	}

	pub async fn remove_all(&mut self) {
		for file in self.files.values() {
			if let Err(e) = file.remove().await {
				tracing::warn!(
					path = %file.path().display(),
					error = %e,
					"failed to delete uploaded temp file"
				);
			}
		}
		self.files.clear();
	}
}

impl IntoIterator for FileSet {
	type Item = UploadedFile;
	type IntoIter = indexmap::map::IntoValues<String, UploadedFile>;

	fn into_iter(self) -> Self::IntoIter {
		self.files.into_values()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};
	use tempfile::TempDir;

	#[fixture]
	fn temp_dir() -> TempDir {
		tempfile::tempdir().unwrap()
	}

	fn write_temp(dir: &TempDir, name: &str) -> PathBuf {
		let path = dir.path().join(name);
		std::fs::write(&path, b"data").unwrap();
		path
	}

	#[rstest]
	fn test_new_requires_existing_file(temp_dir: TempDir) {
		// Act
		let result = UploadedFile::new(
			"doc",
			"a.txt",
			"text/plain",
			temp_dir.path().join("missing"),
			4,
		);

		// Assert
		assert!(matches!(result, Err(UploadError::MissingTempFile(_))));
	}

	#[rstest]
	fn test_record_roundtrip_resolves_against_temp_dir(temp_dir: TempDir) {
		// Arrange
		let path = write_temp(&temp_dir, "abc.txt");
		let file = UploadedFile::new("doc", "report.txt", "text/plain", &path, 4).unwrap();

		// Act
		let record = file.to_record();
		let restored = UploadedFile::from_record(&record, temp_dir.path()).unwrap();

		// Assert
		assert_eq!(record.temp_name, "abc.txt");
		assert_eq!(restored, file);
	}

	#[rstest]
	#[case("../escape.txt")]
	#[case("nested/file.txt")]
	#[case(".htaccess")]
	#[case("")]
	fn test_record_with_path_components_is_rejected(temp_dir: TempDir, #[case] temp_name: &str) {
		// Arrange
		let record = UploadedFileRecord {
			field: "doc".into(),
			name: "x".into(),
			mime_type: "text/plain".into(),
			temp_name: temp_name.into(),
			size: 1,
		};

		// Act
		let result = UploadedFile::from_record(&record, temp_dir.path());

		// Assert
		assert!(matches!(result, Err(UploadError::InvalidTempName(_))));
	}

	#[rstest]
	fn test_add_replaces_without_deleting(temp_dir: TempDir) {
		// Arrange
		let first_path = write_temp(&temp_dir, "first");
		let second_path = write_temp(&temp_dir, "second");
		let mut files = FileSet::new();
		files.add(UploadedFile::new("doc", "1", "text/plain", &first_path, 4).unwrap());

		// Act
		let replaced = files.add(UploadedFile::new("doc", "2", "text/plain", &second_path, 4).unwrap());

		// Assert
		assert_eq!(files.len(), 1);
		assert_eq!(replaced.unwrap().path(), first_path.as_path());
		assert!(first_path.exists());
		assert_eq!(files.get("doc").unwrap().original_name(), "2");
	}

	#[rstest]
	#[tokio::test]
	async fn test_remove_all_deletes_temp_files(temp_dir: TempDir) {
		// Arrange
		let path = write_temp(&temp_dir, "upload");
		let mut files = FileSet::new();
		files.add(UploadedFile::new("doc", "u", "text/plain", &path, 4).unwrap());

		// Act
		files.remove_all().await;

		// Assert
		assert!(files.is_empty());
		assert!(!path.exists());
	}
}
