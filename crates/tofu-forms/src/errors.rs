//! Validation errors collected during a request

use serde::{Deserialize, Serialize};

/// A single field error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
	pub field: String,
	pub message: String,
}

/// Ordered, append-only collection of field errors
///
/// A field may carry several errors. Any entry puts the submission in error
/// state.
///
/// # Examples
///
/// ```
/// use tofu_forms::ErrorSet;
///
/// let mut errors = ErrorSet::new();
/// assert!(!errors.has_errors());
///
/// errors.add("email", "The Email field is required");
/// errors.add("email", "The Email field must be a valid email address");
///
/// assert!(errors.has_errors());
/// assert_eq!(errors.for_field("email").count(), 2);
/// assert_eq!(errors.first("email"), Some("The Email field is required"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorSet {
	errors: Vec<ValidationError>,
}

impl ErrorSet {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
		self.errors.push(ValidationError {
			field: field.into(),
			message: message.into(),
		});
	}

	pub fn has_errors(&self) -> bool {
		!self.errors.is_empty()
	}

	pub fn has_error(&self, field: &str) -> bool {
		self.errors.iter().any(|e| e.field == field)
	}

	pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a str> + 'a {
		self.errors
			.iter()
			.filter(move |e| e.field == field)
			.map(|e| e.message.as_str())
	}

	pub fn first(&self, field: &str) -> Option<&str> {
		self.errors
			.iter()
			.find(|e| e.field == field)
			.map(|e| e.message.as_str())
	}

	pub fn len(&self) -> usize {
		self.errors.len()
	}

	pub fn is_empty(&self) -> bool {
		self.errors.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
		self.errors.iter()
	}

	pub fn clear(&mut self) {
		self.errors.clear();
	}

	pub fn extend(&mut self, other: ErrorSet) {
		self.errors.extend(other.errors);
	}
}

impl IntoIterator for ErrorSet {
	type Item = ValidationError;
	type IntoIter = std::vec::IntoIter<ValidationError>;

	fn into_iter(self) -> Self::IntoIter {
		self.errors.into_iter()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_duplicate_errors_are_kept() {
		// Arrange
		let mut errors = ErrorSet::new();

		// Act
		errors.add("name", "same");
		errors.add("name", "same");

		// Assert
		assert_eq!(errors.len(), 2);
	}

	#[rstest]
	fn test_order_is_preserved_across_fields() {
		// Arrange
		let mut errors = ErrorSet::new();
		errors.add("b", "first");
		errors.add("a", "second");

		// Act
		let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();

		// Assert
		assert_eq!(fields, vec!["b", "a"]);
		assert!(errors.has_error("a"));
		assert!(!errors.has_error("c"));
	}
}
