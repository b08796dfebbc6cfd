//! Field values
//!
//! Values are kept as [`serde_json::Value`] so that multi-valued inputs
//! (checkbox groups, multi-selects) survive as arrays.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Insertion-ordered field values, at most one per field
///
/// # Examples
///
/// ```
/// use tofu_forms::FieldValueSet;
///
/// let mut values = FieldValueSet::new();
/// values.add("name", "Alice");
/// values.add("name", "Bob");
///
/// assert_eq!(values.len(), 1);
/// assert_eq!(values.get_str("name"), Some("Bob"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldValueSet {
	values: IndexMap<String, Value>,
}

impl FieldValueSet {
	pub fn new() -> Self {
		Self::default()
	}

	/// Set a field's value, replacing any previous value in place
	pub fn add(&mut self, field: impl Into<String>, value: impl Into<Value>) {
		self.values.insert(field.into(), value.into());
	}

	pub fn get(&self, field: &str) -> Option<&Value> {
		self.values.get(field)
	}

	/// The value when it is a plain string
	pub fn get_str(&self, field: &str) -> Option<&str> {
		self.values.get(field).and_then(Value::as_str)
	}

	/// The value rendered as text; empty when absent
	pub fn text(&self, field: &str) -> String {
		self.values.get(field).map(value_to_text).unwrap_or_default()
	}

	pub fn contains(&self, field: &str) -> bool {
		self.values.contains_key(field)
	}

	pub fn remove(&mut self, field: &str) -> Option<Value> {
		self.values.shift_remove(field)
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	pub fn clear(&mut self) {
		self.values.clear();
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
		self.values.iter().map(|(k, v)| (k.as_str(), v))
	}

	pub fn as_map(&self) -> &IndexMap<String, Value> {
		&self.values
	}
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for FieldValueSet {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut set = Self::new();
		for (field, value) in iter {
			set.add(field, value);
		}
		set
	}
}

/// Render a value for display or substitution
///
/// Strings are used as-is, arrays are joined with `", "`, null is empty.
pub fn value_to_text(value: &Value) -> String {
	match value {
		Value::Null => String::new(),
		Value::String(s) => s.clone(),
		Value::Bool(b) => b.to_string(),
		Value::Number(n) => n.to_string(),
		Value::Array(items) => items
			.iter()
			.map(value_to_text)
			.collect::<Vec<_>>()
			.join(", "),
		Value::Object(_) => value.to_string(),
	}
}

/// Whether a value counts as "not provided"
pub fn is_empty_value(value: Option<&Value>) -> bool {
	match value {
		None | Some(Value::Null) => true,
		Some(Value::String(s)) => s.trim().is_empty(),
		Some(Value::Array(items)) => items.iter().all(|item| is_empty_value(Some(item))),
		Some(Value::Object(map)) => map.is_empty(),
		Some(_) => false,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_add_preserves_first_insertion_position() {
		// Arrange
		let mut values = FieldValueSet::new();
		values.add("a", "1");
		values.add("b", "2");

		// Act
		values.add("a", "3");

		// Assert
		let fields: Vec<_> = values.iter().map(|(k, _)| k).collect();
		assert_eq!(fields, vec!["a", "b"]);
		assert_eq!(values.get_str("a"), Some("3"));
	}

	#[rstest]
	#[case(json!(null), "")]
	#[case(json!("text"), "text")]
	#[case(json!(42), "42")]
	#[case(json!(["red", "blue"]), "red, blue")]
	fn test_value_to_text(#[case] value: Value, #[case] expected: &str) {
		assert_eq!(value_to_text(&value), expected);
	}

	#[rstest]
	#[case(None, true)]
	#[case(Some(json!("   ")), true)]
	#[case(Some(json!([])), true)]
	#[case(Some(json!([""])), true)]
	#[case(Some(json!("x")), false)]
	#[case(Some(json!(0)), false)]
	fn test_is_empty_value(#[case] value: Option<Value>, #[case] expected: bool) {
		assert_eq!(is_empty_value(value.as_ref()), expected);
	}

	#[rstest]
	fn test_serializes_as_plain_object() {
		// Arrange
		let values: FieldValueSet = [("name", "Alice")].into_iter().collect();

		// Act
		let json = serde_json::to_value(&values).unwrap();

		// Assert
		assert_eq!(json, json!({"name": "Alice"}));
	}
}
