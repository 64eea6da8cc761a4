use crate::ape::constants::INVALID_KEYS;
use crate::error::Result;
use crate::macros::err;
use crate::tag::ItemValue;

/// Represents an `APE` tag item
///
/// Keys are case-insensitive, but the casing they were set with is kept for writing.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ApeItem {
	/// Whether or not to mark the item as read only
	pub read_only: bool,
	pub(crate) key: String,
	pub(crate) folded_key: String,
	pub(crate) value: ItemValue,
}

impl ApeItem {
	/// Create an [`ApeItem`]
	///
	/// # Errors
	///
	/// * `key` is shorter than 2 or longer than 255 bytes
	/// * `key` contains characters outside of `0x20..=0x7E`
	/// * `key` is one of the reserved keys `ID3`, `TAG`, `OggS`, or `MP+` (case-insensitive)
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsplice::ape::ApeItem;
	/// use tagsplice::tag::ItemValue;
	///
	/// assert!(ApeItem::new(String::from("Artist"), ItemValue::from("Foo")).is_ok());
	/// assert!(ApeItem::new(String::from("tag"), ItemValue::from("Foo")).is_err());
	/// ```
	pub fn new(key: String, value: ItemValue) -> Result<Self> {
		if !is_valid_key(&key) {
			err!(InvalidKey);
		}

		Ok(Self {
			read_only: false,
			folded_key: key.to_ascii_lowercase(),
			key,
			value,
		})
	}

	/// Make a new text item
	///
	/// # Errors
	///
	/// See [`ApeItem::new`]
	pub fn text(key: &str, value: impl Into<String>) -> Result<Self> {
		Self::new(String::from(key), ItemValue::Text(value.into()))
	}

	/// Returns the item key, in the casing it was last set with
	pub fn key(&self) -> &str {
		&self.key
	}

	/// Returns the item value
	pub fn value(&self) -> &ItemValue {
		&self.value
	}

	/// Returns a mutable reference to the item value
	pub fn value_mut(&mut self) -> &mut ItemValue {
		&mut self.value
	}

	/// Consume the item, returning its value
	pub fn into_value(self) -> ItemValue {
		self.value
	}

	// Kind (bits 1-2) and read only (bit 0) flags
	pub(crate) fn flags(&self) -> u32 {
		let kind: u32 = match self.value {
			ItemValue::Text(_) => 0,
			ItemValue::Binary(_) => 1,
			ItemValue::Locator(_) => 2,
		};

		(kind << 1) | u32::from(self.read_only)
	}
}

/// Whether `key` is a legal APE item key
///
/// # Examples
///
/// ```rust
/// use tagsplice::ape::is_valid_key;
///
/// assert!(is_valid_key("Album Artist"));
/// assert!(!is_valid_key("A"));
/// assert!(!is_valid_key("OggS"));
/// assert!(!is_valid_key("Caf\u{e9}"));
/// ```
pub fn is_valid_key(key: &str) -> bool {
	(2..=255).contains(&key.len())
		&& key.bytes().all(|b| (0x20..=0x7E).contains(&b))
		&& !INVALID_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

#[cfg(test)]
mod tests {
	use super::{ApeItem, is_valid_key};
	use crate::error::ErrorKind;
	use crate::tag::ItemValue;

	#[test_log::test]
	fn key_validity() {
		assert!(is_valid_key("Ar"));
		assert!(is_valid_key(&"k".repeat(255)));
		assert!(!is_valid_key(&"k".repeat(256)));
		assert!(!is_valid_key("Foo\x1F"));
		assert!(!is_valid_key("Foo\x7F"));

		for reserved in ["ID3", "id3", "TAG", "OggS", "OGGS", "MP+"] {
			assert!(!is_valid_key(reserved), "{reserved} should be reserved");
		}
	}

	#[test_log::test]
	fn flags() {
		let mut item = ApeItem::new(String::from("Cover"), ItemValue::Binary(vec![1])).unwrap();
		assert_eq!(item.flags(), 0b010);

		item.read_only = true;
		assert_eq!(item.flags(), 0b011);

		let item = ApeItem::new(String::from("Web"), ItemValue::Locator(String::new())).unwrap();
		assert_eq!(item.flags(), 0b100);
	}

	#[test_log::test]
	fn invalid_key_error() {
		let err = ApeItem::text("X", "Foo").unwrap_err();
		assert!(matches!(err.kind(), ErrorKind::InvalidKey));
	}
}
