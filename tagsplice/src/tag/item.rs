use crate::error::Result;
use crate::macros::err;

const SEPARATOR: char = '\0';

/// Represents a tag item's value
///
/// Text values may hold multiple strings, stored internally as a single NUL separated string.
/// See [`ItemValue::values`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ItemValue {
	/// Any UTF-8 encoded text
	Text(String),
	/// Any UTF-8 encoded locator of external information
	Locator(String),
	/// Binary information
	Binary(Vec<u8>),
}

impl ItemValue {
	/// Classify raw bytes
	///
	/// Valid UTF-8 becomes [`ItemValue::Text`], anything else becomes [`ItemValue::Binary`].
	/// Use [`ItemValue::Binary`] or [`ItemValue::Locator`] directly to override this.
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsplice::tag::ItemValue;
	///
	/// assert_eq!(ItemValue::from_bytes(b"Foo".to_vec()), ItemValue::Text(String::from("Foo")));
	/// assert_eq!(ItemValue::from_bytes(vec![0xFF, 0xFE]), ItemValue::Binary(vec![0xFF, 0xFE]));
	/// ```
	pub fn from_bytes(bytes: Vec<u8>) -> Self {
		match String::from_utf8(bytes) {
			Ok(text) => Self::Text(text),
			Err(e) => Self::Binary(e.into_bytes()),
		}
	}

	/// Create a text value holding multiple strings
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsplice::tag::ItemValue;
	///
	/// let value = ItemValue::text_list(["Foo", "Bar"]);
	/// assert_eq!(value.values().collect::<Vec<_>>(), ["Foo", "Bar"]);
	/// ```
	pub fn text_list<I, S>(values: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut joined = String::new();
		for (i, value) in values.into_iter().enumerate() {
			if i > 0 {
				joined.push(SEPARATOR);
			}
			joined.push_str(value.as_ref());
		}

		Self::Text(joined)
	}

	/// Returns the value if the variant is `Text`
	pub fn text(&self) -> Option<&str> {
		match self {
			Self::Text(text) => Some(text),
			_ => None,
		}
	}

	/// Returns the value if the variant is `Locator`
	pub fn locator(&self) -> Option<&str> {
		match self {
			Self::Locator(locator) => Some(locator),
			_ => None,
		}
	}

	/// Returns the value if the variant is `Binary`
	pub fn binary(&self) -> Option<&[u8]> {
		match self {
			Self::Binary(bin) => Some(bin),
			_ => None,
		}
	}

	/// Iterate over the individual strings of a text or locator value
	///
	/// Binary values produce nothing.
	pub fn values(&self) -> impl Iterator<Item = &str> {
		let content = match self {
			Self::Text(text) | Self::Locator(text) => Some(text.as_str()),
			Self::Binary(_) => None,
		};

		content.into_iter().flat_map(|text| text.split(SEPARATOR))
	}

	/// The number of strings in a text or locator value
	pub fn value_count(&self) -> usize {
		self.values().count()
	}

	/// Get the string at `index`
	pub fn get(&self, index: usize) -> Option<&str> {
		self.values().nth(index)
	}

	/// Replace the string at `index`
	///
	/// An `index` equal to [`ItemValue::value_count`] appends a new string.
	///
	/// # Errors
	///
	/// * The value is binary
	/// * `index` is greater than the number of strings
	/// * `value` contains a NUL, which would split it in two
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsplice::tag::ItemValue;
	///
	/// # fn main() -> tagsplice::error::Result<()> {
	/// let mut value = ItemValue::text_list(["Foo", "Bar"]);
	/// value.set(1, "Baz")?;
	/// value.set(2, "Qux")?;
	///
	/// assert_eq!(value.text(), Some("Foo\0Baz\0Qux"));
	/// # Ok(()) }
	/// ```
	pub fn set(&mut self, index: usize, value: &str) -> Result<()> {
		if value.contains(SEPARATOR) {
			err!(InvalidArgument("text values cannot contain a NUL"));
		}

		let (Self::Text(content) | Self::Locator(content)) = self else {
			err!(InvalidArgument("binary values have no strings to index"));
		};

		let mut values = content.split(SEPARATOR).collect::<Vec<_>>();
		match index.cmp(&values.len()) {
			std::cmp::Ordering::Less => values[index] = value,
			std::cmp::Ordering::Equal => values.push(value),
			std::cmp::Ordering::Greater => err!(InvalidArgument("text index out of range")),
		}

		*content = values.join("\0");
		Ok(())
	}

	/// The value as bytes, as it is written to a tag
	pub fn as_bytes(&self) -> &[u8] {
		match self {
			Self::Text(text) | Self::Locator(text) => text.as_bytes(),
			Self::Binary(bin) => bin,
		}
	}

	/// Check for emptiness
	pub fn is_empty(&self) -> bool {
		match self {
			Self::Binary(bin) => bin.is_empty(),
			Self::Locator(locator) => locator.is_empty(),
			Self::Text(text) => text.is_empty(),
		}
	}
}

impl From<Vec<u8>> for ItemValue {
	fn from(bytes: Vec<u8>) -> Self {
		Self::from_bytes(bytes)
	}
}

impl From<String> for ItemValue {
	fn from(text: String) -> Self {
		Self::Text(text)
	}
}

impl From<&str> for ItemValue {
	fn from(text: &str) -> Self {
		Self::Text(text.to_owned())
	}
}
