pub(crate) mod item;
pub(crate) mod read;
pub(crate) mod write;

use crate::ape::TagLocation;
use crate::ape::tag::item::ApeItem;
use crate::config::{ParseOptions, WriteOptions};
use crate::error::{Result, TagError};
use crate::splice::SpliceTarget;
use crate::tag::{ItemValue, TagExt, TagType};

use std::io::{Read, Seek, Write};

/// An `APE` tag
///
/// ## Supported file types
///
/// Any file with a trailing (or, although APEv2 forbids it, leading) APEv1 or APEv2 tag, such as
/// Monkey's Audio, Musepack, WavPack, or MP3.
///
/// ## Item storage
///
/// Keys are case-insensitive. Inserting a key that differs from an existing one only by case
/// replaces the existing item's value and casing, but keeps its position.
///
/// ## Writing
///
/// Tags are always written at the end of the file with a header and a footer, removing any
/// ID3v1 or Lyrics3v2 block that followed the old tag.
#[derive(Default, Debug, PartialEq, Eq, Clone)]
pub struct ApeTag {
	/// Whether or not to mark the tag as read only
	pub read_only: bool,
	pub(super) items: Vec<ApeItem>,
}

impl ApeTag {
	/// Create a new empty `ApeTag`
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsplice::ape::ApeTag;
	/// use tagsplice::tag::TagExt;
	///
	/// let ape_tag = ApeTag::new();
	/// assert!(ape_tag.is_empty());
	/// ```
	pub fn new() -> Self {
		Self::default()
	}

	/// Read an `ApeTag` from a reader
	///
	/// # Errors
	///
	/// * [`ErrorKind::NoTagFound`](crate::error::ErrorKind::NoTagFound)
	/// * See [`TagLocation::locate`]
	/// * An item has an invalid size or kind
	/// * An item has an illegal key, and [`ParsingMode::Strict`](crate::config::ParsingMode::Strict) is used
	pub fn read_from<R>(reader: &mut R, parse_options: ParseOptions) -> Result<Self>
	where
		R: Read + Seek,
	{
		let location = TagLocation::locate(reader, parse_options)?;
		read::read_ape_tag(reader, &location, parse_options)
	}

	/// Get an [`ApeItem`] by key
	///
	/// NOTE: While `APE` items are supposed to be case-sensitive,
	/// this rule is rarely followed, so this will ignore case when searching.
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsplice::ape::ApeTag;
	///
	/// # fn main() -> tagsplice::error::Result<()> {
	/// let mut ape_tag = ApeTag::new();
	/// ape_tag.insert_text("Album", "Foo album")?;
	///
	/// assert!(ape_tag.get("ALBUM").is_some());
	/// # Ok(()) }
	/// ```
	pub fn get(&self, key: &str) -> Option<&ApeItem> {
		let folded = key.to_ascii_lowercase();
		self.items.iter().find(|i| i.folded_key == folded)
	}

	/// Get a mutable reference to an [`ApeItem`] by key
	pub fn get_mut(&mut self, key: &str) -> Option<&mut ApeItem> {
		let folded = key.to_ascii_lowercase();
		self.items.iter_mut().find(|i| i.folded_key == folded)
	}

	/// Insert an [`ApeItem`]
	///
	/// An item whose key matches ignoring case is replaced in place, taking on the new casing.
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsplice::ape::{ApeItem, ApeTag};
	/// use tagsplice::tag::TagExt;
	///
	/// # fn main() -> tagsplice::error::Result<()> {
	/// let mut ape_tag = ApeTag::new();
	/// ape_tag.insert(ApeItem::text("ARTIST", "Foo")?);
	/// ape_tag.insert(ApeItem::text("Artist", "Bar")?);
	///
	/// assert_eq!(ape_tag.len(), 1);
	/// assert_eq!(ape_tag.get("artist").map(|i| i.key()), Some("Artist"));
	/// # Ok(()) }
	/// ```
	pub fn insert(&mut self, item: ApeItem) {
		match self
			.items
			.iter_mut()
			.find(|i| i.folded_key == item.folded_key)
		{
			Some(existing) => *existing = item,
			None => self.items.push(item),
		}
	}

	/// Insert a value, classifying it with [`ItemValue::from`]
	///
	/// # Errors
	///
	/// See [`ApeItem::new`]
	pub fn insert_value(&mut self, key: &str, value: impl Into<ItemValue>) -> Result<()> {
		self.insert(ApeItem::new(String::from(key), value.into())?);
		Ok(())
	}

	/// Insert a text item
	///
	/// # Errors
	///
	/// See [`ApeItem::new`]
	pub fn insert_text(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
		self.insert(ApeItem::text(key, value)?);
		Ok(())
	}

	/// Remove an [`ApeItem`] by key, ignoring case
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsplice::ape::ApeTag;
	///
	/// # fn main() -> tagsplice::error::Result<()> {
	/// let mut ape_tag = ApeTag::new();
	/// ape_tag.insert_text("Album", "Foo album")?;
	///
	/// assert!(ape_tag.remove("album").is_some());
	/// assert!(ape_tag.get("Album").is_none());
	/// # Ok(()) }
	/// ```
	pub fn remove(&mut self, key: &str) -> Option<ApeItem> {
		let folded = key.to_ascii_lowercase();
		let pos = self.items.iter().position(|i| i.folded_key == folded)?;

		Some(self.items.remove(pos))
	}

	/// Returns all of the tag's items
	pub fn items(&self) -> impl ExactSizeIterator<Item = &ApeItem> + Clone {
		self.items.iter()
	}

	/// Returns the keys of every item, in the casing they were set with
	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.items.iter().map(ApeItem::key)
	}
}

impl IntoIterator for ApeTag {
	type Item = ApeItem;
	type IntoIter = std::vec::IntoIter<Self::Item>;

	fn into_iter(self) -> Self::IntoIter {
		self.items.into_iter()
	}
}

impl<'a> IntoIterator for &'a ApeTag {
	type Item = &'a ApeItem;
	type IntoIter = std::slice::Iter<'a, ApeItem>;

	fn into_iter(self) -> Self::IntoIter {
		self.items.iter()
	}
}

impl TagExt for ApeTag {
	type Err = TagError;

	fn tag_type(&self) -> TagType {
		TagType::Ape
	}

	fn len(&self) -> usize {
		self.items.len()
	}

	fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	/// Write an `APE` tag to a file
	///
	/// # Errors
	///
	/// * An existing tag is flagged read only, and [`WriteOptions::respect_read_only`] is set
	/// * An existing tag has an invalid size
	/// * [`std::io::Error`]
	fn save_to<F>(&self, file: &mut F, write_options: WriteOptions) -> std::result::Result<(), Self::Err>
	where
		F: SpliceTarget,
	{
		write::write_to(file, self, write_options)
	}

	/// Dumps the tag to a writer
	///
	/// # Errors
	///
	/// * [`std::io::Error`]
	fn dump_to<W: Write>(
		&self,
		writer: &mut W,
		_write_options: WriteOptions,
	) -> std::result::Result<(), Self::Err> {
		let tag = write::create_ape_tag(self)?;
		writer.write_all(&tag)?;
		Ok(())
	}

	fn clear(&mut self) {
		self.items.clear();
	}
}
