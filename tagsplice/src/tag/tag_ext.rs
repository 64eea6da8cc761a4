use crate::config::WriteOptions;
use crate::error::TagError;
use crate::splice::SpliceTarget;
use crate::tag::TagType;

use std::path::Path;

/// A set of common methods between tags
///
/// This provides a set of methods to make interaction with all tags a similar
/// experience.
pub trait TagExt: Sized + private::Sealed {
	/// The associated error which can be returned from IO operations
	type Err: From<std::io::Error> + From<TagError>;

	/// Returns the [`TagType`] this tag is stored as
	fn tag_type(&self) -> TagType;

	/// Returns the number of items in the tag
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsplice::ape::ApeTag;
	/// use tagsplice::tag::TagExt;
	///
	/// # fn main() -> tagsplice::error::Result<()> {
	/// let mut tag = ApeTag::new();
	/// assert_eq!(tag.len(), 0);
	///
	/// tag.insert_text("Artist", "Foo artist")?;
	/// assert_eq!(tag.len(), 1);
	/// # Ok(()) }
	/// ```
	fn len(&self) -> usize;

	/// Whether the tag has any items
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsplice::mp4::Ilst;
	/// use tagsplice::tag::TagExt;
	///
	/// let tag = Ilst::default();
	/// assert!(tag.is_empty());
	/// ```
	fn is_empty(&self) -> bool;

	/// Save the tag to a path
	///
	/// # Errors
	///
	/// * Path doesn't exist
	/// * Path is not writable
	/// * See [`TagExt::save_to`]
	fn save_to_path<P: AsRef<Path>>(
		&self,
		path: P,
		write_options: WriteOptions,
	) -> std::result::Result<(), Self::Err> {
		self.save_to(
			&mut std::fs::OpenOptions::new()
				.read(true)
				.write(true)
				.open(path)?,
			write_options,
		)
	}

	/// Save the tag to a [`SpliceTarget`]
	///
	/// The bytes outside of the tag region are preserved. Saving an unchanged tag twice produces
	/// identical output.
	///
	/// # Errors
	///
	/// * The file format could not be determined
	/// * Attempting to write a tag to a format that does not support it.
	fn save_to<F>(
		&self,
		file: &mut F,
		write_options: WriteOptions,
	) -> std::result::Result<(), Self::Err>
	where
		F: SpliceTarget;

	/// Dump the tag to a writer
	///
	/// This will only write the tag, it will not produce a usable file.
	#[allow(clippy::missing_errors_doc)]
	fn dump_to<W: std::io::Write>(
		&self,
		writer: &mut W,
		write_options: WriteOptions,
	) -> std::result::Result<(), Self::Err>;

	/// Remove a tag from a [`Path`]
	///
	/// # Errors
	///
	/// See [`TagType::remove_from`]
	fn remove_from_path<P: AsRef<Path>>(&self, path: P) -> std::result::Result<(), Self::Err> {
		self.tag_type().remove_from_path(path).map_err(Into::into)
	}

	/// Remove a tag from a [`SpliceTarget`]
	///
	/// # Errors
	///
	/// See [`TagType::remove_from`]
	fn remove_from<F>(&self, file: &mut F) -> std::result::Result<(), Self::Err>
	where
		F: SpliceTarget,
	{
		self.tag_type().remove_from(file).map_err(Into::into)
	}

	/// Clear the tag, removing all items
	///
	/// NOTE: This will **not** remove any format-specific extras, such as flags
	fn clear(&mut self);
}

// https://rust-lang.github.io/api-guidelines/future-proofing.html#c-sealed
mod private {
	use crate::ape::ApeTag;
	use crate::mp4::Ilst;

	pub trait Sealed {}

	impl Sealed for ApeTag {}
	impl Sealed for Ilst {}
}
