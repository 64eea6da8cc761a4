pub(super) mod atom;
pub(super) mod constants;
pub(super) mod data_type;
mod read;
pub(crate) mod write;

use super::tree::AtomTree;
use crate::config::{ParseOptions, WriteOptions};
use crate::error::{ErrorKind, Result, TagError};
use crate::macros::err;
use crate::splice::SpliceTarget;
use crate::tag::{TagExt, TagType};

use atom::{Atom, AtomData, AtomIdent};

use std::io::{Read, Seek, Write};

/// An MP4 `ilst` atom
///
/// The item list lives at `moov.udta.meta.ilst`. Every item is an [`Atom`] holding one or more
/// values.
///
/// ## Writing
///
/// When the new `ilst` fits in the space of the old one (plus any `free` atoms around it), it is
/// written in place and the rest is filled with a new `free` atom. Otherwise the `meta` atom is
/// rewritten, followed by a `free` atom of [`WriteOptions::preferred_padding`] bytes, and the
/// chunk offsets of the file are updated.
#[derive(Default, PartialEq, Eq, Debug, Clone)]
pub struct Ilst {
	pub(crate) atoms: Vec<Atom>,
}

impl Ilst {
	/// Create a new empty `Ilst`
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsplice::mp4::Ilst;
	/// use tagsplice::tag::TagExt;
	///
	/// let ilst_tag = Ilst::new();
	/// assert!(ilst_tag.is_empty());
	/// ```
	pub fn new() -> Self {
		Self::default()
	}

	/// Read the `ilst` of an MP4 file
	///
	/// # Errors
	///
	/// * [`ErrorKind::NoTagFound`] if there is no `moov.udta.meta.ilst`
	/// * See [`AtomTree::read_from`]
	/// * An item is malformed, and [`ParsingMode::Strict`](crate::config::ParsingMode::Strict) is used
	pub fn read_from<R>(reader: &mut R, parse_options: ParseOptions) -> Result<Self>
	where
		R: Read + Seek,
	{
		reader.rewind()?;
		let tree = AtomTree::read_from(reader, parse_options)?;

		let ilst = match tree.find("moov.udta.meta.ilst") {
			Ok(ilst) => ilst,
			Err(e) if matches!(e.kind(), ErrorKind::NotFound) => err!(NoTagFound),
			Err(e) => return Err(e),
		};

		let contents = tree.read_payload(reader, ilst)?;
		read::parse_ilst(&contents, parse_options)
	}

	/// Get an item by its [`AtomIdent`]
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsplice::mp4::{Atom, AtomData, AtomIdent, Ilst};
	///
	/// const TITLE_IDENTIFIER: AtomIdent = AtomIdent::Fourcc(*b"\xa9nam");
	///
	/// let mut ilst = Ilst::new();
	/// ilst.insert(Atom::new(
	/// 	TITLE_IDENTIFIER,
	/// 	AtomData::Utf8(String::from("Foo title")),
	/// ));
	///
	/// let title = ilst.get(&TITLE_IDENTIFIER);
	/// assert!(title.is_some());
	/// ```
	pub fn get(&self, ident: &AtomIdent) -> Option<&Atom> {
		self.atoms.iter().find(|atom| &atom.ident == ident)
	}

	/// Get a mutable reference to an item by its [`AtomIdent`]
	pub fn get_mut(&mut self, ident: &AtomIdent) -> Option<&mut Atom> {
		self.atoms.iter_mut().find(|atom| &atom.ident == ident)
	}

	/// Inserts an [`Atom`], replacing any atom with the same [`AtomIdent`]
	///
	/// A replaced atom keeps its position.
	pub fn insert(&mut self, atom: Atom) {
		match self.get_mut(&atom.ident) {
			Some(existing) => *existing = atom,
			None => self.atoms.push(atom),
		}
	}

	/// Remove an atom by its [`AtomIdent`]
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsplice::mp4::{Atom, AtomData, AtomIdent, Ilst};
	/// use tagsplice::tag::TagExt;
	///
	/// const TITLE_IDENTIFIER: AtomIdent = AtomIdent::Fourcc(*b"\xa9nam");
	///
	/// let mut ilst = Ilst::new();
	/// ilst.insert(Atom::new(
	/// 	TITLE_IDENTIFIER,
	/// 	AtomData::Utf8(String::from("Foo title")),
	/// ));
	/// assert_eq!(ilst.len(), 1);
	///
	/// let removed = ilst.remove(&TITLE_IDENTIFIER);
	/// assert!(removed.is_some());
	/// assert!(ilst.is_empty());
	/// ```
	pub fn remove(&mut self, ident: &AtomIdent) -> Option<Atom> {
		let index = self.atoms.iter().position(|atom| &atom.ident == ident)?;
		Some(self.atoms.remove(index))
	}

	/// Returns all of the tag's atoms
	pub fn atoms(&self) -> impl ExactSizeIterator<Item = &Atom> + Clone {
		self.atoms.iter()
	}

	/// Whether the tag contains an atom with the identifier
	pub fn contains(&self, ident: &AtomIdent) -> bool {
		self.get(ident).is_some()
	}

	/// Sets the value of a flag ([`AtomData::Bool`]) atom
	///
	/// For identifiers, see [`flags`](crate::mp4::flags).
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsplice::mp4::{AtomData, Ilst, flags};
	///
	/// let mut ilst = Ilst::new();
	/// ilst.set_flag(flags::COMPILATION, true);
	///
	/// let compilation = ilst.get(&flags::COMPILATION).unwrap();
	/// assert_eq!(compilation.data().next(), Some(&AtomData::Bool(true)));
	/// ```
	pub fn set_flag(&mut self, ident: AtomIdent, value: bool) {
		self.insert(Atom::new(ident, AtomData::Bool(value)));
	}
}

impl IntoIterator for Ilst {
	type Item = Atom;
	type IntoIter = std::vec::IntoIter<Self::Item>;

	fn into_iter(self) -> Self::IntoIter {
		self.atoms.into_iter()
	}
}

impl TagExt for Ilst {
	type Err = TagError;

	fn tag_type(&self) -> TagType {
		TagType::Mp4Ilst
	}

	fn len(&self) -> usize {
		self.atoms.len()
	}

	fn is_empty(&self) -> bool {
		self.atoms.is_empty()
	}

	/// Writes the tag to a file
	///
	/// An empty tag removes the `ilst` atom.
	///
	/// # Errors
	///
	/// * The file has no `moov` atom
	/// * An atom's data can't be encoded, see [`AtomData`]
	/// * See [`AtomTree::replace`]
	fn save_to<F>(&self, file: &mut F, write_options: WriteOptions) -> std::result::Result<(), Self::Err>
	where
		F: SpliceTarget,
	{
		write::write_to(file, self, write_options)
	}

	/// Dumps the `ilst` atom to a writer
	///
	/// # Errors
	///
	/// * An atom's data can't be encoded
	/// * [`std::io::Error`]
	fn dump_to<W: Write>(
		&self,
		writer: &mut W,
		_write_options: WriteOptions,
	) -> std::result::Result<(), Self::Err> {
		let ilst = write::build_ilst(&self.atoms)?;
		writer.write_all(&ilst)?;
		Ok(())
	}

	fn clear(&mut self) {
		self.atoms.clear();
	}
}

#[cfg(test)]
mod tests {
	use crate::config::{ParseOptions, WriteOptions};
	use crate::error::ErrorKind;
	use crate::mp4::{Atom, AtomData, AtomIdent, Ilst, flags, render};
	use crate::tag::{TagExt, TagType};

	use std::io::{Cursor, Write};

	#[test_log::test]
	fn insert_replaces_in_place() {
		let mut ilst = Ilst::new();
		ilst.insert(Atom::new(
			AtomIdent::Fourcc(*b"\xA9nam"),
			AtomData::Utf8(String::from("Foo")),
		));
		ilst.set_flag(flags::PODCAST, false);
		ilst.insert(Atom::new(
			AtomIdent::Fourcc(*b"\xA9nam"),
			AtomData::Utf8(String::from("Bar")),
		));

		assert_eq!(ilst.len(), 2);

		let first = ilst.atoms().next().unwrap();
		assert_eq!(first.ident(), &AtomIdent::Fourcc(*b"\xA9nam"));
		assert_eq!(
			first.data().next(),
			Some(&AtomData::Utf8(String::from("Bar")))
		);

		assert!(ilst.contains(&flags::PODCAST));
		assert!(ilst.remove(&flags::PODCAST).is_some());
		assert!(!ilst.contains(&flags::PODCAST));
	}

	#[test_log::test]
	fn dump_and_remove() {
		let mut ilst = Ilst::new();
		ilst.set_flag(flags::HD_VIDEO, true);

		let mut dumped = Vec::new();
		ilst.dump_to(&mut dumped, WriteOptions::new()).unwrap();
		assert_eq!(&dumped[4..8], b"ilst");
		assert_eq!(dumped.len(), 8 + 25);

		let mut file = Cursor::new(Vec::new());
		file.write_all(&render(*b"moov", &[]).unwrap()).unwrap();
		ilst.save_to(&mut file, WriteOptions::new()).unwrap();

		file.set_position(0);
		assert_eq!(Ilst::read_from(&mut file, ParseOptions::new()).unwrap(), ilst);

		TagType::Mp4Ilst.remove_from(&mut file).unwrap();

		let err = Ilst::read_from(&mut file, ParseOptions::new()).unwrap_err();
		assert!(matches!(err.kind(), ErrorKind::NoTagFound));
	}
}
