use super::data_type::DataType;

use std::fmt::{Debug, Formatter};

/// Represents the identifier of an item in an [`Ilst`](super::Ilst)
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum AtomIdent {
	/// A four byte identifier
	///
	/// Many FOURCCs start with `0xA9` (©), and should be written as such. For example,
	/// `AtomIdent::Fourcc(*b"\xA9ART")`.
	Fourcc([u8; 4]),
	/// A freeform identifier
	///
	/// # Example
	///
	/// ```text
	/// ----:com.apple.iTunes:SUBTITLE
	/// ─┬── ────────┬─────── ───┬────
	///  ╰freeform identifier    ╰name
	///              |
	///              ╰mean
	/// ```
	Freeform {
		/// A string using a reverse DNS naming convention
		mean: String,
		/// A string identifying the atom
		name: String,
	},
}

impl AtomIdent {
	/// Create a freeform identifier
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsplice::mp4::AtomIdent;
	///
	/// let ident = AtomIdent::freeform("com.apple.iTunes", "SUBTITLE");
	/// assert_eq!(format!("{ident:?}"), "----:com.apple.iTunes:SUBTITLE");
	/// ```
	pub fn freeform(mean: impl Into<String>, name: impl Into<String>) -> Self {
		Self::Freeform {
			mean: mean.into(),
			name: name.into(),
		}
	}
}

impl Debug for AtomIdent {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			AtomIdent::Fourcc(fourcc) => {
				let chars = fourcc.iter().map(|b| char::from(*b)).collect::<String>();
				write!(f, "{chars}")
			},
			AtomIdent::Freeform { mean, name } => write!(f, "----:{mean}:{name}"),
		}
	}
}

impl From<[u8; 4]> for AtomIdent {
	fn from(fourcc: [u8; 4]) -> Self {
		AtomIdent::Fourcc(fourcc)
	}
}

/// Represents an item in an [`Ilst`](super::Ilst)
///
/// An item can hold multiple values, each written as its own `data` atom.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Atom {
	pub(crate) ident: AtomIdent,
	pub(crate) data: Vec<AtomData>,
}

impl Atom {
	/// Create a new [`Atom`]
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsplice::mp4::{Atom, AtomData, AtomIdent};
	///
	/// let atom = Atom::new(
	/// 	AtomIdent::Fourcc(*b"\xA9ART"),
	/// 	AtomData::Utf8(String::from("Foo")),
	/// );
	/// assert_eq!(atom.data().count(), 1);
	/// ```
	#[must_use]
	pub fn new(ident: AtomIdent, data: AtomData) -> Self {
		Self {
			ident,
			data: vec![data],
		}
	}

	/// Create a new [`Atom`] from a collection of [`AtomData`]s
	///
	/// This will return `None` if `data` is empty, as empty atoms are useless.
	pub fn from_collection(ident: AtomIdent, data: Vec<AtomData>) -> Option<Self> {
		if data.is_empty() {
			return None;
		}

		Some(Self { ident, data })
	}

	/// Returns the atom's [`AtomIdent`]
	pub fn ident(&self) -> &AtomIdent {
		&self.ident
	}

	/// Returns the atom's [`AtomData`]
	pub fn data(&self) -> impl Iterator<Item = &AtomData> {
		self.data.iter()
	}

	/// Consumes the atom, returning its [`AtomData`]
	pub fn into_data(self) -> impl Iterator<Item = AtomData> {
		self.data.into_iter()
	}

	/// Append a value to the atom
	pub fn push_data(&mut self, data: AtomData) {
		self.data.push(data);
	}
}

/// The data of an atom
///
/// NOTES:
///
/// * Integers are written with the smallest width that can hold them (1, 2, 4 or 8 bytes), use
///   [`AtomData::Enum`] or [`AtomData::Binary`] when the width matters.
/// * Everything without a dedicated variant is kept as [`AtomData::Binary`].
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AtomData {
	/// A UTF-8 encoded string
	Utf8(String),
	/// A big-endian UTF-16 encoded string
	Utf16(String),
	/// A big-endian signed integer (code `21`)
	SignedInteger(i64),
	/// A big-endian unsigned integer (code `22`)
	UnsignedInteger(u64),
	/// A boolean value
	///
	/// NOTE: This isn't an official data type, the flag atoms (see
	/// [`flags`](crate::mp4::flags)) are signed integers that are read as booleans.
	Bool(bool),
	/// A pair of integers, such as the track number and total (`trkn`, `disk`)
	IntegerPair(u16, u16),
	/// A signed integer with a fixed width of 1 to 4 bytes (`rtng`, `stik`, `akID`, ...)
	Enum {
		/// The number of bytes the value occupies
		width: u8,
		/// The value
		value: u32,
	},
	/// Any other data
	Binary {
		/// The code, or type of the item
		code: DataType,
		/// The binary data of the atom
		data: Vec<u8>,
	},
}

impl AtomData {
	/// Get the [`DataType`] of the atom
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsplice::mp4::{AtomData, DataType};
	///
	/// let data = AtomData::Utf8(String::from("foo"));
	/// assert_eq!(data.data_type(), DataType::Utf8);
	///
	/// let data = AtomData::Bool(true);
	/// assert_eq!(data.data_type(), DataType::BeSignedInteger);
	/// ```
	pub fn data_type(&self) -> DataType {
		match self {
			AtomData::Utf8(_) => DataType::Utf8,
			AtomData::Utf16(_) => DataType::Utf16,
			AtomData::SignedInteger(_) | AtomData::Bool(_) | AtomData::Enum { .. } => {
				DataType::BeSignedInteger
			},
			AtomData::UnsignedInteger(_) => DataType::BeUnsignedInteger,
			AtomData::IntegerPair(..) => DataType::Reserved,
			AtomData::Binary { code, .. } => *code,
		}
	}
}
