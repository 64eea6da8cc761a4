/// Identifiers for flag atoms
///
/// Any identifier in here will be read as [`AtomData::Bool`], see [`Ilst::set_flag`].
///
/// [`AtomData::Bool`]: crate::mp4::AtomData::Bool
/// [`Ilst::set_flag`]: crate::mp4::Ilst::set_flag
pub mod flags {
	use crate::mp4::AtomIdent;

	/// Podcast flag (`pcst`)
	pub const PODCAST: AtomIdent = AtomIdent::Fourcc(*b"pcst");
	/// Gapless playback flag (`pgap`)
	pub const GAPLESS: AtomIdent = AtomIdent::Fourcc(*b"pgap");
	/// Show work and movement flag (`shwm`)
	pub const SHOW_WORK: AtomIdent = AtomIdent::Fourcc(*b"shwm");
	/// HD video flag (`hdvd`)
	pub const HD_VIDEO: AtomIdent = AtomIdent::Fourcc(*b"hdvd");
	/// Compilation flag (`cpil`)
	pub const COMPILATION: AtomIdent = AtomIdent::Fourcc(*b"cpil");
}

pub(crate) const FLAG_IDENTS: &[[u8; 4]] = &[*b"cpil", *b"hdvd", *b"pcst", *b"pgap", *b"shwm"];

// Items stored as a sized signed integer, whose width has to survive a rewrite
pub(crate) const ENUM_IDENTS: &[[u8; 4]] = &[
	*b"rtng", *b"stik", *b"akID", *b"sfID", *b"cmID", *b"atID", *b"geID", *b"cnID", *b"tvsn",
	*b"tves",
];

// Items stored as a pair of integers (track/disc number and total)
pub(crate) const INTEGER_PAIR_IDENTS: &[[u8; 4]] = &[*b"trkn", *b"disk"];

pub(crate) const FREEFORM_IDENT: [u8; 4] = *b"----";

pub(crate) const WELL_KNOWN_TYPE_SET: u8 = 0;
