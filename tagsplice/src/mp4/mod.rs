//! MP4 specific items
//!
//! ## Atom tree
//!
//! [`AtomTree`] is a view of the atoms in a file, built from a single scan. Only the children of
//! well-known containers (`moov`, `udta`, `meta`, `ilst`, `trak`, `mdia`, `minf`, `stbl`, `moof`,
//! `traf`) are parsed, everything else is an opaque leaf.
//!
//! Changing the size of an atom through the tree updates the size of every ancestor, and shifts the
//! chunk offsets (`stco`, `co64`, `tfhd`) of the file.
//!
//! ## Tags
//!
//! The only supported tag format is [`Ilst`].
mod atom_info;
pub(crate) mod ilst;
mod offsets;
mod tree;

use crate::error::Result;
use crate::splice::SpliceTarget;

// Exports

pub use atom_info::{render, render_with};
pub use ilst::Ilst;
pub use ilst::atom::{Atom, AtomData, AtomIdent};
pub use ilst::constants::flags;
pub use ilst::data_type::DataType;
pub use tree::{AtomId, AtomNode, AtomTree, FindAll};

pub(crate) fn remove_from<F>(file: &mut F) -> Result<()>
where
	F: SpliceTarget,
{
	ilst::write::remove_from(file)
}
