use crate::error::Result;
use crate::splice::SpliceTarget;

use std::fs::OpenOptions;
use std::path::Path;

/// The tag formats tagsplice can locate and rewrite
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum TagType {
	/// This covers both APEv1 and APEv2 as it doesn't matter much
	Ape,
	/// Represents an `ilst` atom in an MP4 file
	Mp4Ilst,
}

impl TagType {
	/// Remove a tag from a [`Path`]
	///
	/// # Errors
	///
	/// See [`TagType::remove_from`]
	pub fn remove_from_path(&self, path: impl AsRef<Path>) -> Result<()> {
		let mut file = OpenOptions::new().read(true).write(true).open(path)?;
		self.remove_from(&mut file)
	}

	/// Remove a tag from a [`SpliceTarget`]
	///
	/// A file without a tag of this type is left untouched, this is not an error.
	///
	/// # Errors
	///
	/// * The existing tag (or its surrounding atoms) is malformed
	/// * [`std::io::Error`]
	pub fn remove_from<F>(&self, file: &mut F) -> Result<()>
	where
		F: SpliceTarget,
	{
		match self {
			TagType::Ape => crate::ape::remove_from(file),
			TagType::Mp4Ilst => crate::mp4::remove_from(file),
		}
	}
}
