use super::constants::{APE_PREAMBLE, APE_VERSION_1, APE_VERSION_2};
use crate::error::{Result, truncated};
use crate::macros::err;

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

/// The fields following the `APETAGEX` preamble of a header or footer
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct ApeHeader {
	pub(crate) version: u32,
	// Items + footer, never including the header
	pub(crate) size: u32,
	pub(crate) item_count: u32,
	pub(crate) flags: u32,
}

impl ApeHeader {
	/// Reads the 24 bytes after the preamble
	pub(crate) fn read<R>(data: &mut R) -> Result<Self>
	where
		R: Read,
	{
		let version = data.read_u32::<LittleEndian>().map_err(truncated)?;
		let size = data.read_u32::<LittleEndian>().map_err(truncated)?;
		let item_count = data.read_u32::<LittleEndian>().map_err(truncated)?;
		let flags = data.read_u32::<LittleEndian>().map_err(truncated)?;

		// Reserved, must be zero but nobody checks
		let mut reserved = [0; 8];
		data.read_exact(&mut reserved).map_err(truncated)?;

		if version != APE_VERSION_1 && version != APE_VERSION_2 {
			err!(UnsupportedVersion(version));
		}

		log::trace!(
			"APE: Header fields: version {version}, size {size}, {item_count} items, flags \
			 {flags:#010X}"
		);

		Ok(Self {
			version,
			size,
			item_count,
			flags,
		})
	}

	/// Writes the full 32 byte block, preamble included
	pub(crate) fn write_to<W>(&self, writer: &mut W) -> Result<()>
	where
		W: Write,
	{
		writer.write_all(APE_PREAMBLE)?;
		writer.write_u32::<LittleEndian>(self.version)?;
		writer.write_u32::<LittleEndian>(self.size)?;
		writer.write_u32::<LittleEndian>(self.item_count)?;
		writer.write_u32::<LittleEndian>(self.flags)?;
		// The header/footer must end in 8 bytes of zeros
		writer.write_u64::<LittleEndian>(0)?;

		Ok(())
	}
}
