use crate::error::{Result, truncated};
use crate::macros::err;

use std::io::{Read, Seek, SeekFrom, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

pub(crate) const FOURCC_LEN: u64 = 4;
pub(crate) const IDENTIFIER_LEN: u64 = 4;
pub(crate) const ATOM_HEADER_LEN: u64 = FOURCC_LEN + IDENTIFIER_LEN;
pub(crate) const EXTENDED_ATOM_HEADER_LEN: u64 = ATOM_HEADER_LEN + 8;

/// The header of a single atom, as found in a file
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct AtomInfo {
	pub(crate) start: u64,
	pub(crate) len: u64,
	pub(crate) extended: bool,
	pub(crate) ident: [u8; 4],
}

impl AtomInfo {
	/// Read an atom header at the reader's current position
	///
	/// * `available` is the number of bytes from the start of the header to the end of the
	///   enclosing region (the parent's payload, or the file)
	/// * `to_eof` allows a length of 0, meaning the atom covers everything that is `available`
	pub(crate) fn read<R>(data: &mut R, available: u64, to_eof: bool) -> Result<Self>
	where
		R: Read + Seek,
	{
		if available < ATOM_HEADER_LEN {
			err!(TruncatedHeader);
		}

		let start = data.stream_position()?;

		let len_raw = u64::from(data.read_u32::<BigEndian>().map_err(truncated)?);

		let mut ident = [0; IDENTIFIER_LEN as usize];
		data.read_exact(&mut ident).map_err(truncated)?;

		let (len, extended) = match len_raw {
			// The atom extends to the end of the region
			0 if to_eof => (available, false),
			0 => err!(BadAtom("Found an atom with a length of 0 inside of a container")),
			// There's an extended length
			1 => {
				if available < EXTENDED_ATOM_HEADER_LEN {
					err!(TruncatedHeader);
				}

				(data.read_u64::<BigEndian>().map_err(truncated)?, true)
			},
			_ => (len_raw, false),
		};

		let header_len = header_len(extended);
		if len < header_len {
			// Seek to the end, since we can't recover from this
			data.seek(SeekFrom::End(0))?;

			err!(BadAtom("Found an invalid length (< header size)"));
		}

		if len > available {
			err!(SizeMismatch);
		}

		Ok(Self {
			start,
			len,
			extended,
			ident,
		})
	}

	pub(crate) fn header_size(&self) -> u64 {
		header_len(self.extended)
	}
}

pub(crate) fn header_len(extended: bool) -> u64 {
	if extended {
		EXTENDED_ATOM_HEADER_LEN
	} else {
		ATOM_HEADER_LEN
	}
}

/// Render an atom header for a payload of `payload_len` bytes
///
/// The 64-bit form is only used when the total size can't fit in 32 bits, or when `extended` is set.
pub(crate) fn render_header(ident: [u8; 4], payload_len: u64, extended: bool) -> Result<Vec<u8>> {
	let mut header = Vec::with_capacity(EXTENDED_ATOM_HEADER_LEN as usize);

	if !extended {
		if let Some(size) = payload_len
			.checked_add(ATOM_HEADER_LEN)
			.and_then(|size| u32::try_from(size).ok())
		{
			header.write_u32::<BigEndian>(size)?;
			header.write_all(&ident)?;
			return Ok(header);
		}
	}

	let Some(size) = payload_len.checked_add(EXTENDED_ATOM_HEADER_LEN) else {
		err!(PayloadTooLarge);
	};

	// 0001 (identifier) ????????
	header.write_u32::<BigEndian>(1)?;
	header.write_all(&ident)?;
	header.write_u64::<BigEndian>(size)?;

	Ok(header)
}

/// Render an atom, choosing the smallest header that can describe it
///
/// # Errors
///
/// * [`ErrorKind::PayloadTooLarge`](crate::error::ErrorKind::PayloadTooLarge) if even a 64-bit size
///   can't describe the atom
///
/// # Examples
///
/// ```rust
/// use tagsplice::mp4::render;
///
/// # fn main() -> tagsplice::error::Result<()> {
/// let atom = render(*b"free", &[0; 4])?;
/// assert_eq!(atom, b"\x00\x00\x00\x0Cfree\x00\x00\x00\x00");
/// # Ok(()) }
/// ```
pub fn render(ident: [u8; 4], payload: &[u8]) -> Result<Vec<u8>> {
	render_with(ident, payload, false)
}

/// Render an atom, optionally forcing a 64-bit header
///
/// # Errors
///
/// See [`render`]
///
/// # Examples
///
/// ```rust
/// use tagsplice::mp4::render_with;
///
/// # fn main() -> tagsplice::error::Result<()> {
/// let atom = render_with(*b"mdat", b"ab", true)?;
/// assert_eq!(atom, b"\x00\x00\x00\x01mdat\x00\x00\x00\x00\x00\x00\x00\x12ab");
/// # Ok(()) }
/// ```
pub fn render_with(ident: [u8; 4], payload: &[u8], extended: bool) -> Result<Vec<u8>> {
	let mut atom = render_header(ident, payload.len() as u64, extended)?;
	atom.try_reserve_exact(payload.len())?;
	atom.extend_from_slice(payload);

	Ok(atom)
}

/// Write an atom's size over an existing header at `start`
///
/// NOTE: The header form can't change here, the caller has to verify that `size` fits.
pub(crate) fn write_atom_size<W>(writer: &mut W, start: u64, size: u64, extended: bool) -> Result<()>
where
	W: Write + Seek,
{
	writer.seek(SeekFrom::Start(start))?;

	if !extended {
		let Ok(size) = u32::try_from(size) else {
			err!(PayloadTooLarge);
		};

		writer.write_u32::<BigEndian>(size)?;
		return Ok(());
	}

	// Extended size indicator, identifier, then the actual size
	writer.write_u32::<BigEndian>(1)?;
	writer.seek(SeekFrom::Current(IDENTIFIER_LEN as i64))?;
	writer.write_u64::<BigEndian>(size)?;

	Ok(())
}
