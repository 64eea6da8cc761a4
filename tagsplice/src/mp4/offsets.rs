use super::tree::{AtomNode, AtomTree};
use crate::error::Result;
use crate::macros::{err, try_vec};
use crate::splice::BUFFER_SIZE;

use std::io::{Read, Seek, SeekFrom, Write};
use std::ops::Range;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

// Version (1) + flags (3) + entry count (4)
const TABLE_HEADER_LEN: u64 = 8;

// `base_data_offset` is present in `tfhd`
const TFHD_BASE_DATA_OFFSET_PRESENT: u32 = 0x01;

/// A shift of every absolute file offset that points at or after `boundary`
///
/// Tables positioned within `skip` are left alone, they are either about to be overwritten or
/// were just written by the caller.
pub(crate) struct OffsetShift {
	pub(crate) boundary: u64,
	pub(crate) delta: i64,
	pub(crate) skip: Range<u64>,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Pass {
	Check,
	Apply,
}

/// Verify that every offset can be shifted, without writing anything
///
/// The tree must still reflect the positions *before* the resize.
pub(crate) fn check_offsets<F>(file: &mut F, tree: &AtomTree, shift: &OffsetShift) -> Result<()>
where
	F: Read + Write + Seek,
{
	visit_offsets(file, tree, shift, Pass::Check)
}

/// Shift every absolute file offset that points at or after the boundary
///
/// This covers the chunk offset tables (`stco`, `co64`) of every track, as well as the base data
/// offset of every track fragment (`tfhd`).
///
/// The tree must already reflect the positions *after* the resize, and the same shift must have
/// passed [`check_offsets`].
pub(crate) fn update_offsets<F>(file: &mut F, tree: &AtomTree, shift: &OffsetShift) -> Result<()>
where
	F: Read + Write + Seek,
{
	visit_offsets(file, tree, shift, Pass::Apply)
}

fn visit_offsets<F>(file: &mut F, tree: &AtomTree, shift: &OffsetShift, pass: Pass) -> Result<()>
where
	F: Read + Write + Seek,
{
	let nodes = |ident: [u8; 4]| {
		tree.find_all(ident)
			.filter_map(|id| tree.get(id))
			.filter(|node| !shift.skip.contains(&node.position()))
	};

	for node in nodes(*b"stco") {
		visit_table::<F, u32>(file, node, shift, pass)?;
	}

	for node in nodes(*b"co64") {
		visit_table::<F, u64>(file, node, shift, pass)?;
	}

	for node in nodes(*b"tfhd") {
		visit_tfhd(file, node, shift, pass)?;
	}

	Ok(())
}

// An entry in a chunk offset table
trait ChunkOffset: Sized + Copy + Into<u64> + TryFrom<u64> {
	const WIDTH: usize;

	fn from_be_slice(bytes: &[u8]) -> Self;
	fn to_be_vec(self) -> Vec<u8>;
}

impl ChunkOffset for u32 {
	const WIDTH: usize = 4;

	fn from_be_slice(bytes: &[u8]) -> Self {
		let mut raw = [0; 4];
		raw.copy_from_slice(bytes);
		u32::from_be_bytes(raw)
	}

	fn to_be_vec(self) -> Vec<u8> {
		self.to_be_bytes().to_vec()
	}
}

impl ChunkOffset for u64 {
	const WIDTH: usize = 8;

	fn from_be_slice(bytes: &[u8]) -> Self {
		let mut raw = [0; 8];
		raw.copy_from_slice(bytes);
		u64::from_be_bytes(raw)
	}

	fn to_be_vec(self) -> Vec<u8> {
		self.to_be_bytes().to_vec()
	}
}

fn shift_offset(offset: u64, shift: &OffsetShift) -> Result<Option<u64>> {
	if offset < shift.boundary {
		return Ok(None);
	}

	match offset.checked_add_signed(shift.delta) {
		Some(shifted) => Ok(Some(shifted)),
		None => err!(TooMuchData),
	}
}

fn visit_table<F, T>(file: &mut F, node: &AtomNode, shift: &OffsetShift, pass: Pass) -> Result<()>
where
	F: Read + Write + Seek,
	T: ChunkOffset,
{
	if node.payload_len() < TABLE_HEADER_LEN {
		err!(BadAtom("Chunk offset table is too small"));
	}

	file.seek(SeekFrom::Start(node.data_offset() + 4))?;
	let entry_count = u64::from(file.read_u32::<BigEndian>()?);

	let width = T::WIDTH as u64;
	let Some(table_len) = entry_count.checked_mul(width) else {
		err!(SizeMismatch);
	};

	if table_len > node.payload_len() - TABLE_HEADER_LEN {
		err!(SizeMismatch);
	}

	log::trace!(
		"MP4: Visiting {entry_count} chunk offsets in {:?} at {}",
		String::from_utf8_lossy(&node.ident()),
		node.position()
	);

	let entries_start = node.data_offset() + TABLE_HEADER_LEN;
	let entries_per_block = (BUFFER_SIZE / T::WIDTH) as u64;

	let mut done = 0;
	while done < entry_count {
		let block_entries = (entry_count - done).min(entries_per_block);
		let block_start = entries_start + done * width;

		let mut block = try_vec![0; (block_entries * width) as usize];
		file.seek(SeekFrom::Start(block_start))?;
		file.read_exact(&mut block)?;

		let mut changed = false;
		for entry in block.chunks_exact_mut(T::WIDTH) {
			let offset: u64 = T::from_be_slice(entry).into();
			let Some(shifted) = shift_offset(offset, shift)? else {
				continue;
			};

			let Ok(shifted) = T::try_from(shifted) else {
				err!(TooMuchData);
			};

			entry.copy_from_slice(&shifted.to_be_vec());
			changed = true;
		}

		if changed && pass == Pass::Apply {
			file.seek(SeekFrom::Start(block_start))?;
			file.write_all(&block)?;
		}

		done += block_entries;
	}

	Ok(())
}

fn visit_tfhd<F>(file: &mut F, node: &AtomNode, shift: &OffsetShift, pass: Pass) -> Result<()>
where
	F: Read + Write + Seek,
{
	if node.payload_len() < TABLE_HEADER_LEN {
		err!(BadAtom("Track fragment header is too small"));
	}

	file.seek(SeekFrom::Start(node.data_offset() + 1))?;
	let flags = file.read_u24::<BigEndian>()?;

	if flags & TFHD_BASE_DATA_OFFSET_PRESENT == 0 {
		return Ok(());
	}

	// Skip the track ID
	if node.payload_len() < TABLE_HEADER_LEN + 8 {
		err!(BadAtom("Track fragment header is missing its base data offset"));
	}

	let offset_pos = node.data_offset() + TABLE_HEADER_LEN;
	file.seek(SeekFrom::Start(offset_pos))?;
	let offset = file.read_u64::<BigEndian>()?;

	let Some(shifted) = shift_offset(offset, shift)? else {
		return Ok(());
	};

	if pass == Pass::Apply {
		log::trace!("MP4: Updating tfhd base data offset, {offset} -> {shifted}");

		file.seek(SeekFrom::Start(offset_pos))?;
		file.write_u64::<BigEndian>(shifted)?;
	}

	Ok(())
}
