use super::constants::WELL_KNOWN_TYPE_SET;
use super::data_type::DataType;
use super::{Atom, AtomData, AtomIdent, Ilst};
use crate::config::{ParseOptions, WriteOptions};
use crate::error::{ErrorKind, Result};
use crate::macros::{encode_err, err, try_vec};
use crate::mp4::atom_info::{ATOM_HEADER_LEN, render};
use crate::mp4::tree::{AtomId, AtomTree};
use crate::splice::SpliceTarget;
use crate::util::text::utf16_be_encode;

use std::io::{SeekFrom, Write};

use byteorder::{BigEndian, WriteBytesExt};

// Version (1) + flags (3), pre-defined (4), handler type (4), reserved (12), empty name (1)
const HDLR_PAYLOAD: &[u8; 25] = b"\x00\x00\x00\x00\x00\x00\x00\x00mdirappl\x00\x00\x00\x00\x00\x00\x00\x00\x00";

pub(crate) fn write_to<F>(file: &mut F, tag: &Ilst, write_options: WriteOptions) -> Result<()>
where
	F: SpliceTarget,
{
	log::debug!("MP4: Attempting to write `ilst` tag to file");

	if tag.atoms.is_empty() {
		log::debug!("MP4: Tag is empty, removing `ilst` instead");
		return remove_from(file);
	}

	let ilst = build_ilst(&tag.atoms)?;

	file.rewind()?;
	let mut tree = AtomTree::read_from(file, ParseOptions::new())?;

	let moov = match tree.find("moov") {
		Ok(moov) => moov,
		Err(e) if matches!(e.kind(), ErrorKind::NotFound) => {
			encode_err!(@BAIL Mp4Ilst, "Could not find \"moov\" atom in target file")
		},
		Err(e) => return Err(e),
	};

	let padding = free_atom(write_options.preferred_padding)?;

	let Some(udta) = tree.find_child(moov, *b"udta") else {
		log::trace!("MP4: No `udta` atom found, creating one");

		let udta = render(*b"udta", &create_meta(&ilst, &padding)?)?;
		tree.insert_child(file, moov, 0, &udta)?;
		return Ok(());
	};

	let Some(meta) = tree.find_child(udta, *b"meta") else {
		log::trace!("MP4: No `meta` atom found, creating one");

		tree.insert_child(file, udta, 0, &create_meta(&ilst, &padding)?)?;
		return Ok(());
	};

	let Some(existing_ilst) = tree.find_child(meta, *b"ilst") else {
		log::trace!("MP4: No `ilst` atom found, appending one to `meta`");

		let mut payload = tree.read_payload(file, meta)?;
		payload.extend_from_slice(&ilst);
		payload.extend_from_slice(&padding);

		return tree.replace(file, meta, &payload);
	};

	save_to_existing(file, &mut tree, meta, existing_ilst, &ilst, &padding)
}

fn save_to_existing<F>(
	file: &mut F,
	tree: &mut AtomTree,
	meta: AtomId,
	existing_ilst: AtomId,
	ilst: &[u8],
	padding: &[u8],
) -> Result<()>
where
	F: SpliceTarget,
{
	let (range_start, range_end) = padded_range(tree, meta, existing_ilst);

	let available_space = range_end - range_start;
	let ilst_len = ilst.len() as u64;

	// Check if the `ilst` atom and a new `free` atom fit in the existing padding
	if available_space == ilst_len || available_space >= ilst_len + ATOM_HEADER_LEN {
		log::trace!("MP4: Found enough padding to fit the tag, file size will not change");

		let remaining_space = available_space - ilst_len;
		let Ok(remaining_space) = u32::try_from(remaining_space) else {
			err!(TooMuchData);
		};

		file.seek(SeekFrom::Start(range_start))?;
		file.write_all(ilst)?;
		if remaining_space > 0 {
			write_free_atom(file, remaining_space)?;
		}

		file.flush()?;
		return Ok(());
	}

	log::trace!("MP4: Not enough padding, rewriting `meta`");

	let Some(meta_node) = tree.get(meta) else {
		err!(NotFound);
	};
	let data_offset = meta_node.data_offset();

	let payload = tree.read_payload(file, meta)?;
	let prefix_len = (range_start - data_offset) as usize;
	let suffix_start = (range_end - data_offset) as usize;

	let mut new_payload = Vec::with_capacity(
		prefix_len + ilst.len() + padding.len() + (payload.len() - suffix_start),
	);
	new_payload.extend_from_slice(&payload[..prefix_len]);
	new_payload.extend_from_slice(ilst);
	new_payload.extend_from_slice(padding);
	new_payload.extend_from_slice(&payload[suffix_start..]);

	tree.replace(file, meta, &new_payload)
}

// The span of the `ilst` atom, including any `free` atoms directly before or after it
fn padded_range(tree: &AtomTree, meta: AtomId, ilst: AtomId) -> (u64, u64) {
	let siblings = tree.children(meta);
	let is_free = |id: &AtomId| tree.get(*id).is_some_and(|node| node.ident() == *b"free");

	let Some(ilst_idx) = siblings.iter().position(|id| *id == ilst) else {
		return (0, 0);
	};

	let first = siblings[..ilst_idx]
		.iter()
		.rev()
		.take_while(|id| is_free(id))
		.last()
		.copied()
		.unwrap_or(ilst);

	let last = siblings[ilst_idx + 1..]
		.iter()
		.take_while(|id| is_free(id))
		.last()
		.copied()
		.unwrap_or(ilst);

	let start = tree.get(first).map_or(0, |node| node.position());
	let end = tree.get(last).map_or(0, |node| node.end());

	log::trace!("MP4: Existing `ilst` with padding spans {start}..{end}");
	(start, end)
}

pub(crate) fn remove_from<F>(file: &mut F) -> Result<()>
where
	F: SpliceTarget,
{
	file.rewind()?;
	let mut tree = AtomTree::read_from(file, ParseOptions::new())?;

	let ilst = match tree.find("moov.udta.meta.ilst") {
		Ok(ilst) => ilst,
		Err(e) if matches!(e.kind(), ErrorKind::NotFound) => return Ok(()),
		Err(e) => return Err(e),
	};

	log::debug!("MP4: Removing `ilst` atom");
	tree.remove(file, ilst)
}

// `meta` + `hdlr` + `ilst` + `free`
fn create_meta(ilst: &[u8], padding: &[u8]) -> Result<Vec<u8>> {
	let hdlr = render(*b"hdlr", HDLR_PAYLOAD)?;

	let mut payload = Vec::with_capacity(4 + hdlr.len() + ilst.len() + padding.len());
	payload.extend_from_slice(&[0; 4]);
	payload.extend_from_slice(&hdlr);
	payload.extend_from_slice(ilst);
	payload.extend_from_slice(padding);

	render(*b"meta", &payload)
}

fn free_atom(preferred_padding: Option<u32>) -> Result<Vec<u8>> {
	match preferred_padding {
		Some(size) if u64::from(size) >= ATOM_HEADER_LEN => {
			let mut atom = Vec::new();
			write_free_atom(&mut atom, size)?;
			Ok(atom)
		},
		_ => Ok(Vec::new()),
	}
}

fn write_free_atom<W>(writer: &mut W, size: u32) -> Result<()>
where
	W: Write,
{
	writer.write_u32::<BigEndian>(size)?;
	writer.write_all(b"free")?;
	writer.write_all(&try_vec![0; (size - ATOM_HEADER_LEN as u32) as usize])?;
	Ok(())
}

pub(super) fn build_ilst(atoms: &[Atom]) -> Result<Vec<u8>> {
	log::debug!("MP4: Building `ilst` atom");

	let mut items = Vec::new();
	for atom in atoms {
		items.extend(render_item(atom)?);
	}

	render(*b"ilst", &items)
}

fn render_item(atom: &Atom) -> Result<Vec<u8>> {
	let mut payload = Vec::new();

	let ident = match &atom.ident {
		AtomIdent::Fourcc(fourcc) => *fourcc,
		AtomIdent::Freeform { mean, name } => {
			payload.extend(render_full(*b"mean", mean.as_bytes())?);
			payload.extend(render_full(*b"name", name.as_bytes())?);
			*b"----"
		},
	};

	for data in &atom.data {
		let (code, value) = encode_data(&atom.ident, data)?;
		payload.extend(render_data(code, &value)?);
	}

	render(ident, &payload)
}

// A full atom with a version and flags of 0
fn render_full(ident: [u8; 4], content: &[u8]) -> Result<Vec<u8>> {
	let mut payload = Vec::with_capacity(4 + content.len());
	payload.extend_from_slice(&[0; 4]);
	payload.extend_from_slice(content);

	render(ident, &payload)
}

fn render_data(code: DataType, value: &[u8]) -> Result<Vec<u8>> {
	let code = u32::from(code);
	if code > DataType::MAX {
		encode_err!(@BAIL Mp4Ilst, "Data type code does not fit in 24 bits");
	}

	let mut payload = Vec::with_capacity(8 + value.len());
	payload.write_u8(WELL_KNOWN_TYPE_SET)?;
	payload.write_u24::<BigEndian>(code)?;
	// Locale
	payload.write_u32::<BigEndian>(0)?;
	payload.extend_from_slice(value);

	render(*b"data", &payload)
}

fn encode_data(ident: &AtomIdent, data: &AtomData) -> Result<(DataType, Vec<u8>)> {
	let encoded = match data {
		AtomData::Utf8(text) => (DataType::Utf8, text.as_bytes().to_vec()),
		AtomData::Utf16(text) => (DataType::Utf16, utf16_be_encode(text)),
		AtomData::SignedInteger(int) => (DataType::BeSignedInteger, minimal_signed(*int)),
		AtomData::UnsignedInteger(uint) => (DataType::BeUnsignedInteger, minimal_unsigned(*uint)),
		AtomData::Bool(flag) => (DataType::BeSignedInteger, vec![u8::from(*flag)]),
		AtomData::IntegerPair(first, second) => {
			let mut value = Vec::with_capacity(8);
			value.write_u16::<BigEndian>(0)?;
			value.write_u16::<BigEndian>(*first)?;
			value.write_u16::<BigEndian>(*second)?;

			// `disk` doesn't have the trailing reserved bytes
			if *ident != AtomIdent::Fourcc(*b"disk") {
				value.write_u16::<BigEndian>(0)?;
			}

			(DataType::Reserved, value)
		},
		AtomData::Enum { width, value } => {
			let width = usize::from(*width);
			if !(1..=4).contains(&width) {
				encode_err!(@BAIL Mp4Ilst, "Enum width must be between 1 and 4 bytes");
			}

			let bytes = value.to_be_bytes();
			if bytes[..4 - width].iter().any(|b| *b != 0) {
				encode_err!(@BAIL Mp4Ilst, "Enum value does not fit in its width");
			}

			(DataType::BeSignedInteger, bytes[4 - width..].to_vec())
		},
		AtomData::Binary { code, data } => (*code, data.clone()),
	};

	Ok(encoded)
}

fn minimal_signed(int: i64) -> Vec<u8> {
	if let Ok(int) = i8::try_from(int) {
		int.to_be_bytes().to_vec()
	} else if let Ok(int) = i16::try_from(int) {
		int.to_be_bytes().to_vec()
	} else if let Ok(int) = i32::try_from(int) {
		int.to_be_bytes().to_vec()
	} else {
		int.to_be_bytes().to_vec()
	}
}

fn minimal_unsigned(uint: u64) -> Vec<u8> {
	if let Ok(uint) = u8::try_from(uint) {
		uint.to_be_bytes().to_vec()
	} else if let Ok(uint) = u16::try_from(uint) {
		uint.to_be_bytes().to_vec()
	} else if let Ok(uint) = u32::try_from(uint) {
		uint.to_be_bytes().to_vec()
	} else {
		uint.to_be_bytes().to_vec()
	}
}
