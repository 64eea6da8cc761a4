use super::constants::{
	ENUM_IDENTS, FLAG_IDENTS, FREEFORM_IDENT, INTEGER_PAIR_IDENTS, WELL_KNOWN_TYPE_SET,
};
use super::data_type::DataType;
use super::{Atom, AtomData, AtomIdent, Ilst};
use crate::config::{ParseOptions, ParsingMode};
use crate::error::Result;
use crate::macros::{err, parse_mode_choice};
use crate::mp4::atom_info::{ATOM_HEADER_LEN, AtomInfo};
use crate::util::text::{utf8_decode, utf16_be_decode_bytes};

use std::io::Cursor;

// Type set (1) + type (3) + locale (4)
const DATA_PREFIX_LEN: usize = 8;

// A child atom of an item, as a range into the item's payload
struct ItemChild {
	ident: [u8; 4],
	start: usize,
	end: usize,
}

pub(super) fn parse_ilst(contents: &[u8], parse_options: ParseOptions) -> Result<Ilst> {
	let parsing_mode = parse_options.parsing_mode;

	let mut tag = Ilst::default();
	for child in child_atoms(contents, parsing_mode)? {
		if matches!(&child.ident, b"free" | b"skip") {
			continue;
		}

		let item_payload = &contents[child.start..child.end];
		let item = if child.ident == FREEFORM_IDENT {
			parse_freeform(item_payload, parsing_mode)
		} else {
			parse_item(child.ident, item_payload, parsing_mode)
		};

		match item {
			Ok(Some(atom)) => tag.atoms.push(atom),
			Ok(None) => {},
			Err(e) => {
				parse_mode_choice!(
					parsing_mode,
					STRICT: return Err(e),
					DEFAULT: log::warn!(
						"MP4: Skipping item {:?}: {e}",
						AtomIdent::Fourcc(child.ident)
					)
				);
			},
		}
	}

	log::debug!("MP4: Read {} items from ilst", tag.atoms.len());
	Ok(tag)
}

// Lists the atoms in `contents`, stopping at the first one that can't be read
fn child_atoms(contents: &[u8], parsing_mode: ParsingMode) -> Result<Vec<ItemChild>> {
	let len = contents.len() as u64;
	let mut cursor = Cursor::new(contents);

	let mut children = Vec::new();
	let mut pos = 0;
	while pos < len {
		let remaining = len - pos;
		if remaining < ATOM_HEADER_LEN {
			log::warn!("MP4: Ignoring {remaining} trailing bytes in ilst");
			break;
		}

		cursor.set_position(pos);
		let info = match AtomInfo::read(&mut cursor, remaining, false) {
			Ok(info) => info,
			Err(e) => {
				parse_mode_choice!(
					parsing_mode,
					STRICT: return Err(e),
					DEFAULT: {
						log::warn!("MP4: Unable to read an atom in ilst, stopping: {e}");
						break;
					}
				);
			},
		};

		children.push(ItemChild {
			ident: info.ident,
			start: (pos + info.header_size()) as usize,
			end: (pos + info.len) as usize,
		});

		pos += info.len;
	}

	Ok(children)
}

fn parse_item(ident: [u8; 4], contents: &[u8], parsing_mode: ParsingMode) -> Result<Option<Atom>> {
	let raw = parse_data_atoms(contents, &child_atoms(contents, parsing_mode)?, parsing_mode)?;

	let mut data = Vec::with_capacity(raw.len());
	for (code, content) in raw {
		data.push(interpret(ident, code, content, parsing_mode)?);
	}

	Ok(Atom::from_collection(AtomIdent::Fourcc(ident), data))
}

// ---- items are `mean`, then `name`, then any number of `data` atoms
fn parse_freeform(contents: &[u8], parsing_mode: ParsingMode) -> Result<Option<Atom>> {
	let children = child_atoms(contents, parsing_mode)?;

	let (Some(mean), Some(name)) = (children.first(), children.get(1)) else {
		err!(BadAtom("Freeform item is missing its \"mean\" or \"name\""));
	};

	if &mean.ident != b"mean" || &name.ident != b"name" {
		err!(BadAtom("Freeform item does not start with \"mean\" and \"name\""));
	}

	let mean = freeform_string(&contents[mean.start..mean.end])?;
	let name = freeform_string(&contents[name.start..name.end])?;

	let raw = parse_data_atoms(contents, &children[2..], parsing_mode)?;

	let mut data = Vec::with_capacity(raw.len());
	for (code, content) in raw {
		data.push(interpret_generic(code, content)?);
	}

	Ok(Atom::from_collection(AtomIdent::Freeform { mean, name }, data))
}

// `mean` and `name` are full atoms
fn freeform_string(contents: &[u8]) -> Result<String> {
	let Some(text) = contents.get(4..) else {
		err!(BadAtom("Freeform item has a truncated \"mean\" or \"name\""));
	};

	utf8_decode(text.to_vec())
}

fn parse_data_atoms(
	contents: &[u8],
	children: &[ItemChild],
	parsing_mode: ParsingMode,
) -> Result<Vec<(DataType, Vec<u8>)>> {
	let mut ret = Vec::new();

	for child in children {
		if &child.ident != b"data" {
			parse_mode_choice!(
				parsing_mode,
				RELAXED: {
					log::warn!(
						"MP4: Skipping unexpected atom {:?} in an item",
						AtomIdent::Fourcc(child.ident)
					);
					continue;
				},
				DEFAULT: err!(BadAtom("Expected atom \"data\" to follow item"))
			);
		}

		let payload = &contents[child.start..child.end];

		if payload.len() < DATA_PREFIX_LEN {
			parse_mode_choice!(
				parsing_mode,
				STRICT: err!(BadAtom("Data atom is too small")),
				DEFAULT: break
			);
		}

		if payload.len() == DATA_PREFIX_LEN {
			log::warn!("MP4: Skipping empty \"data\" atom");
			continue;
		}

		let type_set = payload[0];
		if type_set != WELL_KNOWN_TYPE_SET {
			parse_mode_choice!(
				parsing_mode,
				STRICT: err!(BadAtom("Unknown type set in data atom")),
				DEFAULT: {
					log::warn!("MP4: Skipping \"data\" atom with an unknown type set: {type_set}");
					continue;
				}
			);
		}

		let code = u32::from_be_bytes([0, payload[1], payload[2], payload[3]]);
		ret.push((DataType::from(code), payload[DATA_PREFIX_LEN..].to_vec()));
	}

	Ok(ret)
}

fn interpret(
	ident: [u8; 4],
	code: DataType,
	content: Vec<u8>,
	parsing_mode: ParsingMode,
) -> Result<AtomData> {
	if FLAG_IDENTS.contains(&ident) {
		// Any size integer is technically valid, it's corrected on write
		return Ok(AtomData::Bool(content.iter().any(|&b| b != 0)));
	}

	if INTEGER_PAIR_IDENTS.contains(&ident) && code == DataType::Reserved {
		if content.len() >= 6 {
			let first = u16::from_be_bytes([content[2], content[3]]);
			let second = u16::from_be_bytes([content[4], content[5]]);
			return Ok(AtomData::IntegerPair(first, second));
		}

		if parsing_mode == ParsingMode::Strict {
			err!(BadAtom("Integer pair is too small"));
		}
	}

	if ENUM_IDENTS.contains(&ident)
		&& code == DataType::BeSignedInteger
		&& (1..=4).contains(&content.len())
	{
		let value = content
			.iter()
			.fold(0u32, |acc, &b| (acc << 8) | u32::from(b));
		return Ok(AtomData::Enum {
			width: content.len() as u8,
			value,
		});
	}

	interpret_generic(code, content)
}

fn interpret_generic(code: DataType, content: Vec<u8>) -> Result<AtomData> {
	let data = match code {
		DataType::Utf8 => AtomData::Utf8(utf8_decode(content)?),
		DataType::Utf16 => AtomData::Utf16(utf16_be_decode_bytes(&content)?),
		DataType::BeSignedInteger => AtomData::SignedInteger(read_signed(&content)?),
		DataType::BeUnsignedInteger => AtomData::UnsignedInteger(read_unsigned(&content)?),
		code => AtomData::Binary {
			code,
			data: content,
		},
	};

	Ok(data)
}

fn read_unsigned(content: &[u8]) -> Result<u64> {
	if content.is_empty() || content.len() > 8 {
		err!(BadAtom("Unexpected integer width"));
	}

	Ok(content
		.iter()
		.fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
}

fn read_signed(content: &[u8]) -> Result<i64> {
	let unsigned = read_unsigned(content)?;

	// Sign extend from the stored width
	let shift = 64 - content.len() as u32 * 8;
	Ok(((unsigned << shift) as i64) >> shift)
}
