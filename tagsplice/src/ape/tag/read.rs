use super::ApeTag;
use super::item::ApeItem;
use crate::ape::TagLocation;
use crate::ape::constants::FLAG_READ_ONLY;
use crate::config::ParseOptions;
use crate::error::{Result, truncated};
use crate::macros::{decode_err, err, parse_mode_choice, try_vec};
use crate::tag::ItemValue;

use std::io::{Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};

// Size (4) + flags (4) + a terminated key of at least 2 bytes
const MIN_ITEM_SIZE: u64 = 11;

pub(crate) fn read_ape_tag<R>(
	data: &mut R,
	location: &TagLocation,
	parse_options: ParseOptions,
) -> Result<ApeTag>
where
	R: Read + Seek,
{
	let parsing_mode = parse_options.parsing_mode;

	let (Some(items_start), Some(end)) = (location.data, location.end) else {
		err!(NoTagFound);
	};

	// The items end at the footer, or the end of the tag if there isn't one
	let items_end = location.footer.unwrap_or(end);
	let mut remaining_size = items_end.saturating_sub(items_start);

	data.seek(SeekFrom::Start(items_start))?;

	let mut tag = ApeTag {
		read_only: location.flags & FLAG_READ_ONLY != 0,
		items: Vec::new(),
	};

	for _ in 0..location.item_count {
		if remaining_size < MIN_ITEM_SIZE {
			log::warn!(
				"APE: Tag declares {} items, but ran out of space after {}",
				location.item_count,
				tag.items.len()
			);
			break;
		}

		let value_size = data.read_u32::<LittleEndian>().map_err(truncated)?;
		let flags = data.read_u32::<LittleEndian>().map_err(truncated)?;
		remaining_size -= 8;

		let kind = (flags >> 1) & 3;
		if kind == 3 {
			err!(InvalidItemKind(kind));
		}

		let mut key = Vec::new();
		let mut key_char = data.read_u8().map_err(truncated)?;
		remaining_size -= 1;

		while key_char != 0 {
			if remaining_size == 0 {
				decode_err!(@BAIL Ape, "APE tag item key is not terminated");
			}

			key.push(key_char);
			key_char = data.read_u8().map_err(truncated)?;
			remaining_size -= 1;
		}

		if u64::from(value_size) > remaining_size {
			err!(SizeMismatch);
		}

		let mut value = try_vec![0; value_size as usize];
		data.read_exact(&mut value).map_err(truncated)?;
		remaining_size -= u64::from(value_size);

		let Ok(key) = String::from_utf8(key) else {
			parse_mode_choice!(
				parsing_mode,
				STRICT: decode_err!(@BAIL Ape, "APE tag item contains a non UTF-8 key"),
				DEFAULT: {
					log::warn!("APE: Skipping an item with a non UTF-8 key");
					continue;
				}
			);
		};

		let parsed_value = match kind {
			0 => ItemValue::Text(decode_text(value, parse_options)?),
			1 => ItemValue::Binary(value),
			_ => ItemValue::Locator(decode_text(value, parse_options)?),
		};

		let mut item = match ApeItem::new(key, parsed_value) {
			Ok(item) => item,
			Err(e) => {
				parse_mode_choice!(
					parsing_mode,
					STRICT: return Err(e),
					DEFAULT: {
						log::warn!("APE: Skipping an item with an illegal key");
						continue;
					}
				);
			},
		};

		item.read_only = flags & FLAG_READ_ONLY != 0;
		tag.insert(item);
	}

	Ok(tag)
}

fn decode_text(value: Vec<u8>, parse_options: ParseOptions) -> Result<String> {
	match String::from_utf8(value) {
		Ok(text) => Ok(text),
		Err(e) => {
			let parsing_mode = parse_options.parsing_mode;
			parse_mode_choice!(
				parsing_mode,
				STRICT: decode_err!(@BAIL Ape, "Failed to convert text item into a UTF-8 string"),
				DEFAULT: {
					log::warn!("APE: Text item is not valid UTF-8, replacing invalid sequences");
					Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
				}
			)
		},
	}
}
