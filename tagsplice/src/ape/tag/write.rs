use super::ApeTag;
use crate::ape::TagLocation;
use crate::ape::constants::{
	APE_HEADER_SIZE, APE_VERSION_2, FLAG_HAS_HEADER, FLAG_IS_HEADER, FLAG_READ_ONLY,
};
use crate::ape::header::ApeHeader;
use crate::config::{ParseOptions, WriteOptions};
use crate::error::{ErrorKind, Result};
use crate::macros::err;
use crate::splice::{SpliceTarget, delete_bytes};
use crate::util::io::set_file_len;

use std::io::{SeekFrom, Write};

use byteorder::{LittleEndian, WriteBytesExt};

pub(crate) fn write_to<F>(file: &mut F, tag: &ApeTag, write_options: WriteOptions) -> Result<()>
where
	F: SpliceTarget,
{
	// Build the tag first, nothing can fail after the file is touched except I/O
	let tag_bytes = create_ape_tag(tag)?;

	if let Some(location) = find_existing(file)? {
		if write_options.respect_read_only && location.is_read_only() {
			err!(ReadOnly);
		}

		let (Some(start), Some(end)) = (location.start, location.end) else {
			err!(NoTagFound);
		};

		if location.is_at_start {
			log::debug!("APE: Removing tag from the start of the file ({} bytes)", end - start);
			delete_bytes(file, end - start, start)?;
		} else {
			// Anything after the tag (ID3v1, Lyrics3v2) goes with it
			log::debug!("APE: Truncating the file at the existing tag ({start})");
			set_file_len(file, start)?;
		}
	}

	file.seek(SeekFrom::End(0))?;
	file.write_all(&tag_bytes)?;
	file.flush()?;

	Ok(())
}

pub(crate) fn remove_from<F>(file: &mut F) -> Result<()>
where
	F: SpliceTarget,
{
	let Some(location) = find_existing(file)? else {
		return Ok(());
	};

	if let (Some(start), Some(end)) = (location.start, location.end) {
		log::debug!("APE: Removing tag spanning {start}..{end}");
		delete_bytes(file, end - start, start)?;
	}

	Ok(())
}

fn find_existing<F>(file: &mut F) -> Result<Option<TagLocation>>
where
	F: SpliceTarget,
{
	match TagLocation::locate(file, ParseOptions::new()) {
		Ok(location) => Ok(Some(location)),
		Err(e) if matches!(e.kind(), ErrorKind::NoTagFound) => Ok(None),
		Err(e) => Err(e),
	}
}

pub(super) fn create_ape_tag(tag: &ApeTag) -> Result<Vec<u8>> {
	let mut items = Vec::with_capacity(tag.items.len());

	for item in &tag.items {
		let value = item.value.as_bytes();
		let Ok(value_len) = u32::try_from(value.len()) else {
			err!(TooMuchData);
		};

		let mut item_bytes = Vec::with_capacity(9 + item.key.len() + value.len());
		item_bytes.write_u32::<LittleEndian>(value_len)?;
		item_bytes.write_u32::<LittleEndian>(item.flags())?;
		item_bytes.write_all(item.key.as_bytes())?;
		item_bytes.write_u8(0)?;
		item_bytes.write_all(value)?;

		items.push(item_bytes);
	}

	// Smaller items first, as recommended for APEv2
	items.sort_by_key(Vec::len);

	let items_len: usize = items.iter().map(Vec::len).sum();
	let Ok(size) = u32::try_from(items_len as u64 + APE_HEADER_SIZE) else {
		err!(TooMuchData);
	};
	let Ok(item_count) = u32::try_from(items.len()) else {
		err!(TooMuchData);
	};

	let read_only = if tag.read_only { FLAG_READ_ONLY } else { 0 };

	let mut footer = ApeHeader {
		version: APE_VERSION_2,
		size,
		item_count,
		flags: FLAG_HAS_HEADER | FLAG_IS_HEADER | read_only,
	};

	let mut tag_bytes = Vec::with_capacity(items_len + 2 * APE_HEADER_SIZE as usize);

	// The header is the same as the footer, except for the flags
	footer.write_to(&mut tag_bytes)?;
	for item in items {
		tag_bytes.extend(item);
	}

	footer.flags = FLAG_HAS_HEADER | read_only;
	footer.write_to(&mut tag_bytes)?;

	Ok(tag_bytes)
}

#[cfg(test)]
mod tests {
	use super::create_ape_tag;
	use crate::ape::{ApeItem, ApeTag};
	use crate::tag::ItemValue;

	#[test_log::test]
	fn empty_tag_keeps_framing() {
		let bytes = create_ape_tag(&ApeTag::new()).unwrap();

		assert_eq!(bytes.len(), 64);
		assert_eq!(&bytes[..8], b"APETAGEX");
		assert_eq!(&bytes[32..40], b"APETAGEX");
		// Size covers the footer only
		assert_eq!(&bytes[12..16], &32u32.to_le_bytes());
		// Header flags: has header, is header
		assert_eq!(&bytes[20..24], &0xA000_0000_u32.to_le_bytes());
		// Footer flags: has header
		assert_eq!(&bytes[52..56], &0x8000_0000_u32.to_le_bytes());
	}

	#[test_log::test]
	fn items_sorted_by_size() {
		let mut tag = ApeTag::new();
		tag.insert_text("Comment", "A rather long comment").unwrap();
		tag.insert_text("Title", "Foo").unwrap();
		tag.insert(ApeItem::new(String::from("Cover"), ItemValue::Binary(vec![0; 4])).unwrap());

		let bytes = create_ape_tag(&tag).unwrap();

		// Title: 8 + 6 + 3, Cover: 8 + 6 + 4, Comment: 8 + 8 + 21
		assert_eq!(&bytes[32 + 8..32 + 13], b"Title");
		assert_eq!(&bytes[32 + 17 + 8..32 + 17 + 13], b"Cover");
		assert_eq!(&bytes[32 + 35 + 8..32 + 35 + 15], b"Comment");

		let size = u32::from_le_bytes(bytes[12..16].try_into().unwrap());
		assert_eq!(size as usize, bytes.len() - 32);
	}

	#[test_log::test]
	fn read_only_tag_flag() {
		let mut tag = ApeTag::new();
		tag.read_only = true;

		let bytes = create_ape_tag(&tag).unwrap();
		assert_eq!(&bytes[20..24], &0xA000_0001_u32.to_le_bytes());
		assert_eq!(&bytes[52..56], &0x8000_0001_u32.to_le_bytes());
	}
}
