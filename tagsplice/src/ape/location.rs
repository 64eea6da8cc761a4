use super::constants::{
	APE_HEADER_SIZE, APE_PREAMBLE, FLAG_HAS_HEADER, FLAG_HAS_NO_FOOTER, FLAG_READ_ONLY, ID3V1_MARKER, ID3V1_SIZE,
	LEGACY_HEADER_STEP, LYRICS3V2_MARKER, LYRICS3V2_SIZE_LEN,
};
use super::header::ApeHeader;
use crate::config::ParseOptions;
use crate::error::Result;
use crate::macros::{decode_err, err};
use crate::util::io::SeekStreamLen;

use std::io::{Read, Seek, SeekFrom};

/// Where an APE tag lives in a file
///
/// All offsets are absolute. A location is computed fresh on every read, any write
/// invalidates it.
///
/// ```text
/// start    header       data                 footer       end
///   | legacy | header (32) | items ...        | footer (32) |
/// ```
///
/// * `start` is where the tag's span begins, including any stray legacy headers
/// * `header` and `footer` are only set when present
/// * `data` is where the first item begins
/// * `end` is one past the last byte of the tag, legacy trailers such as ID3v1 are not included
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TagLocation {
	/// The start of the tag's span
	pub start: Option<u64>,
	/// The offset of the header, if present
	pub header: Option<u64>,
	/// The offset of the first item
	pub data: Option<u64>,
	/// The offset of the footer, if present
	pub footer: Option<u64>,
	/// One past the end of the tag
	pub end: Option<u64>,
	/// Whether the tag was found at the start of the file
	pub is_at_start: bool,
	/// The tag version, 1000 or 2000
	pub version: u32,
	/// The declared size, covering the items and footer
	pub declared_size: u32,
	/// The number of items in the tag
	pub item_count: u32,
	/// The tag flags
	pub flags: u32,
}

enum Marker {
	Header(u64),
	Footer(u64),
}

impl TagLocation {
	/// Search a reader for an APE tag
	///
	/// The following positions are checked in order:
	///
	/// 1. A footer at the end of the file
	/// 2. A footer followed by an ID3v1 tag
	/// 3. A footer followed by a Lyrics3v2 block and an ID3v1 tag
	/// 4. A header at the start of the file
	///
	/// Once found, the span is extended backwards over any stray legacy headers, up to
	/// [`ParseOptions::max_legacy_headers`].
	///
	/// # Errors
	///
	/// * [`ErrorKind::NoTagFound`](crate::error::ErrorKind::NoTagFound) if none of the positions hold a tag
	/// * [`ErrorKind::UnsupportedVersion`](crate::error::ErrorKind::UnsupportedVersion)
	/// * [`ErrorKind::TruncatedHeader`](crate::error::ErrorKind::TruncatedHeader)
	/// * The declared size doesn't fit in the file
	pub fn locate<R>(reader: &mut R, parse_options: ParseOptions) -> Result<Self>
	where
		R: Read + Seek,
	{
		let file_len = reader.stream_len_hack()?;

		let Some(marker) = find_marker(reader, file_len)? else {
			log::debug!("APE: No tag found");
			err!(NoTagFound);
		};

		let marker_pos = match marker {
			Marker::Header(pos) | Marker::Footer(pos) => pos,
		};

		reader.seek(SeekFrom::Start(marker_pos + APE_PREAMBLE.len() as u64))?;
		let fields = ApeHeader::read(reader)?;
		let size = u64::from(fields.size);

		let mut location = Self {
			start: None,
			header: None,
			data: None,
			footer: None,
			end: None,
			is_at_start: false,
			version: fields.version,
			declared_size: fields.size,
			item_count: fields.item_count,
			flags: fields.flags,
		};

		match marker {
			Marker::Header(header) => {
				let data = header + APE_HEADER_SIZE;
				let end = data + size;
				if end > file_len {
					decode_err!(@BAIL Ape, "APE tag has an invalid size (> file size)");
				}

				location.is_at_start = header == 0;
				location.header = Some(header);
				location.data = Some(data);
				location.end = Some(end);

				let may_have_footer = fields.flags & FLAG_HAS_NO_FOOTER == 0;
				if may_have_footer
					&& size >= APE_HEADER_SIZE
					&& has_preamble_at(reader, end - APE_HEADER_SIZE)?
				{
					location.footer = Some(end - APE_HEADER_SIZE);
				}
			},
			Marker::Footer(footer) => {
				let end = footer + APE_HEADER_SIZE;
				if size < APE_HEADER_SIZE {
					// The size always includes the footer
					decode_err!(@BAIL Ape, "APE tag has an invalid size (< 32)");
				}

				let Some(data) = end.checked_sub(size) else {
					decode_err!(@BAIL Ape, "APE tag has an invalid size (> file size)");
				};

				location.footer = Some(footer);
				location.data = Some(data);
				location.end = Some(end);

				if fields.flags & FLAG_HAS_HEADER != 0 {
					let Some(header) = data.checked_sub(APE_HEADER_SIZE) else {
						decode_err!(@BAIL Ape, "APE tag claims a header that doesn't fit in the file");
					};

					location.header = Some(header);
				}
			},
		}

		let start = location.header.or(location.data).unwrap_or_default();
		let start = skip_legacy_headers(reader, start, parse_options.max_legacy_headers)?;
		location.start = Some(start);

		log::debug!(
			"APE: Found a v{} tag spanning {start}..{} with {} items",
			location.version,
			location.end.unwrap_or_default(),
			location.item_count
		);

		Ok(location)
	}

	/// The number of bytes between [`TagLocation::start`] and [`TagLocation::end`]
	pub fn len(&self) -> u64 {
		match (self.start, self.end) {
			(Some(start), Some(end)) => end - start,
			_ => 0,
		}
	}

	/// Whether the tag is flagged as read only
	pub fn is_read_only(&self) -> bool {
		self.flags & FLAG_READ_ONLY != 0
	}
}

fn has_preamble_at<R>(reader: &mut R, pos: u64) -> Result<bool>
where
	R: Read + Seek,
{
	let mut preamble = [0; 8];
	reader.seek(SeekFrom::Start(pos))?;
	reader.read_exact(&mut preamble)?;

	Ok(&preamble == APE_PREAMBLE)
}

fn find_marker<R>(reader: &mut R, file_len: u64) -> Result<Option<Marker>>
where
	R: Read + Seek,
{
	// Nothing smaller than a single header can hold a tag
	if file_len < APE_HEADER_SIZE {
		return Ok(None);
	}

	// A plain footer
	let footer = file_len - APE_HEADER_SIZE;
	if has_preamble_at(reader, footer)? {
		return Ok(Some(Marker::Footer(footer)));
	}

	if file_len >= ID3V1_SIZE {
		let id3v1 = file_len - ID3V1_SIZE;

		let mut id3v1_marker = [0; 3];
		reader.seek(SeekFrom::Start(id3v1))?;
		reader.read_exact(&mut id3v1_marker)?;

		if &id3v1_marker == ID3V1_MARKER {
			log::trace!("APE: Found an ID3v1 tag at {id3v1}");

			// A footer directly before the ID3v1 tag
			if let Some(footer) = id3v1.checked_sub(APE_HEADER_SIZE) {
				if has_preamble_at(reader, footer)? {
					return Ok(Some(Marker::Footer(footer)));
				}
			}

			// A Lyrics3v2 block between the footer and the ID3v1 tag
			if let Some(footer) = find_footer_before_lyrics3v2(reader, id3v1)? {
				return Ok(Some(Marker::Footer(footer)));
			}
		}
	}

	// A header at the start of the file, which APEv2 forbids but happens
	if has_preamble_at(reader, 0)? {
		return Ok(Some(Marker::Header(0)));
	}

	Ok(None)
}

// The Lyrics3v2 block ends with a 6 digit size followed by the marker, right before the ID3v1 tag
fn find_footer_before_lyrics3v2<R>(reader: &mut R, id3v1: u64) -> Result<Option<u64>>
where
	R: Read + Seek,
{
	let Some(marker_pos) = id3v1.checked_sub(LYRICS3V2_MARKER.len() as u64) else {
		return Ok(None);
	};
	let Some(size_pos) = marker_pos.checked_sub(LYRICS3V2_SIZE_LEN) else {
		return Ok(None);
	};

	let mut marker = [0; 9];
	reader.seek(SeekFrom::Start(marker_pos))?;
	reader.read_exact(&mut marker)?;
	if &marker != LYRICS3V2_MARKER {
		return Ok(None);
	}

	let mut size_digits = [0; LYRICS3V2_SIZE_LEN as usize];
	reader.seek(SeekFrom::Start(size_pos))?;
	reader.read_exact(&mut size_digits)?;

	// An unreadable size just means there's nothing to find here
	let Some(lyrics_size) = parse_ascii_decimal(&size_digits) else {
		log::debug!("APE: Lyrics3v2 block has an invalid size field {size_digits:?}");
		return Ok(None);
	};

	log::trace!("APE: Found a Lyrics3v2 block of {lyrics_size} bytes");

	let Some(footer) = size_pos
		.checked_sub(lyrics_size)
		.and_then(|lyrics_start| lyrics_start.checked_sub(APE_HEADER_SIZE))
	else {
		return Ok(None);
	};

	if has_preamble_at(reader, footer)? {
		return Ok(Some(footer));
	}

	Ok(None)
}

fn parse_ascii_decimal(digits: &[u8]) -> Option<u64> {
	if !digits.iter().all(u8::is_ascii_digit) {
		return None;
	}

	Some(
		digits
			.iter()
			.fold(0, |acc, digit| acc * 10 + u64::from(digit - b'0')),
	)
}

fn skip_legacy_headers<R>(reader: &mut R, mut start: u64, max_legacy_headers: usize) -> Result<u64>
where
	R: Read + Seek,
{
	for _ in 0..max_legacy_headers {
		let Some(candidate) = start.checked_sub(LEGACY_HEADER_STEP) else {
			break;
		};

		if !has_preamble_at(reader, candidate)? {
			break;
		}

		log::warn!("APE: Found a stray legacy header at {candidate}, including it in the tag");
		start = candidate;
	}

	Ok(start)
}

#[cfg(test)]
mod tests {
	use super::{TagLocation, parse_ascii_decimal};
	use crate::config::ParseOptions;
	use crate::error::ErrorKind;

	use std::io::Cursor;

	fn frame(version: u32, size: u32, items: u32, flags: u32) -> Vec<u8> {
		let mut bytes = b"APETAGEX".to_vec();
		for field in [version, size, items, flags] {
			bytes.extend_from_slice(&field.to_le_bytes());
		}
		bytes.extend_from_slice(&[0; 8]);
		bytes
	}

	fn id3v1() -> Vec<u8> {
		let mut tag = b"TAG".to_vec();
		tag.resize(128, b' ');
		tag
	}

	fn locate(bytes: Vec<u8>) -> crate::error::Result<TagLocation> {
		TagLocation::locate(&mut Cursor::new(bytes), ParseOptions::new())
	}

	#[test_log::test]
	fn footer_at_end() {
		let mut file = vec![0xAA; 100];
		file.extend(frame(2000, 32, 0, 0));

		let location = locate(file).unwrap();
		assert_eq!(location.footer, Some(100));
		assert_eq!(location.data, Some(100));
		assert_eq!(location.header, None);
		assert_eq!(location.start, Some(100));
		assert_eq!(location.end, Some(132));
		assert!(!location.is_at_start);
	}

	#[test_log::test]
	fn header_and_footer() {
		let mut file = vec![0xAA; 10];
		file.extend(frame(2000, 32, 0, (1 << 31) | (1 << 29)));
		file.extend(frame(2000, 32, 0, 1 << 31));

		let location = locate(file).unwrap();
		assert_eq!(location.header, Some(10));
		assert_eq!(location.data, Some(42));
		assert_eq!(location.footer, Some(42));
		assert_eq!(location.start, Some(10));
		assert_eq!(location.len(), 64);
	}

	#[test_log::test]
	fn footer_before_id3v1() {
		let mut file = vec![0xAA; 50];
		file.extend(frame(1000, 32, 0, 0));
		file.extend(id3v1());

		let location = locate(file).unwrap();
		assert_eq!(location.footer, Some(50));
		assert_eq!(location.end, Some(82));
		assert_eq!(location.version, 1000);
	}

	#[test_log::test]
	fn footer_before_lyrics3v2() {
		let lyrics = b"LYRICSBEGININD0000210";
		let mut file = vec![0xAA; 50];
		file.extend(frame(2000, 32, 0, 0));
		file.extend_from_slice(lyrics);
		file.extend_from_slice(format!("{:06}", lyrics.len()).as_bytes());
		file.extend_from_slice(b"LYRICS200");
		file.extend(id3v1());

		let location = locate(file).unwrap();
		assert_eq!(location.footer, Some(50));
		assert_eq!(location.end, Some(82));
	}

	#[test_log::test]
	fn bad_lyrics3v2_size_is_ignored() {
		let mut file = vec![0xAA; 50];
		file.extend(frame(2000, 32, 0, 0));
		file.extend_from_slice(b"LYRICSBEGIN");
		file.extend_from_slice(b"00x011");
		file.extend_from_slice(b"LYRICS200");
		file.extend(id3v1());

		let err = locate(file).unwrap_err();
		assert!(matches!(err.kind(), ErrorKind::NoTagFound));
	}

	#[test_log::test]
	fn header_at_start() {
		let mut file = frame(2000, 32, 0, (1 << 31) | (1 << 29));
		file.extend(frame(2000, 32, 0, 1 << 31));
		file.extend(vec![0xAA; 100]);

		let location = locate(file).unwrap();
		assert!(location.is_at_start);
		assert_eq!(location.start, Some(0));
		assert_eq!(location.header, Some(0));
		assert_eq!(location.footer, Some(32));
		assert_eq!(location.end, Some(64));
	}

	#[test_log::test]
	fn stray_legacy_headers() {
		let mut file = vec![0xAA; 100];
		// Two leftover 24 byte header prefixes
		file.extend(&frame(2000, 32, 0, 1 << 31)[..24]);
		file.extend(&frame(2000, 32, 0, 1 << 31)[..24]);
		file.extend(frame(2000, 32, 0, (1 << 31) | (1 << 29)));
		file.extend(frame(2000, 32, 0, 1 << 31));

		let location = locate(file.clone()).unwrap();
		assert_eq!(location.header, Some(148));
		assert_eq!(location.start, Some(100));

		let limited = TagLocation::locate(
			&mut Cursor::new(file),
			ParseOptions::new().max_legacy_headers(1),
		)
		.unwrap();
		assert_eq!(limited.start, Some(124));
	}

	#[test_log::test]
	fn no_tag() {
		for file in [vec![], vec![0xAA; 31], vec![0xAA; 500]] {
			let err = locate(file).unwrap_err();
			assert!(matches!(err.kind(), ErrorKind::NoTagFound));
		}
	}

	#[test_log::test]
	fn size_past_start_of_file() {
		let mut file = vec![0xAA; 4];
		file.extend(frame(2000, 64, 0, 0));

		assert!(locate(file).is_err());
	}

	#[test_log::test]
	fn ascii_decimal() {
		assert_eq!(parse_ascii_decimal(b"000123"), Some(123));
		assert_eq!(parse_ascii_decimal(b" 00123"), None);
	}
}
