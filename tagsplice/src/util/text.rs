use crate::error::{ErrorKind, Result, TagError};

pub(crate) fn utf8_decode(bytes: Vec<u8>) -> Result<String> {
	String::from_utf8(bytes)
		.map(|mut text| {
			trim_end_nulls(&mut text);
			text
		})
		.map_err(Into::into)
}

pub(crate) fn utf16_decode(words: &[u16]) -> Result<String> {
	String::from_utf16(words)
		.map(|mut text| {
			trim_end_nulls(&mut text);
			text
		})
		.map_err(|_| TagError::new(ErrorKind::BadAtom("Given an invalid UTF-16 string")))
}

pub(crate) fn utf16_be_decode_bytes(bytes: &[u8]) -> Result<String> {
	if bytes.len() % 2 != 0 {
		return Err(TagError::new(ErrorKind::BadAtom(
			"UTF-16 string has an odd length",
		)));
	}

	let unverified: Vec<u16> = bytes
		.chunks_exact(2)
		.map(|c| u16::from_be_bytes([c[0], c[1]]))
		.collect();

	utf16_decode(&unverified)
}

pub(crate) fn utf16_be_encode(text: &str) -> Vec<u8> {
	let mut encoded = Vec::<u8>::with_capacity(text.len() * 2);

	for ch in text.encode_utf16() {
		encoded.extend_from_slice(&ch.to_be_bytes());
	}

	encoded
}

pub(crate) fn trim_end_nulls(text: &mut String) {
	if text.ends_with('\0') {
		let new_len = text.trim_end_matches('\0').len();
		text.truncate(new_len);
	}
}

#[cfg(test)]
mod tests {
	const TEST_STRING: &str = "l\u{f8}ft\u{a5}";

	#[test_log::test]
	fn utf16_round_trip() {
		let encoded = super::utf16_be_encode(TEST_STRING);
		assert_eq!(
			encoded,
			[0x00, 0x6C, 0x00, 0xF8, 0x00, 0x66, 0x00, 0x74, 0x00, 0xA5]
		);

		assert_eq!(
			super::utf16_be_decode_bytes(&encoded).unwrap(),
			TEST_STRING
		);
	}

	#[test_log::test]
	fn utf16_odd_length() {
		assert!(super::utf16_be_decode_bytes(&[0x00, 0x6C, 0x00]).is_err());
	}

	#[test_log::test]
	fn utf8_trailing_nulls() {
		let decoded = super::utf8_decode(b"Foo\0\0".to_vec()).unwrap();
		assert_eq!(decoded, "Foo");
	}
}
