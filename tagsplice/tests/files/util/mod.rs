use tagsplice::mp4::render;

use std::fs::File;
use std::io::{Read as _, Seek as _, Write as _};

/// Create a new temporary file holding `content`
pub fn temp_file(content: &[u8]) -> File {
	let mut file = tempfile::tempfile().unwrap();
	file.write_all(content).unwrap();
	file.rewind().unwrap();

	file
}

/// Read the entire contents of `file`, leaving the cursor at the start
pub fn contents(file: &mut File) -> Vec<u8> {
	let mut content = Vec::new();
	file.rewind().unwrap();
	file.read_to_end(&mut content).unwrap();
	file.rewind().unwrap();

	content
}

/// Render an atom with a 32-bit header
pub fn atom(ident: &[u8; 4], payload: &[u8]) -> Vec<u8> {
	render(*ident, payload).unwrap()
}

/// A `stco` atom with the given entries
pub fn stco(entries: &[u32]) -> Vec<u8> {
	let mut payload = vec![0; 4];
	payload.extend_from_slice(&(entries.len() as u32).to_be_bytes());
	for entry in entries {
		payload.extend_from_slice(&entry.to_be_bytes());
	}

	atom(b"stco", &payload)
}

/// A `co64` atom with the given entries
pub fn co64(entries: &[u64]) -> Vec<u8> {
	let mut payload = vec![0; 4];
	payload.extend_from_slice(&(entries.len() as u32).to_be_bytes());
	for entry in entries {
		payload.extend_from_slice(&entry.to_be_bytes());
	}

	atom(b"co64", &payload)
}

/// Read the entries of a chunk offset table starting at `position`
pub fn table_entries(file: &[u8], position: u64, width: usize) -> Vec<u64> {
	let start = position as usize + 12;
	let count = u32::from_be_bytes(file[start..start + 4].try_into().unwrap()) as usize;

	file[start + 4..start + 4 + count * width]
		.chunks_exact(width)
		.map(|entry| match width {
			4 => u64::from(u32::from_be_bytes(entry.try_into().unwrap())),
			_ => u64::from_be_bytes(entry.try_into().unwrap()),
		})
		.collect()
}

/// A 32 byte APE header or footer
pub fn ape_frame(version: u32, size: u32, item_count: u32, flags: u32) -> Vec<u8> {
	let mut frame = b"APETAGEX".to_vec();
	for field in [version, size, item_count, flags] {
		frame.extend_from_slice(&field.to_le_bytes());
	}
	frame.extend_from_slice(&[0; 8]);

	frame
}

/// A 128 byte ID3v1 tag
pub fn id3v1() -> Vec<u8> {
	let mut tag = b"TAG".to_vec();
	tag.resize(128, b' ');

	tag
}
