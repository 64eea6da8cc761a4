use crate::util::{atom, co64, contents, stco, table_entries, temp_file};

use tagsplice::config::{ParseOptions, WriteOptions};
use tagsplice::error::ErrorKind;
use tagsplice::mp4::{Atom, AtomData, AtomIdent, AtomTree, Ilst, flags};
use tagsplice::tag::{TagExt, TagType};

// ftyp (16), moov (8 + trak), stco pointing at the mdat payload, mdat
fn mp4_file() -> Vec<u8> {
	let mut file = atom(b"ftyp", b"M4A \x00\x00\x02\x00");

	let chunk_offsets = atom(b"stbl", &stco(&[0]));
	let trak = atom(b"trak", &atom(b"mdia", &atom(b"minf", &chunk_offsets)));
	file.extend(atom(b"moov", &trak));

	let mdat_payload = file.len() as u32 + 8;
	let stco_entry = file.len() - 4;
	file[stco_entry..].copy_from_slice(&mdat_payload.to_be_bytes());

	file.extend(atom(b"mdat", &[0xAA; 64]));
	file
}

fn assert_mdat_offset(file: &[u8]) {
	let tree = AtomTree::read_from(&mut std::io::Cursor::new(file), ParseOptions::new()).unwrap();
	let stco = tree.find("moov.trak.mdia.minf.stbl.stco").unwrap();
	let mdat = tree.find("mdat").unwrap();

	let entries = table_entries(file, tree.get(stco).unwrap().position(), 4);
	assert_eq!(entries, [tree.get(mdat).unwrap().data_offset()]);
	assert_eq!(
		&file[entries[0] as usize..entries[0] as usize + 64],
		&[0xAA; 64][..]
	);
}

fn sample_tag() -> Ilst {
	let mut tag = Ilst::new();
	tag.insert(Atom::new(
		AtomIdent::Fourcc(*b"\xA9ART"),
		AtomData::Utf8(String::from("Foo artist")),
	));
	tag.insert(Atom::new(
		AtomIdent::Fourcc(*b"trkn"),
		AtomData::IntegerPair(3, 12),
	));
	tag.insert(Atom::new(
		AtomIdent::freeform("com.apple.iTunes", "ISRC"),
		AtomData::Utf8(String::from("USX9P0000000")),
	));
	tag.set_flag(flags::COMPILATION, true);
	tag
}

#[test_log::test]
fn write_read_remove() {
	let original = mp4_file();
	let mut file = temp_file(&original);

	let tag = sample_tag();
	tag.save_to(&mut file, WriteOptions::new()).unwrap();

	let written = contents(&mut file);
	assert_mdat_offset(&written);
	assert_eq!(Ilst::read_from(&mut file, ParseOptions::new()).unwrap(), tag);

	TagType::Mp4Ilst.remove_from(&mut file).unwrap();
	let removed = contents(&mut file);
	assert_mdat_offset(&removed);

	let err = Ilst::read_from(&mut file, ParseOptions::new()).unwrap_err();
	assert!(matches!(err.kind(), ErrorKind::NoTagFound));
}

#[test_log::test]
fn write_is_idempotent() {
	let mut file = temp_file(&mp4_file());

	let tag = sample_tag();
	tag.save_to(&mut file, WriteOptions::new()).unwrap();
	let first = contents(&mut file);

	tag.save_to(&mut file, WriteOptions::new()).unwrap();
	let second = contents(&mut file);
	assert_eq!(first, second);
}

#[test_log::test]
fn shrinking_reuses_padding() {
	let mut file = temp_file(&mp4_file());

	let mut tag = sample_tag();
	tag.save_to(&mut file, WriteOptions::new()).unwrap();
	let len = contents(&mut file).len();

	tag.remove(&AtomIdent::freeform("com.apple.iTunes", "ISRC"));
	tag.save_to(&mut file, WriteOptions::new()).unwrap();

	let written = contents(&mut file);
	assert_eq!(written.len(), len);
	assert_mdat_offset(&written);
	assert_eq!(Ilst::read_from(&mut file, ParseOptions::new()).unwrap(), tag);
}

#[test_log::test]
fn growing_moves_mdat() {
	let mut file = temp_file(&mp4_file());

	let mut tag = sample_tag();
	tag.save_to(&mut file, WriteOptions::new().preferred_padding(0))
		.unwrap();
	let len = contents(&mut file).len();

	tag.insert(Atom::new(
		AtomIdent::Fourcc(*b"\xA9cmt"),
		AtomData::Utf8("Foo comment ".repeat(20)),
	));
	tag.save_to(&mut file, WriteOptions::new().preferred_padding(0))
		.unwrap();

	let written = contents(&mut file);
	assert!(written.len() > len);
	assert_mdat_offset(&written);
	assert_eq!(Ilst::read_from(&mut file, ParseOptions::new()).unwrap(), tag);
}

// moov (77)
// ├── udta (61)
// │   └── leaf (53)
// └── free (8)
// stco, co64, mdat
fn box_scenario() -> Vec<u8> {
	let udta = atom(b"udta", &atom(b"leaf", &[0xAB; 45]));
	let mut moov_payload = udta;
	moov_payload.extend(atom(b"free", &[]));

	let mut file = atom(b"moov", &moov_payload);
	file.extend(stco(&[69, 12, 200]));
	file.extend(co64(&[68, 1000]));
	file.extend(atom(b"mdat", &[0; 64]));
	file
}

#[test_log::test]
fn insert_into_nested_atom() {
	let original = box_scenario();
	let mut file = temp_file(&original);
	let mut tree = AtomTree::read_from(&mut file, ParseOptions::new()).unwrap();

	let udta = tree.find("moov.udta").unwrap();
	let leaf = tree
		.append_child(&mut file, udta, &atom(b"leaf", &[0xCD; 17]))
		.unwrap();

	let written = contents(&mut file);
	assert_eq!(&written[..4], &102u32.to_be_bytes());
	assert_eq!(&written[8..12], &86u32.to_be_bytes());
	assert_eq!(table_entries(&written, 102, 4), [94, 12, 225]);
	assert_eq!(table_entries(&written, 102 + 28, 8), [68, 1025]);

	// The tree matches a fresh parse
	let reparsed = AtomTree::read_from(&mut file, ParseOptions::new()).unwrap();
	let moov = reparsed.find("moov").unwrap();
	assert_eq!(reparsed.get(moov).unwrap().size(), 102);
	assert_eq!(reparsed.children(reparsed.find("moov.udta").unwrap()).len(), 2);
	assert_eq!(tree.file_len(), reparsed.file_len());

	tree.remove(&mut file, leaf).unwrap();
	assert_eq!(contents(&mut file), original);
}

#[test_log::test]
fn replace_leaf_payload() {
	let mut file = temp_file(&box_scenario());
	let mut tree = AtomTree::read_from(&mut file, ParseOptions::new()).unwrap();

	let leaf = tree.find("moov.udta.leaf").unwrap();
	tree.replace(&mut file, leaf, &[0xEE; 5]).unwrap();

	let written = contents(&mut file);
	assert_eq!(&written[..4], &37u32.to_be_bytes());
	assert_eq!(table_entries(&written, 37, 4), [29, 12, 160]);
	assert_eq!(tree.read_payload(&mut file, leaf).unwrap(), [0xEE; 5]);
}

#[test_log::test]
fn offset_overflow_leaves_file_untouched() {
	let mut original = atom(b"ftyp", b"M4A \x00\x00\x02\x00");
	original.extend(atom(b"moov", &atom(b"udta", &[])));
	original.extend(stco(&[u32::MAX - 4]));
	original.extend(atom(b"mdat", &[0xAA; 16]));

	let mut file = temp_file(&original);

	let err = sample_tag()
		.save_to(&mut file, WriteOptions::new())
		.unwrap_err();
	assert!(matches!(err.kind(), ErrorKind::TooMuchData));
	assert_eq!(contents(&mut file), original);
}
