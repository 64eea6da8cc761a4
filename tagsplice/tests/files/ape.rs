use crate::util::{ape_frame, contents, id3v1, temp_file};

use tagsplice::ape::{ApeTag, TagLocation};
use tagsplice::config::{ParseOptions, WriteOptions};
use tagsplice::error::ErrorKind;
use tagsplice::tag::{ItemValue, TagExt, TagType};

const HAS_HEADER: u32 = 1 << 31;
const IS_HEADER: u32 = 1 << 29;
const READ_ONLY: u32 = 1;

#[test_log::test]
fn read_empty_and_write() {
	let prefix = vec![0xAA; 100];
	let mut content = prefix.clone();
	content.extend(ape_frame(2000, 32, 0, 0));

	let mut file = temp_file(&content);
	let mut tag = ApeTag::read_from(&mut file, ParseOptions::new()).unwrap();
	assert!(tag.is_empty());

	tag.insert_text("Artist", "X").unwrap();
	tag.save_to(&mut file, WriteOptions::new()).unwrap();

	let written = contents(&mut file);
	assert_eq!(&written[..100], &prefix[..]);
	// Header + "Artist" item (8 + 6 + 1 + 1) + footer
	assert_eq!(written.len(), 100 + 32 + 16 + 32);

	let tag = ApeTag::read_from(&mut file, ParseOptions::new()).unwrap();
	assert_eq!(
		tag.get("artist").map(|item| item.value()),
		Some(&ItemValue::Text(String::from("X")))
	);
	assert_eq!(tag.keys().collect::<Vec<_>>(), ["Artist"]);
}

#[test_log::test]
fn write_is_idempotent() {
	let mut file = temp_file(&[0xAA; 64]);

	let mut tag = ApeTag::new();
	tag.insert_text("Title", "Foo title").unwrap();
	tag.insert_value("Cover", vec![0xFF, 0xD8, 0xFF]).unwrap();
	tag.insert_value("Homepage", ItemValue::Locator(String::from("https://example.com")))
		.unwrap();

	tag.save_to(&mut file, WriteOptions::new()).unwrap();
	let first = contents(&mut file);

	tag.save_to(&mut file, WriteOptions::new()).unwrap();
	let second = contents(&mut file);
	assert_eq!(first, second);

	let read = ApeTag::read_from(&mut file, ParseOptions::new()).unwrap();
	assert_eq!(read.len(), 3);
	assert_eq!(
		read.get("cover").map(|item| item.value()),
		Some(&ItemValue::Binary(vec![0xFF, 0xD8, 0xFF]))
	);
	assert_eq!(
		read.get("HOMEPAGE").and_then(|item| item.value().locator()),
		Some("https://example.com")
	);
}

#[test_log::test]
fn write_replaces_id3v1() {
	let prefix = vec![0xAA; 40];
	let mut content = prefix.clone();
	content.extend(ape_frame(2000, 32, 0, 0));
	content.extend(id3v1());

	let mut file = temp_file(&content);
	let mut tag = ApeTag::read_from(&mut file, ParseOptions::new()).unwrap();
	tag.insert_text("Album", "Foo album").unwrap();
	tag.save_to(&mut file, WriteOptions::new()).unwrap();

	let written = contents(&mut file);
	assert_eq!(&written[..40], &prefix[..]);
	assert_eq!(&written[written.len() - 32..written.len() - 24], b"APETAGEX");

	let location = TagLocation::locate(&mut file, ParseOptions::new()).unwrap();
	assert_eq!(location.start, Some(40));
	assert_eq!(location.end, Some(written.len() as u64));
}

#[test_log::test]
fn duplicate_keys_across_saves() {
	let mut file = temp_file(&[0xAA; 16]);

	let mut tag = ApeTag::new();
	tag.insert_text("artist", "First").unwrap();
	tag.save_to(&mut file, WriteOptions::new()).unwrap();

	let mut tag = ApeTag::read_from(&mut file, ParseOptions::new()).unwrap();
	tag.insert_text("ARTIST", "Second").unwrap();
	tag.insert_text("ArTiSt", "Third").unwrap();
	tag.save_to(&mut file, WriteOptions::new()).unwrap();

	let tag = ApeTag::read_from(&mut file, ParseOptions::new()).unwrap();
	assert_eq!(tag.len(), 1);
	assert_eq!(tag.keys().collect::<Vec<_>>(), ["ArTiSt"]);
	assert_eq!(
		tag.get("artist").and_then(|item| item.value().text()),
		Some("Third")
	);
}

#[test_log::test]
fn stray_legacy_header_removed() {
	let prefix = vec![0xAA; 100];
	let mut content = prefix.clone();
	// A leftover copy of the header from an earlier, larger tag
	content.extend(&ape_frame(2000, 32, 0, HAS_HEADER)[..24]);
	content.extend(ape_frame(2000, 32, 0, HAS_HEADER | IS_HEADER));
	content.extend(ape_frame(2000, 32, 0, HAS_HEADER));

	let mut file = temp_file(&content);

	let location = TagLocation::locate(&mut file, ParseOptions::new()).unwrap();
	assert_eq!(location.start, Some(100));
	assert_eq!(location.header, Some(124));
	assert_eq!(location.len(), 24 + 64);

	TagType::Ape.remove_from(&mut file).unwrap();
	assert_eq!(contents(&mut file), prefix);

	let err = ApeTag::read_from(&mut file, ParseOptions::new()).unwrap_err();
	assert!(matches!(err.kind(), ErrorKind::NoTagFound));
}

#[test_log::test]
fn read_only_tag() {
	let mut content = vec![0xAA; 10];
	content.extend(ape_frame(2000, 32, 0, HAS_HEADER | IS_HEADER | READ_ONLY));
	content.extend(ape_frame(2000, 32, 0, HAS_HEADER | READ_ONLY));

	let mut file = temp_file(&content);
	let mut tag = ApeTag::read_from(&mut file, ParseOptions::new()).unwrap();
	assert!(tag.read_only);

	tag.insert_text("Title", "Foo title").unwrap();

	let err = tag.save_to(&mut file, WriteOptions::new()).unwrap_err();
	assert!(matches!(err.kind(), ErrorKind::ReadOnly));
	assert_eq!(contents(&mut file), content);

	tag.read_only = false;
	tag.save_to(&mut file, WriteOptions::new().respect_read_only(false))
		.unwrap();

	let tag = ApeTag::read_from(&mut file, ParseOptions::new()).unwrap();
	assert!(!tag.read_only);
	assert!(tag.get("title").is_some());
}

#[test_log::test]
fn remove_without_tag() {
	let content = vec![0xAA; 200];
	let mut file = temp_file(&content);

	TagType::Ape.remove_from(&mut file).unwrap();
	assert_eq!(contents(&mut file), content);
}
