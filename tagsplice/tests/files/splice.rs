use crate::util::{contents, temp_file};

use tagsplice::config::{GlobalOptions, apply_global_options};
use tagsplice::error::ErrorKind;
use tagsplice::splice::{
	BUFFER_SIZE, SpliceStrategy, delete_bytes, delete_bytes_with, insert_bytes, insert_bytes_with,
	resize_bytes,
};

fn pattern(len: usize) -> Vec<u8> {
	(0..len).map(|i| (i % 251) as u8).collect()
}

#[test_log::test]
fn insert_and_delete_with_each_strategy() {
	// Larger than a single streaming block, so the tail is moved in pieces
	let original = pattern(BUFFER_SIZE * 3 + 17);
	let offset = 1000;
	let size = 4321;

	for strategy in [SpliceStrategy::Auto, SpliceStrategy::Streaming] {
		let mut file = temp_file(&original);

		insert_bytes_with(&mut file, size, offset, strategy).unwrap();

		let grown = contents(&mut file);
		assert_eq!(grown.len(), original.len() + size as usize);
		assert_eq!(&grown[..offset as usize], &original[..offset as usize]);
		assert!(
			grown[offset as usize..(offset + size) as usize]
				.iter()
				.all(|b| *b == 0)
		);
		assert_eq!(
			&grown[(offset + size) as usize..],
			&original[offset as usize..]
		);

		delete_bytes_with(&mut file, size, offset, strategy).unwrap();
		assert_eq!(contents(&mut file), original);
	}
}

#[test_log::test]
fn strategies_agree() {
	let original = pattern(BUFFER_SIZE + 512);

	let mut mapped = temp_file(&original);
	let mut streamed = temp_file(&original);

	delete_bytes_with(&mut mapped, 700, 3, SpliceStrategy::Auto).unwrap();
	delete_bytes_with(&mut streamed, 700, 3, SpliceStrategy::Streaming).unwrap();
	assert_eq!(contents(&mut mapped), contents(&mut streamed));

	insert_bytes_with(&mut mapped, 90_000, 50, SpliceStrategy::Auto).unwrap();
	insert_bytes_with(&mut streamed, 90_000, 50, SpliceStrategy::Streaming).unwrap();
	assert_eq!(contents(&mut mapped), contents(&mut streamed));
}

#[test_log::test]
fn memory_map_disabled() {
	apply_global_options(GlobalOptions::new().use_memory_map(false));

	let original = pattern(4096);
	let mut file = temp_file(&original);

	insert_bytes(&mut file, 10, 4096).unwrap();
	assert_eq!(contents(&mut file).len(), 4106);

	resize_bytes(&mut file, 10, 0, 4096).unwrap();
	assert_eq!(contents(&mut file), original);

	apply_global_options(GlobalOptions::default());
}

#[test_log::test]
fn invalid_arguments() {
	let original = pattern(64);
	let mut file = temp_file(&original);

	let err = insert_bytes(&mut file, 0, 10).unwrap_err();
	assert!(matches!(err.kind(), ErrorKind::InvalidArgument(_)));

	let err = insert_bytes(&mut file, 4, 65).unwrap_err();
	assert!(matches!(err.kind(), ErrorKind::InvalidArgument(_)));

	let err = delete_bytes(&mut file, 8, 60).unwrap_err();
	assert!(matches!(err.kind(), ErrorKind::InvalidArgument(_)));

	assert_eq!(contents(&mut file), original);
}
