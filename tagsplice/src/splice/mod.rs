//! Growing and shrinking regions inside of a file
//!
//! Every splice moves the bytes after the affected region, leaving everything before it untouched.
//! Two strategies produce identical results:
//!
//! * Memory mapping the whole file and doing a single block move (see [`SpliceTarget::move_mapped`])
//! * Streaming the tail through a fixed [`BUFFER_SIZE`] block, under a best-effort advisory lock
//!
//! [`SpliceStrategy::Auto`] tries the first and falls back to the second whenever the target can't be
//! mapped. Memory use on the streaming path never depends on the size of the file or the move.
//!
//! NOTE: A failure in the middle of a streaming move leaves the moved region in an unknown state.
//!       Bytes before the splice offset are never written.

mod lock;
mod target;

pub use lock::LockStatus;
pub use target::SpliceTarget;

use crate::config::global_options;
use crate::error::{ErrorKind, Result};
use crate::macros::{err, try_vec};
use crate::util::io::{file_len, set_file_len};

use std::io::SeekFrom;

/// The block size used when streaming
pub const BUFFER_SIZE: usize = 1 << 16;

/// How a splice moves data
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SpliceStrategy {
	/// Memory map the file if possible, otherwise stream
	#[default]
	Auto,
	/// Always stream the data through a fixed size buffer
	Streaming,
}

fn default_strategy() -> SpliceStrategy {
	if unsafe { global_options().use_memory_map } {
		SpliceStrategy::Auto
	} else {
		SpliceStrategy::Streaming
	}
}

/// Insert `size` zeroed bytes at `offset`
///
/// Uses [`SpliceStrategy::Auto`] unless memory mapping was disabled through
/// [`GlobalOptions::use_memory_map`](crate::config::GlobalOptions::use_memory_map).
///
/// # Errors
///
/// * [`ErrorKind::InvalidArgument`] if `size` is 0 or `offset` is past the end of the file
/// * [`std::io::Error`]
///
/// # Examples
///
/// ```rust
/// use std::io::Cursor;
/// use tagsplice::splice::insert_bytes;
///
/// # fn main() -> tagsplice::error::Result<()> {
/// let mut file = Cursor::new(b"abcdef".to_vec());
/// insert_bytes(&mut file, 2, 3)?;
///
/// assert_eq!(file.get_ref(), b"abc\0\0def");
/// # Ok(()) }
/// ```
pub fn insert_bytes<F>(file: &mut F, size: u64, offset: u64) -> Result<()>
where
	F: SpliceTarget,
{
	insert_bytes_with(file, size, offset, default_strategy())
}

/// Same as [`insert_bytes`], with an explicit [`SpliceStrategy`]
///
/// # Errors
///
/// See [`insert_bytes`]
pub fn insert_bytes_with<F>(
	file: &mut F,
	size: u64,
	offset: u64,
	strategy: SpliceStrategy,
) -> Result<()>
where
	F: SpliceTarget,
{
	if size == 0 {
		err!(InvalidArgument("attempted to insert zero bytes"));
	}

	let original_len = file_len(&*file)?;
	if offset > original_len {
		err!(InvalidArgument("insertion offset is past the end of the file"));
	}

	let Some(new_len) = original_len.checked_add(size) else {
		err!(InvalidArgument("insertion would overflow the file length"));
	};

	let move_len = original_len - offset;
	log::debug!("Inserting {size} bytes at offset {offset}, moving {move_len} bytes");

	if strategy == SpliceStrategy::Auto && move_len > 0 {
		set_file_len(file, new_len)?;
		match file.move_mapped(offset, offset + size, move_len) {
			Ok(()) => {
				zero_fill(file, offset, size.min(move_len))?;
				file.flush()?;
				return Ok(());
			},
			Err(e) if matches!(e.kind(), ErrorKind::MapUnavailable) => {
				log::debug!("Memory map unavailable, falling back to streaming");
				set_file_len(file, original_len)?;
			},
			Err(e) => return Err(e),
		}
	}

	with_lock(file, |file| {
		set_file_len(file, new_len)?;
		stream_backward(file, offset, size, move_len)?;
		zero_fill(file, offset, size.min(move_len))?;
		file.flush()?;
		Ok(())
	})
}

/// Remove `size` bytes starting at `offset`, shrinking the file
///
/// Uses [`SpliceStrategy::Auto`] unless memory mapping was disabled through
/// [`GlobalOptions::use_memory_map`](crate::config::GlobalOptions::use_memory_map).
///
/// # Errors
///
/// * [`ErrorKind::InvalidArgument`] if `size` is 0 or the range extends past the end of the file
/// * [`std::io::Error`]
///
/// # Examples
///
/// ```rust
/// use std::io::Cursor;
/// use tagsplice::splice::delete_bytes;
///
/// # fn main() -> tagsplice::error::Result<()> {
/// let mut file = Cursor::new(b"abc\0\0def".to_vec());
/// delete_bytes(&mut file, 2, 3)?;
///
/// assert_eq!(file.get_ref(), b"abcdef");
/// # Ok(()) }
/// ```
pub fn delete_bytes<F>(file: &mut F, size: u64, offset: u64) -> Result<()>
where
	F: SpliceTarget,
{
	delete_bytes_with(file, size, offset, default_strategy())
}

/// Same as [`delete_bytes`], with an explicit [`SpliceStrategy`]
///
/// # Errors
///
/// See [`delete_bytes`]
pub fn delete_bytes_with<F>(
	file: &mut F,
	size: u64,
	offset: u64,
	strategy: SpliceStrategy,
) -> Result<()>
where
	F: SpliceTarget,
{
	if size == 0 {
		err!(InvalidArgument("attempted to delete zero bytes"));
	}

	let original_len = file_len(&*file)?;
	let end = match offset.checked_add(size) {
		Some(end) if end <= original_len => end,
		_ => err!(InvalidArgument("deletion range is past the end of the file")),
	};

	let move_len = original_len - end;
	let new_len = original_len - size;
	log::debug!("Deleting {size} bytes at offset {offset}, moving {move_len} bytes");

	if move_len == 0 {
		set_file_len(file, new_len)?;
		file.flush()?;
		return Ok(());
	}

	if strategy == SpliceStrategy::Auto {
		match file.move_mapped(end, offset, move_len) {
			Ok(()) => {
				set_file_len(file, new_len)?;
				file.flush()?;
				return Ok(());
			},
			Err(e) if matches!(e.kind(), ErrorKind::MapUnavailable) => {
				log::debug!("Memory map unavailable, falling back to streaming");
			},
			Err(e) => return Err(e),
		}
	}

	with_lock(file, |file| {
		stream_forward(file, offset, size, move_len)?;
		set_file_len(file, new_len)?;
		file.flush()?;
		Ok(())
	})
}

/// Resize the `old_size` byte region at `offset` to `new_size` bytes
///
/// Growing inserts zeroed bytes at the end of the region, shrinking removes bytes from the end of it.
///
/// # Errors
///
/// See [`insert_bytes`] and [`delete_bytes`]
pub fn resize_bytes<F>(file: &mut F, old_size: u64, new_size: u64, offset: u64) -> Result<()>
where
	F: SpliceTarget,
{
	match new_size.cmp(&old_size) {
		std::cmp::Ordering::Greater => insert_bytes(file, new_size - old_size, offset + old_size),
		std::cmp::Ordering::Less => delete_bytes(file, old_size - new_size, offset + new_size),
		std::cmp::Ordering::Equal => Ok(()),
	}
}

fn with_lock<F, T>(file: &mut F, op: impl FnOnce(&mut F) -> Result<T>) -> Result<T>
where
	F: SpliceTarget,
{
	let status = file.lock_exclusive();
	match &status {
		LockStatus::Locked => log::trace!("Acquired advisory lock"),
		LockStatus::Unsupported => log::trace!("Advisory locking unsupported, continuing unlocked"),
		LockStatus::Failed(e) => log::warn!("Failed to acquire advisory lock, continuing unlocked: {e}"),
	}

	let ret = op(file);

	if let LockStatus::Locked = status {
		let unlock_ret = file.unlock();

		// The operation's error takes priority
		let value = ret?;
		unlock_ret?;
		return Ok(value);
	}

	ret
}

// Moves `[offset, offset + move_len)` up by `size`, tail first
fn stream_backward<F>(file: &mut F, offset: u64, size: u64, move_len: u64) -> Result<()>
where
	F: SpliceTarget,
{
	if move_len == 0 {
		return Ok(());
	}

	let mut buffer = try_vec![0; block_len(move_len)];
	let mut remaining = move_len;
	while remaining > 0 {
		let chunk = remaining.min(buffer.len() as u64);
		let block = &mut buffer[..chunk as usize];
		let read_pos = offset + remaining - chunk;

		file.seek(SeekFrom::Start(read_pos))?;
		file.read_exact(block)?;
		file.seek(SeekFrom::Start(read_pos + size))?;
		file.write_all(block)?;

		remaining -= chunk;
	}

	Ok(())
}

// Moves `[offset + size, offset + size + move_len)` down to `offset`, head first
fn stream_forward<F>(file: &mut F, offset: u64, size: u64, move_len: u64) -> Result<()>
where
	F: SpliceTarget,
{
	let mut buffer = try_vec![0; block_len(move_len)];
	let mut moved = 0;
	while moved < move_len {
		let chunk = (move_len - moved).min(buffer.len() as u64);
		let block = &mut buffer[..chunk as usize];

		file.seek(SeekFrom::Start(offset + size + moved))?;
		file.read_exact(block)?;
		file.seek(SeekFrom::Start(offset + moved))?;
		file.write_all(block)?;

		moved += chunk;
	}

	Ok(())
}

fn zero_fill<F>(file: &mut F, offset: u64, len: u64) -> Result<()>
where
	F: SpliceTarget,
{
	if len == 0 {
		return Ok(());
	}

	let zeros = try_vec![0; block_len(len)];
	file.seek(SeekFrom::Start(offset))?;

	let mut remaining = len;
	while remaining > 0 {
		let chunk = remaining.min(zeros.len() as u64);
		file.write_all(&zeros[..chunk as usize])?;
		remaining -= chunk;
	}

	Ok(())
}

fn block_len(len: u64) -> usize {
	usize::try_from(len).map_or(BUFFER_SIZE, |len| len.min(BUFFER_SIZE))
}
