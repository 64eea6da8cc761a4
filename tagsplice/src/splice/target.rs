use super::lock::{LockStatus, lock_file, unlock_file};
use crate::error::{ErrorKind, Result, TagError};
use crate::macros::err;
use crate::util::io::FileLike;

use std::fs::File;
use std::io::Cursor;

use memmap2::MmapOptions;

/// A [`FileLike`] that can be spliced
///
/// The default methods describe a target with none of the optional capabilities: it can't be
/// memory mapped and can't be locked, so every splice takes the streaming path.
pub trait SpliceTarget: FileLike {
	/// Move `count` bytes from `src` to `dest` through a memory map of the whole target
	///
	/// Both ranges must lie within the target's current length.
	///
	/// # Errors
	///
	/// * [`ErrorKind::MapUnavailable`] if the target can't be mapped, the caller is expected to
	///   fall back to streaming
	/// * [`std::io::Error`] if flushing the map fails
	fn move_mapped(&mut self, src: u64, dest: u64, count: u64) -> Result<()> {
		let _ = (src, dest, count);
		err!(MapUnavailable)
	}

	/// Try to take an exclusive advisory lock
	fn lock_exclusive(&mut self) -> LockStatus {
		LockStatus::Unsupported
	}

	/// Release a lock taken by [`SpliceTarget::lock_exclusive`]
	///
	/// # Errors
	///
	/// Failing to release a held lock is always an error.
	fn unlock(&mut self) -> Result<()> {
		Ok(())
	}
}

fn map_unavailable() -> TagError {
	TagError::new(ErrorKind::MapUnavailable)
}

impl SpliceTarget for File {
	fn move_mapped(&mut self, src: u64, dest: u64, count: u64) -> Result<()> {
		let file_len = self.metadata()?.len();
		let map_len = usize::try_from(file_len).map_err(|_| map_unavailable())?;
		let src = usize::try_from(src).map_err(|_| map_unavailable())?;
		let dest = usize::try_from(dest).map_err(|_| map_unavailable())?;
		let count = usize::try_from(count).map_err(|_| map_unavailable())?;

		if src.max(dest).saturating_add(count) > map_len {
			err!(InvalidArgument("move range is outside of the mapped file"));
		}

		// Safety: the file is not expected to be modified by another process while mapped.
		// This is the same contract the streaming path relies on without a lock.
		let mut map = match unsafe { MmapOptions::new().len(map_len).map_mut(&*self) } {
			Ok(map) => map,
			Err(e) => {
				log::debug!("Unable to memory map file: {e}");
				err!(MapUnavailable);
			},
		};

		map.copy_within(src..src + count, dest);
		map.flush()?;

		Ok(())
	}

	fn lock_exclusive(&mut self) -> LockStatus {
		lock_file(self)
	}

	fn unlock(&mut self) -> Result<()> {
		unlock_file(self)
	}
}

impl<T> SpliceTarget for Cursor<T> where Cursor<T>: FileLike {}

impl<S> SpliceTarget for &mut S
where
	S: SpliceTarget,
{
	fn move_mapped(&mut self, src: u64, dest: u64, count: u64) -> Result<()> {
		(**self).move_mapped(src, dest, count)
	}

	fn lock_exclusive(&mut self) -> LockStatus {
		(**self).lock_exclusive()
	}

	fn unlock(&mut self) -> Result<()> {
		(**self).unlock()
	}
}

impl<S> SpliceTarget for Box<S>
where
	S: SpliceTarget,
{
	fn move_mapped(&mut self, src: u64, dest: u64, count: u64) -> Result<()> {
		self.as_mut().move_mapped(src, dest, count)
	}

	fn lock_exclusive(&mut self) -> LockStatus {
		self.as_mut().lock_exclusive()
	}

	fn unlock(&mut self) -> Result<()> {
		self.as_mut().unlock()
	}
}
