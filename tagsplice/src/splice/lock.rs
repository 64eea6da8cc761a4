use crate::error::Result;

use std::fs::File;

/// The outcome of trying to take an advisory lock
///
/// Locking is best-effort. Only [`LockStatus::Locked`] obliges the caller to unlock.
#[derive(Debug)]
pub enum LockStatus {
	/// An exclusive lock is held until [`SpliceTarget::unlock`](super::SpliceTarget::unlock)
	Locked,
	/// The platform or filesystem has no notion of advisory locks
	Unsupported,
	/// Locking is supported, but the attempt failed
	Failed(std::io::Error),
}

#[cfg(unix)]
pub(super) fn lock_file(file: &File) -> LockStatus {
	use std::os::unix::io::AsRawFd;

	// Blocks until the lock is available
	let ret = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX) };
	if ret == 0 {
		return LockStatus::Locked;
	}

	let err = std::io::Error::last_os_error();
	match err.raw_os_error() {
		Some(libc::ENOLCK | libc::EOPNOTSUPP) => LockStatus::Unsupported,
		_ => LockStatus::Failed(err),
	}
}

#[cfg(unix)]
pub(super) fn unlock_file(file: &File) -> Result<()> {
	use std::os::unix::io::AsRawFd;

	let ret = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_UN) };
	if ret != 0 {
		return Err(std::io::Error::last_os_error().into());
	}

	Ok(())
}

#[cfg(not(unix))]
pub(super) fn lock_file(_file: &File) -> LockStatus {
	LockStatus::Unsupported
}

#[cfg(not(unix))]
pub(super) fn unlock_file(_file: &File) -> Result<()> {
	Ok(())
}

#[cfg(all(test, unix))]
mod tests {
	use super::{LockStatus, lock_file, unlock_file};

	#[test_log::test]
	fn lock_then_unlock() {
		let file = tempfile::tempfile().unwrap();

		match lock_file(&file) {
			LockStatus::Locked => unlock_file(&file).unwrap(),
			LockStatus::Unsupported => {},
			LockStatus::Failed(e) => panic!("Failed to lock a temporary file: {e}"),
		}
	}
}
