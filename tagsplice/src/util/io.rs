//! Various traits for reading and writing to file-like objects

use crate::error::{Result, TagError};

use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};

// TODO: https://github.com/rust-lang/rust/issues/59359
pub(crate) trait SeekStreamLen: Seek {
	fn stream_len_hack(&mut self) -> Result<u64> {
		let current_pos = self.stream_position()?;
		let len = self.seek(SeekFrom::End(0))?;

		self.seek(SeekFrom::Start(current_pos))?;

		Ok(len)
	}
}

impl<T> SeekStreamLen for T where T: Seek {}

/// Provides a method to truncate (or extend) an object to the specified length
///
/// This is one component of the [`FileLike`] trait, which is used to provide implementors access to any
/// file saving methods such as [`ApeTag::save_to`](crate::ape::ApeTag::save_to).
///
/// Take great care in implementing this for downstream types, as tagsplice will assume that the
/// container has the new length specified. If this assumption were to be broken, files **will** become corrupted.
///
/// NOTE: Growing an object through `truncate` must fill the new space with zeros, the same as
/// [`File::set_len`].
///
/// # Examples
///
/// ```rust
/// use tagsplice::io::Truncate;
///
/// let mut data = vec![1, 2, 3, 4, 5];
/// Truncate::truncate(&mut data, 3).unwrap();
///
/// assert_eq!(data, vec![1, 2, 3]);
/// ```
pub trait Truncate {
	/// The error type of the truncation operation
	type Error: Into<TagError>;

	/// Truncate a storage object to the specified length
	///
	/// # Errors
	///
	/// Errors depend on the object being truncated, which may not always be fallible.
	fn truncate(&mut self, new_len: u64) -> std::result::Result<(), Self::Error>;
}

impl Truncate for File {
	type Error = std::io::Error;

	fn truncate(&mut self, new_len: u64) -> std::result::Result<(), Self::Error> {
		self.set_len(new_len)
	}
}

impl Truncate for Vec<u8> {
	type Error = std::convert::Infallible;

	fn truncate(&mut self, new_len: u64) -> std::result::Result<(), Self::Error> {
		self.resize(new_len as usize, 0);
		Ok(())
	}
}

impl<T> Truncate for Cursor<T>
where
	T: Truncate,
{
	type Error = <T as Truncate>::Error;

	fn truncate(&mut self, new_len: u64) -> std::result::Result<(), Self::Error> {
		self.get_mut().truncate(new_len)
	}
}

impl<T> Truncate for Box<T>
where
	T: Truncate,
{
	type Error = <T as Truncate>::Error;

	fn truncate(&mut self, new_len: u64) -> std::result::Result<(), Self::Error> {
		self.as_mut().truncate(new_len)
	}
}

impl<T> Truncate for &mut T
where
	T: Truncate,
{
	type Error = <T as Truncate>::Error;

	fn truncate(&mut self, new_len: u64) -> std::result::Result<(), Self::Error> {
		(**self).truncate(new_len)
	}
}

/// Provides a method to get the length of a storage object
///
/// This is one component of the [`FileLike`] trait, which is used to provide implementors access to any
/// file saving methods such as [`ApeTag::save_to`](crate::ape::ApeTag::save_to).
///
/// Take great care in implementing this for downstream types, as tagsplice will assume that the
/// container has the exact length specified. If this assumption were to be broken, files **may** become corrupted.
///
/// # Examples
///
/// ```rust
/// use tagsplice::io::Length;
///
/// let data = vec![1, 2, 3, 4, 5];
/// assert_eq!(Length::len(&data).unwrap(), 5);
/// ```
pub trait Length {
	/// The error type of the length operation
	type Error: Into<TagError>;

	/// Get the length of a storage object
	///
	/// # Errors
	///
	/// Errors depend on the object being read, which may not always be fallible.
	fn len(&self) -> std::result::Result<u64, Self::Error>;
}

impl Length for File {
	type Error = std::io::Error;

	fn len(&self) -> std::result::Result<u64, Self::Error> {
		self.metadata().map(|m| m.len())
	}
}

impl Length for Vec<u8> {
	type Error = std::convert::Infallible;

	fn len(&self) -> std::result::Result<u64, Self::Error> {
		Ok(self.len() as u64)
	}
}

impl<T> Length for Cursor<T>
where
	T: Length,
{
	type Error = <T as Length>::Error;

	fn len(&self) -> std::result::Result<u64, Self::Error> {
		Length::len(self.get_ref())
	}
}

impl<T> Length for Box<T>
where
	T: Length,
{
	type Error = <T as Length>::Error;

	fn len(&self) -> std::result::Result<u64, Self::Error> {
		Length::len(self.as_ref())
	}
}

impl<T> Length for &T
where
	T: Length,
{
	type Error = <T as Length>::Error;

	fn len(&self) -> std::result::Result<u64, Self::Error> {
		Length::len(*self)
	}
}

impl<T> Length for &mut T
where
	T: Length,
{
	type Error = <T as Length>::Error;

	fn len(&self) -> std::result::Result<u64, Self::Error> {
		Length::len(*self)
	}
}

/// Provides a set of methods to read and write to a file-like object
///
/// This is a combination of the [`Read`], [`Write`], [`Seek`], [`Truncate`], and [`Length`] traits.
/// It is used to provide implementors access to any file saving methods such as [`ApeTag::save_to`](crate::ape::ApeTag::save_to).
///
/// Take great care in implementing this for downstream types, as tagsplice will assume that the
/// trait implementations are correct. If this assumption were to be broken, files **may** become corrupted.
pub trait FileLike: Read + Write + Seek + Truncate + Length {}

impl<T> FileLike for T where T: Read + Write + Seek + Truncate + Length {}

/// Fetch the length of a [`FileLike`], converting the implementor's error
pub(crate) fn file_len<F>(file: &F) -> Result<u64>
where
	F: Length + ?Sized,
{
	Length::len(file).map_err(Into::into)
}

/// Resize a [`FileLike`], converting the implementor's error
pub(crate) fn set_file_len<F>(file: &mut F, new_len: u64) -> Result<()>
where
	F: Truncate + ?Sized,
{
	Truncate::truncate(file, new_len).map_err(Into::into)
}

#[cfg(test)]
mod tests {
	use super::{Length, Truncate};

	use std::io::{Cursor, Read, Seek, Write};

	#[test_log::test]
	fn vec_truncate_extends_with_zeros() {
		let mut data = vec![1u8, 2, 3];
		Truncate::truncate(&mut data, 5).unwrap();
		assert_eq!(data, [1, 2, 3, 0, 0]);

		Truncate::truncate(&mut data, 1).unwrap();
		assert_eq!(data, [1]);
	}

	#[test_log::test]
	fn file_truncate_extends_with_zeros() {
		let mut file = tempfile::tempfile().unwrap();
		file.write_all(&[0xFF; 4]).unwrap();

		Truncate::truncate(&mut file, 8).unwrap();
		assert_eq!(Length::len(&file).unwrap(), 8);

		file.rewind().unwrap();
		let mut contents = Vec::new();
		file.read_to_end(&mut contents).unwrap();
		assert_eq!(contents, [0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0]);
	}

	#[test_log::test]
	fn cursor_length_uses_inner() {
		let cursor = Cursor::new(vec![0u8; 12]);
		assert_eq!(Length::len(&cursor).unwrap(), 12);
	}
}
