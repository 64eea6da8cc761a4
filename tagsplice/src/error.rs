//! Contains the errors that can arise within tagsplice
//!
//! The primary error is [`TagError`]. The type of error is determined by [`ErrorKind`],
//! which can be extended at any time. Every kind belongs to one [`ErrorCategory`].

use crate::tag::TagType;

use std::collections::TryReserveError;
use std::fmt::{Debug, Display, Formatter};

/// Alias for `Result<T, TagError>`
pub type Result<T> = std::result::Result<T, TagError>;

/// The types of errors that can occur
#[derive(Debug)]
#[non_exhaustive]
pub enum ErrorKind {
	// Argument errors
	/// A splice or tree mutation was given an unusable argument
	///
	/// For example, a zero splice size, a range outside of the file, or a removed atom.
	InvalidArgument(&'static str),
	/// The target cannot be memory mapped, the caller should use the streaming path
	MapUnavailable,

	// Structural errors
	/// Fewer bytes remained than a header requires
	TruncatedHeader,
	/// A payload is too large to be described by any header form
	PayloadTooLarge,
	/// Attempting to allocate an abnormally large amount of data
	TooMuchData,
	/// Expected the data to be a different size than provided
	///
	/// This occurs when the size of an item is written as one value, but that size is either too
	/// big or small to be valid within the bounds of that item.
	SizeMismatch,
	/// Errors that occur while decoding a file
	FileDecoding(FileDecodingError),
	/// Errors that occur while encoding a file
	FileEncoding(FileEncodingError),
	/// Arises when an atom contains invalid data
	BadAtom(&'static str),
	/// The flat tag declares a version other than 1000 or 2000
	UnsupportedVersion(u32),

	// Lookup errors
	/// A box path could not be resolved
	NotFound,
	/// The file has no tag of the requested format
	NoTagFound,

	// Validation errors
	/// An APE item declared the reserved value kind
	InvalidItemKind(u32),
	/// An APE item key is outside of the allowed charset, length, or is reserved
	InvalidKey,
	/// Attempted to save over a tag flagged as read only
	ReadOnly,

	// Conversions for external errors
	/// Unable to convert bytes to a String
	StringFromUtf8(std::string::FromUtf8Error),
	/// Unable to convert bytes to a str
	StrFromUtf8(std::str::Utf8Error),
	/// Represents all cases of [`std::io::Error`].
	Io(std::io::Error),
	/// Failure to allocate enough memory
	Alloc(TryReserveError),
	/// This should **never** be encountered
	Infallible(std::convert::Infallible),
}

/// The broad class an [`ErrorKind`] falls into
///
/// Callers that only care whether a file "has no metadata" versus "is broken" can match on this
/// instead of every individual kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
	/// Malformed header or length fields, truncated reads
	Structural,
	/// No tag (or box) present, an expected outcome
	NotFound,
	/// An illegal key, value, kind code, or argument
	Validation,
	/// Platform I/O failures
	Io,
}

/// An error that arises while decoding a file
pub struct FileDecodingError {
	format: Option<TagType>,
	description: &'static str,
}

impl FileDecodingError {
	/// Create a `FileDecodingError` from a [`TagType`] and description
	#[must_use]
	pub const fn new(format: TagType, description: &'static str) -> Self {
		Self {
			format: Some(format),
			description,
		}
	}

	/// Create a `FileDecodingError` without binding it to a [`TagType`]
	pub fn from_description(description: &'static str) -> Self {
		Self {
			format: None,
			description,
		}
	}

	/// Returns the associated [`TagType`], if one exists
	pub fn format(&self) -> Option<TagType> {
		self.format
	}

	/// Returns the error description
	pub fn description(&self) -> &str {
		self.description
	}
}

impl Debug for FileDecodingError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		if let Some(format) = self.format {
			write!(f, "{:?}: {:?}", format, self.description)
		} else {
			write!(f, "{:?}", self.description)
		}
	}
}

impl Display for FileDecodingError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		if let Some(format) = self.format {
			write!(f, "{:?}: {}", format, self.description)
		} else {
			write!(f, "{}", self.description)
		}
	}
}

/// An error that arises while encoding a file
pub struct FileEncodingError {
	format: Option<TagType>,
	description: &'static str,
}

impl FileEncodingError {
	/// Create a `FileEncodingError` from a [`TagType`] and description
	#[must_use]
	pub const fn new(format: TagType, description: &'static str) -> Self {
		Self {
			format: Some(format),
			description,
		}
	}

	/// Create a `FileEncodingError` without binding it to a [`TagType`]
	pub fn from_description(description: &'static str) -> Self {
		Self {
			format: None,
			description,
		}
	}

	/// Returns the associated [`TagType`], if one exists
	pub fn format(&self) -> Option<TagType> {
		self.format
	}

	/// Returns the error description
	pub fn description(&self) -> &str {
		self.description
	}
}

impl Debug for FileEncodingError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		if let Some(format) = self.format {
			write!(f, "{:?}: {:?}", format, self.description)
		} else {
			write!(f, "{:?}", self.description)
		}
	}
}

impl Display for FileEncodingError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		if let Some(format) = self.format {
			write!(f, "{:?}: {}", format, self.description)
		} else {
			write!(f, "{}", self.description)
		}
	}
}

/// Errors that could occur within tagsplice
pub struct TagError {
	pub(crate) kind: ErrorKind,
}

impl TagError {
	/// Create a `TagError` from an [`ErrorKind`]
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsplice::error::{ErrorKind, TagError};
	///
	/// let no_tag = TagError::new(ErrorKind::NoTagFound);
	/// ```
	#[must_use]
	pub const fn new(kind: ErrorKind) -> Self {
		Self { kind }
	}

	/// Returns the [`ErrorKind`]
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsplice::error::{ErrorKind, TagError};
	///
	/// let no_tag = TagError::new(ErrorKind::NoTagFound);
	/// if let ErrorKind::NoTagFound = no_tag.kind() {
	/// 	println!("The file has no tag");
	/// }
	/// ```
	pub fn kind(&self) -> &ErrorKind {
		&self.kind
	}

	/// Returns the [`ErrorCategory`] of this error
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsplice::error::{ErrorCategory, ErrorKind, TagError};
	///
	/// let no_tag = TagError::new(ErrorKind::NoTagFound);
	/// assert_eq!(no_tag.category(), ErrorCategory::NotFound);
	/// ```
	pub fn category(&self) -> ErrorCategory {
		match self.kind {
			ErrorKind::NotFound | ErrorKind::NoTagFound => ErrorCategory::NotFound,
			ErrorKind::InvalidArgument(_)
			| ErrorKind::InvalidItemKind(_)
			| ErrorKind::InvalidKey
			| ErrorKind::ReadOnly
			| ErrorKind::FileEncoding(_)
			| ErrorKind::StringFromUtf8(_)
			| ErrorKind::StrFromUtf8(_) => ErrorCategory::Validation,
			ErrorKind::MapUnavailable | ErrorKind::Io(_) => ErrorCategory::Io,
			ErrorKind::TruncatedHeader
			| ErrorKind::PayloadTooLarge
			| ErrorKind::TooMuchData
			| ErrorKind::SizeMismatch
			| ErrorKind::FileDecoding(_)
			| ErrorKind::BadAtom(_)
			| ErrorKind::UnsupportedVersion(_)
			| ErrorKind::Alloc(_)
			| ErrorKind::Infallible(_) => ErrorCategory::Structural,
		}
	}
}

impl std::error::Error for TagError {}

impl Debug for TagError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{:?}", self.kind)
	}
}

impl From<FileDecodingError> for TagError {
	fn from(input: FileDecodingError) -> Self {
		Self {
			kind: ErrorKind::FileDecoding(input),
		}
	}
}

impl From<FileEncodingError> for TagError {
	fn from(input: FileEncodingError) -> Self {
		Self {
			kind: ErrorKind::FileEncoding(input),
		}
	}
}

impl From<std::io::Error> for TagError {
	fn from(input: std::io::Error) -> Self {
		Self {
			kind: ErrorKind::Io(input),
		}
	}
}

/// Maps a short read inside of a header or item to [`ErrorKind::TruncatedHeader`]
///
/// Only for use at parse sites. Anywhere else, running out of data is an I/O failure.
pub(crate) fn truncated(input: std::io::Error) -> TagError {
	if input.kind() == std::io::ErrorKind::UnexpectedEof {
		return TagError::new(ErrorKind::TruncatedHeader);
	}

	TagError::from(input)
}

impl From<std::string::FromUtf8Error> for TagError {
	fn from(input: std::string::FromUtf8Error) -> Self {
		Self {
			kind: ErrorKind::StringFromUtf8(input),
		}
	}
}

impl From<std::str::Utf8Error> for TagError {
	fn from(input: std::str::Utf8Error) -> Self {
		Self {
			kind: ErrorKind::StrFromUtf8(input),
		}
	}
}

impl From<std::collections::TryReserveError> for TagError {
	fn from(input: TryReserveError) -> Self {
		Self {
			kind: ErrorKind::Alloc(input),
		}
	}
}

impl From<std::convert::Infallible> for TagError {
	fn from(input: std::convert::Infallible) -> Self {
		Self {
			kind: ErrorKind::Infallible(input),
		}
	}
}

impl Display for TagError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self.kind {
			// Conversions
			ErrorKind::StringFromUtf8(ref err) => write!(f, "{err}"),
			ErrorKind::StrFromUtf8(ref err) => write!(f, "{err}"),
			ErrorKind::Io(ref err) => write!(f, "{err}"),
			ErrorKind::Alloc(ref err) => write!(f, "{err}"),

			ErrorKind::InvalidArgument(reason) => write!(f, "Invalid argument: {reason}"),
			ErrorKind::MapUnavailable => write!(f, "Unable to memory map the target"),
			ErrorKind::TruncatedHeader => write!(
				f,
				"Encountered a header with fewer bytes available than it requires"
			),
			ErrorKind::PayloadTooLarge => write!(
				f,
				"Payload is too large to be described by a 64-bit size"
			),
			ErrorKind::TooMuchData => write!(
				f,
				"Attempted to read/write an abnormally large amount of data"
			),
			ErrorKind::SizeMismatch => write!(
				f,
				"Encountered an invalid item size, either too big or too small to be valid"
			),
			ErrorKind::FileDecoding(ref file_decode_err) => write!(f, "{file_decode_err}"),
			ErrorKind::FileEncoding(ref file_encode_err) => write!(f, "{file_encode_err}"),
			ErrorKind::BadAtom(message) => write!(f, "MP4 Atom: {message}"),
			ErrorKind::UnsupportedVersion(version) => write!(
				f,
				"APE: Found an unsupported version ({version}), expected 1000 or 2000"
			),
			ErrorKind::NotFound => write!(f, "No box exists at the requested path"),
			ErrorKind::NoTagFound => write!(f, "No tag was found in the file"),
			ErrorKind::InvalidItemKind(kind) => write!(
				f,
				"APE: Found an item with an invalid value kind ({kind}), expected 0, 1, or 2"
			),
			ErrorKind::InvalidKey => write!(f, "APE: Encountered an illegal item key"),
			ErrorKind::ReadOnly => write!(f, "APE: Attempted to overwrite a read only tag"),

			ErrorKind::Infallible(_) => write!(f, "A expected condition was not upheld"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::{ErrorCategory, ErrorKind, TagError, truncated};

	#[test_log::test]
	fn short_reads_are_structural_only_when_parsing() {
		let err = truncated(std::io::Error::from(std::io::ErrorKind::UnexpectedEof));
		assert!(matches!(err.kind(), ErrorKind::TruncatedHeader));
		assert_eq!(err.category(), ErrorCategory::Structural);

		let err = TagError::from(std::io::Error::from(std::io::ErrorKind::UnexpectedEof));
		assert!(matches!(err.kind(), ErrorKind::Io(_)));
		assert_eq!(err.category(), ErrorCategory::Io);

		let err = truncated(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
		assert_eq!(err.category(), ErrorCategory::Io);
	}

	#[test_log::test]
	fn platform_errors_stay_io() {
		let io_err = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
		let err = TagError::from(io_err);

		assert_eq!(err.category(), ErrorCategory::Io);
	}

	#[test_log::test]
	fn categories() {
		assert_eq!(
			TagError::new(ErrorKind::InvalidItemKind(3)).category(),
			ErrorCategory::Validation
		);
		assert_eq!(
			TagError::new(ErrorKind::NotFound).category(),
			ErrorCategory::NotFound
		);
		assert_eq!(
			TagError::new(ErrorKind::UnsupportedVersion(3000)).category(),
			ErrorCategory::Structural
		);
	}
}
