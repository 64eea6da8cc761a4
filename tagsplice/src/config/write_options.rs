/// Options to control how tagsplice writes to a file
///
/// This acts as a dumping ground for all sorts of format-specific settings. As such, this is best
/// used as an application global config that gets set once.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct WriteOptions {
	pub(crate) preferred_padding: Option<u32>,
	pub(crate) respect_read_only: bool,
}

impl WriteOptions {
	/// Default preferred padding size in bytes
	pub const DEFAULT_PREFERRED_PADDING: u32 = 1024;

	/// Creates a new `WriteOptions`, alias for `Default` implementation
	///
	/// See also: [`WriteOptions::default`]
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsplice::config::WriteOptions;
	///
	/// let write_options = WriteOptions::new();
	/// ```
	pub const fn new() -> Self {
		Self {
			preferred_padding: Some(Self::DEFAULT_PREFERRED_PADDING),
			respect_read_only: true,
		}
	}

	/// Set the preferred padding size in bytes
	///
	/// If the tag format supports padding, this will be used as the preferred padding size. Currently
	/// only MP4 `ilst` atoms make use of it, through a trailing `free` atom.
	///
	/// NOTES:
	///
	/// * Not all tag formats support padding
	/// * The actual padding size may be different from this value, depending on tag size limitations
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsplice::config::WriteOptions;
	///
	/// // I really don't want my files rewritten, so I'll double the padding size!
	/// let options = WriteOptions::new().preferred_padding(2048);
	///
	/// // ...Or I don't want padding under any circumstances!
	/// let options = WriteOptions::new().preferred_padding(0);
	/// ```
	pub fn preferred_padding(mut self, preferred_padding: u32) -> Self {
		match preferred_padding {
			0 => self.preferred_padding = None,
			_ => self.preferred_padding = Some(preferred_padding),
		}
		self
	}

	/// Whether to respect read-only tag items
	///
	/// Some tag formats allow for a tag to be marked as read-only. If set, tagsplice will refuse to
	/// overwrite such a tag with [`ErrorKind::ReadOnly`](crate::error::ErrorKind::ReadOnly).
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsplice::config::WriteOptions;
	///
	/// // I don't care about read-only tags, I want to write my new values!
	/// let options = WriteOptions::new().respect_read_only(false);
	/// ```
	pub fn respect_read_only(mut self, respect_read_only: bool) -> Self {
		self.respect_read_only = respect_read_only;
		self
	}
}

impl Default for WriteOptions {
	/// The default implementation for `WriteOptions`
	///
	/// The defaults are as follows:
	///
	/// ```rust,ignore
	/// WriteOptions {
	/// 	preferred_padding: 1024,
	/// 	respect_read_only: true,
	/// }
	/// ```
	fn default() -> Self {
		Self::new()
	}
}
