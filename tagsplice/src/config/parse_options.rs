/// The parsing strictness mode
///
/// This can be set with [`ParseOptions::parsing_mode`].
///
/// # Examples
///
/// ```rust
/// use tagsplice::config::{ParseOptions, ParsingMode};
///
/// // Fail on any illegal item key
/// let parsing_options = ParseOptions::new().parsing_mode(ParsingMode::Strict);
/// ```
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
#[non_exhaustive]
pub enum ParsingMode {
	/// Will eagerly error on invalid input
	///
	/// An APE item with an illegal key or a text value that isn't UTF-8 fails the whole load.
	Strict,
	/// Default mode, less eager to error on recoverably malformed input
	///
	/// Illegal items are logged and skipped.
	#[default]
	BestAttempt,
	/// Least eager to error, may produce invalid/partial output
	///
	/// In addition to [`ParsingMode::BestAttempt`], a box whose declared size runs past its parent
	/// ends the scan of that parent instead of failing.
	Relaxed,
}

/// Options to control how tagsplice parses a file
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct ParseOptions {
	pub(crate) parsing_mode: ParsingMode,
	pub(crate) max_legacy_headers: usize,
}

impl Default for ParseOptions {
	/// The default implementation for `ParseOptions`
	///
	/// The defaults are as follows:
	///
	/// ```rust,ignore
	/// ParseOptions {
	/// 	parsing_mode: ParsingMode::BestAttempt,
	/// 	max_legacy_headers: 64,
	/// }
	/// ```
	fn default() -> Self {
		Self::new()
	}
}

impl ParseOptions {
	/// Default parsing mode
	pub const DEFAULT_PARSING_MODE: ParsingMode = ParsingMode::BestAttempt;

	/// Default number of stray APE headers to step over
	pub const DEFAULT_MAX_LEGACY_HEADERS: usize = 64;

	/// Creates a new `ParseOptions`, alias for `Default` implementation
	///
	/// See also: [`ParseOptions::default`]
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsplice::config::ParseOptions;
	///
	/// let parsing_options = ParseOptions::new();
	/// ```
	#[must_use]
	pub const fn new() -> Self {
		Self {
			parsing_mode: Self::DEFAULT_PARSING_MODE,
			max_legacy_headers: Self::DEFAULT_MAX_LEGACY_HEADERS,
		}
	}

	/// The parsing mode to use, see [`ParsingMode`] for details
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsplice::config::{ParseOptions, ParsingMode};
	///
	/// // By default, `parsing_mode` is ParsingMode::BestAttempt. Here, we need absolute correctness.
	/// let parsing_options = ParseOptions::new().parsing_mode(ParsingMode::Strict);
	/// ```
	pub fn parsing_mode(&mut self, parsing_mode: ParsingMode) -> Self {
		self.parsing_mode = parsing_mode;
		*self
	}

	/// The maximum number of stray APE headers to step over when locating a tag
	///
	/// Some old writers left the first 24 bytes of the previous header in place when rewriting
	/// a tag, stacking copies in front of the real one. These are included in the tag's span so
	/// they get removed on the next save.
	///
	/// # Examples
	///
	/// ```rust
	/// use tagsplice::config::ParseOptions;
	///
	/// // Never look behind the header
	/// let parsing_options = ParseOptions::new().max_legacy_headers(0);
	/// ```
	pub fn max_legacy_headers(&mut self, max_legacy_headers: usize) -> Self {
		self.max_legacy_headers = max_legacy_headers;
		*self
	}
}
