//! APE specific items
//!
//! ## Tag location
//!
//! APE tags are expected at the end of a file, optionally followed by an ID3v1 tag (and a Lyrics3v2
//! block before it). Some writers put them at the start instead. [`TagLocation`] finds either, and
//! is used by both reading and writing.
//!
//! ## Writing
//!
//! Tags are always written to the end of the file, with both a header and a footer. Any ID3v1 or
//! Lyrics3v2 block that followed the old tag is dropped.
pub(crate) mod constants;
pub(crate) mod header;
mod location;
pub(crate) mod tag;

// Exports

pub use location::TagLocation;
pub use tag::ApeTag;
pub use tag::item::{ApeItem, is_valid_key};

pub(crate) use tag::write::remove_from;
