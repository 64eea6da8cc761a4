//! In-place metadata splicing for MP4 atoms and APEv2 tags.
//!
//! Tags are rewritten without copying the rest of the file: the bytes after the tag are shifted in
//! place, through a memory map when possible and in fixed size blocks otherwise.
//!
//! # Examples
//!
//! ## Editing an APE tag
//!
//! ```rust,no_run
//! # fn main() -> tagsplice::error::Result<()> {
//! use tagsplice::ape::ApeTag;
//! use tagsplice::config::{ParseOptions, WriteOptions};
//! use tagsplice::tag::TagExt;
//! use std::fs::OpenOptions;
//!
//! let mut file = OpenOptions::new().read(true).write(true).open("test.wv")?;
//!
//! let mut tag = ApeTag::read_from(&mut file, ParseOptions::new())?;
//! tag.insert_text("Artist", "Foo artist")?;
//!
//! tag.save_to(&mut file, WriteOptions::new())?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Editing an MP4 `ilst`
//!
//! ```rust,no_run
//! # fn main() -> tagsplice::error::Result<()> {
//! use tagsplice::config::{ParseOptions, WriteOptions};
//! use tagsplice::mp4::{Atom, AtomData, AtomIdent, Ilst};
//! use tagsplice::tag::TagExt;
//! use std::fs::OpenOptions;
//!
//! let mut file = OpenOptions::new().read(true).write(true).open("test.m4a")?;
//!
//! let mut ilst = Ilst::read_from(&mut file, ParseOptions::new())?;
//! ilst.insert(Atom::new(
//! 	AtomIdent::Fourcc(*b"\xA9nam"),
//! 	AtomData::Utf8(String::from("Foo title")),
//! ));
//!
//! // The sizes of `meta`, `udta` and `moov` and the chunk offsets are updated as needed
//! ilst.save_to(&mut file, WriteOptions::new())?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Working with atoms directly
//!
//! ```rust,no_run
//! # fn main() -> tagsplice::error::Result<()> {
//! use tagsplice::config::ParseOptions;
//! use tagsplice::mp4::{AtomTree, render};
//! use std::fs::OpenOptions;
//!
//! let mut file = OpenOptions::new().read(true).write(true).open("test.m4a")?;
//!
//! let mut tree = AtomTree::read_from(&mut file, ParseOptions::new())?;
//! let udta = tree.find("moov.udta")?;
//! tree.append_child(&mut file, udta, &render(*b"free", &[0; 32])?)?;
//! # Ok(())
//! # }
//! ```

pub mod ape;
pub mod config;
pub mod error;
pub(crate) mod macros;
pub mod mp4;
pub mod splice;
pub mod tag;
mod util;

pub use util::io;
