//! Format-agnostic tag handling

pub(crate) mod item;
mod tag_ext;
mod tag_type;

pub use item::ItemValue;
pub use tag_ext::TagExt;
pub use tag_type::TagType;
