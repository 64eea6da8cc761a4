#![allow(missing_docs)]

mod ape;
mod mp4;
mod splice;
pub(crate) mod util;
