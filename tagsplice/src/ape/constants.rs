// https://wiki.hydrogenaud.io/index.php?title=APE_Tags_Header
pub(crate) const APE_PREAMBLE: &[u8; 8] = b"APETAGEX";

// Both the header and footer are 32 bytes
pub(crate) const APE_HEADER_SIZE: u64 = 32;

pub(crate) const APE_VERSION_1: u32 = 1000;
pub(crate) const APE_VERSION_2: u32 = 2000;

// Tag flags
pub(crate) const FLAG_READ_ONLY: u32 = 1;
pub(crate) const FLAG_IS_HEADER: u32 = 1 << 29;
pub(crate) const FLAG_HAS_NO_FOOTER: u32 = 1 << 30;
pub(crate) const FLAG_HAS_HEADER: u32 = 1 << 31;

pub(super) const INVALID_KEYS: [&str; 4] = ["ID3", "TAG", "OGGS", "MP+"];

// Legacy trailers that may follow an APE tag
pub(crate) const ID3V1_MARKER: &[u8; 3] = b"TAG";
pub(crate) const ID3V1_SIZE: u64 = 128;
pub(crate) const LYRICS3V2_MARKER: &[u8; 9] = b"LYRICS200";
pub(crate) const LYRICS3V2_SIZE_LEN: u64 = 6;

// Old PyMusepack versions left the first 24 bytes of the previous header behind on rewrite
pub(crate) const LEGACY_HEADER_STEP: u64 = 24;
