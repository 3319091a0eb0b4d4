//! Field level encodings found inside the header and the TLV values.

pub mod c40;
pub mod date;
pub mod text;

pub use date::PackedDate;
pub use text::{DecodedText, TextCodec};
