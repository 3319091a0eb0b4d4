//! Byte level reading shared by every decoding stage.

mod cursor;
mod err;
pub mod length;

pub use cursor::ByteCursor;
pub use err::{Error, ErrorKind, LengthError};
pub use length::{read_length, write_length};
