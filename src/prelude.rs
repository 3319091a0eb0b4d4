pub use crate::codec::{PackedDate, TextCodec};
pub use crate::diagnostic::{Diagnostic, DiagnosticEvent};
pub use crate::header::{DocumentType, Header, HeaderFormat, SignerInfo, SignerLayout};
pub use crate::io::{ByteCursor, Error, ErrorKind, LengthError};
pub use crate::payload::{Field, ImageFormat, Payload, Portrait, Tag, UnknownField};
pub use crate::render::ScanOutcome;
pub use crate::seal::{decode, DecodeResult, Decoder, DecoderConfig, Signature};
