//! Decoder for identity documents sealed into a QR code following the ICAO 9303
//! "Visible Digital Seal" conventions.
//!
//! The QR reader hands over the raw payload bytes of a symbol, [`decode`] turns them into a
//! [`DecodeResult`]:
//!
//! ```plain
//! raw bytes -> Header -> TLV records -> Signature -> DecodeResult
//! ```
//!
//! Only a header that cannot be read fails the decode. Malformed records, text in an
//! unexpected encoding or dates that are not dates degrade the result instead and are
//! reported as [`Diagnostic`]s.
//!
//! ```
//! use vds_decode::prelude::*;
//!
//! let seal = [
//!     0xDC, 0x01, b'E', b'S',                 // magic, version, country
//!     0x5B, 0xBC, 0x77, 0x5B, 0xBC, 0x77,     // issue and signature date, 01-06-2023
//!     0x07, 0x09,                             // document type and category
//!     0x40, 0x03, b'A', b'B', b'C',           // document number
//!     0xFF, 0x02, 0xBE, 0xEF,                 // signature
//! ];
//! let result = decode(&seal).unwrap();
//! assert_eq!(Some("ABC"), result.payload.document_number.as_deref());
//! assert_eq!("BEEF", result.signature.unwrap().hex());
//! ```
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(unused_extern_crates)]

#[macro_use]
pub extern crate serde_derive;

pub mod codec;
pub mod diagnostic;
pub mod header;
pub mod io;
pub mod payload;
pub mod prelude;
pub mod render;
pub mod seal;

pub use diagnostic::{Diagnostic, DiagnosticEvent};
pub use io::{Error, ErrorKind};
pub use seal::{decode, DecodeResult, Decoder, DecoderConfig, Signature};
