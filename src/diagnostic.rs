//! Structured events describing every fallback or irregularity met while decoding.
//!
//! Each event is forwarded to the `log` facade and, unless disabled in the
//! [`DecoderConfig`](crate::DecoderConfig), collected on the result.

use crate::codec::TextCodec;
use crate::io::LengthError;
use crate::payload::Field;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Byte offset into the raw buffer the event refers to
    pub offset: usize,
    pub event: DiagnosticEvent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticEvent {
    UnexpectedMagic { expected: u8, found: u8 },
    TextFallback { field: Field, codec: TextCodec },
    DateUndecodable { field: Field, raw: String },
    UnknownTag { tag: u8, length: usize },
    InvalidBoolean { length: usize },
    DuplicateField { field: Field },
    PayloadTruncated { tag: u8, reason: LengthError },
    SignatureMissing,
    TrailingBytes { count: usize },
}

impl DiagnosticEvent {
    /// Events that mean information was lost rather than merely reinterpreted.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            DiagnosticEvent::UnexpectedMagic { .. }
                | DiagnosticEvent::PayloadTruncated { .. }
                | DiagnosticEvent::DateUndecodable { .. }
                | DiagnosticEvent::TrailingBytes { .. }
        )
    }
}

impl Display for DiagnosticEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticEvent::UnexpectedMagic { expected, found } => {
                write!(f, "magic byte 0x{found:02X}, expected 0x{expected:02X}")
            }
            DiagnosticEvent::TextFallback { field, codec } => {
                write!(f, "{field} decoded using fallback codec {codec}")
            }
            DiagnosticEvent::DateUndecodable { field, raw } => {
                write!(f, "{field} is not a calendar date (0x{raw})")
            }
            DiagnosticEvent::UnknownTag { tag, length } => {
                write!(f, "unknown tag 0x{tag:02X} with {length} bytes kept")
            }
            DiagnosticEvent::InvalidBoolean { length } => {
                write!(f, "boolean value with {length} bytes kept as unknown field")
            }
            DiagnosticEvent::DuplicateField { field } => {
                write!(f, "{field} repeated, keeping the last value")
            }
            DiagnosticEvent::PayloadTruncated { tag, reason } => {
                write!(f, "payload truncated at tag 0x{tag:02X}: {reason}")
            }
            DiagnosticEvent::SignatureMissing => write!(f, "no signature record"),
            DiagnosticEvent::TrailingBytes { count } => {
                write!(f, "{count} bytes left after the last record")
            }
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}: {}", self.offset, self.event)
    }
}

/// Collects events for one decode call.
#[derive(Debug, Default)]
pub(crate) struct Diagnostics {
    collect: bool,
    events: Vec<Diagnostic>,
}

impl Diagnostics {
    pub(crate) fn new(collect: bool) -> Self {
        Self {
            collect,
            events: Vec::new(),
        }
    }

    pub(crate) fn emit(&mut self, offset: usize, event: DiagnosticEvent) {
        if event.is_warning() {
            log::warn!("@{}: {}", offset, event);
        } else {
            log::debug!("@{}: {}", offset, event);
        }
        if self.collect {
            self.events.push(Diagnostic { offset, event });
        }
    }

    pub(crate) fn into_inner(self) -> Vec<Diagnostic> {
        self.events
    }
}
