use backtrace::Backtrace;
use std::fmt::{Debug, Display, Formatter};

pub struct Error(pub(crate) Box<Inner>);

impl Error {
    #[inline]
    pub fn kind(&self) -> &ErrorKind {
        &self.0.kind
    }

    #[cold]
    #[inline(never)]
    pub fn buffer_too_short(minimum: usize, actual: usize) -> Self {
        Self::from(ErrorKind::BufferTooShort { minimum, actual })
    }

    #[cold]
    #[inline(never)]
    pub fn buffer_underrun(offset: usize, requested: usize, remaining: usize) -> Self {
        Self::from(ErrorKind::BufferUnderrun {
            offset,
            requested,
            remaining,
        })
    }

    #[cold]
    #[inline(never)]
    pub fn invalid_signer_block(reason: impl Into<String>) -> Self {
        Self::from(ErrorKind::InvalidSignerBlock {
            reason: reason.into(),
        })
    }

    #[cold]
    #[inline(never)]
    pub fn invalid_length(error: LengthError) -> Self {
        Self::from(ErrorKind::InvalidLength(error))
    }

    #[cold]
    #[inline(never)]
    pub fn unexpected_magic(expected: u8, found: u8) -> Self {
        Self::from(ErrorKind::UnexpectedMagic { expected, found })
    }

    /// Whether the whole decode has to be abandoned, as opposed to an error the payload
    /// loop absorbs by truncating.
    pub fn is_fatal(&self) -> bool {
        !matches!(self.kind(), ErrorKind::InvalidLength(_))
    }
}

impl From<ErrorKind> for Error {
    #[inline]
    fn from(kind: ErrorKind) -> Self {
        Error(Box::new(Inner::from(kind)))
    }
}

impl From<LengthError> for Error {
    #[inline]
    fn from(e: LengthError) -> Self {
        Self::invalid_length(e)
    }
}

impl Debug for Error {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.0.kind)?;
        let mut backtrace = self.0.backtrace.clone();
        backtrace.resolve();
        writeln!(f, "{backtrace:?}")
    }
}

impl std::error::Error for Error {
    fn description(&self) -> &str {
        "decoding the visible digital seal failed"
    }
}

#[derive(Debug)]
pub(crate) struct Inner {
    pub(crate) kind: ErrorKind,
    pub(crate) backtrace: Backtrace,
}

impl From<ErrorKind> for Inner {
    #[inline]
    fn from(kind: ErrorKind) -> Self {
        Self {
            kind,
            backtrace: Backtrace::new_unresolved(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    BufferTooShort {
        minimum: usize,
        actual: usize,
    },
    BufferUnderrun {
        offset: usize,
        requested: usize,
        remaining: usize,
    },
    InvalidSignerBlock {
        reason: String,
    },
    InvalidLength(LengthError),
    UnexpectedMagic {
        expected: u8,
        found: u8,
    },
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::BufferTooShort { minimum, actual } => {
                write!(
                    f,
                    "Buffer too short for a header, requires at least {minimum} bytes but got {actual}"
                )
            }
            ErrorKind::BufferUnderrun {
                offset,
                requested,
                remaining,
            } => {
                write!(
                    f,
                    "Cannot read {requested} bytes at offset {offset}, only {remaining} remaining"
                )
            }
            ErrorKind::InvalidSignerBlock { reason } => {
                write!(f, "Invalid signer block: {reason}")
            }
            ErrorKind::InvalidLength(e) => write!(f, "Invalid length encoding: {e}"),
            ErrorKind::UnexpectedMagic { expected, found } => {
                write!(
                    f,
                    "Expected magic byte 0x{expected:02X} but got 0x{found:02X}"
                )
            }
        }
    }
}

/// Reasons a DER length field is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LengthError {
    /// Not even the first length octet is present
    Missing,
    /// `0x80`, the indefinite form
    Indefinite,
    /// More than four length octets announced
    ExcessiveOctets(u8),
    /// The length octets themselves are cut off
    MissingOctets { expected: u8, available: usize },
    /// The decoded length points past the end of the buffer
    ExceedsBuffer { length: usize, remaining: usize },
}

impl Display for LengthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LengthError::Missing => write!(f, "length octet missing"),
            LengthError::Indefinite => write!(f, "indefinite length form is not supported"),
            LengthError::ExcessiveOctets(count) => {
                write!(f, "{count} length octets announced, at most 4 are supported")
            }
            LengthError::MissingOctets {
                expected,
                available,
            } => write!(
                f,
                "{expected} length octets announced but only {available} available"
            ),
            LengthError::ExceedsBuffer { length, remaining } => write!(
                f,
                "declared length {length} exceeds the {remaining} remaining bytes"
            ),
        }
    }
}
