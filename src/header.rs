//! The seal header in front of the TLV payload.
//!
//! ```plain
//! | magic | version | country | [signer block] | issue date | signature date | type | category |
//! |   1   |    1    |    2    |   6..=n (C40)  |     3      |       3        |  1   |    1     |
//! ```
//!
//! The signer block is only present in the [`HeaderFormat::PackedSigner`] format and its
//! length depends on the [`SignerLayout`].

use crate::codec::{c40, PackedDate};
use crate::diagnostic::{DiagnosticEvent, Diagnostics};
use crate::io::{ByteCursor, Error};
use crate::payload::Field;
use crate::seal::DecoderConfig;
use std::fmt::{Display, Formatter};

pub const MAGIC: u8 = 0xDC;
/// magic, version, country, two dates, type and category
pub const MIN_HEADER_LEN: usize = 12;

pub const VERSION_FIXED_REFERENCE: u8 = 0x02;
pub const VERSION_SIZED_REFERENCE: u8 = 0x03;

const COUNTRY_LEN: usize = 2;
const SIGNER_BLOCK_INITIAL_LEN: usize = 6;
/// country (2), entity (2), reference size (2)
const SIGNER_PREFIX_CHARS: usize = 6;
const SIGNER_ID_CHARS: usize = 4;
const FIXED_REFERENCE_CHARS: usize = 5;
const C40_GROUP_CHARS: usize = 3;
const C40_GROUP_LEN: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeaderFormat {
    /// Two plain ASCII country bytes, no signer block
    Simple,
    /// C40 country and a C40 signer / certificate reference block
    PackedSigner(SignerLayout),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignerLayout {
    /// Four signer characters followed by a five character certificate reference
    FixedReference,
    /// Four signer characters, two hex digits announcing the reference length, the reference
    SizedReference,
}

impl HeaderFormat {
    pub fn from_version(version: u8) -> Self {
        match version {
            VERSION_FIXED_REFERENCE => HeaderFormat::PackedSigner(SignerLayout::FixedReference),
            VERSION_SIZED_REFERENCE => HeaderFormat::PackedSigner(SignerLayout::SizedReference),
            _ => HeaderFormat::Simple,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerInfo {
    pub country: String,
    pub entity: String,
    pub certificate_reference: String,
}

impl SignerInfo {
    /// Country and entity code, e.g. `"ESPN"`
    pub fn identifier(&self) -> String {
        format!("{}{}", self.country, self.entity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    Simple,
    Full,
    AgeVerification,
    Unknown(u8),
}

impl From<u8> for DocumentType {
    fn from(value: u8) -> Self {
        match value {
            0x07 => DocumentType::Simple,
            0x08 => DocumentType::Full,
            0x09 => DocumentType::AgeVerification,
            other => DocumentType::Unknown(other),
        }
    }
}

impl DocumentType {
    pub fn value(self) -> u8 {
        match self {
            DocumentType::Simple => 0x07,
            DocumentType::Full => 0x08,
            DocumentType::AgeVerification => 0x09,
            DocumentType::Unknown(other) => other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DocumentType::Simple => "simple",
            DocumentType::Full => "full",
            DocumentType::AgeVerification => "age-verification-only",
            DocumentType::Unknown(_) => "unknown",
        }
    }
}

impl Display for DocumentType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (0x{:02X})", self.label(), self.value())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub magic: u8,
    pub version: u8,
    pub format: HeaderFormat,
    pub issuing_country: String,
    pub signer: Option<SignerInfo>,
    pub issue_date: PackedDate,
    pub signature_date: PackedDate,
    pub document_type: DocumentType,
    pub document_category: u8,
}

impl Header {
    pub(crate) fn read(
        cursor: &mut ByteCursor<'_>,
        config: &DecoderConfig,
        diagnostics: &mut Diagnostics,
    ) -> Result<Self, Error> {
        if cursor.remaining() < MIN_HEADER_LEN {
            return Err(Error::buffer_too_short(MIN_HEADER_LEN, cursor.remaining()));
        }

        let magic = cursor.read_byte()?;
        if magic != config.expected_magic {
            if config.require_magic {
                return Err(Error::unexpected_magic(config.expected_magic, magic));
            }
            diagnostics.emit(
                0,
                DiagnosticEvent::UnexpectedMagic {
                    expected: config.expected_magic,
                    found: magic,
                },
            );
        }

        let version = cursor.read_byte()?;
        let format = HeaderFormat::from_version(version);
        log::debug!("Header version 0x{:02X} selects {:?}", version, format);

        let (issuing_country, signer) = match format {
            HeaderFormat::Simple => (read_ascii_country(cursor)?, None),
            HeaderFormat::PackedSigner(layout) => {
                let country = c40::decode(cursor.read_bytes(COUNTRY_LEN)?);
                let signer = read_signer(cursor, layout)?;
                (country, Some(signer))
            }
        };

        let issue_date = read_date(cursor, Field::IssueDate, diagnostics)?;
        let signature_date = read_date(cursor, Field::SignatureDate, diagnostics)?;
        let document_type = DocumentType::from(cursor.read_byte()?);
        let document_category = cursor.read_byte()?;

        Ok(Header {
            magic,
            version,
            format,
            issuing_country,
            signer,
            issue_date,
            signature_date,
            document_type,
            document_category,
        })
    }
}

fn read_ascii_country(cursor: &mut ByteCursor<'_>) -> Result<String, Error> {
    let bytes = cursor.read_bytes(COUNTRY_LEN)?;
    let country = bytes
        .iter()
        .map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                char::from(b)
            } else {
                '?'
            }
        })
        .collect::<String>();
    Ok(country.trim_end().to_string())
}

fn read_date(
    cursor: &mut ByteCursor<'_>,
    field: Field,
    diagnostics: &mut Diagnostics,
) -> Result<PackedDate, Error> {
    let offset = cursor.position();
    let date = PackedDate::decode(cursor.read_array()?);
    if let PackedDate::Undecodable { raw } = date {
        diagnostics.emit(
            offset,
            DiagnosticEvent::DateUndecodable {
                field,
                raw: hex::encode_upper(&raw),
            },
        );
    }
    Ok(date)
}

fn read_signer(cursor: &mut ByteCursor<'_>, layout: SignerLayout) -> Result<SignerInfo, Error> {
    let initial = c40_chars(cursor.peek_bytes(SIGNER_BLOCK_INITIAL_LEN)?);
    if initial.len() < SIGNER_PREFIX_CHARS {
        return Err(Error::invalid_signer_block(format!(
            "expected at least {} characters but decoded {}",
            SIGNER_PREFIX_CHARS,
            initial.len()
        )));
    }

    let reference_len = match layout {
        SignerLayout::FixedReference => FIXED_REFERENCE_CHARS,
        SignerLayout::SizedReference => {
            let digits = initial[SIGNER_ID_CHARS..SIGNER_PREFIX_CHARS]
                .iter()
                .collect::<String>();
            let size = hex::decode(&digits)
                .ok()
                .and_then(|bytes| bytes.first().copied());
            size.map(usize::from).ok_or_else(|| {
                Error::invalid_signer_block(format!(
                    "certificate reference size {digits:?} is not hex"
                ))
            })?
        }
    };

    let reference_start = match layout {
        SignerLayout::FixedReference => SIGNER_ID_CHARS,
        SignerLayout::SizedReference => SIGNER_PREFIX_CHARS,
    };
    let total_chars = reference_start + reference_len;
    let block_len = (total_chars + C40_GROUP_CHARS - 1) / C40_GROUP_CHARS * C40_GROUP_LEN;
    log::trace!(
        "Signer block of {} characters spans {} bytes",
        total_chars,
        block_len
    );

    let chars = c40_chars(cursor.read_bytes(block_len)?);
    if chars.len() < total_chars {
        return Err(Error::invalid_signer_block(format!(
            "expected {} characters but decoded {}",
            total_chars,
            chars.len()
        )));
    }

    let part = |from: usize, to: usize| chars[from..to].iter().collect::<String>();
    Ok(SignerInfo {
        country: part(0, 2).trim().to_string(),
        entity: part(2, SIGNER_ID_CHARS).trim().to_string(),
        certificate_reference: part(reference_start, total_chars),
    })
}

fn c40_chars(bytes: &[u8]) -> Vec<char> {
    c40::decode_untrimmed(bytes).chars().collect()
}
