//! Assembles header, payload and signature into a [`DecodeResult`].

use crate::diagnostic::{Diagnostic, DiagnosticEvent, Diagnostics};
use crate::header::{Header, MAGIC};
use crate::io::{ByteCursor, Error};
use crate::payload::{Payload, PayloadEnd, PayloadParser, TlvRecord, SIGNATURE_TAG};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Magic byte every seal is expected to start with
    pub expected_magic: u8,
    /// Reject a seal with another magic byte instead of only reporting it
    pub require_magic: bool,
    /// Tag of the terminal signature record
    pub signature_tag: u8,
    /// Keep [`Diagnostic`]s on the result; they are logged either way
    pub collect_diagnostics: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            expected_magic: MAGIC,
            require_magic: false,
            signature_tag: SIGNATURE_TAG,
            collect_diagnostics: true,
        }
    }
}

/// The signature record, kept as raw bytes. It is never verified here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub offset: usize,
    pub bytes: Vec<u8>,
}

impl Signature {
    pub fn hex(&self) -> String {
        hex::encode_upper(&self.bytes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeResult {
    pub header: Header,
    pub payload: Payload,
    pub signature: Option<Signature>,
    /// The payload loop stopped on a malformed record, later records are missing
    pub truncated: bool,
    pub diagnostics: Vec<Diagnostic>,
    /// The input as it was handed to the decoder
    pub raw: Vec<u8>,
}

impl DecodeResult {
    pub fn raw_hex(&self) -> String {
        hex::encode_upper(&self.raw)
    }

    /// Whether anything after the header had to be given up on.
    pub fn is_partial(&self) -> bool {
        self.truncated || self.signature.is_none()
    }
}

enum DecodeState {
    ReadingHeader,
    ReadingPayloadRecords(Header),
    ReadingSignature(Header, Payload),
    Done {
        header: Header,
        payload: Payload,
        signature: Option<Signature>,
        truncated: bool,
    },
}

impl DecodeState {
    fn name(&self) -> &'static str {
        match self {
            DecodeState::ReadingHeader => "ReadingHeader",
            DecodeState::ReadingPayloadRecords(_) => "ReadingPayloadRecords",
            DecodeState::ReadingSignature(..) => "ReadingSignature",
            DecodeState::Done { .. } => "Done",
        }
    }
}

/// Decodes seals with a fixed configuration. Holds no state between calls.
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    config: DecoderConfig,
}

impl From<DecoderConfig> for Decoder {
    #[inline]
    fn from(config: DecoderConfig) -> Self {
        Self::new(config)
    }
}

impl Decoder {
    #[inline]
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Fails only if the header cannot be read. Problems after the header are reported
    /// through [`DecodeResult::truncated`] and the diagnostics.
    pub fn decode(&self, bytes: &[u8]) -> Result<DecodeResult, Error> {
        let mut cursor = ByteCursor::new(bytes);
        let mut diagnostics = Diagnostics::new(self.config.collect_diagnostics);
        let mut state = DecodeState::ReadingHeader;

        loop {
            log::trace!("{} at offset {}", state.name(), cursor.position());
            state = match state {
                DecodeState::ReadingHeader => {
                    let header = Header::read(&mut cursor, &self.config, &mut diagnostics)?;
                    DecodeState::ReadingPayloadRecords(header)
                }
                DecodeState::ReadingPayloadRecords(header) => {
                    let (payload, end) = PayloadParser::new(
                        &mut cursor,
                        self.config.signature_tag,
                        &mut diagnostics,
                    )
                    .parse();
                    match end {
                        PayloadEnd::Truncated => DecodeState::Done {
                            header,
                            payload,
                            signature: None,
                            truncated: true,
                        },
                        PayloadEnd::Exhausted | PayloadEnd::Signature => {
                            DecodeState::ReadingSignature(header, payload)
                        }
                    }
                }
                DecodeState::ReadingSignature(header, payload) => {
                    let signature = self.read_signature(&mut cursor, &mut diagnostics);
                    if !cursor.is_exhausted() {
                        diagnostics.emit(
                            cursor.position(),
                            DiagnosticEvent::TrailingBytes {
                                count: cursor.remaining(),
                            },
                        );
                    }
                    DecodeState::Done {
                        header,
                        payload,
                        signature,
                        truncated: false,
                    }
                }
                DecodeState::Done {
                    header,
                    payload,
                    signature,
                    truncated,
                } => {
                    return Ok(DecodeResult {
                        header,
                        payload,
                        signature,
                        truncated,
                        diagnostics: diagnostics.into_inner(),
                        raw: bytes.to_vec(),
                    });
                }
            };
        }
    }

    fn read_signature(
        &self,
        cursor: &mut ByteCursor<'_>,
        diagnostics: &mut Diagnostics,
    ) -> Option<Signature> {
        let offset = cursor.position();
        let signature = match cursor.peek(0) {
            Ok(tag) if tag == self.config.signature_tag => match TlvRecord::read(cursor) {
                Ok(record) => Some(Signature {
                    offset,
                    bytes: record.value.to_vec(),
                }),
                Err((tag, reason)) => {
                    diagnostics.emit(offset, DiagnosticEvent::PayloadTruncated { tag, reason });
                    None
                }
            },
            _ => None,
        };
        if signature.is_none() {
            diagnostics.emit(offset, DiagnosticEvent::SignatureMissing);
        }
        signature
    }
}

/// Decodes with the default [`DecoderConfig`].
pub fn decode(bytes: &[u8]) -> Result<DecodeResult, Error> {
    Decoder::default().decode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::PackedDate;
    use crate::header::DocumentType;
    use crate::io::write_length;

    fn record(tag: u8, value: &[u8]) -> Vec<u8> {
        let mut data = vec![tag];
        write_length(&mut data, value.len());
        data.extend_from_slice(value);
        data
    }

    fn simple_header() -> Vec<u8> {
        let mut data = vec![MAGIC, 0x01, b'E', b'S'];
        data.extend_from_slice(&PackedDate::encode(1, 6, 2023).unwrap());
        data.extend_from_slice(&PackedDate::encode(2, 6, 2023).unwrap());
        data.extend_from_slice(&[0x07, 0x09]);
        data
    }

    #[test]
    fn test_simple_seal() {
        let mut data = simple_header();
        data.extend(record(0x40, b"ABC"));
        data.extend(record(SIGNATURE_TAG, &[0x30, 0x44, 0x02, 0x20]));

        let result = decode(&data).unwrap();
        assert_eq!("ES", result.header.issuing_country);
        assert_eq!(DocumentType::Simple, result.header.document_type);
        assert_eq!("simple", result.header.document_type.label());
        assert_eq!(0x09, result.header.document_category);
        assert_eq!(Some("ABC".to_string()), result.payload.document_number);
        assert!(result.payload.unknown.is_empty());
        let signature = result.signature.as_ref().unwrap();
        assert_eq!("30440220", signature.hex());
        assert_eq!(17, signature.offset);
        assert!(!result.truncated);
        assert!(!result.is_partial());
        assert!(result.diagnostics.is_empty());
        assert_eq!(data, result.raw);
    }

    #[test]
    fn test_missing_signature() {
        let mut data = simple_header();
        data.extend(record(0x40, b"ABC"));
        let result = decode(&data).unwrap();
        assert_eq!(None, result.signature);
        assert!(result.is_partial());
        assert_eq!(
            DiagnosticEvent::SignatureMissing,
            result.diagnostics.last().unwrap().event
        );
    }

    #[test]
    fn test_truncated_signature() {
        let mut data = simple_header();
        data.extend(record(0x40, b"ABC"));
        data.extend_from_slice(&[SIGNATURE_TAG, 0x40, 0x01]);
        let result = decode(&data).unwrap();
        assert_eq!(Some("ABC".to_string()), result.payload.document_number);
        assert_eq!(None, result.signature);
        assert!(result.payload.unknown.is_empty());
    }

    #[test]
    fn test_trailing_bytes_after_signature() {
        let mut data = simple_header();
        data.extend(record(SIGNATURE_TAG, &[0x01]));
        data.extend_from_slice(&[0xAB, 0xCD]);
        let result = decode(&data).unwrap();
        assert_eq!(vec![0x01], result.signature.unwrap().bytes);
        assert_eq!(
            DiagnosticEvent::TrailingBytes { count: 2 },
            result.diagnostics[0].event
        );
    }

    #[test]
    fn test_custom_signature_tag() {
        let mut data = simple_header();
        data.extend(record(0x40, b"ABC"));
        data.extend(record(0x7F, &[0xEE]));
        let decoder = Decoder::new(DecoderConfig {
            signature_tag: 0x7F,
            ..DecoderConfig::default()
        });
        let result = decoder.decode(&data).unwrap();
        assert_eq!(vec![0xEE], result.signature.unwrap().bytes);
        assert!(result.payload.unknown.is_empty());
    }

    #[test]
    fn test_diagnostics_collection_can_be_disabled() {
        let mut data = simple_header();
        data.extend(record(0x7A, &[0x01]));
        let decoder = Decoder::new(DecoderConfig {
            collect_diagnostics: false,
            ..DecoderConfig::default()
        });
        let result = decoder.decode(&data).unwrap();
        assert_eq!(1, result.payload.unknown.len());
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_header_only() {
        let result = decode(&simple_header()).unwrap();
        assert!(result.payload.is_empty());
        assert_eq!(None, result.signature);
    }
}
