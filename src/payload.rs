//! The TLV records between the header and the signature.

use crate::codec::{c40, text, PackedDate};
use crate::diagnostic::{DiagnosticEvent, Diagnostics};
use crate::io::{read_length, ByteCursor, LengthError};
use std::fmt::{Display, Formatter};

pub const SIGNATURE_TAG: u8 = 0xFF;
/// A tag and at least one length octet
const MIN_RECORD_LEN: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    DocumentNumber,
    GivenName,
    FirstSurname,
    SecondSurname,
    Sex,
    DateOfBirth,
    DateOfExpiry,
    Nationality,
    PlaceOfBirth,
    Address,
    Parents,
    IsAdult,
    Mrz,
    Portrait,
    Unknown(u8),
}

impl From<u8> for Tag {
    fn from(value: u8) -> Self {
        match value {
            0x40 => Tag::DocumentNumber,
            0x41 => Tag::GivenName,
            0x42 => Tag::FirstSurname,
            0x43 => Tag::SecondSurname,
            0x44 => Tag::Sex,
            0x45 => Tag::DateOfBirth,
            0x46 => Tag::DateOfExpiry,
            0x47 => Tag::Nationality,
            0x48 => Tag::PlaceOfBirth,
            0x49 => Tag::Address,
            0x4A => Tag::Parents,
            0x4B => Tag::IsAdult,
            0x4C => Tag::Mrz,
            0x50 => Tag::Portrait,
            other => Tag::Unknown(other),
        }
    }
}

impl Tag {
    pub fn value(self) -> u8 {
        match self {
            Tag::DocumentNumber => 0x40,
            Tag::GivenName => 0x41,
            Tag::FirstSurname => 0x42,
            Tag::SecondSurname => 0x43,
            Tag::Sex => 0x44,
            Tag::DateOfBirth => 0x45,
            Tag::DateOfExpiry => 0x46,
            Tag::Nationality => 0x47,
            Tag::PlaceOfBirth => 0x48,
            Tag::Address => 0x49,
            Tag::Parents => 0x4A,
            Tag::IsAdult => 0x4B,
            Tag::Mrz => 0x4C,
            Tag::Portrait => 0x50,
            Tag::Unknown(other) => other,
        }
    }

    pub fn field(self) -> Option<Field> {
        Some(match self {
            Tag::DocumentNumber => Field::DocumentNumber,
            Tag::GivenName => Field::GivenName,
            Tag::FirstSurname => Field::FirstSurname,
            Tag::SecondSurname => Field::SecondSurname,
            Tag::Sex => Field::Sex,
            Tag::DateOfBirth => Field::DateOfBirth,
            Tag::DateOfExpiry => Field::DateOfExpiry,
            Tag::Nationality => Field::Nationality,
            Tag::PlaceOfBirth => Field::PlaceOfBirth,
            Tag::Address => Field::Address,
            Tag::Parents => Field::Parents,
            Tag::IsAdult => Field::IsAdult,
            Tag::Mrz => Field::Mrz,
            Tag::Portrait => Field::Portrait,
            Tag::Unknown(_) => return None,
        })
    }
}

/// Named fields, used to attribute diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    IssueDate,
    SignatureDate,
    DocumentNumber,
    GivenName,
    FirstSurname,
    SecondSurname,
    Sex,
    DateOfBirth,
    DateOfExpiry,
    Nationality,
    PlaceOfBirth,
    Address,
    Parents,
    IsAdult,
    Mrz,
    Portrait,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::IssueDate => "issue date",
            Field::SignatureDate => "signature date",
            Field::DocumentNumber => "document number",
            Field::GivenName => "given name",
            Field::FirstSurname => "first surname",
            Field::SecondSurname => "second surname",
            Field::Sex => "sex",
            Field::DateOfBirth => "date of birth",
            Field::DateOfExpiry => "date of expiry",
            Field::Nationality => "nationality",
            Field::PlaceOfBirth => "place of birth",
            Field::Address => "address",
            Field::Parents => "parents",
            Field::IsAdult => "is adult",
            Field::Mrz => "mrz",
            Field::Portrait => "portrait",
        }
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One record as it appears on the wire, borrowing its value from the input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlvRecord<'a> {
    pub offset: usize,
    pub tag: u8,
    pub value: &'a [u8],
}

impl<'a> TlvRecord<'a> {
    /// Reads tag, length and value. On failure the cursor is restored to the tag.
    pub fn read(cursor: &mut ByteCursor<'a>) -> Result<Self, (u8, LengthError)> {
        let offset = cursor.position();
        let tag = cursor.read_byte().map_err(|_| (0, LengthError::Missing))?;
        let record = read_length(cursor).and_then(|length| {
            cursor
                .read_bytes(length)
                .map_err(|_| LengthError::ExceedsBuffer {
                    length,
                    remaining: cursor.remaining(),
                })
        });
        match record {
            Ok(value) => Ok(TlvRecord { offset, tag, value }),
            Err(reason) => {
                cursor.rewind(cursor.position() - offset);
                Err((tag, reason))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageFormat {
    Jpeg,
    Jpeg2000,
    Png,
    Webp,
    Unknown,
}

impl ImageFormat {
    /// Labels an image container by its leading bytes, without decoding it.
    pub fn sniff(bytes: &[u8]) -> Self {
        const JP2_SIGNATURE: [u8; 8] = [0x00, 0x00, 0x00, 0x0C, 0x6A, 0x50, 0x20, 0x20];
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            ImageFormat::Jpeg
        } else if bytes.starts_with(&[0xFF, 0x4F, 0xFF, 0x51]) || bytes.starts_with(&JP2_SIGNATURE)
        {
            ImageFormat::Jpeg2000
        } else if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
            ImageFormat::Png
        } else if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
            ImageFormat::Webp
        } else {
            ImageFormat::Unknown
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Jpeg2000 => "image/jp2",
            ImageFormat::Png => "image/png",
            ImageFormat::Webp => "image/webp",
            ImageFormat::Unknown => "application/octet-stream",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portrait {
    pub format: ImageFormat,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnknownField {
    pub tag: u8,
    pub value: Vec<u8>,
    pub hex: String,
}

impl UnknownField {
    fn new(tag: u8, value: &[u8]) -> Self {
        Self {
            tag,
            value: value.to_vec(),
            hex: hex::encode_upper(value),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub document_number: Option<String>,
    pub given_name: Option<String>,
    pub first_surname: Option<String>,
    pub second_surname: Option<String>,
    pub sex: Option<String>,
    /// `DD-MM-YYYY`, or the hex marker of an undecodable packed date
    pub date_of_birth: Option<String>,
    pub date_of_expiry: Option<String>,
    pub nationality: Option<String>,
    pub place_of_birth: Option<String>,
    pub address: Vec<String>,
    pub parents: Option<String>,
    pub is_adult: Option<bool>,
    pub mrz: Option<String>,
    pub portrait: Option<Portrait>,
    pub unknown: Vec<UnknownField>,
}

impl Payload {
    pub fn is_empty(&self) -> bool {
        *self == Payload::default()
    }
}

/// Why the record loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PayloadEnd {
    /// Fewer than two bytes are left
    Exhausted,
    /// The cursor sits on the signature tag
    Signature,
    /// A record could not be read; the cursor sits on its tag
    Truncated,
}

pub(crate) struct PayloadParser<'c, 'a> {
    cursor: &'c mut ByteCursor<'a>,
    signature_tag: u8,
    diagnostics: &'c mut Diagnostics,
    payload: Payload,
}

impl<'c, 'a> PayloadParser<'c, 'a> {
    pub(crate) fn new(
        cursor: &'c mut ByteCursor<'a>,
        signature_tag: u8,
        diagnostics: &'c mut Diagnostics,
    ) -> Self {
        Self {
            cursor,
            signature_tag,
            diagnostics,
            payload: Payload::default(),
        }
    }

    pub(crate) fn parse(mut self) -> (Payload, PayloadEnd) {
        let end = loop {
            if self.cursor.remaining() < MIN_RECORD_LEN {
                break PayloadEnd::Exhausted;
            }
            match self.cursor.peek(0) {
                Ok(tag) if tag == self.signature_tag => break PayloadEnd::Signature,
                Ok(_) => {}
                Err(_) => break PayloadEnd::Exhausted,
            }
            match TlvRecord::read(self.cursor) {
                Ok(record) => self.dispatch(record),
                Err((tag, reason)) => {
                    self.diagnostics.emit(
                        self.cursor.position(),
                        DiagnosticEvent::PayloadTruncated { tag, reason },
                    );
                    break PayloadEnd::Truncated;
                }
            }
        };
        (self.payload, end)
    }

    fn dispatch(&mut self, record: TlvRecord<'_>) {
        let TlvRecord { offset, tag, value } = record;
        let field = match Tag::from(tag).field() {
            Some(field) => field,
            None => {
                self.diagnostics.emit(
                    offset,
                    DiagnosticEvent::UnknownTag {
                        tag,
                        length: value.len(),
                    },
                );
                self.payload.unknown.push(UnknownField::new(tag, value));
                return;
            }
        };
        log::trace!("Record {} at {} with {} bytes", field, offset, value.len());

        match field {
            Field::Address => {
                let line = self.text(field, offset, value);
                self.payload.address.push(line);
            }
            Field::IsAdult => match value {
                [flag] => {
                    if self.payload.is_adult.replace(*flag != 0x00).is_some() {
                        self.duplicate(field, offset);
                    }
                }
                _ => {
                    self.diagnostics.emit(
                        offset,
                        DiagnosticEvent::InvalidBoolean {
                            length: value.len(),
                        },
                    );
                    self.payload.unknown.push(UnknownField::new(tag, value));
                }
            },
            Field::Portrait => {
                let portrait = Portrait {
                    format: ImageFormat::sniff(value),
                    data: value.to_vec(),
                };
                if self.payload.portrait.replace(portrait).is_some() {
                    self.duplicate(field, offset);
                }
            }
            Field::Mrz => self.assign(field, offset, c40::decode(value)),
            Field::DateOfBirth | Field::DateOfExpiry => {
                let date = self.date(field, offset, value);
                self.assign(field, offset, date);
            }
            _ => {
                let text = self.text(field, offset, value);
                self.assign(field, offset, text);
            }
        }
    }

    fn text(&mut self, field: Field, offset: usize, value: &[u8]) -> String {
        let decoded = text::decode(value);
        if decoded.codec.is_fallback() {
            self.diagnostics.emit(
                offset,
                DiagnosticEvent::TextFallback {
                    field,
                    codec: decoded.codec,
                },
            );
        }
        decoded.value.trim().to_string()
    }

    /// Packed when exactly three bytes long, otherwise taken as already formatted text.
    fn date(&mut self, field: Field, offset: usize, value: &[u8]) -> String {
        match PackedDate::from_slice(value) {
            Some(date) => {
                if let PackedDate::Undecodable { raw } = date {
                    self.diagnostics.emit(
                        offset,
                        DiagnosticEvent::DateUndecodable {
                            field,
                            raw: hex::encode_upper(&raw),
                        },
                    );
                }
                date.to_string()
            }
            None => self.text(field, offset, value),
        }
    }

    /// Stores a single valued text field, replacing and reporting an earlier value.
    fn assign(&mut self, field: Field, offset: usize, value: String) {
        let slot = match field {
            Field::DocumentNumber => &mut self.payload.document_number,
            Field::GivenName => &mut self.payload.given_name,
            Field::FirstSurname => &mut self.payload.first_surname,
            Field::SecondSurname => &mut self.payload.second_surname,
            Field::Sex => &mut self.payload.sex,
            Field::DateOfBirth => &mut self.payload.date_of_birth,
            Field::DateOfExpiry => &mut self.payload.date_of_expiry,
            Field::Nationality => &mut self.payload.nationality,
            Field::PlaceOfBirth => &mut self.payload.place_of_birth,
            Field::Parents => &mut self.payload.parents,
            Field::Mrz => &mut self.payload.mrz,
            Field::IssueDate
            | Field::SignatureDate
            | Field::Address
            | Field::IsAdult
            | Field::Portrait => return,
        };
        if slot.replace(value).is_some() {
            self.duplicate(field, offset);
        }
    }

    fn duplicate(&mut self, field: Field, offset: usize) {
        self.diagnostics
            .emit(offset, DiagnosticEvent::DuplicateField { field });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::write_length;

    fn record(tag: u8, value: &[u8]) -> Vec<u8> {
        let mut data = vec![tag];
        write_length(&mut data, value.len());
        data.extend_from_slice(value);
        data
    }

    fn parse(data: &[u8]) -> (Payload, PayloadEnd, usize, Vec<crate::Diagnostic>) {
        let mut cursor = ByteCursor::new(data);
        let mut diagnostics = Diagnostics::new(true);
        let (payload, end) =
            PayloadParser::new(&mut cursor, SIGNATURE_TAG, &mut diagnostics).parse();
        (payload, end, cursor.position(), diagnostics.into_inner())
    }

    #[test]
    fn test_document_number_only() {
        let (payload, end, position, diagnostics) = parse(&[0x40, 0x03, b'A', b'B', b'C']);
        assert_eq!(Some("ABC".to_string()), payload.document_number);
        assert!(payload.unknown.is_empty());
        assert_eq!(PayloadEnd::Exhausted, end);
        assert_eq!(5, position);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_tag_round_trip() {
        for value in 0..=u8::MAX {
            assert_eq!(value, Tag::from(value).value());
        }
    }

    #[test]
    fn test_stops_at_signature_tag() {
        let mut data = record(0x41, b"JUAN");
        data.extend(record(SIGNATURE_TAG, &[0x01, 0x02]));
        let (payload, end, position, _) = parse(&data);
        assert_eq!(Some("JUAN".to_string()), payload.given_name);
        assert_eq!(PayloadEnd::Signature, end);
        assert_eq!(6, position);
        assert!(payload.unknown.is_empty());
    }

    #[test]
    fn test_overrun_keeps_previous_fields() {
        let mut data = record(0x42, b"GARCIA");
        data.extend_from_slice(&[0x43, 0x20, b'L', b'O']);
        let (payload, end, position, diagnostics) = parse(&data);
        assert_eq!(Some("GARCIA".to_string()), payload.first_surname);
        assert_eq!(None, payload.second_surname);
        assert_eq!(PayloadEnd::Truncated, end);
        assert_eq!(8, position);
        assert_eq!(
            DiagnosticEvent::PayloadTruncated {
                tag: 0x43,
                reason: LengthError::ExceedsBuffer {
                    length: 0x20,
                    remaining: 2
                }
            },
            diagnostics[0].event
        );
    }

    #[test]
    fn test_indefinite_length_truncates() {
        let mut data = record(0x44, b"F");
        data.extend_from_slice(&[0x40, 0x80, 0x00, 0x00]);
        let (payload, end, _, _) = parse(&data);
        assert_eq!(Some("F".to_string()), payload.sex);
        assert_eq!(PayloadEnd::Truncated, end);
    }

    #[test]
    fn test_dates() {
        let mut data = record(0x45, &PackedDate::encode(22, 7, 1977).unwrap());
        data.extend(record(0x46, b"01-01-2030"));
        let (payload, _, _, diagnostics) = parse(&data);
        assert_eq!(Some("22-07-1977".to_string()), payload.date_of_birth);
        assert_eq!(Some("01-01-2030".to_string()), payload.date_of_expiry);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_undecodable_date_is_marked() {
        let (payload, _, _, diagnostics) = parse(&record(0x45, &[0x00, 0x00, 0x01]));
        assert_eq!(Some("0x000001".to_string()), payload.date_of_birth);
        assert_eq!(
            DiagnosticEvent::DateUndecodable {
                field: Field::DateOfBirth,
                raw: "000001".to_string()
            },
            diagnostics[0].event
        );
    }

    #[test]
    fn test_boolean_and_address_lines() {
        let mut data = record(0x4B, &[0x01]);
        data.extend(record(0x49, b"CALLE MAYOR 1"));
        data.extend(record(0x49, b"MADRID"));
        let (payload, _, _, _) = parse(&data);
        assert_eq!(Some(true), payload.is_adult);
        assert_eq!(
            vec!["CALLE MAYOR 1".to_string(), "MADRID".to_string()],
            payload.address
        );

        let (payload, _, _, _) = parse(&record(0x4B, &[0x00]));
        assert_eq!(Some(false), payload.is_adult);
    }

    #[test]
    fn test_malformed_boolean_is_kept_as_unknown() {
        let (payload, _, _, diagnostics) = parse(&record(0x4B, &[0x01, 0x01]));
        assert_eq!(None, payload.is_adult);
        assert_eq!(1, payload.unknown.len());
        assert_eq!("0101", payload.unknown[0].hex);
        assert_eq!(
            DiagnosticEvent::InvalidBoolean { length: 2 },
            diagnostics[0].event
        );
    }

    #[test]
    fn test_unknown_tags_preserved() {
        let mut data = record(0x7A, &[0xCA, 0xFE]);
        data.extend(record(0x01, &[]));
        let (payload, _, _, _) = parse(&data);
        assert_eq!(
            vec![
                UnknownField {
                    tag: 0x7A,
                    value: vec![0xCA, 0xFE],
                    hex: "CAFE".to_string()
                },
                UnknownField {
                    tag: 0x01,
                    value: vec![],
                    hex: String::new()
                }
            ],
            payload.unknown
        );
    }

    #[test]
    fn test_duplicate_field_keeps_last() {
        let mut data = record(0x40, b"AAA");
        data.extend(record(0x40, b"BBB"));
        let (payload, _, _, diagnostics) = parse(&data);
        assert_eq!(Some("BBB".to_string()), payload.document_number);
        assert_eq!(
            DiagnosticEvent::DuplicateField {
                field: Field::DocumentNumber
            },
            diagnostics[0].event
        );
    }

    #[test]
    fn test_portrait_sniffing() {
        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        let (payload, _, _, _) = parse(&record(0x50, &jpeg));
        let portrait = payload.portrait.unwrap();
        assert_eq!(ImageFormat::Jpeg, portrait.format);
        assert_eq!(jpeg.to_vec(), portrait.data);

        assert_eq!(
            ImageFormat::Jpeg2000,
            ImageFormat::sniff(&[0x00, 0x00, 0x00, 0x0C, 0x6A, 0x50, 0x20, 0x20, 0x0D])
        );
        assert_eq!(
            ImageFormat::Jpeg2000,
            ImageFormat::sniff(&[0xFF, 0x4F, 0xFF, 0x51])
        );
        assert_eq!(
            ImageFormat::Png,
            ImageFormat::sniff(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A])
        );
        assert_eq!(ImageFormat::Webp, ImageFormat::sniff(b"RIFF\x10\x00\x00\x00WEBPVP8 "));
        assert_eq!(ImageFormat::Unknown, ImageFormat::sniff(b"RIFF"));
        assert_eq!(ImageFormat::Unknown, ImageFormat::sniff(&[]));
    }

    #[test]
    fn test_mrz_is_c40() {
        let (payload, _, _, _) = parse(&record(0x4C, &c40::encode("VCD<<DENT").unwrap()));
        assert_eq!(Some("VCD  DENT".to_string()), payload.mrz);
    }

    #[test]
    fn test_latin1_name_reports_fallback() {
        let (payload, _, _, diagnostics) =
            parse(&record(0x42, &[b'N', 0xDA, b'N', b'E', b'Z']));
        assert_eq!(Some("NÚNEZ".to_string()), payload.first_surname);
        assert_eq!(
            DiagnosticEvent::TextFallback {
                field: Field::FirstSurname,
                codec: crate::codec::TextCodec::LenientUtf8
            },
            diagnostics[0].event
        );
    }

    #[test]
    fn test_single_leftover_byte_ends_loop() {
        let mut data = record(0x40, b"X");
        data.push(0x41);
        let (payload, end, position, _) = parse(&data);
        assert_eq!(Some("X".to_string()), payload.document_number);
        assert_eq!(PayloadEnd::Exhausted, end);
        assert_eq!(3, position);
    }
}
