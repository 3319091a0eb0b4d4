//! Human readable output for hosts that display or log a scan.

use crate::header::Header;
use crate::payload::Payload;
use crate::seal::{DecodeResult, Decoder};
use std::fmt::{Display, Formatter};

/// What a host shows for one scanned symbol: the decoded seal, or only the raw bytes if
/// the header could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanOutcome {
    Decoded(DecodeResult),
    Raw { raw_hex: String, error: String },
}

impl ScanOutcome {
    pub fn from_bytes(decoder: &Decoder, bytes: &[u8]) -> Self {
        match decoder.decode(bytes) {
            Ok(result) => ScanOutcome::Decoded(result),
            Err(e) => {
                log::warn!("Showing raw bytes only: {}", e.kind());
                ScanOutcome::Raw {
                    raw_hex: hex::encode_upper(bytes),
                    error: e.kind().to_string(),
                }
            }
        }
    }

    pub fn decoded(&self) -> Option<&DecodeResult> {
        match self {
            ScanOutcome::Decoded(result) => Some(result),
            ScanOutcome::Raw { .. } => None,
        }
    }
}

impl Display for ScanOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanOutcome::Decoded(result) => Display::fmt(result, f),
            ScanOutcome::Raw { raw_hex, error } => {
                writeln!(f, "Undecodable seal: {error}")?;
                writeln!(f, " raw: {raw_hex}")
            }
        }
    }
}

struct IndentedWriter<'a, 'b> {
    f: &'a mut Formatter<'b>,
    indentation: usize,
}

impl<'a, 'b> IndentedWriter<'a, 'b> {
    fn line<T: Display>(&mut self, text: T) -> std::fmt::Result {
        writeln!(self.f, "{}{}", " ".repeat(self.indentation), text)
    }

    fn field<T: Display>(&mut self, label: &str, value: Option<T>) -> std::fmt::Result {
        match value {
            Some(value) => self.line(format_args!("{label}: {value}")),
            None => Ok(()),
        }
    }

    fn with_increased_indentation<F: FnOnce(&mut Self) -> std::fmt::Result>(
        &mut self,
        f: F,
    ) -> std::fmt::Result {
        self.indentation += 1;
        let r = f(self);
        self.indentation -= 1;
        r
    }

    fn header(&mut self, header: &Header) -> std::fmt::Result {
        self.line("Header")?;
        self.with_increased_indentation(|w| {
            w.line(format_args!(
                "version: 0x{:02X} ({:?})",
                header.version, header.format
            ))?;
            w.line(format_args!("issuing country: {}", header.issuing_country))?;
            if let Some(signer) = &header.signer {
                w.line(format_args!("signer: {}", signer.identifier()))?;
                w.line(format_args!(
                    "certificate reference: {}",
                    signer.certificate_reference
                ))?;
            }
            w.line(format_args!("issue date: {}", header.issue_date))?;
            w.line(format_args!("signature date: {}", header.signature_date))?;
            w.line(format_args!("document type: {}", header.document_type))?;
            w.line(format_args!(
                "document category: 0x{:02X}",
                header.document_category
            ))
        })
    }

    fn payload(&mut self, payload: &Payload) -> std::fmt::Result {
        self.line("Payload")?;
        self.with_increased_indentation(|w| {
            w.field("document number", payload.document_number.as_ref())?;
            w.field("given name", payload.given_name.as_ref())?;
            w.field("first surname", payload.first_surname.as_ref())?;
            w.field("second surname", payload.second_surname.as_ref())?;
            w.field("sex", payload.sex.as_ref())?;
            w.field("date of birth", payload.date_of_birth.as_ref())?;
            w.field("date of expiry", payload.date_of_expiry.as_ref())?;
            w.field("nationality", payload.nationality.as_ref())?;
            w.field("place of birth", payload.place_of_birth.as_ref())?;
            for line in &payload.address {
                w.line(format_args!("address: {line}"))?;
            }
            w.field("parents", payload.parents.as_ref())?;
            w.field("is adult", payload.is_adult)?;
            w.field("mrz", payload.mrz.as_ref())?;
            if let Some(portrait) = &payload.portrait {
                w.line(format_args!(
                    "portrait: {} ({} bytes)",
                    portrait.format.mime_type(),
                    portrait.data.len()
                ))?;
            }
            for unknown in &payload.unknown {
                w.line(format_args!(
                    "unknown 0x{:02X}: {}",
                    unknown.tag, unknown.hex
                ))?;
            }
            Ok(())
        })
    }
}

impl Display for DecodeResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut w = IndentedWriter { f, indentation: 0 };
        w.header(&self.header)?;
        w.payload(&self.payload)?;
        match &self.signature {
            Some(signature) => w.line(format_args!("Signature: {}", signature.hex()))?,
            None => w.line("Signature: none")?,
        }
        if self.truncated {
            w.line("Payload truncated")?;
        }
        if !self.diagnostics.is_empty() {
            w.line("Diagnostics")?;
            w.with_increased_indentation(|w| {
                self.diagnostics.iter().try_for_each(|d| w.line(d))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::PackedDate;
    use crate::header::MAGIC;

    fn seal() -> Vec<u8> {
        let mut data = vec![MAGIC, 0x01, b'E', b'S'];
        data.extend_from_slice(&PackedDate::encode(1, 6, 2023).unwrap());
        data.extend_from_slice(&PackedDate::encode(2, 6, 2023).unwrap());
        data.extend_from_slice(&[0x08, 0x01]);
        data.extend_from_slice(&[0x40, 0x03, b'A', b'B', b'C']);
        data.extend_from_slice(&[0x4B, 0x01, 0x01]);
        data.extend_from_slice(&[0xFF, 0x02, 0xBE, 0xEF]);
        data
    }

    #[test]
    fn test_render_decoded() {
        let outcome = ScanOutcome::from_bytes(&Decoder::default(), &seal());
        let text = outcome.to_string();
        assert!(text.contains(" issuing country: ES\n"));
        assert!(text.contains(" document type: full (0x08)\n"));
        assert!(text.contains(" document number: ABC\n"));
        assert!(text.contains(" is adult: true\n"));
        assert!(text.contains("Signature: BEEF\n"));
        assert!(!text.contains("Diagnostics"));
    }

    #[test]
    fn test_raw_fallback() {
        let outcome = ScanOutcome::from_bytes(&Decoder::default(), &[0xDC, 0x01, 0x02]);
        assert_eq!(None, outcome.decoded());
        assert_eq!(
            ScanOutcome::Raw {
                raw_hex: "DC0102".to_string(),
                error: "Buffer too short for a header, requires at least 12 bytes but got 3"
                    .to_string(),
            },
            outcome
        );
    }
}
