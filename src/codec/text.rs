//! Text values of unknown encoding. Decoding walks an ordered chain of codecs and always
//! yields some string.

use std::fmt::{Display, Formatter};

const REPLACEMENT: char = '\u{FFFD}';
const PLACEHOLDER: char = '?';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextCodec {
    Utf8,
    LenientUtf8,
    Latin1,
    AsciiSubstitution,
    Hex,
}

impl TextCodec {
    pub fn name(self) -> &'static str {
        match self {
            TextCodec::Utf8 => "utf-8",
            TextCodec::LenientUtf8 => "lenient utf-8",
            TextCodec::Latin1 => "latin-1",
            TextCodec::AsciiSubstitution => "ascii with substitution",
            TextCodec::Hex => "hex",
        }
    }

    /// Whether anything but a clean UTF-8 decode was needed.
    #[inline]
    pub fn is_fallback(self) -> bool {
        self != TextCodec::Utf8
    }
}

impl Display for TextCodec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub value: String,
    pub codec: TextCodec,
}

pub fn decode(bytes: &[u8]) -> DecodedText {
    if bytes.is_empty() {
        return DecodedText {
            value: String::new(),
            codec: TextCodec::Utf8,
        };
    }

    if let Ok(value) = std::str::from_utf8(bytes) {
        if is_acceptable(value) {
            return DecodedText {
                value: value.to_string(),
                codec: TextCodec::Utf8,
            };
        }
    }

    let lenient = decode_lenient_utf8(bytes);
    if is_acceptable(&lenient) {
        return DecodedText {
            value: lenient,
            codec: TextCodec::LenientUtf8,
        };
    }

    let latin1 = decode_latin1(bytes);
    if !is_degenerate(&latin1) {
        return DecodedText {
            value: latin1,
            codec: TextCodec::Latin1,
        };
    }

    let substituted = decode_ascii_substituted(bytes);
    if substituted.chars().all(|c| c == PLACEHOLDER) {
        DecodedText {
            value: hex::encode_upper(bytes),
            codec: TextCodec::Hex,
        }
    } else {
        DecodedText {
            value: substituted,
            codec: TextCodec::AsciiSubstitution,
        }
    }
}

fn is_acceptable(text: &str) -> bool {
    !text.is_empty() && !text.contains(REPLACEMENT)
}

/// Mostly control characters, nothing a reader could make sense of
fn is_degenerate(text: &str) -> bool {
    let total = text.chars().count();
    let control = text.chars().filter(|c| c.is_control()).count();
    control * 2 > total
}

/// Decodes well-formed UTF-8 sequences. A byte that does not start one becomes its
/// Latin-1 character.
fn decode_lenient_utf8(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        let lead = bytes[index];
        let width = match lead {
            0x00..=0x7F => 1,
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            _ => 0,
        };
        match width {
            0 | 1 => {
                out.push(char::from(lead));
                index += 1;
            }
            _ => match bytes
                .get(index..index + width)
                .and_then(|sequence| std::str::from_utf8(sequence).ok())
            {
                Some(sequence) => {
                    out.push_str(sequence);
                    index += width;
                }
                None => {
                    out.push(char::from(lead));
                    index += 1;
                }
            },
        }
    }
    out
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().copied().map(char::from).collect()
}

fn decode_ascii_substituted(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| {
            if (0x20..=0x7E).contains(&b) {
                char::from(b)
            } else {
                PLACEHOLDER
            }
        })
        .collect()
}
