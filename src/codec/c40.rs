//! C40 packing as used by ICAO 9303-13: three characters of a 40 symbol alphabet per two
//! bytes, big-endian.

use byteorder::{BigEndian, ByteOrder};

/// First byte of a group carrying one plain ASCII character (`second byte - 1`)
pub const UNLATCH: u8 = 0xFE;
const SPACE: u16 = 3;
const DIGITS_START: u16 = 4;
const LETTERS_START: u16 = 14;
const TABLE_LEN: u16 = 40;
const SHIFT_PADDING: u16 = 0;

/// Decodes and trims leading and trailing whitespace.
pub fn decode(bytes: &[u8]) -> String {
    decode_untrimmed(bytes).trim().to_string()
}

/// Decodes without trimming, so character positions stay meaningful.
///
/// Shift codes `0..=2` are dropped. A zero group marks padding and ends the value, an
/// odd trailing byte is ignored.
pub fn decode_untrimmed(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() / 2 * 3);
    for group in bytes.chunks_exact(2) {
        if group[0] == UNLATCH {
            if let Some(ascii) = group[1].checked_sub(1) {
                out.push(char::from(ascii));
            }
            continue;
        }

        let word = BigEndian::read_u16(group);
        if word == 0 {
            break;
        }

        let value = word - 1;
        let codes = [
            value / (TABLE_LEN * TABLE_LEN),
            (value % (TABLE_LEN * TABLE_LEN)) / TABLE_LEN,
            value % TABLE_LEN,
        ];
        out.extend(codes.iter().copied().filter_map(symbol));
    }
    out
}

fn symbol(code: u16) -> Option<char> {
    match code {
        SPACE => Some(' '),
        DIGITS_START..=13 => Some(char::from(b'0' + (code - DIGITS_START) as u8)),
        LETTERS_START..=39 => Some(char::from(b'A' + (code - LETTERS_START) as u8)),
        _ => None,
    }
}

fn code(character: char) -> Option<u16> {
    match character {
        ' ' | '<' => Some(SPACE),
        '0'..='9' => Some(DIGITS_START + (character as u16 - '0' as u16)),
        'A'..='Z' => Some(LETTERS_START + (character as u16 - 'A' as u16)),
        _ => None,
    }
}

/// Packs `text` into C40 groups. A trailing pair is completed with shift code 0, which
/// decoding drops. A trailing single character uses the unlatch form. Returns `None` for
/// characters outside the alphabet. `<` is accepted as filler and always encoded as space.
pub fn encode(text: &str) -> Option<Vec<u8>> {
    let codes = text.chars().map(code).collect::<Option<Vec<u16>>>()?;
    let mut out = Vec::with_capacity((codes.len() + 2) / 3 * 2);
    let mut chunks = codes.chunks_exact(3);
    for chunk in &mut chunks {
        push_group(&mut out, chunk[0], chunk[1], chunk[2]);
    }
    match chunks.remainder() {
        [first, second] => push_group(&mut out, *first, *second, SHIFT_PADDING),
        [last] => {
            let ascii = if *last == SPACE {
                b' '
            } else {
                text.as_bytes()[text.len() - 1]
            };
            out.extend_from_slice(&[UNLATCH, ascii + 1]);
        }
        _ => {}
    }
    Some(out)
}

fn push_group(out: &mut Vec<u8>, c1: u16, c2: u16, c3: u16) {
    let word = c1 * TABLE_LEN * TABLE_LEN + c2 * TABLE_LEN + c3 + 1;
    let mut bytes = [0u8; 2];
    BigEndian::write_u16(&mut bytes, word);
    out.extend_from_slice(&bytes);
}
