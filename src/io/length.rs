//! DER length octets, according to ITU-T X.690 chapter 8.1.3, restricted to definite
//! lengths of at most four length octets.

use crate::io::{ByteCursor, LengthError};

pub const LENGTH_SHORT_MAX_VALUE: usize = 127;
pub const LENGTH_MAX_OCTETS: u8 = 4;
const LENGTH_BIT_MASK: u8 = 0b1_0000000;
const LENGTH_BIT_SHORT_FORM: u8 = 0b0_0000000;
const LENGTH_BIT_LONG_FORM: u8 = 0b1_0000000;

/// Reads a length in the short (8.1.3.4) or long (8.1.3.5) form. The decoded length must
/// fit into what remains of the buffer after the length octets.
///
/// On failure the cursor is left where it was before the length octets.
pub fn read_length(cursor: &mut ByteCursor<'_>) -> Result<usize, LengthError> {
    let start = cursor.position();
    let result = read_length_unchecked(cursor).and_then(|length| {
        if length > cursor.remaining() {
            Err(LengthError::ExceedsBuffer {
                length,
                remaining: cursor.remaining(),
            })
        } else {
            Ok(length)
        }
    });
    if result.is_err() {
        cursor.rewind(cursor.position() - start);
    }
    result
}

fn read_length_unchecked(cursor: &mut ByteCursor<'_>) -> Result<usize, LengthError> {
    let first = cursor.read_byte().map_err(|_| LengthError::Missing)?;
    if first & LENGTH_BIT_MASK == LENGTH_BIT_SHORT_FORM {
        return Ok(usize::from(first));
    }

    let octets = first & !LENGTH_BIT_MASK;
    if octets == 0 {
        return Err(LengthError::Indefinite);
    }
    if octets > LENGTH_MAX_OCTETS {
        return Err(LengthError::ExcessiveOctets(octets));
    }
    if usize::from(octets) > cursor.remaining() {
        return Err(LengthError::MissingOctets {
            expected: octets,
            available: cursor.remaining(),
        });
    }

    let mut bytes = [0u8; 4];
    let offset = bytes.len() - usize::from(octets);
    for byte in &mut bytes[offset..] {
        *byte = cursor.read_byte().map_err(|_| LengthError::Missing)?;
    }
    Ok(u32::from_be_bytes(bytes) as usize)
}

/// Appends the shortest DER encoding of `length`.
pub fn write_length(buffer: &mut Vec<u8>, length: usize) {
    if length <= LENGTH_SHORT_MAX_VALUE {
        buffer.push(LENGTH_BIT_SHORT_FORM | length as u8);
    } else {
        let bytes = (length as u64).to_be_bytes();
        let leading_zero_bytes = (length as u64).leading_zeros() / u8::BITS;
        let significant = &bytes[leading_zero_bytes as usize..];
        buffer.push(LENGTH_BIT_LONG_FORM | significant.len() as u8);
        buffer.extend_from_slice(significant);
    }
}
