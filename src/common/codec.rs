// src/common/codec.rs

//! Register codec: typed values to and from register bytes.
//!
//! Pure functions over the static [`REGISTER_MAP`](super::registers::REGISTER_MAP).
//! `encode` validates against the declared range and width of a field; `decode`
//! only validates width (and ASCII-ness of identifier strings) and otherwise passes
//! whatever the sensor reported straight through.

use super::registers::{Field, FieldKind, MAX_FIELD_WIDTH};
use arrayvec::{ArrayString, ArrayVec};

/// Raw register bytes of one field.
pub type FieldBytes = ArrayVec<u8, MAX_FIELD_WIDTH>;

/// A decoded register value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    U8(u8),
    U16(u16),
    U32(u32),
    /// ASCII text without its NUL padding.
    Ascii(ArrayString<MAX_FIELD_WIDTH>),
    Blob(ArrayVec<u8, MAX_FIELD_WIDTH>),
}

/// Error during field encoding or decoding.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CodecError {
    /// Byte or string length does not match the declared width of the field.
    #[error("{field}: expected {expected} bytes, got {got}")]
    WidthMismatch { field: Field, expected: usize, got: usize },

    /// Numeric value outside the range the field accepts.
    #[error("{field}: value {value} outside {min}..={max}")]
    OutOfRange { field: Field, value: u32, min: u32, max: u32 },

    /// The value variant does not match the field kind (e.g. text for a counter).
    #[error("{field}: value kind does not match the field")]
    KindMismatch { field: Field },

    /// Identifier text contains a non-ASCII or NUL byte.
    #[error("{field}: invalid identifier byte {byte:#04x}")]
    InvalidAscii { field: Field, byte: u8 },
}

fn check_range(field: Field, value: u32) -> Result<(), CodecError> {
    if let Some((min, max)) = field.spec().range {
        if value < min || value > max {
            return Err(CodecError::OutOfRange { field, value, min, max });
        }
    }
    Ok(())
}

fn check_width(field: Field, got: usize) -> Result<(), CodecError> {
    let expected = field.width();
    if got != expected {
        return Err(CodecError::WidthMismatch { field, expected, got });
    }
    Ok(())
}

/// Encodes `value` into `out`, which must be exactly as wide as `field`.
pub fn encode_into(field: Field, value: &FieldValue, out: &mut [u8]) -> Result<(), CodecError> {
    check_width(field, out.len())?;
    match (field.spec().kind, value) {
        (FieldKind::U8, FieldValue::U8(v)) => {
            check_range(field, u32::from(*v))?;
            out[0] = *v;
        }
        (FieldKind::U16, FieldValue::U16(v)) => {
            check_range(field, u32::from(*v))?;
            out.copy_from_slice(&v.to_be_bytes());
        }
        (FieldKind::U32, FieldValue::U32(v)) => {
            check_range(field, *v)?;
            out.copy_from_slice(&v.to_be_bytes());
        }
        (FieldKind::Ascii, FieldValue::Ascii(text)) => {
            let bytes = text.as_bytes();
            if bytes.len() > out.len() {
                return Err(CodecError::WidthMismatch { field, expected: out.len(), got: bytes.len() });
            }
            if let Some(&byte) = bytes.iter().find(|b| !b.is_ascii() || **b == 0) {
                return Err(CodecError::InvalidAscii { field, byte });
            }
            out.fill(0);
            out[..bytes.len()].copy_from_slice(bytes);
        }
        (FieldKind::Blob, FieldValue::Blob(blob)) => {
            check_width(field, blob.len())?;
            out.copy_from_slice(blob);
        }
        _ => return Err(CodecError::KindMismatch { field }),
    }
    Ok(())
}

/// Encodes `value` into a freshly sized byte buffer for `field`.
pub fn encode(field: Field, value: &FieldValue) -> Result<FieldBytes, CodecError> {
    let mut buf = [0u8; MAX_FIELD_WIDTH];
    let width = field.width();
    encode_into(field, value, &mut buf[..width])?;
    // width <= MAX_FIELD_WIDTH for every row of the map
    Ok(buf[..width].iter().copied().collect())
}

/// Decodes the bytes of `field`.
pub fn decode(field: Field, bytes: &[u8]) -> Result<FieldValue, CodecError> {
    check_width(field, bytes.len())?;
    let value = match field.spec().kind {
        FieldKind::U8 => FieldValue::U8(bytes[0]),
        FieldKind::U16 => FieldValue::U16(u16::from_be_bytes([bytes[0], bytes[1]])),
        FieldKind::U32 => FieldValue::U32(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])),
        FieldKind::Ascii => {
            let end = bytes.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
            let mut text = ArrayString::new();
            for &byte in &bytes[..end] {
                if !byte.is_ascii() || byte == 0 {
                    return Err(CodecError::InvalidAscii { field, byte });
                }
                text.push(byte as char);
            }
            FieldValue::Ascii(text)
        }
        FieldKind::Blob => FieldValue::Blob(bytes.iter().copied().collect()),
    };
    Ok(value)
}

// --- Typed helpers ---

pub fn decode_u8(field: Field, bytes: &[u8]) -> Result<u8, CodecError> {
    match decode(field, bytes)? {
        FieldValue::U8(v) => Ok(v),
        _ => Err(CodecError::KindMismatch { field }),
    }
}

pub fn decode_u16(field: Field, bytes: &[u8]) -> Result<u16, CodecError> {
    match decode(field, bytes)? {
        FieldValue::U16(v) => Ok(v),
        _ => Err(CodecError::KindMismatch { field }),
    }
}

pub fn decode_u32(field: Field, bytes: &[u8]) -> Result<u32, CodecError> {
    match decode(field, bytes)? {
        FieldValue::U32(v) => Ok(v),
        _ => Err(CodecError::KindMismatch { field }),
    }
}

/// Returns the bytes of `field` inside a block read that started at `base`.
///
/// Used for multi-field block reads (the settings block).
pub fn slice_for(field: Field, base: u8, block: &[u8]) -> Result<&[u8], CodecError> {
    let start = field.address().wrapping_sub(base) as usize;
    let end = start + field.width();
    block
        .get(start..end)
        .ok_or(CodecError::WidthMismatch { field, expected: end, got: block.len() })
}
