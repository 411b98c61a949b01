//! Strings to fixed-width bit vectors and back.
//!
//! Every character contributes `char_length` bits of its code point, most
//! significant bit first. Vectors are zero-padded to the configured length,
//! so an all-zero block marks the end of the text.

use crate::error::{BlindMatchError, EncodingError, Result};

pub const DEFAULT_CHAR_LENGTH: u32 = 16;
const MAX_CHAR_LENGTH: u32 = 32;

/// A vector of bits, each entry 0 or 1.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct BinaryVector {
    bits: Vec<u8>,
}

impl BinaryVector {
    pub fn from_bits(bits: &[u8]) -> std::result::Result<Self, EncodingError> {
        if let Some((index, &value)) = bits.iter().enumerate().find(|&(_, &b)| b > 1) {
            return Err(EncodingError::NotBinary { index, value: value as u64 });
        }
        Ok(Self { bits: bits.to_vec() })
    }

    pub fn zeros(len: usize) -> Self {
        Self { bits: vec![0; len] }
    }

    pub fn bits(&self) -> &[u8] {
        &self.bits
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Number of positions where the two vectors differ.
    pub fn hamming_distance(&self, other: &Self) -> Result<u64> {
        if self.len() != other.len() {
            return Err(BlindMatchError::DimensionMismatch { expected: self.len(), got: other.len() });
        }
        Ok(self.bits.iter().zip(&other.bits).filter(|(a, b)| a != b).count() as u64)
    }
}

fn check_char_length(char_length: u32) -> std::result::Result<(), EncodingError> {
    if char_length == 0 || char_length > MAX_CHAR_LENGTH {
        return Err(EncodingError::InvalidCharLength(char_length));
    }
    Ok(())
}

/// Encode `text` and zero-pad it to `max_length` bits.
pub fn string_to_binary_vector(
    text: &str,
    char_length: u32,
    max_length: usize,
) -> std::result::Result<BinaryVector, EncodingError> {
    check_char_length(char_length)?;
    let width = char_length as usize;
    let bits = text.chars().count().saturating_mul(width);
    if bits > max_length {
        return Err(EncodingError::TooLong { bits, max_length });
    }

    let mut out = Vec::with_capacity(max_length);
    for ch in text.chars() {
        let code_point = ch as u32;
        if code_point == 0 {
            return Err(EncodingError::NulCharacter);
        }
        if char_length < MAX_CHAR_LENGTH && code_point >> char_length != 0 {
            return Err(EncodingError::CodePointTooWide { code_point, char_length });
        }
        out.extend((0..char_length).rev().map(|shift| ((code_point >> shift) & 1) as u8));
    }
    out.resize(max_length, 0);
    Ok(BinaryVector { bits: out })
}

/// Decode blocks of `char_length` bits until the first all-zero block or the
/// end of the vector. A trailing partial block is padding and is skipped.
pub fn binary_vector_to_string(vec: &BinaryVector, char_length: u32) -> std::result::Result<String, EncodingError> {
    check_char_length(char_length)?;
    let mut text = String::new();
    for block in vec.bits.chunks_exact(char_length as usize) {
        let code_point = block.iter().fold(0u32, |acc, &b| (acc << 1) | b as u32);
        if code_point == 0 {
            break;
        }
        text.push(char::from_u32(code_point).ok_or(EncodingError::InvalidCodePoint(code_point))?);
    }
    Ok(text)
}
