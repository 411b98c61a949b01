use std::fmt;

use thiserror::Error;

/// Process-unique identity of a [`crate::context::CryptoContext`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContextId(pub(crate) u64);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

/// Failures of the string <-> bit-vector encoding layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("character length must be in 1..=32 bits, got {0}")]
    InvalidCharLength(u32),

    #[error("code point U+{code_point:04X} does not fit in {char_length} bits")]
    CodePointTooWide { code_point: u32, char_length: u32 },

    #[error("U+0000 cannot be encoded: the all-zero block terminates a vector")]
    NulCharacter,

    #[error("encoded length {bits} bits exceeds the vector length {max_length}")]
    TooLong { bits: usize, max_length: usize },

    #[error("bit vector entry {index} is {value}, expected 0 or 1")]
    NotBinary { index: usize, value: u64 },

    #[error("decoded block {0:#x} is not a Unicode scalar value")]
    InvalidCodePoint(u32),
}

/// Reasons a ciphertext refused to decrypt.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecryptionError {
    #[error("noise budget exhausted")]
    NoiseBudgetExhausted,

    #[error("decrypted value {value} exceeds the largest legitimate value {bound}")]
    OutOfRange { value: u64, bound: u64 },

    #[error("slot {index} decrypted to {value}, expected a bit")]
    NotABit { index: usize, value: u64 },

    #[error("ciphertext was produced under different parameters")]
    ForeignParameters,

    #[error("ciphertext has {got} components, expected at least 2")]
    MalformedCiphertext { got: usize },
}

#[derive(Debug, Error)]
pub enum BlindMatchError {
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("invalid parameter: {0}")]
    Parameter(String),

    #[error("ring degree must be a power of 2 and at least 16, got {0}")]
    InvalidRingDegree(usize),

    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("modulus mismatch")]
    ModulusMismatch,

    #[error("context mismatch: operand belongs to {found}, expected {expected}")]
    ContextMismatch { expected: ContextId, found: ContextId },

    #[error("decryption error: {0}")]
    Decryption(#[from] DecryptionError),

    #[error("string equality evaluation failed: {0}")]
    Match(#[source] Box<BlindMatchError>),
}

impl BlindMatchError {
    /// Wrap a failure raised while evaluating an equality query.
    pub fn into_match(self) -> Self {
        match self {
            err @ BlindMatchError::Match(_) => err,
            other => BlindMatchError::Match(Box::new(other)),
        }
    }

    /// The innermost error, looking through `Match` wrappers.
    pub fn root_cause(&self) -> &BlindMatchError {
        let mut err = self;
        while let BlindMatchError::Match(inner) = err {
            err = inner;
        }
        err
    }
}

pub type Result<T> = std::result::Result<T, BlindMatchError>;
