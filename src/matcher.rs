//! Encrypted string equality on top of a [`CryptoContext`].

use log::debug;

use crate::algebra::{self, EncryptedScalar, EncryptedVector};
use crate::context::{CryptoContext, MatcherConfig};
use crate::encoding::{binary_vector_to_string, string_to_binary_vector};
use crate::error::Result;

/// Encrypts strings and decides whether two encrypted strings are equal by
/// decrypting nothing but their Hamming distance.
pub struct EncryptedStringMatcher {
    context: CryptoContext,
}

impl EncryptedStringMatcher {
    pub fn new(config: MatcherConfig) -> Result<Self> {
        Ok(Self { context: CryptoContext::new(&config)? })
    }

    pub fn from_context(context: CryptoContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &CryptoContext {
        &self.context
    }

    fn char_length(&self) -> u32 {
        self.context.config().char_length
    }

    pub fn encrypt_string(&self, text: &str) -> Result<EncryptedVector> {
        let vec = string_to_binary_vector(text, self.char_length(), self.context.vector_length())?;
        self.context.encrypt_vector(&vec)
    }

    pub fn decrypt_string(&self, encrypted: &EncryptedVector) -> Result<String> {
        let vec = self.context.decrypt_vector(encrypted)?;
        Ok(binary_vector_to_string(&vec, self.char_length())?)
    }

    /// Encrypted distance, for callers that decrypt elsewhere.
    pub fn encrypted_hamming_distance(&self, a: &EncryptedVector, b: &EncryptedVector) -> Result<EncryptedScalar> {
        algebra::hamming_distance(&self.context, a, b)
    }

    /// Decrypted Hamming distance between the two encodings. This reveals
    /// how far apart the strings are, not only whether they match.
    pub fn hamming_distance(&self, a: &EncryptedVector, b: &EncryptedVector) -> Result<u64> {
        let encrypted = self.encrypted_hamming_distance(a, b)?;
        self.context.decrypt_scalar(&encrypted)
    }

    /// True iff the strings behind `a` and `b` are identical. Any failure is
    /// reported as [`crate::error::BlindMatchError::Match`].
    pub fn are_strings_equal(&self, a: &EncryptedVector, b: &EncryptedVector) -> Result<bool> {
        let distance = self.hamming_distance(a, b).map_err(|e| e.into_match())?;
        debug!("{}: equality query answered", self.context.id());
        Ok(distance == 0)
    }
}
