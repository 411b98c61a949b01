//! Parameters and key material for one matching deployment.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, trace};
use rand::{CryptoRng, Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;

use crate::algebra::{EncryptedScalar, EncryptedVector};
use crate::bfv::keygen::{
    gen_galois_key_with_rng, gen_public_key_with_rng, gen_relin_key_with_rng, gen_secret_key_with_rng,
};
use crate::bfv::{
    check_same_params, decrypt_with_budget, encode_coeffs, encrypt_pk_with_rng, BfvCiphertext, GaloisKey, PublicKey,
    RelinKey, SecretKey,
};
use crate::encoding::{BinaryVector, DEFAULT_CHAR_LENGTH};
use crate::error::{BlindMatchError, ContextId, DecryptionError, EncodingError, Result};
use crate::params::{select_parameters, BfvParams, ParameterChoice, SecurityLevel};
use crate::ring::poly::CoeffPoly;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Construction options for a [`CryptoContext`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatcherConfig {
    /// Bit capacity `l` of every encoded string.
    pub vector_length: usize,
    pub security_level: SecurityLevel,
    /// Stay at the smallest ring degree for the security level.
    pub use_minimal_parameters: bool,
    /// Bits per character.
    pub char_length: u32,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            vector_length: 256,
            security_level: SecurityLevel::Bits128,
            use_minimal_parameters: true,
            char_length: DEFAULT_CHAR_LENGTH,
        }
    }
}

impl MatcherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vector_length(mut self, l: usize) -> Self {
        self.vector_length = l;
        self
    }

    pub fn security_level(mut self, level: SecurityLevel) -> Self {
        self.security_level = level;
        self
    }

    pub fn use_minimal_parameters(mut self, yes: bool) -> Self {
        self.use_minimal_parameters = yes;
        self
    }

    pub fn char_length(mut self, bits: u32) -> Self {
        self.char_length = bits;
        self
    }
}

/// Owns the BFV parameters and every key. Immutable once built, so it can be
/// shared across threads; each encryption draws its own randomness.
pub struct CryptoContext {
    id: ContextId,
    config: MatcherConfig,
    choice: ParameterChoice,
    secret_key: SecretKey,
    public_key: PublicKey,
    relin_key: RelinKey,
    reversal_key: GaloisKey,
    /// w = 1 - X - X^2 - ... - X^{n-1} = Σ_j X^{-j}.
    reversed_ones: CoeffPoly,
}

impl CryptoContext {
    pub fn new(config: &MatcherConfig) -> Result<Self> {
        let mut rng = ChaCha20Rng::from_os_rng();
        Self::with_rng(config, &mut rng)
    }

    /// Build with caller-supplied randomness for key generation.
    pub fn with_rng<R: Rng + CryptoRng>(config: &MatcherConfig, rng: &mut R) -> Result<Self> {
        if config.char_length == 0 || config.char_length > 32 {
            return Err(EncodingError::InvalidCharLength(config.char_length).into());
        }
        let choice = select_parameters(config.vector_length, config.security_level, config.use_minimal_parameters)?;
        let params = choice.params.clone();
        let n = params.ring_degree;

        let secret_key = gen_secret_key_with_rng(&params, rng)?;
        let public_key = gen_public_key_with_rng(&secret_key, rng)?;
        let relin_key = gen_relin_key_with_rng(&secret_key, rng)?;
        let reversal_key = gen_galois_key_with_rng(&secret_key, 2 * n - 1, rng)?;

        let minus_one = params.plain_modulus.value() - 1;
        let mut coeffs = vec![minus_one; n];
        coeffs[0] = 1;
        let reversed_ones = CoeffPoly { coeffs, modulus: params.plain_modulus };

        let id = ContextId(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed));
        debug!(
            "{id}: ready, l={} bits in {} chunk(s) at {}",
            config.vector_length, choice.chunks, config.security_level
        );

        Ok(Self {
            id,
            config: config.clone(),
            choice,
            secret_key,
            public_key,
            relin_key,
            reversal_key,
            reversed_ones,
        })
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    pub fn parameters(&self) -> &ParameterChoice {
        &self.choice
    }

    pub fn params(&self) -> &Arc<BfvParams> {
        &self.choice.params
    }

    pub fn vector_length(&self) -> usize {
        self.config.vector_length
    }

    pub(crate) fn relin_key(&self) -> &RelinKey {
        &self.relin_key
    }

    pub(crate) fn reversal_key(&self) -> &GaloisKey {
        &self.reversal_key
    }

    pub(crate) fn reversed_ones(&self) -> &CoeffPoly {
        &self.reversed_ones
    }

    pub(crate) fn check_owner(&self, found: ContextId) -> Result<()> {
        if found != self.id {
            return Err(BlindMatchError::ContextMismatch { expected: self.id, found });
        }
        Ok(())
    }

    fn check_length(&self, vec: &BinaryVector) -> Result<()> {
        if vec.len() != self.vector_length() {
            return Err(BlindMatchError::DimensionMismatch { expected: self.vector_length(), got: vec.len() });
        }
        Ok(())
    }

    /// Encrypt with fresh OS randomness per chunk, chunks in parallel.
    pub fn encrypt_vector(&self, vec: &BinaryVector) -> Result<EncryptedVector> {
        self.check_length(vec)?;
        let chunks = vec
            .bits()
            .par_chunks(self.params().ring_degree)
            .map(|bits| {
                let mut rng = ChaCha20Rng::from_os_rng();
                self.encrypt_chunk(bits, &mut rng)
            })
            .collect::<Result<Vec<_>>>()?;
        trace!("{}: encrypted {} bits", self.id, vec.len());
        Ok(EncryptedVector::new(self.id, vec.len(), chunks))
    }

    pub fn encrypt_vector_with_rng<R: Rng + CryptoRng>(
        &self,
        vec: &BinaryVector,
        rng: &mut R,
    ) -> Result<EncryptedVector> {
        self.check_length(vec)?;
        let chunks = vec
            .bits()
            .chunks(self.params().ring_degree)
            .map(|bits| self.encrypt_chunk(bits, rng))
            .collect::<Result<Vec<_>>>()?;
        Ok(EncryptedVector::new(self.id, vec.len(), chunks))
    }

    fn encrypt_chunk<R: Rng + CryptoRng>(&self, bits: &[u8], rng: &mut R) -> Result<BfvCiphertext> {
        let values: Vec<u64> = bits.iter().map(|&b| b as u64).collect();
        let pt = encode_coeffs(&values, self.params())?;
        encrypt_pk_with_rng(&pt, &self.public_key, rng)
    }

    /// Decrypt every chunk back to bits; a slot that is not 0/1 means the
    /// ciphertext was not a fresh encryption of a bit vector.
    pub fn decrypt_vector(&self, vec: &EncryptedVector) -> Result<BinaryVector> {
        self.check_owner(vec.context_id())?;
        let n = self.params().ring_degree;
        let mut bits = Vec::with_capacity(vec.len());
        for (chunk_idx, ct) in vec.chunks().iter().enumerate() {
            let pt = self.decrypt_checked(ct)?;
            let take = (vec.len() - chunk_idx * n).min(n);
            for (offset, &value) in pt.coeffs[..take].iter().enumerate() {
                if value > 1 {
                    return Err(DecryptionError::NotABit { index: chunk_idx * n + offset, value }.into());
                }
                bits.push(value as u8);
            }
        }
        Ok(BinaryVector::from_bits(&bits)?)
    }

    /// The aggregate in coefficient 0, checked against the scalar's bound.
    pub fn decrypt_scalar(&self, scalar: &EncryptedScalar) -> Result<u64> {
        self.check_owner(scalar.context_id())?;
        let pt = self.decrypt_checked(scalar.ciphertext())?;
        let value = pt.coeffs[0];
        if value > scalar.bound() {
            return Err(DecryptionError::OutOfRange { value, bound: scalar.bound() }.into());
        }
        trace!("{}: decrypted one scalar", self.id);
        Ok(value)
    }

    /// Smallest invariant noise budget over the chunks, in bits.
    pub fn noise_budget(&self, vec: &EncryptedVector) -> Result<u32> {
        self.check_owner(vec.context_id())?;
        vec.chunks()
            .iter()
            .map(|ct| self.decrypt_with_budget(ct).map(|(_, budget)| budget))
            .try_fold(u32::MAX, |min, budget| budget.map(|b| min.min(b)))
    }

    pub fn scalar_noise_budget(&self, scalar: &EncryptedScalar) -> Result<u32> {
        self.check_owner(scalar.context_id())?;
        self.decrypt_with_budget(scalar.ciphertext()).map(|(_, budget)| budget)
    }

    fn decrypt_with_budget(&self, ct: &BfvCiphertext) -> Result<(CoeffPoly, u32)> {
        check_same_params(&ct.params, self.params()).map_err(|_| DecryptionError::ForeignParameters)?;
        decrypt_with_budget(ct, &self.secret_key)
    }

    fn decrypt_checked(&self, ct: &BfvCiphertext) -> Result<CoeffPoly> {
        let (pt, budget) = self.decrypt_with_budget(ct)?;
        if budget == 0 {
            return Err(DecryptionError::NoiseBudgetExhausted.into());
        }
        Ok(pt)
    }
}
