//! Homomorphic Hamming distance over encrypted bit vectors.
//!
//! Bits are packed as polynomial coefficients, one ring element per chunk of
//! `n` bits. For chunks a(X) and b(X), with σ: X -> X^{-1},
//!
//! ```text
//! [a(X)·σ(b)(X)]_0           = Σ a_i·b_i
//! [(a + b)(X)·Σ_j X^{-j}]_0  = Σ a_i + Σ b_i
//! ```
//!
//! so the constant coefficient of `(a + b)·w - 2·a·σ(b)` is the number of
//! positions where the chunks differ. The other coefficients carry no
//! meaning and are never read.

use log::trace;
use rayon::prelude::*;

use crate::bfv::{
    bfv_add, bfv_apply_automorphism, bfv_mul_and_relin, bfv_plain_mul, bfv_scalar_mul, bfv_sub, bfv_sum,
    BfvCiphertext,
};
use crate::context::CryptoContext;
use crate::error::{BlindMatchError, ContextId, Result};

/// An encrypted bit vector, tagged with the context that produced it.
#[derive(Clone, Debug)]
pub struct EncryptedVector {
    context_id: ContextId,
    bit_len: usize,
    chunks: Vec<BfvCiphertext>,
}

impl EncryptedVector {
    pub(crate) fn new(context_id: ContextId, bit_len: usize, chunks: Vec<BfvCiphertext>) -> Self {
        Self { context_id, bit_len, chunks }
    }

    pub fn context_id(&self) -> ContextId {
        self.context_id
    }

    /// Number of encrypted bits.
    pub fn len(&self) -> usize {
        self.bit_len
    }

    pub fn is_empty(&self) -> bool {
        self.bit_len == 0
    }

    pub fn num_chunks(&self) -> usize {
        self.chunks.len()
    }

    pub(crate) fn chunks(&self) -> &[BfvCiphertext] {
        &self.chunks
    }
}

/// A single encrypted integer in coefficient 0, with the largest value it
/// can legitimately hold.
#[derive(Clone, Debug)]
pub struct EncryptedScalar {
    context_id: ContextId,
    bound: u64,
    ct: BfvCiphertext,
}

impl EncryptedScalar {
    pub fn context_id(&self) -> ContextId {
        self.context_id
    }

    pub fn bound(&self) -> u64 {
        self.bound
    }

    pub(crate) fn ciphertext(&self) -> &BfvCiphertext {
        &self.ct
    }
}

/// Encrypted count of differing bits between `a` and `b`.
pub fn hamming_distance(ctx: &CryptoContext, a: &EncryptedVector, b: &EncryptedVector) -> Result<EncryptedScalar> {
    ctx.check_owner(a.context_id)?;
    ctx.check_owner(b.context_id)?;
    if a.bit_len != b.bit_len {
        return Err(BlindMatchError::DimensionMismatch { expected: a.bit_len, got: b.bit_len });
    }
    if a.chunks.len() != b.chunks.len() {
        return Err(BlindMatchError::DimensionMismatch { expected: a.chunks.len(), got: b.chunks.len() });
    }

    let partial = a
        .chunks
        .par_iter()
        .zip(b.chunks.par_iter())
        .map(|(ca, cb)| chunk_distance(ctx, ca, cb))
        .collect::<Result<Vec<_>>>()?;
    let ct = bfv_sum(&partial)?;
    trace!("{}: evaluated Hamming distance over {} chunk(s)", ctx.id(), partial.len());

    Ok(EncryptedScalar { context_id: ctx.id(), bound: a.bit_len as u64, ct })
}

fn chunk_distance(ctx: &CryptoContext, a: &BfvCiphertext, b: &BfvCiphertext) -> Result<BfvCiphertext> {
    let b_rev = bfv_apply_automorphism(b, ctx.reversal_key())?;
    let dot = bfv_mul_and_relin(a, &b_rev, ctx.relin_key())?;
    let total = bfv_plain_mul(&bfv_add(a, b)?, ctx.reversed_ones())?;
    bfv_sub(&total, &bfv_scalar_mul(&dot, 2))
}
