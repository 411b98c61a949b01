use std::sync::Arc;

use log::debug;

use crate::error::{BlindMatchError, Result};
use crate::params::security::SecurityLevel;
use crate::params::{BfvParams, BfvParamsBuilder};
use crate::ring::primes::NttPrimeGenerator;

const MAX_RING_DEGREE: usize = 1 << 15;
const MAX_CT_MODULUS_BITS: u32 = 60;
const AUX_PRIME_BITS: u32 = 55;
const AUX_PRIMES: usize = 2;
const GADGET_BASE_BITS: u32 = 4;
const SIGMA: f64 = 3.2;
/// Tail multiplier applied to the estimated standard deviation.
const TAIL_FACTOR: f64 = 6.0;

/// Parameters chosen for a vector length, plus how they were arrived at.
#[derive(Clone, Debug)]
pub struct ParameterChoice {
    pub params: Arc<BfvParams>,
    pub security: SecurityLevel,
    pub vector_length: usize,
    /// Number of ring elements a vector of `vector_length` bits occupies.
    pub chunks: usize,
    /// Estimated log2 of the noise in a Hamming-distance result.
    pub estimated_noise_bits: f64,
}

/// Pick BFV parameters able to hold `vector_length` bits and evaluate one
/// Hamming distance over them at the requested security level.
pub fn select_parameters(
    vector_length: usize,
    security: SecurityLevel,
    use_minimal: bool,
) -> Result<ParameterChoice> {
    if vector_length == 0 {
        return Err(BlindMatchError::Parameter("vector length must be positive".into()));
    }
    let t_bits = ceil_log2(vector_length) + 1;
    if t_bits > MAX_CT_MODULUS_BITS {
        return Err(BlindMatchError::Parameter(format!(
            "vector length {vector_length} needs a {t_bits}-bit plaintext modulus"
        )));
    }

    let mut n = initial_ring_degree(vector_length, security, use_minimal);
    loop {
        let max_bits = security.max_coeff_modulus_bits(n).ok_or_else(|| {
            BlindMatchError::Parameter(format!("no security bound for ring degree {n}"))
        })?;
        let q_bits = max_bits.min(MAX_CT_MODULUS_BITS);
        let chunks = vector_length.div_ceil(n);
        let gadget_digits = q_bits.div_ceil(GADGET_BASE_BITS) as usize;
        let noise_bits = estimate_noise_bits(n, t_bits, gadget_digits, chunks);
        // one spare bit keeps the decrypted noise budget positive
        let ceiling = q_bits as f64 - t_bits as f64 - 2.0;

        debug!(
            "n={n}: q {q_bits} bits, t 2^{t_bits}, {chunks} chunk(s), noise ~2^{noise_bits:.1} vs 2^{ceiling:.1}"
        );

        if q_bits > t_bits + 1 && noise_bits < ceiling {
            let q = NttPrimeGenerator::new(q_bits, n)?.take(1)?[0];
            let aux = NttPrimeGenerator::new(AUX_PRIME_BITS, n)?.take(AUX_PRIMES)?;
            let params = BfvParamsBuilder::new()
                .ring_degree(n)
                .plain_modulus(1u64 << t_bits)
                .ct_modulus(q)
                .aux_moduli(aux)
                .sigma(SIGMA)
                .gadget_base(1u64 << GADGET_BASE_BITS)
                .build()?;
            debug!("selected n={n}, q={q}, t=2^{t_bits} at {security}");
            return Ok(ParameterChoice { params, security, vector_length, chunks, estimated_noise_bits: noise_bits });
        }

        if n >= MAX_RING_DEGREE {
            return Err(BlindMatchError::Parameter(format!(
                "no parameters at {security} keep a {vector_length}-bit comparison below the decryption bound"
            )));
        }
        n *= 2;
    }
}

fn initial_ring_degree(vector_length: usize, security: SecurityLevel, use_minimal: bool) -> usize {
    let n_min = security.min_ring_degree();
    if use_minimal {
        return n_min;
    }
    let wanted = vector_length.saturating_mul(2);
    if wanted < n_min {
        n_min
    } else if wanted > MAX_RING_DEGREE {
        MAX_RING_DEGREE
    } else {
        wanted.next_power_of_two()
    }
}

fn ceil_log2(x: usize) -> u32 {
    if x <= 1 {
        0
    } else {
        usize::BITS - (x - 1).leading_zeros()
    }
}

/// log2 of a high-probability bound on the noise of
/// `(a + b)·w - 2·relin(a ⊗ σ(b))` summed over `chunks` ring elements.
///
/// Fresh public-key noise has variance σ²(n·(1/2 + 2/3) + 1) for a ternary
/// secret and binary encryption randomness. Key switching adds
/// (B²/12)·σ²·n·D. The tensor rounding term is dominated by
/// t·‖a‖·‖k‖·(e_a + e_b) with ‖k‖ ≈ √(n/18).
pub fn estimate_noise_bits(n: usize, t_bits: u32, gadget_digits: usize, chunks: usize) -> f64 {
    let nf = n as f64;
    let base = (1u64 << GADGET_BASE_BITS) as f64;

    let fresh = SIGMA * (nf * (0.5 + 2.0 / 3.0) + 1.0).sqrt();
    let key_switch = base / 12f64.sqrt() * SIGMA * (nf * gadget_digits as f64).sqrt();
    let reversed = (fresh * fresh + key_switch * key_switch).sqrt();

    let k_norm = (nf / 18.0).sqrt() + 1.0;
    let t = 2f64.powi(t_bits as i32);
    let tensor = t * nf.sqrt() * k_norm * (fresh + reversed) + key_switch;

    let linear = nf.sqrt() * 2f64.sqrt() * fresh;
    let per_chunk = ((2.0 * tensor).powi(2) + linear.powi(2)).sqrt();
    let total = per_chunk * (chunks.max(1) as f64).sqrt();

    (TAIL_FACTOR * total).log2()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ceil_log2() {
        assert_eq!(ceil_log2(1), 0);
        assert_eq!(ceil_log2(2), 1);
        assert_eq!(ceil_log2(3), 2);
        assert_eq!(ceil_log2(256), 8);
        assert_eq!(ceil_log2(257), 9);
    }

    #[test]
    fn test_initial_ring_degree() {
        let sec = SecurityLevel::Bits128;
        assert_eq!(initial_ring_degree(100_000, sec, true), 4096);
        assert_eq!(initial_ring_degree(256, sec, false), 4096);
        assert_eq!(initial_ring_degree(3000, sec, false), 8192);
        assert_eq!(initial_ring_degree(4096, sec, false), 8192);
        assert_eq!(initial_ring_degree(20_000, sec, false), 1 << 15);
        assert_eq!(initial_ring_degree(256, SecurityLevel::Bits256, true), 8192);
    }

    #[test]
    fn test_default_selection() {
        let choice = select_parameters(256, SecurityLevel::Bits128, true).unwrap();
        let p = &choice.params;
        assert_eq!(p.ring_degree, 4096);
        assert_eq!(p.plain_modulus.value(), 512);
        assert_eq!(p.ct_modulus.bits(), 60);
        assert_eq!(p.ct_modulus.value() % 8192, 1);
        assert_eq!(choice.chunks, 1);
        assert!(choice.estimated_noise_bits < p.noise_ceiling_bits() - 1.0);
    }

    #[test]
    fn test_256_bit_security_uses_larger_ring() {
        let choice = select_parameters(256, SecurityLevel::Bits256, true).unwrap();
        assert_eq!(choice.params.ring_degree, 8192);
    }

    #[test]
    fn test_long_vectors_span_chunks() {
        let choice = select_parameters(5000, SecurityLevel::Bits128, true).unwrap();
        assert_eq!(choice.params.ring_degree, 4096);
        assert_eq!(choice.chunks, 2);
        assert_eq!(choice.params.plain_modulus.value(), 1 << 14);
    }

    #[test]
    fn test_rejects_impossible_requests() {
        assert!(select_parameters(0, SecurityLevel::Bits128, true).is_err());
        // a 2^40-bit vector needs t = 2^41 and far more noise room than 60 bits
        assert!(select_parameters(1 << 40, SecurityLevel::Bits128, true).is_err());
    }

    #[test]
    fn test_noise_grows_with_plaintext_modulus() {
        let small = estimate_noise_bits(4096, 9, 15, 1);
        let large = estimate_noise_bits(4096, 12, 15, 1);
        assert!((large - small - 3.0).abs() < 0.1);
        assert!(small < 49.0, "{small}");
    }
}
