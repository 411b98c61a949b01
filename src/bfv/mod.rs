pub mod encoding;
pub mod encrypt;
pub mod eval;
pub mod keygen;
pub mod keyswitch;

pub use encoding::{decode_coeffs, decode_scalar, encode_coeffs, encode_scalar};
pub use encrypt::{
    decrypt, decrypt_with_budget, encrypt_pk, encrypt_pk_with_rng, encrypt_sk, encrypt_sk_with_rng, noise_budget,
};
pub use eval::{
    bfv_add, bfv_apply_automorphism, bfv_mul_and_relin, bfv_mul_no_relin, bfv_neg, bfv_plain_add,
    bfv_plain_mul, bfv_scalar_mul, bfv_sub, bfv_sum,
};
pub use keygen::{GaloisKey, PublicKey, RelinKey, SecretKey};

use std::sync::Arc;

use crate::error::{BlindMatchError, Result};
use crate::params::BfvParams;
use crate::ring::ntt::NttPoly;
use crate::ring::poly::CoeffPoly;

/// A BFV ciphertext: (c0, c1) when fresh, (c0, c1, c2) after a product
/// before relinearization. Components are kept in NTT form mod q.
#[derive(Clone, Debug)]
pub struct BfvCiphertext {
    pub c: Vec<NttPoly>,
    pub params: Arc<BfvParams>,
}

impl BfvCiphertext {
    pub fn degree(&self) -> usize {
        self.c.len().saturating_sub(1)
    }
}

/// Operands must come from the same parameter set.
pub(crate) fn check_same_params(a: &Arc<BfvParams>, b: &Arc<BfvParams>) -> Result<()> {
    if Arc::ptr_eq(a, b) {
        return Ok(());
    }
    if a.ring_degree != b.ring_degree {
        return Err(BlindMatchError::DimensionMismatch { expected: a.ring_degree, got: b.ring_degree });
    }
    if a.ct_modulus != b.ct_modulus || a.plain_modulus != b.plain_modulus {
        return Err(BlindMatchError::ModulusMismatch);
    }
    Ok(())
}

/// Lift small signed values (noise, keys, randomness) into NTT form mod q.
pub(crate) fn small_to_ntt(values: &[i64], params: &BfvParams) -> Result<NttPoly> {
    NttPoly::from_coeff_poly(&CoeffPoly::from_signed(values, params.ct_modulus), params.ct_plan.clone())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::params::{BfvParams, BfvParamsBuilder};
    use crate::ring::primes::NttPrimeGenerator;

    /// n = 64, t = 2^9, 60-bit q.
    pub fn small_params() -> Arc<BfvParams> {
        params_with(64, 512)
    }

    pub fn params_with(n: usize, t: u64) -> Arc<BfvParams> {
        let q = NttPrimeGenerator::new(60, n).unwrap().take(1).unwrap()[0];
        let aux = NttPrimeGenerator::new(55, n).unwrap().take(2).unwrap();
        BfvParamsBuilder::new()
            .ring_degree(n)
            .plain_modulus(t)
            .ct_modulus(q)
            .aux_moduli(aux)
            .build()
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::test_support::params_with;

    #[test]
    fn test_check_same_params() {
        let a = params_with(64, 512);
        let b = params_with(64, 512);
        let c = params_with(128, 512);
        let d = params_with(64, 1024);
        assert!(check_same_params(&a, &a).is_ok());
        assert!(check_same_params(&a, &b).is_ok());
        assert!(matches!(check_same_params(&a, &c), Err(BlindMatchError::DimensionMismatch { .. })));
        assert!(matches!(check_same_params(&a, &d), Err(BlindMatchError::ModulusMismatch)));
    }
}
