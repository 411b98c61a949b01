use std::sync::Arc;

use rand::{CryptoRng, Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::bfv::keygen::{PublicKey, SecretKey};
use crate::bfv::{check_same_params, small_to_ntt, BfvCiphertext};
use crate::error::{BlindMatchError, DecryptionError, Result};
use crate::params::BfvParams;
use crate::ring::ntt::NttPoly;
use crate::ring::poly::CoeffPoly;
use crate::sampling::{sample_binary, sample_uniform_poly, DiscreteGaussian};

/// ct = (pk0·u + e1 + Δ·m, pk1·u + e2) with binary u and Gaussian e1, e2.
pub fn encrypt_pk(plaintext: &CoeffPoly, pk: &PublicKey) -> Result<BfvCiphertext> {
    let mut rng = ChaCha20Rng::from_os_rng();
    encrypt_pk_with_rng(plaintext, pk, &mut rng)
}

pub fn encrypt_pk_with_rng<R: Rng + CryptoRng>(
    plaintext: &CoeffPoly,
    pk: &PublicKey,
    rng: &mut R,
) -> Result<BfvCiphertext> {
    let params = &pk.params;
    let n = params.ring_degree;
    let delta_m = scale_plaintext(plaintext, params)?;
    let gaussian = DiscreteGaussian::new(params.sigma);

    let u = small_to_ntt(&sample_binary(n, rng), params)?;
    let e1 = small_to_ntt(&gaussian.sample_vec(n, rng), params)?;
    let e2 = small_to_ntt(&gaussian.sample_vec(n, rng), params)?;

    let c0 = pk.pk0.mul(&u)?.add(&e1)?.add(&delta_m)?;
    let c1 = pk.pk1.mul(&u)?.add(&e2)?;
    Ok(BfvCiphertext { c: vec![c0, c1], params: params.clone() })
}

/// ct = (-a·s + e + Δ·m, a).
pub fn encrypt_sk(plaintext: &CoeffPoly, sk: &SecretKey) -> Result<BfvCiphertext> {
    let mut rng = ChaCha20Rng::from_os_rng();
    encrypt_sk_with_rng(plaintext, sk, &mut rng)
}

pub fn encrypt_sk_with_rng<R: Rng + CryptoRng>(
    plaintext: &CoeffPoly,
    sk: &SecretKey,
    rng: &mut R,
) -> Result<BfvCiphertext> {
    let params = &sk.params;
    let n = params.ring_degree;
    let delta_m = scale_plaintext(plaintext, params)?;
    let gaussian = DiscreteGaussian::new(params.sigma);

    let a = NttPoly::from_coeff_poly(&sample_uniform_poly(n, params.ct_modulus, rng), params.ct_plan.clone())?;
    let e = small_to_ntt(&gaussian.sample_vec(n, rng), params)?;
    let c0 = a.mul(&sk.poly)?.neg().add(&e)?.add(&delta_m)?;
    Ok(BfvCiphertext { c: vec![c0, a], params: params.clone() })
}

/// m = ⌊t·(c0 + c1·s + c2·s²)/q⌉ mod t.
pub fn decrypt(ct: &BfvCiphertext, sk: &SecretKey) -> Result<CoeffPoly> {
    decrypt_with_budget(ct, sk).map(|(pt, _)| pt)
}

/// Invariant noise budget in bits; 0 means the plaintext can no longer be
/// trusted.
pub fn noise_budget(ct: &BfvCiphertext, sk: &SecretKey) -> Result<u32> {
    decrypt_with_budget(ct, sk).map(|(_, budget)| budget)
}

/// Decrypt and report the invariant noise budget
/// `bits(q) - bits(‖t·phase mod q‖) - 1` in one pass.
pub fn decrypt_with_budget(ct: &BfvCiphertext, sk: &SecretKey) -> Result<(CoeffPoly, u32)> {
    if ct.c.len() < 2 || ct.c.len() > 3 {
        return Err(DecryptionError::MalformedCiphertext { got: ct.c.len() }.into());
    }
    check_same_params(&ct.params, &sk.params)?;
    let params = &ct.params;

    let mut phase = ct.c[0].clone();
    let mut s_power = sk.poly.clone();
    for (i, ci) in ct.c.iter().enumerate().skip(1) {
        phase.fma_assign(ci, &s_power)?;
        if i + 1 < ct.c.len() {
            s_power = s_power.mul(&sk.poly)?;
        }
    }
    let phase = phase.to_coeff_poly();

    let q = params.ct_modulus.value() as i128;
    let t = params.plain_modulus.value() as i128;
    let mut max_noise: u128 = 0;
    let coeffs = phase
        .centered_coeffs()
        .into_iter()
        .map(|x| {
            let noise = params.ct_modulus.center(params.ct_modulus.lift(t * x));
            max_noise = max_noise.max(noise.unsigned_abs());
            // ⌊t·x/q + 1/2⌋
            let rounded = (2 * t * x + q).div_euclid(2 * q);
            params.plain_modulus.lift(rounded)
        })
        .collect();

    let noise_bits = 128 - max_noise.leading_zeros();
    let budget = (params.ct_modulus.bits() as i64 - noise_bits as i64 - 1).max(0) as u32;
    Ok((CoeffPoly { coeffs, modulus: params.plain_modulus }, budget))
}

/// Δ·m in NTT form mod q.
pub(crate) fn scale_plaintext(plaintext: &CoeffPoly, params: &Arc<BfvParams>) -> Result<NttPoly> {
    if plaintext.modulus != params.plain_modulus {
        return Err(BlindMatchError::ModulusMismatch);
    }
    let q = params.ct_modulus;
    let coeffs = plaintext.coeffs.iter().map(|&m| q.mul(m, params.delta)).collect();
    NttPoly::from_coeff_poly(&CoeffPoly { coeffs, modulus: q }, params.ct_plan.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bfv::encoding::{decode_coeffs, decode_scalar, encode_coeffs, encode_scalar};
    use crate::bfv::keygen::{gen_public_key_with_rng, gen_secret_key_with_rng};
    use crate::bfv::test_support::small_params;

    #[test]
    fn test_encrypt_decrypt_sk() {
        let params = small_params();
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let sk = gen_secret_key_with_rng(&params, &mut rng).unwrap();

        for value in [0u64, 1, 42, 511] {
            let pt = encode_scalar(value, &params).unwrap();
            let ct = encrypt_sk_with_rng(&pt, &sk, &mut rng).unwrap();
            assert_eq!(decode_scalar(&decrypt(&ct, &sk).unwrap()), value);
        }
    }

    #[test]
    fn test_encrypt_decrypt_pk_packed() {
        let params = small_params();
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let sk = gen_secret_key_with_rng(&params, &mut rng).unwrap();
        let pk = gen_public_key_with_rng(&sk, &mut rng).unwrap();

        let bits = [1u64, 0, 1, 1, 0, 0, 1];
        let pt = encode_coeffs(&bits, &params).unwrap();
        let ct = encrypt_pk_with_rng(&pt, &pk, &mut rng).unwrap();
        let decrypted = decrypt(&ct, &sk).unwrap();
        assert_eq!(decode_coeffs(&decrypted, bits.len()), bits);
        assert!(decrypted.coeffs[bits.len()..].iter().all(|&c| c == 0));
    }

    #[test]
    fn test_fresh_ciphertexts_differ() {
        let params = small_params();
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let sk = gen_secret_key_with_rng(&params, &mut rng).unwrap();
        let pk = gen_public_key_with_rng(&sk, &mut rng).unwrap();
        let pt = encode_scalar(5, &params).unwrap();
        let a = encrypt_pk(&pt, &pk).unwrap();
        let b = encrypt_pk(&pt, &pk).unwrap();
        assert!(a.c[0] != b.c[0]);
    }

    #[test]
    fn test_fresh_noise_budget() {
        let params = small_params();
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        let sk = gen_secret_key_with_rng(&params, &mut rng).unwrap();
        let pk = gen_public_key_with_rng(&sk, &mut rng).unwrap();
        let ct = encrypt_pk_with_rng(&encode_scalar(1, &params).unwrap(), &pk, &mut rng).unwrap();
        // 60-bit q, 9-bit t, fresh noise well under 2^12
        let budget = noise_budget(&ct, &sk).unwrap();
        assert!(budget > 35, "budget = {budget}");
    }

    #[test]
    fn test_garbage_has_no_budget() {
        let params = small_params();
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        let sk = gen_secret_key_with_rng(&params, &mut rng).unwrap();
        let n = params.ring_degree;
        let uniform = |rng: &mut ChaCha20Rng| {
            NttPoly::from_coeff_poly(&sample_uniform_poly(n, params.ct_modulus, rng), params.ct_plan.clone())
                .unwrap()
        };
        let ct = BfvCiphertext { c: vec![uniform(&mut rng), uniform(&mut rng)], params: params.clone() };
        assert!(noise_budget(&ct, &sk).unwrap() <= 1);
    }

    #[test]
    fn test_malformed_ciphertext() {
        let params = small_params();
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let sk = gen_secret_key_with_rng(&params, &mut rng).unwrap();
        let ct = BfvCiphertext { c: vec![sk.poly.clone()], params: params.clone() };
        assert!(matches!(
            decrypt(&ct, &sk),
            Err(BlindMatchError::Decryption(DecryptionError::MalformedCiphertext { got: 1 }))
        ));
    }
}
