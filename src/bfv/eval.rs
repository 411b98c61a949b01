use crate::bfv::encrypt::scale_plaintext;
use crate::bfv::keygen::{GaloisKey, RelinKey};
use crate::bfv::keyswitch::{key_switch, relinearize};
use crate::bfv::{check_same_params, BfvCiphertext};
use crate::error::{BlindMatchError, Result};
use crate::ring::modular::Modulus;
use crate::ring::ntt::NttPoly;
use crate::ring::poly::CoeffPoly;
use crate::ring::rns::RnsPoly;

fn zip_components(
    ct1: &BfvCiphertext,
    ct2: &BfvCiphertext,
    f: impl Fn(Option<&NttPoly>, Option<&NttPoly>) -> Result<NttPoly>,
) -> Result<BfvCiphertext> {
    check_same_params(&ct1.params, &ct2.params)?;
    let len = ct1.c.len().max(ct2.c.len());
    let c = (0..len).map(|i| f(ct1.c.get(i), ct2.c.get(i))).collect::<Result<Vec<_>>>()?;
    Ok(BfvCiphertext { c, params: ct1.params.clone() })
}

/// Component-wise sum; a shorter ciphertext is padded with zeros.
pub fn bfv_add(ct1: &BfvCiphertext, ct2: &BfvCiphertext) -> Result<BfvCiphertext> {
    zip_components(ct1, ct2, |a, b| match (a, b) {
        (Some(a), Some(b)) => a.add(b),
        (Some(x), None) | (None, Some(x)) => Ok(x.clone()),
        (None, None) => unreachable!("index below the longer length"),
    })
}

pub fn bfv_sub(ct1: &BfvCiphertext, ct2: &BfvCiphertext) -> Result<BfvCiphertext> {
    zip_components(ct1, ct2, |a, b| match (a, b) {
        (Some(a), Some(b)) => a.sub(b),
        (Some(a), None) => Ok(a.clone()),
        (None, Some(b)) => Ok(b.neg()),
        (None, None) => unreachable!("index below the longer length"),
    })
}

pub fn bfv_neg(ct: &BfvCiphertext) -> BfvCiphertext {
    BfvCiphertext { c: ct.c.iter().map(NttPoly::neg).collect(), params: ct.params.clone() }
}

/// Sum of a non-empty slice of ciphertexts.
pub fn bfv_sum(cts: &[BfvCiphertext]) -> Result<BfvCiphertext> {
    let (first, rest) = cts
        .split_first()
        .ok_or_else(|| BlindMatchError::Parameter("cannot sum an empty set of ciphertexts".into()))?;
    rest.iter().try_fold(first.clone(), |acc, ct| bfv_add(&acc, ct))
}

/// ct + Δ·m.
pub fn bfv_plain_add(ct: &BfvCiphertext, plaintext: &CoeffPoly) -> Result<BfvCiphertext> {
    let delta_m = scale_plaintext(plaintext, &ct.params)?;
    let mut c = ct.c.clone();
    c[0] = c[0].add(&delta_m)?;
    Ok(BfvCiphertext { c, params: ct.params.clone() })
}

/// ct·m for a plaintext polynomial m ∈ R_t. Coefficients of m are lifted
/// centered, so noise grows by ‖m‖₁ with entries in (-t/2, t/2].
pub fn bfv_plain_mul(ct: &BfvCiphertext, plaintext: &CoeffPoly) -> Result<BfvCiphertext> {
    let params = &ct.params;
    if plaintext.modulus != params.plain_modulus {
        return Err(BlindMatchError::ModulusMismatch);
    }
    let lifted = plaintext.switch_modulus_centered(params.ct_modulus);
    let pt = NttPoly::from_coeff_poly(&lifted, params.ct_plan.clone())?;
    let c = ct.c.iter().map(|ci| ci.mul(&pt)).collect::<Result<Vec<_>>>()?;
    Ok(BfvCiphertext { c, params: params.clone() })
}

/// ct·k for a small signed integer k.
pub fn bfv_scalar_mul(ct: &BfvCiphertext, k: i64) -> BfvCiphertext {
    let scalar = ct.params.ct_modulus.lift(k as i128);
    BfvCiphertext { c: ct.c.iter().map(|ci| ci.scalar_mul(scalar)).collect(), params: ct.params.clone() }
}

pub fn bfv_mul_and_relin(ct1: &BfvCiphertext, ct2: &BfvCiphertext, rlk: &RelinKey) -> Result<BfvCiphertext> {
    relinearize(&bfv_mul_no_relin(ct1, ct2)?, rlk)
}

/// Degree-2 product ⌊t/q·(ct1 ⊗ ct2)⌉ (Halevi-Polyakov-Shoup).
///
/// 1. Extend the centered components of both inputs to the auxiliary basis P.
/// 2. Form the tensor products mod q and mod P.
/// 3. Per coefficient, with x ≡ a (mod q) and x ≡ b (mod P), recover
///    m = (x - a_c)/q = (b - a_c)·q^{-1} mod P, centered, then
///    ⌊t·x/q⌉ = ⌊t·a_c/q⌉ + t·m.
pub fn bfv_mul_no_relin(ct1: &BfvCiphertext, ct2: &BfvCiphertext) -> Result<BfvCiphertext> {
    if ct1.c.len() != 2 || ct2.c.len() != 2 {
        return Err(BlindMatchError::Parameter("multiplication requires degree-1 ciphertexts".into()));
    }
    check_same_params(&ct1.params, &ct2.params)?;
    let params = &ct1.params;
    let aux = &params.aux_basis;

    let coeff = |p: &NttPoly| p.to_coeff_poly();
    let (c0, c1) = (coeff(&ct1.c[0]), coeff(&ct1.c[1]));
    let (d0, d1) = (coeff(&ct2.c[0]), coeff(&ct2.c[1]));
    let (c0_p, c1_p) = (RnsPoly::extend_centered(&c0, aux)?, RnsPoly::extend_centered(&c1, aux)?);
    let (d0_p, d1_p) = (RnsPoly::extend_centered(&d0, aux)?, RnsPoly::extend_centered(&d1, aux)?);

    let t0_q = ct1.c[0].mul(&ct2.c[0])?;
    let t1_q = ct1.c[0].mul(&ct2.c[1])?.add(&ct1.c[1].mul(&ct2.c[0])?)?;
    let t2_q = ct1.c[1].mul(&ct2.c[1])?;

    let t0_p = c0_p.mul(&d0_p)?;
    let t1_p = c0_p.mul(&d1_p)?.add(&c1_p.mul(&d0_p)?)?;
    let t2_p = c1_p.mul(&d1_p)?;

    let q_inv = aux
        .moduli
        .iter()
        .map(|m| {
            m.inv(params.ct_modulus.value() % m.value())
                .ok_or_else(|| BlindMatchError::Parameter("q must be invertible modulo every auxiliary prime".into()))
        })
        .collect::<Result<Vec<_>>>()?;

    let c = [(&t0_q, &t0_p), (&t1_q, &t1_p), (&t2_q, &t2_p)]
        .into_iter()
        .map(|(tq, tp)| hps_scale(tq, tp, &q_inv, ct1))
        .collect::<Result<Vec<_>>>()?;

    Ok(BfvCiphertext { c, params: params.clone() })
}

fn hps_scale(t_q: &NttPoly, t_p: &RnsPoly, q_inv: &[u64], ct: &BfvCiphertext) -> Result<NttPoly> {
    let params = &ct.params;
    let aux = &params.aux_basis;
    let q_mod: Modulus = params.ct_modulus;
    let q = q_mod.value() as i128;
    let t = params.plain_modulus.value() as i128;

    let a_poly = t_q.to_coeff_poly();
    let b_polys: Vec<CoeffPoly> = t_p.components.iter().map(NttPoly::to_coeff_poly).collect();
    let mut residues = vec![0u64; aux.num_moduli()];

    let coeffs = a_poly
        .coeffs
        .iter()
        .enumerate()
        .map(|(i, &a)| {
            let a_c = q_mod.center(a);
            for (((slot, m), b), &inv) in residues.iter_mut().zip(&aux.moduli).zip(&b_polys).zip(q_inv) {
                *slot = m.mul(m.sub(b.coeffs[i], m.lift(a_c)), inv);
            }
            let m = aux.reconstruct_centered(&residues);
            let rounded = (2 * t * a_c + q).div_euclid(2 * q);
            q_mod.add(q_mod.lift(rounded), q_mod.mul(t as u64, q_mod.lift(m)))
        })
        .collect();

    NttPoly::from_coeff_poly(&CoeffPoly { coeffs, modulus: q_mod }, params.ct_plan.clone())
}

/// σ_k(ct) key-switched back to s: (σ_k(c0) + k0, k1) where
/// (k0, k1) = key_switch(σ_k(c1)).
pub fn bfv_apply_automorphism(ct: &BfvCiphertext, gk: &GaloisKey) -> Result<BfvCiphertext> {
    if ct.c.len() != 2 {
        return Err(BlindMatchError::Parameter("automorphism requires a degree-1 ciphertext".into()));
    }
    check_same_params(&ct.params, &gk.params)?;
    let params = &ct.params;

    let c0 = ct.c[0].to_coeff_poly().automorphism(gk.element);
    let c1 = ct.c[1].to_coeff_poly().automorphism(gk.element);
    let (k0, k1) = key_switch(&c1, &gk.ksk, params)?;
    let c0 = NttPoly::from_coeff_poly(&c0, params.ct_plan.clone())?.add(&k0)?;

    Ok(BfvCiphertext { c: vec![c0, k1], params: params.clone() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bfv::encoding::{decode_coeffs, decode_scalar, encode_coeffs, encode_scalar};
    use crate::bfv::encrypt::{decrypt, encrypt_pk_with_rng, encrypt_sk_with_rng, noise_budget};
    use crate::bfv::keygen::*;
    use crate::bfv::test_support::{params_with, small_params};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn setup(seed: u64) -> (SecretKey, ChaCha20Rng) {
        let params = small_params();
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let sk = gen_secret_key_with_rng(&params, &mut rng).unwrap();
        (sk, rng)
    }

    fn enc(value: u64, sk: &SecretKey, rng: &mut ChaCha20Rng) -> BfvCiphertext {
        encrypt_sk_with_rng(&encode_scalar(value, &sk.params).unwrap(), sk, rng).unwrap()
    }

    #[test]
    fn test_add_sub_neg() {
        let (sk, mut rng) = setup(42);
        let a = enc(50, &sk, &mut rng);
        let b = enc(20, &sk, &mut rng);
        assert_eq!(decode_scalar(&decrypt(&bfv_add(&a, &b).unwrap(), &sk).unwrap()), 70);
        assert_eq!(decode_scalar(&decrypt(&bfv_sub(&a, &b).unwrap(), &sk).unwrap()), 30);
        assert_eq!(decode_scalar(&decrypt(&bfv_neg(&b), &sk).unwrap()), 512 - 20);
    }

    #[test]
    fn test_sum_and_scalar_mul() {
        let (sk, mut rng) = setup(5);
        let cts: Vec<_> = (1..=10).map(|v| enc(v, &sk, &mut rng)).collect();
        assert_eq!(decode_scalar(&decrypt(&bfv_sum(&cts).unwrap(), &sk).unwrap()), 55);
        assert_eq!(decode_scalar(&decrypt(&bfv_scalar_mul(&cts[2], -2), &sk).unwrap()), 512 - 6);
        assert!(bfv_sum(&[]).is_err());
    }

    #[test]
    fn test_plain_add_and_mul() {
        let (sk, mut rng) = setup(11);
        let params = sk.params.clone();
        let ct = encrypt_sk_with_rng(&encode_coeffs(&[3, 1], &params).unwrap(), &sk, &mut rng).unwrap();

        let added = bfv_plain_add(&ct, &encode_scalar(5, &params).unwrap()).unwrap();
        assert_eq!(decode_coeffs(&decrypt(&added, &sk).unwrap(), 2), vec![8, 1]);

        // (3 + X)(2 + X) = 6 + 5X + X^2
        let product = bfv_plain_mul(&ct, &encode_coeffs(&[2, 1], &params).unwrap()).unwrap();
        assert_eq!(decode_coeffs(&decrypt(&product, &sk).unwrap(), 3), vec![6, 5, 1]);
    }

    #[test]
    fn test_mul_and_relin() {
        let (sk, mut rng) = setup(1234);
        let rlk = gen_relin_key_with_rng(&sk, &mut rng).unwrap();
        for (a, b, expected) in [(3u64, 7u64, 21u64), (10, 20, 200), (0, 5, 0), (30, 30, 900 % 512)] {
            let product = bfv_mul_and_relin(&enc(a, &sk, &mut rng), &enc(b, &sk, &mut rng), &rlk).unwrap();
            assert_eq!(product.c.len(), 2);
            assert_eq!(decode_scalar(&decrypt(&product, &sk).unwrap()), expected);
        }
    }

    #[test]
    fn test_degree_two_decrypts_before_relin() {
        let (sk, mut rng) = setup(77);
        let product = bfv_mul_no_relin(&enc(6, &sk, &mut rng), &enc(7, &sk, &mut rng)).unwrap();
        assert_eq!(product.degree(), 2);
        assert_eq!(decode_scalar(&decrypt(&product, &sk).unwrap()), 42);
    }

    #[test]
    fn test_packed_product_with_public_key() {
        let (sk, mut rng) = setup(8);
        let params = sk.params.clone();
        let pk = gen_public_key_with_rng(&sk, &mut rng).unwrap();
        let rlk = gen_relin_key_with_rng(&sk, &mut rng).unwrap();
        let a = encrypt_pk_with_rng(&encode_coeffs(&[1, 1], &params).unwrap(), &pk, &mut rng).unwrap();
        let b = encrypt_pk_with_rng(&encode_coeffs(&[1, 0, 1], &params).unwrap(), &pk, &mut rng).unwrap();
        // (1 + X)(1 + X^2) = 1 + X + X^2 + X^3
        let product = bfv_mul_and_relin(&a, &b, &rlk).unwrap();
        assert_eq!(decode_coeffs(&decrypt(&product, &sk).unwrap(), 4), vec![1, 1, 1, 1]);
        assert!(noise_budget(&product, &sk).unwrap() > 0);
    }

    #[test]
    fn test_reversal_automorphism() {
        let (sk, mut rng) = setup(42);
        let params = sk.params.clone();
        let n = params.ring_degree;
        let gk = gen_galois_key_with_rng(&sk, 2 * n - 1, &mut rng).unwrap();

        // 1 + 2X -> 1 + 2X^{-1} = 1 - 2X^{n-1}
        let ct = encrypt_sk_with_rng(&encode_coeffs(&[1, 2], &params).unwrap(), &sk, &mut rng).unwrap();
        let decrypted = decrypt(&bfv_apply_automorphism(&ct, &gk).unwrap(), &sk).unwrap();
        assert_eq!(decrypted.coeffs[0], 1);
        assert_eq!(decrypted.coeffs[1], 0);
        assert_eq!(decrypted.coeffs[n - 1], 512 - 2);
    }

    #[test]
    fn test_foreign_params_rejected() {
        let (sk, mut rng) = setup(1);
        let other = params_with(128, 512);
        let other_sk = gen_secret_key_with_rng(&other, &mut rng).unwrap();
        let a = enc(1, &sk, &mut rng);
        let b = enc(1, &other_sk, &mut rng);
        assert!(matches!(bfv_add(&a, &b), Err(BlindMatchError::DimensionMismatch { .. })));
    }
}
