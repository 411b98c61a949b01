use crate::bfv::keygen::{KeySwitchKey, RelinKey};
use crate::bfv::{check_same_params, BfvCiphertext};
use crate::error::{BlindMatchError, Result};
use crate::params::BfvParams;
use crate::ring::ntt::NttPoly;
use crate::ring::poly::CoeffPoly;

/// Balanced gadget decomposition: c = Σ d_i·B^i (mod q) with
/// d_i ∈ [-B/2, B/2) for every digit but the last, which absorbs the carry.
/// Digits are returned mod q.
pub fn gadget_decompose(poly: &CoeffPoly, base: u64, num_digits: usize) -> Vec<CoeffPoly> {
    let q = poly.modulus;
    let base = base as i128;
    let half_base = base / 2;
    let mut digits = vec![vec![0u64; poly.len()]; num_digits];

    for (pos, &c) in poly.coeffs.iter().enumerate() {
        let mut remaining = q.center(c);
        for (d, digit) in digits.iter_mut().enumerate() {
            let value = if d + 1 == num_digits {
                remaining
            } else {
                let mut rem = remaining.rem_euclid(base);
                if rem >= half_base {
                    rem -= base;
                }
                remaining = (remaining - rem) / base;
                rem
            };
            digit[pos] = q.lift(value);
        }
    }

    digits.into_iter().map(|coeffs| CoeffPoly { coeffs, modulus: q }).collect()
}

/// Σ_i decomp_i(c)·(k0_i, k1_i): re-encrypts `c·w` under s, where `w` is the
/// polynomial the key was generated for.
pub fn key_switch(c: &CoeffPoly, ksk: &KeySwitchKey, params: &BfvParams) -> Result<(NttPoly, NttPoly)> {
    if ksk.keys.len() != params.gadget_digits {
        return Err(BlindMatchError::DimensionMismatch { expected: params.gadget_digits, got: ksk.keys.len() });
    }
    let mut acc0 = NttPoly::zero(params.ct_modulus, params.ct_plan.clone());
    let mut acc1 = NttPoly::zero(params.ct_modulus, params.ct_plan.clone());
    for (digit, (k0, k1)) in gadget_decompose(c, params.gadget_base, params.gadget_digits).iter().zip(&ksk.keys) {
        let digit = NttPoly::from_coeff_poly(digit, params.ct_plan.clone())?;
        acc0.fma_assign(&digit, k0)?;
        acc1.fma_assign(&digit, k1)?;
    }
    Ok((acc0, acc1))
}

/// (c0, c1, c2) -> (c0 + Σ d_i·rlk0_i, c1 + Σ d_i·rlk1_i).
pub fn relinearize(ct: &BfvCiphertext, rlk: &RelinKey) -> Result<BfvCiphertext> {
    match ct.c.len() {
        2 => return Ok(ct.clone()),
        3 => {}
        _ => {
            return Err(BlindMatchError::Parameter(format!(
                "relinearization needs a degree-2 ciphertext, got degree {}",
                ct.degree()
            )))
        }
    }
    check_same_params(&ct.params, &rlk.params)?;
    let params = &ct.params;

    let (k0, k1) = key_switch(&ct.c[2].to_coeff_poly(), &rlk.ksk, params)?;
    Ok(BfvCiphertext {
        c: vec![ct.c[0].add(&k0)?, ct.c[1].add(&k1)?],
        params: params.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::modular::Modulus;

    fn recompose(digits: &[CoeffPoly], base: u64, pos: usize) -> u64 {
        let q = digits[0].modulus;
        let mut acc = 0u64;
        let mut power = 1u64;
        for d in digits {
            acc = q.add(acc, q.mul(d.coeffs[pos], power));
            power = q.mul(power, base);
        }
        acc
    }

    #[test]
    fn test_gadget_decompose_balanced() {
        // 42 = -6 + 3·16
        let q = Modulus::new(65537).unwrap();
        let digits = gadget_decompose(&CoeffPoly::from_coeffs(vec![42], q), 16, 2);
        assert_eq!(digits[0].coeffs[0], 65537 - 6);
        assert_eq!(digits[1].coeffs[0], 3);
    }

    #[test]
    fn test_gadget_decompose_reconstructs() {
        let q = Modulus::new(65537).unwrap();
        let poly = CoeffPoly::from_coeffs(vec![12345, 54321, 100, 0, 32768, 32769, 65536], q);
        let digits = gadget_decompose(&poly, 16, 4);
        for pos in 0..poly.len() {
            assert_eq!(recompose(&digits, 16, pos), poly.coeffs[pos], "position {pos}");
        }
    }

    #[test]
    fn test_last_digit_absorbs_carry() {
        // q/2 needs a carry past the balanced range of 15 base-16 digits
        let q = Modulus::new(1152921504606830593).unwrap();
        let half = q.value() / 2;
        let poly = CoeffPoly::from_coeffs(vec![half, half + 1, 1 << 59], q);
        let digits = gadget_decompose(&poly, 16, 15);
        for pos in 0..poly.len() {
            assert_eq!(recompose(&digits, 16, pos), poly.coeffs[pos]);
        }
        for d in &digits[..14] {
            assert!(d.centered_coeffs().iter().all(|c| (-8..8).contains(c)));
        }
    }
}
