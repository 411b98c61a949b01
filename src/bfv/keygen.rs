use std::fmt;
use std::sync::Arc;

use log::debug;
use rand::{CryptoRng, Rng};
use zeroize::{Zeroize, Zeroizing};

use crate::bfv::small_to_ntt;
use crate::error::{BlindMatchError, Result};
use crate::params::BfvParams;
use crate::ring::ntt::NttPoly;
use crate::ring::poly::CoeffPoly;
use crate::sampling::{sample_ternary, sample_uniform_poly, DiscreteGaussian};

/// BFV secret key: ternary s, kept both as coefficients (for automorphisms)
/// and in NTT form.
pub struct SecretKey {
    coeffs: Vec<i64>,
    pub(crate) poly: NttPoly,
    pub params: Arc<BfvParams>,
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.coeffs.zeroize();
        self.poly.zeroize();
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey").field("ring_degree", &self.params.ring_degree).finish_non_exhaustive()
    }
}

/// pk = (-(a·s + e), a).
#[derive(Clone, Debug)]
pub struct PublicKey {
    pub pk0: NttPoly,
    pub pk1: NttPoly,
    pub params: Arc<BfvParams>,
}

/// Gadget encryptions of some key-dependent polynomial w under s:
/// `keys[i] = (-(a_i·s) + e_i + B^i·w, a_i)`.
#[derive(Clone, Debug)]
pub struct KeySwitchKey {
    pub keys: Vec<(NttPoly, NttPoly)>,
}

/// Key switching from s² to s.
#[derive(Clone, Debug)]
pub struct RelinKey {
    pub ksk: KeySwitchKey,
    pub params: Arc<BfvParams>,
}

/// Key switching from s(X^k) to s(X), for the automorphism X -> X^k.
#[derive(Clone, Debug)]
pub struct GaloisKey {
    pub ksk: KeySwitchKey,
    pub element: usize,
    pub params: Arc<BfvParams>,
}

pub fn gen_secret_key_with_rng<R: Rng + CryptoRng>(params: &Arc<BfvParams>, rng: &mut R) -> Result<SecretKey> {
    let coeffs = sample_ternary(params.ring_degree, rng);
    let poly = small_to_ntt(&coeffs, params)?;
    debug!("generated secret key for n={}", params.ring_degree);
    Ok(SecretKey { coeffs, poly, params: params.clone() })
}

pub fn gen_public_key_with_rng<R: Rng + CryptoRng>(sk: &SecretKey, rng: &mut R) -> Result<PublicKey> {
    let params = &sk.params;
    let (b, a) = rlwe_sample(sk, rng)?;
    Ok(PublicKey { pk0: b, pk1: a, params: params.clone() })
}

pub fn gen_relin_key_with_rng<R: Rng + CryptoRng>(sk: &SecretKey, rng: &mut R) -> Result<RelinKey> {
    let s_sq = Zeroizing::new(sk.poly.mul(&sk.poly)?);
    let ksk = gen_key_switch_key(sk, &s_sq, rng)?;
    debug!("generated relinearization key with {} digits", ksk.keys.len());
    Ok(RelinKey { ksk, params: sk.params.clone() })
}

pub fn gen_galois_key_with_rng<R: Rng + CryptoRng>(
    sk: &SecretKey,
    element: usize,
    rng: &mut R,
) -> Result<GaloisKey> {
    let params = &sk.params;
    if element % 2 == 0 {
        return Err(BlindMatchError::Parameter(format!(
            "Galois element must be odd, got {element}"
        )));
    }
    let s = Zeroizing::new(CoeffPoly::from_signed(&sk.coeffs, params.ct_modulus));
    let s_rot = Zeroizing::new(s.automorphism(element));
    let s_auto = Zeroizing::new(NttPoly::from_coeff_poly(&s_rot, params.ct_plan.clone())?);
    let ksk = gen_key_switch_key(sk, &s_auto, rng)?;
    debug!("generated Galois key for X -> X^{element}");
    Ok(GaloisKey { ksk, element, params: params.clone() })
}

/// (-(a·s + e), a) with uniform a and Gaussian e.
fn rlwe_sample<R: Rng + CryptoRng>(sk: &SecretKey, rng: &mut R) -> Result<(NttPoly, NttPoly)> {
    let params = &sk.params;
    let n = params.ring_degree;
    let gaussian = DiscreteGaussian::new(params.sigma);

    let a = NttPoly::from_coeff_poly(&sample_uniform_poly(n, params.ct_modulus, rng), params.ct_plan.clone())?;
    let e = small_to_ntt(&gaussian.sample_vec(n, rng), params)?;
    let b = a.mul(&sk.poly)?.add(&e)?.neg();
    Ok((b, a))
}

fn gen_key_switch_key<R: Rng + CryptoRng>(sk: &SecretKey, target: &NttPoly, rng: &mut R) -> Result<KeySwitchKey> {
    let params = &sk.params;
    let mut keys = Vec::with_capacity(params.gadget_digits);
    let mut scaled = Zeroizing::new(target.clone());
    for i in 0..params.gadget_digits {
        let (b, a) = rlwe_sample(sk, rng)?;
        keys.push((b.add(&scaled)?, a));
        if i + 1 < params.gadget_digits {
            scaled = Zeroizing::new(scaled.scalar_mul(params.gadget_base));
        }
    }
    Ok(KeySwitchKey { keys })
}
