use std::sync::Arc;

use concrete_ntt::prime64::Plan;
use zeroize::Zeroize;

use crate::error::{BlindMatchError, Result};
use crate::ring::modular::Modulus;
use crate::ring::poly::CoeffPoly;

/// Polynomial in NTT (evaluation) representation over Z_q[X]/(X^n + 1).
///
/// Pointwise products here are negacyclic products in the coefficient domain.
/// The transform is `concrete-ntt`, which picks AVX2/AVX-512/NEON kernels at
/// runtime.
#[derive(Clone, Debug)]
pub struct NttPoly {
    pub evals: Vec<u64>,
    pub modulus: Modulus,
    pub plan: Arc<Plan>,
}

/// Build an NTT plan. `concrete-ntt` wants a prime q ≡ 1 (mod 2n) and n >= 16.
pub fn make_plan(n: usize, modulus: u64) -> Result<Arc<Plan>> {
    if !n.is_power_of_two() || n < 16 {
        return Err(BlindMatchError::InvalidRingDegree(n));
    }
    let plan = Plan::try_new(n, modulus).ok_or_else(|| {
        BlindMatchError::Parameter(format!(
            "cannot create NTT plan for n={n}, q={modulus} (need prime q ≡ 1 mod {})",
            2 * n
        ))
    })?;
    Ok(Arc::new(plan))
}

impl NttPoly {
    pub fn zero(modulus: Modulus, plan: Arc<Plan>) -> Self {
        Self { evals: vec![0u64; plan.ntt_size()], modulus, plan }
    }

    /// Forward transform.
    pub fn from_coeff_poly(poly: &CoeffPoly, plan: Arc<Plan>) -> Result<Self> {
        if poly.modulus.value() != plan.modulus() {
            return Err(BlindMatchError::ModulusMismatch);
        }
        if poly.len() != plan.ntt_size() {
            return Err(BlindMatchError::DimensionMismatch { expected: plan.ntt_size(), got: poly.len() });
        }
        let mut evals = poly.coeffs.clone();
        plan.fwd(&mut evals);
        Ok(Self { evals, modulus: poly.modulus, plan })
    }

    /// Inverse transform, including the 1/n normalization.
    pub fn to_coeff_poly(&self) -> CoeffPoly {
        let mut coeffs = self.evals.clone();
        self.plan.inv(&mut coeffs);
        self.plan.normalize(&mut coeffs);
        CoeffPoly { coeffs, modulus: self.modulus }
    }

    pub fn len(&self) -> usize {
        self.evals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evals.is_empty()
    }

    fn check_compatible(&self, other: &Self) -> Result<()> {
        if self.len() != other.len() {
            return Err(BlindMatchError::DimensionMismatch { expected: self.len(), got: other.len() });
        }
        if self.modulus != other.modulus {
            return Err(BlindMatchError::ModulusMismatch);
        }
        Ok(())
    }

    fn zip_with(&self, other: &Self, f: impl Fn(u64, u64) -> u64) -> Result<Self> {
        self.check_compatible(other)?;
        let evals = self.evals.iter().zip(&other.evals).map(|(&a, &b)| f(a, b)).collect();
        Ok(Self { evals, modulus: self.modulus, plan: self.plan.clone() })
    }

    pub fn add(&self, other: &Self) -> Result<Self> {
        let m = self.modulus;
        self.zip_with(other, |a, b| m.add(a, b))
    }

    pub fn sub(&self, other: &Self) -> Result<Self> {
        let m = self.modulus;
        self.zip_with(other, |a, b| m.sub(a, b))
    }

    pub fn mul(&self, other: &Self) -> Result<Self> {
        let m = self.modulus;
        self.zip_with(other, |a, b| m.mul(a, b))
    }

    /// `self += a * b`, the inner loop of key switching.
    pub fn fma_assign(&mut self, a: &Self, b: &Self) -> Result<()> {
        a.check_compatible(b)?;
        self.check_compatible(a)?;
        let m = self.modulus;
        for ((acc, &x), &y) in self.evals.iter_mut().zip(&a.evals).zip(&b.evals) {
            *acc = m.add(*acc, m.mul(x, y));
        }
        Ok(())
    }

    pub fn neg(&self) -> Self {
        let m = self.modulus;
        Self {
            evals: self.evals.iter().map(|&a| m.neg(a)).collect(),
            modulus: m,
            plan: self.plan.clone(),
        }
    }

    pub fn scalar_mul(&self, scalar: u64) -> Self {
        let m = self.modulus;
        let s = scalar % m.value();
        Self {
            evals: self.evals.iter().map(|&a| m.mul(a, s)).collect(),
            modulus: m,
            plan: self.plan.clone(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.evals.iter().all(|&e| e == 0)
    }
}

impl PartialEq for NttPoly {
    fn eq(&self, other: &Self) -> bool {
        self.modulus == other.modulus && self.evals == other.evals
    }
}

/// Wipes the evaluations.
impl Zeroize for NttPoly {
    fn zeroize(&mut self) {
        self.evals.zeroize();
    }
}
