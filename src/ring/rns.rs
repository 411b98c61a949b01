use std::sync::Arc;

use concrete_ntt::prime64::Plan;

use crate::error::{BlindMatchError, Result};
use crate::ring::modular::Modulus;
use crate::ring::ntt::{make_plan, NttPoly};
use crate::ring::poly::CoeffPoly;

/// Auxiliary RNS basis P = ∏ p_j used to hold exact tensor products.
///
/// The product must stay below 2^126 so that centered CRT reconstruction fits
/// an i128.
#[derive(Clone, Debug)]
pub struct RnsBasis {
    pub moduli: Vec<Modulus>,
    pub plans: Vec<Arc<Plan>>,
    pub ring_degree: usize,
    /// Garner constants: inv[j] = (p_0 ⋯ p_{j-1})^{-1} mod p_j.
    garner_inv: Vec<u64>,
    product: i128,
}

/// Polynomial held as one NTT component per auxiliary prime.
#[derive(Clone, Debug)]
pub struct RnsPoly {
    pub components: Vec<NttPoly>,
}

impl RnsBasis {
    pub fn new(moduli: &[u64], ring_degree: usize) -> Result<Self> {
        if moduli.is_empty() {
            return Err(BlindMatchError::Parameter("auxiliary basis needs at least one prime".into()));
        }
        let log_product: u32 = moduli.iter().map(|&p| 64 - p.leading_zeros()).sum();
        if log_product > 126 {
            return Err(BlindMatchError::Parameter(format!(
                "auxiliary basis product has {log_product} bits, at most 126 supported"
            )));
        }

        let moduli = moduli.iter().map(|&p| Modulus::new(p)).collect::<Result<Vec<_>>>()?;
        let plans = moduli
            .iter()
            .map(|m| make_plan(ring_degree, m.value()))
            .collect::<Result<Vec<_>>>()?;

        let mut garner_inv = Vec::with_capacity(moduli.len());
        let mut product: i128 = 1;
        for m in &moduli {
            let partial = m.lift(product);
            let inv = m.inv(partial).ok_or_else(|| {
                BlindMatchError::Parameter("auxiliary moduli must be pairwise coprime".into())
            })?;
            garner_inv.push(inv);
            product *= m.value() as i128;
        }

        Ok(Self { moduli, plans, ring_degree, garner_inv, product })
    }

    pub fn num_moduli(&self) -> usize {
        self.moduli.len()
    }

    /// P as an integer.
    pub fn product(&self) -> i128 {
        self.product
    }

    /// Recover x ∈ (-P/2, P/2] from its residues (Garner's mixed radix).
    pub fn reconstruct_centered(&self, residues: &[u64]) -> i128 {
        let mut x: i128 = 0;
        let mut radix: i128 = 1;
        for ((m, &inv), &r) in self.moduli.iter().zip(&self.garner_inv).zip(residues) {
            let diff = m.sub(r, m.lift(x));
            let digit = m.mul(diff, inv);
            x += digit as i128 * radix;
            radix *= m.value() as i128;
        }
        if x > self.product / 2 { x - self.product } else { x }
    }
}

impl RnsPoly {
    /// Extend a polynomial mod q into the auxiliary basis, using the centered
    /// representative of each coefficient.
    pub fn extend_centered(poly: &CoeffPoly, basis: &RnsBasis) -> Result<Self> {
        if poly.len() != basis.ring_degree {
            return Err(BlindMatchError::DimensionMismatch { expected: basis.ring_degree, got: poly.len() });
        }
        let components = basis
            .moduli
            .iter()
            .zip(&basis.plans)
            .map(|(&m, plan)| NttPoly::from_coeff_poly(&poly.switch_modulus_centered(m), plan.clone()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { components })
    }

    fn zip_with(&self, other: &Self, f: impl Fn(&NttPoly, &NttPoly) -> Result<NttPoly>) -> Result<Self> {
        if self.components.len() != other.components.len() {
            return Err(BlindMatchError::DimensionMismatch {
                expected: self.components.len(),
                got: other.components.len(),
            });
        }
        let components = self
            .components
            .iter()
            .zip(&other.components)
            .map(|(a, b)| f(a, b))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { components })
    }

    pub fn add(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, NttPoly::add)
    }

    pub fn mul(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, NttPoly::mul)
    }

    /// Inverse-transform every component and reconstruct centered integer
    /// coefficients.
    #[cfg(test)]
    pub fn to_centered_integers(&self, basis: &RnsBasis) -> Vec<i128> {
        let residues: Vec<CoeffPoly> = self.components.iter().map(NttPoly::to_coeff_poly).collect();
        let mut scratch = vec![0u64; residues.len()];
        (0..basis.ring_degree)
            .map(|i| {
                for (slot, r) in scratch.iter_mut().zip(&residues) {
                    *slot = r.coeffs[i];
                }
                basis.reconstruct_centered(&scratch)
            })
            .collect()
    }
}
