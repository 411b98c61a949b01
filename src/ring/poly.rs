use zeroize::Zeroize;

use crate::error::{BlindMatchError, Result};
use crate::ring::modular::Modulus;

/// Polynomial in coefficient representation over Z_q[X]/(X^n + 1).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoeffPoly {
    pub coeffs: Vec<u64>,
    pub modulus: Modulus,
}

impl CoeffPoly {
    pub fn zero(n: usize, modulus: Modulus) -> Self {
        Self { coeffs: vec![0u64; n], modulus }
    }

    /// Build from raw values, reducing each one mod q.
    pub fn from_coeffs(mut coeffs: Vec<u64>, modulus: Modulus) -> Self {
        let q = modulus.value();
        for c in coeffs.iter_mut() {
            *c %= q;
        }
        Self { coeffs, modulus }
    }

    /// Build from signed values (small noise, ternary keys, centered plaintexts).
    pub fn from_signed(values: &[i64], modulus: Modulus) -> Self {
        let coeffs = values.iter().map(|&v| modulus.lift(v as i128)).collect();
        Self { coeffs, modulus }
    }

    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
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

    pub fn add(&self, other: &Self) -> Result<Self> {
        self.check_compatible(other)?;
        let m = self.modulus;
        let coeffs = self.coeffs.iter().zip(&other.coeffs).map(|(&a, &b)| m.add(a, b)).collect();
        Ok(Self { coeffs, modulus: m })
    }

    pub fn sub(&self, other: &Self) -> Result<Self> {
        self.check_compatible(other)?;
        let m = self.modulus;
        let coeffs = self.coeffs.iter().zip(&other.coeffs).map(|(&a, &b)| m.sub(a, b)).collect();
        Ok(Self { coeffs, modulus: m })
    }

    pub fn neg(&self) -> Self {
        let m = self.modulus;
        Self { coeffs: self.coeffs.iter().map(|&a| m.neg(a)).collect(), modulus: m }
    }

    /// Schoolbook negacyclic product.
    #[cfg(test)]
    pub fn mul_naive(&self, other: &Self) -> Result<Self> {
        self.check_compatible(other)?;
        let n = self.len();
        let m = self.modulus;
        let mut result = vec![0u64; n];
        for (i, &a) in self.coeffs.iter().enumerate().filter(|&(_, &a)| a != 0) {
            for (j, &b) in other.coeffs.iter().enumerate().filter(|&(_, &b)| b != 0) {
                let prod = m.mul(a, b);
                let idx = i + j;
                if idx < n {
                    result[idx] = m.add(result[idx], prod);
                } else {
                    // X^n = -1
                    result[idx - n] = m.sub(result[idx - n], prod);
                }
            }
        }
        Ok(Self { coeffs: result, modulus: m })
    }

    pub fn scalar_mul(&self, scalar: u64) -> Self {
        let m = self.modulus;
        let s = scalar % m.value();
        Self { coeffs: self.coeffs.iter().map(|&c| m.mul(c, s)).collect(), modulus: m }
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.iter().all(|&c| c == 0)
    }

    /// Coefficients mapped to `(-q/2, q/2]`.
    pub fn centered_coeffs(&self) -> Vec<i128> {
        self.coeffs.iter().map(|&c| self.modulus.center(c)).collect()
    }

    /// Same polynomial, coefficients reinterpreted (centered) under another modulus.
    pub fn switch_modulus_centered(&self, target: Modulus) -> Self {
        let coeffs = self.coeffs.iter().map(|&c| target.lift(self.modulus.center(c))).collect();
        Self { coeffs, modulus: target }
    }

    /// The automorphism X -> X^k. For odd k this is a signed permutation of
    /// the coefficients, since X^n = -1.
    pub fn automorphism(&self, k: usize) -> Self {
        let n = self.len();
        let m = self.modulus;
        let mut result = vec![0u64; n];
        for (i, &c) in self.coeffs.iter().enumerate().filter(|&(_, &c)| c != 0) {
            let exp = (i * k) % (2 * n);
            if exp < n {
                result[exp] = m.add(result[exp], c);
            } else {
                result[exp - n] = m.sub(result[exp - n], c);
            }
        }
        Self { coeffs: result, modulus: m }
    }
}

impl Zeroize for CoeffPoly {
    fn zeroize(&mut self) {
        self.coeffs.zeroize();
    }
}
