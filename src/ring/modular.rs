use crate::error::{BlindMatchError, Result};

/// A word-sized modulus with its Barrett constant `floor(2^64 / q)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Modulus {
    value: u64,
    barrett_k: u64,
}

impl Modulus {
    pub fn new(value: u64) -> Result<Self> {
        if value < 2 {
            return Err(BlindMatchError::Parameter(format!("modulus must be >= 2, got {value}")));
        }
        Ok(Self {
            value,
            barrett_k: ((1u128 << 64) / value as u128) as u64,
        })
    }

    #[inline(always)]
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Number of significant bits of q.
    pub fn bits(&self) -> u32 {
        64 - self.value.leading_zeros()
    }

    /// Reduce a double-word value.
    ///
    /// The single-word Barrett trick is exact for q <= 2^32 and a < q^2;
    /// larger moduli go through u128 division.
    #[inline(always)]
    pub fn reduce_u128(&self, a: u128) -> u64 {
        let m = self.value;
        if m > (1u64 << 32) {
            (a % m as u128) as u64
        } else {
            let q_hat = ((a * self.barrett_k as u128) >> 64) as u64;
            let r = (a as u64).wrapping_sub(q_hat.wrapping_mul(m));
            if r >= m { r.wrapping_sub(m) } else { r }
        }
    }

    #[inline(always)]
    pub fn add(&self, a: u64, b: u64) -> u64 {
        let sum = a as u128 + b as u128;
        if sum >= self.value as u128 { (sum - self.value as u128) as u64 } else { sum as u64 }
    }

    #[inline(always)]
    pub fn sub(&self, a: u64, b: u64) -> u64 {
        if a >= b { a - b } else { self.value - b + a }
    }

    #[inline(always)]
    pub fn neg(&self, a: u64) -> u64 {
        if a == 0 { 0 } else { self.value - a }
    }

    #[inline(always)]
    pub fn mul(&self, a: u64, b: u64) -> u64 {
        self.reduce_u128(a as u128 * b as u128)
    }

    pub fn pow(&self, mut base: u64, mut exp: u64) -> u64 {
        let mut result = 1u64 % self.value;
        base %= self.value;
        while exp > 0 {
            if exp & 1 == 1 {
                result = self.mul(result, base);
            }
            exp >>= 1;
            base = self.mul(base, base);
        }
        result
    }

    /// Inverse via extended Euclid; `None` when `a` and q are not coprime.
    pub fn inv(&self, a: u64) -> Option<u64> {
        let m = self.value as i128;
        let (mut old_r, mut r) = ((a % self.value) as i128, m);
        let (mut old_s, mut s) = (1i128, 0i128);
        while r != 0 {
            let quot = old_r / r;
            (old_r, r) = (r, old_r - quot * r);
            (old_s, s) = (s, old_s - quot * s);
        }
        if old_r != 1 {
            return None;
        }
        Some(old_s.rem_euclid(m) as u64)
    }

    /// Representative of `a` in `(-q/2, q/2]`.
    #[inline(always)]
    pub fn center(&self, a: u64) -> i128 {
        if a > self.value / 2 { a as i128 - self.value as i128 } else { a as i128 }
    }

    /// Reduce a signed integer into `[0, q)`.
    #[inline(always)]
    pub fn lift(&self, x: i128) -> u64 {
        x.rem_euclid(self.value as i128) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduce_small_and_large() {
        let small = Modulus::new(65537).unwrap();
        assert_eq!(small.reduce_u128(123456789), (123456789u128 % 65537) as u64);
        assert_eq!(small.reduce_u128(65537), 0);

        let large = Modulus::new(1152921504606830593).unwrap();
        let a = u64::MAX as u128 * 3;
        assert_eq!(large.reduce_u128(a), (a % 1152921504606830593) as u64);
    }

    #[test]
    fn test_add_sub_neg() {
        let m = Modulus::new(65537).unwrap();
        assert_eq!(m.add(100, 200), 300);
        assert_eq!(m.add(65536, 2), 1);
        assert_eq!(m.sub(100, 200), 65537 - 100);
        assert_eq!(m.neg(0), 0);
        assert_eq!(m.add(100, m.neg(100)), 0);
    }

    #[test]
    fn test_pow_and_inv() {
        let m = Modulus::new(65537).unwrap();
        assert_eq!(m.pow(2, 10), 1024);
        assert_eq!(m.pow(3, 0), 1);
        let inv = m.inv(12345).unwrap();
        assert_eq!(m.mul(12345, inv), 1);
        assert!(Modulus::new(12).unwrap().inv(4).is_none());
    }

    #[test]
    fn test_center_and_lift() {
        let m = Modulus::new(17).unwrap();
        assert_eq!(m.center(16), -1);
        assert_eq!(m.center(8), 8);
        assert_eq!(m.center(9), -8);
        assert_eq!(m.lift(-1), 16);
        assert_eq!(m.lift(-35), 1);
        assert_eq!(m.bits(), 5);
    }

    #[test]
    fn test_rejects_trivial_modulus() {
        assert!(Modulus::new(1).is_err());
    }
}
