use rand::Rng;

use crate::ring::modular::Modulus;
use crate::ring::poly::CoeffPoly;

/// Uniform coefficients in [0, q), by rejection on the smallest covering mask.
pub fn sample_uniform_poly<R: Rng + ?Sized>(n: usize, modulus: Modulus, rng: &mut R) -> CoeffPoly {
    let q = modulus.value();
    let mask = u64::MAX >> (q - 1).leading_zeros();
    let coeffs = (0..n)
        .map(|_| loop {
            let v = rng.random::<u64>() & mask;
            if v < q {
                break v;
            }
        })
        .collect();
    CoeffPoly { coeffs, modulus }
}

/// Coefficients uniform over {-1, 0, 1}.
pub fn sample_ternary<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<i64> {
    (0..n)
        .map(|_| loop {
            let r = rng.random::<u8>() & 0x03;
            if r < 3 {
                break r as i64 - 1;
            }
        })
        .collect()
}

/// Coefficients uniform over {0, 1}.
pub fn sample_binary<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<i64> {
    (0..n).map(|_| (rng.random::<u8>() & 1) as i64).collect()
}
