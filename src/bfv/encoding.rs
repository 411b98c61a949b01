use crate::error::{BlindMatchError, Result};
use crate::params::BfvParams;
use crate::ring::poly::CoeffPoly;

/// Constant polynomial m.
pub fn encode_scalar(m: u64, params: &BfvParams) -> Result<CoeffPoly> {
    encode_coeffs(&[m], params)
}

/// Read coefficient 0.
pub fn decode_scalar(poly: &CoeffPoly) -> u64 {
    poly.coeffs.first().copied().unwrap_or(0)
}

/// Coefficient packing: `values[i]` becomes the coefficient of X^i, the
/// remaining coefficients are zero.
pub fn encode_coeffs(values: &[u64], params: &BfvParams) -> Result<CoeffPoly> {
    if values.len() > params.ring_degree {
        return Err(BlindMatchError::DimensionMismatch { expected: params.ring_degree, got: values.len() });
    }
    let t = params.plain_modulus.value();
    if let Some(&v) = values.iter().find(|&&v| v >= t) {
        return Err(BlindMatchError::Parameter(format!("plaintext {v} >= plaintext modulus {t}")));
    }
    let mut coeffs = vec![0u64; params.ring_degree];
    coeffs[..values.len()].copy_from_slice(values);
    Ok(CoeffPoly { coeffs, modulus: params.plain_modulus })
}

/// First `count` coefficients.
pub fn decode_coeffs(poly: &CoeffPoly, count: usize) -> Vec<u64> {
    poly.coeffs.iter().take(count).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bfv::test_support::small_params;

    #[test]
    fn test_scalar() {
        let params = small_params();
        let pt = encode_scalar(42, &params).unwrap();
        assert_eq!(decode_scalar(&pt), 42);
        assert!(pt.coeffs[1..].iter().all(|&c| c == 0));
    }

    #[test]
    fn test_coeffs() {
        let params = small_params();
        let pt = encode_coeffs(&[1, 0, 1, 1], &params).unwrap();
        assert_eq!(pt.len(), params.ring_degree);
        assert_eq!(decode_coeffs(&pt, 4), vec![1, 0, 1, 1]);
    }

    #[test]
    fn test_rejects_out_of_range() {
        let params = small_params();
        assert!(encode_scalar(512, &params).is_err());
        let too_many = vec![0u64; params.ring_degree + 1];
        assert!(matches!(encode_coeffs(&too_many, &params), Err(BlindMatchError::DimensionMismatch { .. })));
    }
}
