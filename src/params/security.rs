use std::fmt;

use crate::error::BlindMatchError;

/// Classical security target for RLWE parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum SecurityLevel {
    #[default]
    Bits128,
    Bits192,
    Bits256,
}

/// Largest total log2(q) per ring degree for ternary secrets, from the
/// homomorphic encryption security standard (Albrecht et al., 2018).
/// Rows are n = 1024, 2048, ..., 32768.
const MAX_LOG_Q: [[u32; 6]; 3] = [
    [27, 54, 109, 218, 438, 881],
    [19, 37, 75, 152, 305, 611],
    [14, 29, 58, 118, 237, 476],
];

impl SecurityLevel {
    pub fn bits(self) -> u32 {
        match self {
            SecurityLevel::Bits128 => 128,
            SecurityLevel::Bits192 => 192,
            SecurityLevel::Bits256 => 256,
        }
    }

    /// Smallest ring degree considered at this level.
    pub fn min_ring_degree(self) -> usize {
        match self {
            SecurityLevel::Bits128 | SecurityLevel::Bits192 => 4096,
            SecurityLevel::Bits256 => 8192,
        }
    }

    /// Upper bound on log2(q) for ring degree `n`, `None` outside 1024..=32768.
    pub fn max_coeff_modulus_bits(self, n: usize) -> Option<u32> {
        if !n.is_power_of_two() || !(1024..=32768).contains(&n) {
            return None;
        }
        let col = (n.trailing_zeros() - 10) as usize;
        let row = match self {
            SecurityLevel::Bits128 => 0,
            SecurityLevel::Bits192 => 1,
            SecurityLevel::Bits256 => 2,
        };
        Some(MAX_LOG_Q[row][col])
    }
}

impl TryFrom<u32> for SecurityLevel {
    type Error = BlindMatchError;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        match bits {
            128 => Ok(SecurityLevel::Bits128),
            192 => Ok(SecurityLevel::Bits192),
            256 => Ok(SecurityLevel::Bits256),
            other => Err(BlindMatchError::Parameter(format!(
                "security level must be 128, 192 or 256 bits, got {other}"
            ))),
        }
    }
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_from() {
        assert_eq!(SecurityLevel::try_from(192).unwrap(), SecurityLevel::Bits192);
        assert!(SecurityLevel::try_from(100).is_err());
        assert_eq!(SecurityLevel::default().bits(), 128);
    }

    #[test]
    fn test_table_lookup() {
        assert_eq!(SecurityLevel::Bits128.max_coeff_modulus_bits(4096), Some(109));
        assert_eq!(SecurityLevel::Bits192.max_coeff_modulus_bits(32768), Some(611));
        assert_eq!(SecurityLevel::Bits256.max_coeff_modulus_bits(2048), Some(29));
        assert_eq!(SecurityLevel::Bits128.max_coeff_modulus_bits(512), None);
        assert_eq!(SecurityLevel::Bits128.max_coeff_modulus_bits(3000), None);
    }

    #[test]
    fn test_min_ring_degree() {
        assert_eq!(SecurityLevel::Bits192.min_ring_degree(), 4096);
        assert_eq!(SecurityLevel::Bits256.min_ring_degree(), 8192);
    }
}
