use primality_test::is_prime;

use crate::error::{BlindMatchError, Result};

/// Walks downward from 2^bits through candidates q ≡ 1 (mod 2n), yielding
/// primes of exactly `bits` bits.
pub struct NttPrimeGenerator {
    next: u64,
    step: u64,
    floor: u64,
}

impl NttPrimeGenerator {
    pub fn new(bits: u32, ring_degree: usize) -> Result<Self> {
        let step = 2 * ring_degree as u64;
        if !(2..=62).contains(&bits) || step.trailing_zeros() >= bits {
            return Err(BlindMatchError::Parameter(format!(
                "no NTT-friendly primes of {bits} bits for ring degree {ring_degree}"
            )));
        }
        Ok(Self {
            next: (1u64 << bits) + 1 - step,
            step,
            floor: 1u64 << (bits - 1),
        })
    }

    pub fn take(&mut self, count: usize) -> Result<Vec<u64>> {
        let mut primes = Vec::with_capacity(count);
        while primes.len() < count {
            primes.push(self.next_prime().ok_or_else(|| {
                BlindMatchError::Parameter("ran out of NTT-friendly primes".into())
            })?);
        }
        Ok(primes)
    }

    fn next_prime(&mut self) -> Option<u64> {
        while self.next > self.floor {
            let candidate = self.next;
            self.next -= self.step;
            if is_prime(candidate) {
                return Some(candidate);
            }
        }
        None
    }
}
