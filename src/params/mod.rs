pub mod security;
pub mod select;

use std::sync::Arc;

use concrete_ntt::prime64::Plan;

use crate::error::{BlindMatchError, Result};
use crate::ring::modular::Modulus;
use crate::ring::ntt::make_plan;
use crate::ring::rns::RnsBasis;

pub use security::SecurityLevel;
pub use select::{select_parameters, ParameterChoice};

/// Parameters of the BFV scheme: R_q = Z_q[X]/(X^n+1) with a single NTT
/// prime q and plaintext space R_t.
#[derive(Clone, Debug)]
pub struct BfvParams {
    /// Ring degree n (power of 2).
    pub ring_degree: usize,
    /// Plaintext modulus t.
    pub plain_modulus: Modulus,
    /// Ciphertext modulus q (prime, ≡ 1 mod 2n).
    pub ct_modulus: Modulus,
    pub ct_plan: Arc<Plan>,
    /// Auxiliary basis P for exact tensoring; P > n·q.
    pub aux_basis: Arc<RnsBasis>,
    /// Gaussian noise standard deviation.
    pub sigma: f64,
    /// Gadget decomposition base for key switching.
    pub gadget_base: u64,
    pub gadget_digits: usize,
    /// Δ = ⌊q/t⌋.
    pub delta: u64,
}

impl BfvParams {
    /// log2 of the largest noise that still decrypts correctly (Δ/2).
    pub fn noise_ceiling_bits(&self) -> f64 {
        (self.delta as f64).log2() - 1.0
    }
}

pub struct BfvParamsBuilder {
    ring_degree: usize,
    plain_modulus: u64,
    ct_modulus: u64,
    aux_moduli: Vec<u64>,
    sigma: f64,
    gadget_base: u64,
}

impl Default for BfvParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BfvParamsBuilder {
    pub fn new() -> Self {
        Self {
            ring_degree: 4096,
            plain_modulus: 512,
            ct_modulus: 0,
            aux_moduli: Vec::new(),
            sigma: 3.2,
            gadget_base: 1 << 4,
        }
    }

    pub fn ring_degree(mut self, n: usize) -> Self {
        self.ring_degree = n;
        self
    }

    pub fn plain_modulus(mut self, t: u64) -> Self {
        self.plain_modulus = t;
        self
    }

    pub fn ct_modulus(mut self, q: u64) -> Self {
        self.ct_modulus = q;
        self
    }

    pub fn aux_moduli(mut self, moduli: Vec<u64>) -> Self {
        self.aux_moduli = moduli;
        self
    }

    pub fn sigma(mut self, sigma: f64) -> Self {
        self.sigma = sigma;
        self
    }

    pub fn gadget_base(mut self, base: u64) -> Self {
        self.gadget_base = base;
        self
    }

    pub fn build(self) -> Result<Arc<BfvParams>> {
        let n = self.ring_degree;
        if !n.is_power_of_two() || n < 16 {
            return Err(BlindMatchError::InvalidRingDegree(n));
        }
        if self.plain_modulus < 2 {
            return Err(BlindMatchError::Parameter("plaintext modulus must be >= 2".into()));
        }
        if self.ct_modulus <= self.plain_modulus {
            return Err(BlindMatchError::Parameter(format!(
                "ciphertext modulus {} must exceed plaintext modulus {}",
                self.ct_modulus, self.plain_modulus
            )));
        }
        if self.gadget_base < 2 {
            return Err(BlindMatchError::Parameter("gadget base must be >= 2".into()));
        }
        if !(self.sigma > 0.0) {
            return Err(BlindMatchError::Parameter(format!("sigma must be positive, got {}", self.sigma)));
        }

        let ct_modulus = Modulus::new(self.ct_modulus)?;
        let ct_plan = make_plan(n, self.ct_modulus)?;
        let aux_basis = RnsBasis::new(&self.aux_moduli, n)?;

        // Exact tensoring recovers m = (x - [x]_q)/q with |m| <= n·q/2.
        let aux_bits: u32 = aux_basis.moduli.iter().map(|m| m.bits() - 1).sum();
        let needed_bits = ct_modulus.bits() + n.trailing_zeros() + 1;
        if aux_bits < needed_bits {
            return Err(BlindMatchError::Parameter(format!(
                "auxiliary basis too small: P has >= {aux_bits} bits, need {needed_bits}"
            )));
        }
        if aux_basis.moduli.iter().any(|m| m.value() == self.ct_modulus) {
            return Err(BlindMatchError::Parameter("auxiliary primes must differ from q".into()));
        }

        let gadget_digits = gadget_digits(self.ct_modulus, self.gadget_base);

        Ok(Arc::new(BfvParams {
            ring_degree: n,
            plain_modulus: Modulus::new(self.plain_modulus)?,
            ct_modulus,
            ct_plan,
            aux_basis: Arc::new(aux_basis),
            sigma: self.sigma,
            gadget_base: self.gadget_base,
            gadget_digits,
            delta: self.ct_modulus / self.plain_modulus,
        }))
    }
}

/// Smallest d with base^d >= q.
fn gadget_digits(q: u64, base: u64) -> usize {
    let mut pow = 1u128;
    let mut digits = 0usize;
    while pow < q as u128 {
        pow *= base as u128;
        digits += 1;
    }
    digits.max(1)
}
