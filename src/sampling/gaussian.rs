use rand::Rng;

/// Discrete Gaussian over Z centered at 0, truncated at ±⌈6σ⌉.
///
/// The cumulative table is built once; every draw scans the whole table with
/// mask selects, so the scan length does not depend on the sample.
#[derive(Clone, Debug)]
pub struct DiscreteGaussian {
    sigma: f64,
    tail: i64,
    cdf: Vec<f64>,
}

impl DiscreteGaussian {
    pub fn new(sigma: f64) -> Self {
        let tail = (6.0 * sigma).ceil() as i64;
        let two_sigma_sq = 2.0 * sigma * sigma;
        let mut cumulative = 0.0f64;
        let mut cdf: Vec<f64> = (-tail..=tail)
            .map(|x| {
                cumulative += (-((x * x) as f64) / two_sigma_sq).exp();
                cumulative
            })
            .collect();
        for c in cdf.iter_mut() {
            *c /= cumulative;
        }
        Self { sigma, tail, cdf }
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn tail(&self) -> i64 {
        self.tail
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> i64 {
        let u: f64 = rng.random::<f64>();
        // smallest index i with u < cdf[i]
        let mut result = self.tail;
        for (i, &c) in self.cdf.iter().enumerate().rev() {
            let mask = ((u < c) as i64).wrapping_neg();
            let candidate = -self.tail + i as i64;
            result = (candidate & mask) | (result & !mask);
        }
        result
    }

    pub fn sample_vec<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<i64> {
        (0..n).map(|_| self.sample(rng)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_gaussian_moments() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let dist = DiscreteGaussian::new(3.2);
        let samples = dist.sample_vec(10_000, &mut rng);

        let n = samples.len() as f64;
        let mean: f64 = samples.iter().map(|&x| x as f64).sum::<f64>() / n;
        assert!(mean.abs() < 0.5, "mean = {mean}");

        let var: f64 = samples.iter().map(|&x| (x as f64 - mean).powi(2)).sum::<f64>() / n;
        assert!((var - 3.2 * 3.2).abs() < 2.0, "var = {var}");

        assert!(samples.iter().all(|s| s.abs() <= dist.tail()));
    }

    #[test]
    fn test_table_is_normalized() {
        let dist = DiscreteGaussian::new(3.2);
        assert_eq!(dist.cdf.len() as i64, 2 * dist.tail() + 1);
        assert!((dist.cdf.last().unwrap() - 1.0).abs() < 1e-12);
    }
}
