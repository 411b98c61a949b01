pub mod modular;
pub mod ntt;
pub mod poly;
pub mod primes;
pub mod rns;

pub use modular::Modulus;
pub use ntt::NttPoly;
pub use poly::CoeffPoly;
pub use primes::NttPrimeGenerator;
pub use rns::{RnsBasis, RnsPoly};
