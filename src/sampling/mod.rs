pub mod gaussian;
pub mod uniform;

pub use gaussian::DiscreteGaussian;
pub use uniform::{sample_binary, sample_ternary, sample_uniform_poly};
