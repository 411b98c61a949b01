//! # blindmatch: encrypted string equality
//!
//! Two strings are compared for exact equality without decrypting either of
//! them. Strings are encoded as fixed-width bit vectors, encrypted under a
//! leveled BFV scheme, and their Hamming distance is evaluated on
//! ciphertexts. Only that distance is ever decrypted; equality is
//! `distance == 0`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use blindmatch::prelude::*;
//!
//! let matcher = EncryptedStringMatcher::new(MatcherConfig::default())?;
//!
//! let a = matcher.encrypt_string("hello world")?;
//! let b = matcher.encrypt_string("hello world")?;
//! let c = matcher.encrypt_string("bye world")?;
//!
//! assert!(matcher.are_strings_equal(&a, &b)?);
//! assert!(!matcher.are_strings_equal(&a, &c)?);
//! assert_eq!(matcher.decrypt_string(&a)?, "hello world");
//! # Ok::<(), blindmatch::error::BlindMatchError>(())
//! ```
//!
//! ## Layers
//!
//! - [`encoding`]: strings <-> [`encoding::BinaryVector`]
//! - [`context`]: parameters, keys, encryption and checked decryption
//! - [`algebra`]: the homomorphic Hamming distance
//! - [`matcher`]: the equality decision
//!
//! underneath which [`ring`], [`sampling`], [`params`] and [`bfv`] implement
//! the encryption scheme itself.

pub mod algebra;
pub mod bfv;
pub mod context;
pub mod encoding;
pub mod error;
pub mod matcher;
pub mod params;
pub mod ring;
pub mod sampling;

/// Convenient re-exports for common types and functions.
pub mod prelude {
    pub use crate::algebra::{hamming_distance, EncryptedScalar, EncryptedVector};
    pub use crate::context::{CryptoContext, MatcherConfig};
    pub use crate::encoding::{binary_vector_to_string, string_to_binary_vector, BinaryVector, DEFAULT_CHAR_LENGTH};
    pub use crate::error::{BlindMatchError, ContextId, DecryptionError, EncodingError, Result};
    pub use crate::matcher::EncryptedStringMatcher;
    pub use crate::params::SecurityLevel;
}
