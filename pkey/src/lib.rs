//! # pkey
//!
//! RSA key material for TLS and license certificates.
//!
//! - [`KeyMaterial`] imports a PEM private key or generates a new one,
//!   reports its algorithm, size and matching [`SignatureAlgorithm`], and
//!   exports PEM.
//! - [`KeyPair`] is the algorithm-neutral view certificate builders use.
//! - [`Settings`] carries the constants those builders share.
//!
//! Only RSA keys are accepted. EC and EdDSA keys are recognized so that
//! the import error can name them.

#![forbid(unsafe_code)]

pub mod algorithm;
pub mod config;
pub mod error;
mod key_material;
mod key_pair;
mod public_key;

pub use algorithm::{KeyAlgorithm, SignatureAlgorithm};
pub use config::Settings;
pub use error::{Error, ParseError, Result};
pub use key_material::{DEFAULT_KEY_BITS, KeyMaterial, MAX_KEY_BITS, MIN_KEY_BITS};
pub use key_pair::KeyPair;
pub use public_key::PublicKey;
