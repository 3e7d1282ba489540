//! # pkeytools
//!
//! Core conversion traits shared by the pkeytools crates.
//!
//! Key material moves between three representations:
//! ```text
//! PEM text → Pem block → DER bytes → KeyMaterial
//! ```
//!
//! Each step to the right is a `Decoder` implementation and each step to
//! the left an `Encoder` implementation. The marker traits
//! (`DecodableFrom` and `EncodableTo`) restrict the pairs of types that
//! may be converted, so a `Pem` can be decoded into a key but a key cannot
//! be "decoded" into an unrelated type by accident.
//!
//! ## Example
//!
//! ```ignore
//! use pkeytools::decoder::Decoder;
//! use pkeytools::encoder::Encoder;
//! use pem::Pem;
//! use pkey::KeyMaterial;
//!
//! let pem: Pem = pem_text.parse()?;
//! let key: KeyMaterial = pem.decode()?;
//! let again: Pem = key.encode()?;
//! ```

#![forbid(unsafe_code)]

pub mod decoder;
pub mod encoder;
