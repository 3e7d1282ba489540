//! Decoder trait for type-safe conversions.
//!
//! `Decoder<T, D>` converts a source `T` into a destination `D`. The
//! destination must opt in through `DecodableFrom<T>`, which keeps the set
//! of legal conversions explicit:
//!
//! ```no_run
//! use pkeytools::decoder::{DecodableFrom, Decoder};
//!
//! struct Armored(String);
//! struct Body(Vec<u8>);
//!
//! #[derive(Debug)]
//! struct BadArmor;
//!
//! impl DecodableFrom<Armored> for Body {}
//!
//! impl Decoder<Armored, Body> for Armored {
//!     type Error = BadArmor;
//!
//!     fn decode(&self) -> Result<Body, Self::Error> {
//!         Ok(Body(self.0.as_bytes().to_vec()))
//!     }
//! }
//! ```

/// Converts `self` (of type `T`) into `D`.
///
/// Implemented on the source type; `D` must implement
/// [`DecodableFrom<T>`].
pub trait Decoder<T, D: DecodableFrom<T>> {
    /// The error type returned when decoding fails.
    type Error;

    /// Decodes `self` into type `D`.
    ///
    /// # Errors
    ///
    /// Returns an error if the conversion fails. The specific error
    /// conditions depend on the implementing type.
    fn decode(&self) -> Result<D, Self::Error>;
}

/// Marker trait indicating that type `D` can be decoded from type `T`.
pub trait DecodableFrom<T> {}
