//! Encoder trait, the reverse direction of [`Decoder`](crate::decoder::Decoder).

/// Converts `self` (of type `T`) into `E`.
///
/// `E` must implement [`EncodableTo<T>`].
pub trait Encoder<T, E: EncodableTo<T>> {
    /// The error type returned when encoding fails.
    type Error;

    /// Encodes `self` into type `E`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be represented as `E`.
    fn encode(&self) -> Result<E, Self::Error>;
}

/// Marker trait indicating that type `E` can be produced from type `T`.
pub trait EncodableTo<T> {}
