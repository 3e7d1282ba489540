use crate::algorithm::{KeyAlgorithm, SignatureAlgorithm};
use crate::error::Result;
use crate::key_material::KeyMaterial;

/// Algorithm-neutral key pair capability.
///
/// Certificate builders should depend on this trait rather than on
/// [`KeyMaterial`] so other key families can be added behind it.
///
/// ```no_run
/// use pkey::{KeyMaterial, KeyPair};
///
/// fn describe(key: &dyn KeyPair) -> String {
///     format!("{} {} ({})", key.algorithm(), key.size(), key.signature_algorithm())
/// }
///
/// let key = KeyMaterial::new(None).unwrap();
/// assert_eq!("RSA 2048 (sha256WithRSAEncryption)", describe(&key));
/// ```
pub trait KeyPair: Send + Sync {
    fn algorithm(&self) -> KeyAlgorithm;

    /// Key size in bits.
    fn size(&self) -> usize;

    fn signature_algorithm(&self) -> SignatureAlgorithm;

    /// Private key as PEM bytes.
    fn private_key_pem(&self) -> Result<Vec<u8>>;

    /// Public key as PEM bytes.
    fn public_key_pem(&self) -> Result<Vec<u8>>;
}

impl KeyPair for KeyMaterial {
    fn algorithm(&self) -> KeyAlgorithm {
        KeyMaterial::algorithm(self)
    }

    fn size(&self) -> usize {
        KeyMaterial::size(self)
    }

    fn signature_algorithm(&self) -> SignatureAlgorithm {
        KeyMaterial::signature_algorithm(self)
    }

    fn private_key_pem(&self) -> Result<Vec<u8>> {
        KeyMaterial::private_key_pem(self)
    }

    fn public_key_pem(&self) -> Result<Vec<u8>> {
        KeyMaterial::public_key_pem(self)
    }
}
