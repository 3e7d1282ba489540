//! Read-only view of the public half of a [`KeyMaterial`](crate::KeyMaterial).

use std::fmt;

use num_bigint::BigUint;
use pem::{Label, Pem, ToPem};
use rsa::RsaPublicKey;
use rsa::pkcs1::EncodeRsaPublicKey;
use rsa::pkcs8::EncodePublicKey;
use rsa::traits::PublicKeyParts;

use crate::error::{Error, Result};

/*
RFC 5280 - SubjectPublicKeyInfo

SubjectPublicKeyInfo ::= SEQUENCE {
    algorithm         AlgorithmIdentifier,
    subjectPublicKey  BIT STRING
}

RFC 8017 - RSAPublicKey

RSAPublicKey ::= SEQUENCE {
    modulus           INTEGER,  -- n
    publicExponent    INTEGER   -- e
}
*/

/// Borrowed view of an RSA public key (modulus and public exponent).
#[derive(Clone, Copy)]
pub struct PublicKey<'a> {
    inner: &'a RsaPublicKey,
}

impl<'a> PublicKey<'a> {
    pub(crate) fn new(inner: &'a RsaPublicKey) -> Self {
        PublicKey { inner }
    }

    /// The modulus `n`.
    pub fn modulus(&self) -> BigUint {
        BigUint::from_bytes_be(&self.inner.n().to_bytes_be())
    }

    /// The public exponent `e`.
    pub fn public_exponent(&self) -> BigUint {
        BigUint::from_bytes_be(&self.inner.e().to_bytes_be())
    }

    /// Modulus bit length.
    pub fn bits(&self) -> usize {
        self.inner.n().bits()
    }

    /// SubjectPublicKeyInfo DER.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_public_key_der()
            .map(|doc| doc.as_bytes().to_vec())
            .map_err(|e| Error::Encode {
                format: "SubjectPublicKeyInfo",
                reason: e.to_string(),
            })
    }

    /// PKCS#1 RSAPublicKey DER.
    pub fn to_pkcs1_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_pkcs1_der()
            .map(|doc| doc.as_bytes().to_vec())
            .map_err(|e| Error::Encode {
                format: "PKCS#1 RSAPublicKey",
                reason: e.to_string(),
            })
    }

    /// PKCS#1 RSAPublicKey wrapped in an `RSA PUBLIC KEY` block.
    pub fn to_pkcs1_pem(&self) -> Result<Pem> {
        Ok(Pem::from_bytes(Label::RSAPublicKey, &self.to_pkcs1_der()?))
    }
}

impl ToPem for PublicKey<'_> {
    type Error = Error;

    fn pem_label(&self) -> Label {
        Label::PublicKey
    }

    /// SubjectPublicKeyInfo wrapped in a `PUBLIC KEY` block.
    fn to_pem(&self) -> Result<Pem> {
        Ok(Pem::from_bytes(self.pem_label(), &self.to_der()?))
    }
}

impl PartialEq for PublicKey<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl Eq for PublicKey<'_> {}

impl fmt::Debug for PublicKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modulus = format!("{:x}", self.modulus());
        write!(
            f,
            "PublicKey {{ bits: {}, e: {}, n: {}.. }}",
            self.bits(),
            self.public_exponent(),
            &modulus[..modulus.len().min(16)]
        )
    }
}
