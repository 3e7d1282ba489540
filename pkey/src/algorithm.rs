//! Key families and the RSA signature algorithms matched to key strength.

use pkcs8::ObjectIdentifier;
use serde::{Deserialize, Serialize};

/// rsaEncryption (RFC 8017)
pub const OID_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
/// id-ecPublicKey (RFC 5480)
pub const OID_EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
/// id-Ed25519 (RFC 8410)
pub const OID_ED25519: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.112");
/// id-Ed448 (RFC 8410)
pub const OID_ED448: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.113");

pub const OID_SHA1_WITH_RSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.5");
pub const OID_SHA256_WITH_RSA: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.11");
pub const OID_SHA384_WITH_RSA: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.12");
pub const OID_SHA512_WITH_RSA: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.13");

/// Key algorithm family.
///
/// Only [`KeyAlgorithm::Rsa`] keys can be wrapped; the other variants exist
/// so an import can say which family it refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum KeyAlgorithm {
    /// RSA encryption
    Rsa,
    /// Elliptic Curve (ECDSA/ECDH)
    Ec,
    /// Ed25519 (EdDSA)
    Ed25519,
    /// Ed448 (EdDSA)
    Ed448,
    /// Unknown or unsupported algorithm
    Unknown,
}

impl KeyAlgorithm {
    /// Classifies a PKCS#8 `privateKeyAlgorithm` identifier.
    pub fn from_oid(oid: &ObjectIdentifier) -> Self {
        if *oid == OID_RSA_ENCRYPTION {
            KeyAlgorithm::Rsa
        } else if *oid == OID_EC_PUBLIC_KEY {
            KeyAlgorithm::Ec
        } else if *oid == OID_ED25519 {
            KeyAlgorithm::Ed25519
        } else if *oid == OID_ED448 {
            KeyAlgorithm::Ed448
        } else {
            KeyAlgorithm::Unknown
        }
    }

    /// Returns the OID for this algorithm, if known.
    #[must_use]
    pub fn oid(&self) -> Option<ObjectIdentifier> {
        match self {
            KeyAlgorithm::Rsa => Some(OID_RSA_ENCRYPTION),
            KeyAlgorithm::Ec => Some(OID_EC_PUBLIC_KEY),
            KeyAlgorithm::Ed25519 => Some(OID_ED25519),
            KeyAlgorithm::Ed448 => Some(OID_ED448),
            KeyAlgorithm::Unknown => None,
        }
    }

    /// Returns a human-readable name for this algorithm.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            KeyAlgorithm::Rsa => "RSA",
            KeyAlgorithm::Ec => "EC",
            KeyAlgorithm::Ed25519 => "Ed25519",
            KeyAlgorithm::Ed448 => "Ed448",
            KeyAlgorithm::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Hash and RSA pairing used when signing with a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureAlgorithm {
    /// Only selected for keys under 2048 bits.
    Sha1WithRsa,
    Sha256WithRsa,
    Sha384WithRsa,
    Sha512WithRsa,
}

impl SignatureAlgorithm {
    /// Picks the signature algorithm for a modulus of `bits` bits.
    ///
    /// | bits     | algorithm        |
    /// |----------|------------------|
    /// | >= 4096  | SHA-512 with RSA |
    /// | >= 3072  | SHA-384 with RSA |
    /// | >= 2048  | SHA-256 with RSA |
    /// | < 2048   | SHA-1 with RSA   |
    pub fn for_key_size(bits: usize) -> Self {
        match bits {
            4096.. => SignatureAlgorithm::Sha512WithRsa,
            3072.. => SignatureAlgorithm::Sha384WithRsa,
            2048.. => SignatureAlgorithm::Sha256WithRsa,
            _ => SignatureAlgorithm::Sha1WithRsa,
        }
    }

    pub fn oid(&self) -> ObjectIdentifier {
        match self {
            SignatureAlgorithm::Sha1WithRsa => OID_SHA1_WITH_RSA,
            SignatureAlgorithm::Sha256WithRsa => OID_SHA256_WITH_RSA,
            SignatureAlgorithm::Sha384WithRsa => OID_SHA384_WITH_RSA,
            SignatureAlgorithm::Sha512WithRsa => OID_SHA512_WITH_RSA,
        }
    }

    /// RFC 8017 name, e.g. `sha256WithRSAEncryption`.
    pub fn name(&self) -> &'static str {
        match self {
            SignatureAlgorithm::Sha1WithRsa => "sha1WithRSAEncryption",
            SignatureAlgorithm::Sha256WithRsa => "sha256WithRSAEncryption",
            SignatureAlgorithm::Sha384WithRsa => "sha384WithRSAEncryption",
            SignatureAlgorithm::Sha512WithRsa => "sha512WithRSAEncryption",
        }
    }

    /// SHA-1 signatures are not collision resistant; callers should not
    /// issue new certificates with them.
    pub fn is_legacy(&self) -> bool {
        matches!(self, SignatureAlgorithm::Sha1WithRsa)
    }
}

impl std::fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
