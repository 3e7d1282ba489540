//! RSA key material: generation, PEM import and PEM export.
//!
//! [`KeyMaterial`] owns one RSA key pair. It is created once, either by
//! [`KeyMaterial::generate`] or by [`KeyMaterial::from_pem`], and never
//! changes afterwards; every query is a pure function of the wrapped key.
//!
//! ```no_run
//! use pkey::KeyMaterial;
//!
//! // Import-or-create: no PEM means a fresh 2048-bit key.
//! let key = KeyMaterial::new(None).unwrap();
//! assert_eq!(2048, key.size());
//! assert_eq!("RSA", key.algorithm_name());
//!
//! let private_pem = key.private_key_pem().unwrap();
//! let again = KeyMaterial::new(Some(private_pem.as_slice())).unwrap();
//! assert_eq!(key.public_key(), again.public_key());
//! ```

use std::fmt;

use pem::{FromPem, Label, Pem, ToPem};
use pkcs8::der::asn1::OctetStringRef;
use pkcs8::der::{self, Decode, Reader, SliceReader, Tag};
use pkcs8::{EncryptedPrivateKeyInfo, PrivateKeyInfo};
use pkeytools::decoder::{DecodableFrom, Decoder};
use pkeytools::encoder::{EncodableTo, Encoder};
use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey};
use rsa::rand_core::CryptoRngCore;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use tracing::{debug, info, warn};

use crate::algorithm::{KeyAlgorithm, SignatureAlgorithm};
use crate::config::Settings;
use crate::error::{Error, ParseError, Result};
use crate::public_key::PublicKey;

/// Modulus size used when no PEM is supplied.
pub const DEFAULT_KEY_BITS: usize = 2048;

/// Smallest modulus [`KeyMaterial::generate`] accepts.
pub const MIN_KEY_BITS: usize = 1024;

/// Largest modulus [`KeyMaterial::generate`] accepts.
pub const MAX_KEY_BITS: usize = 8192;

/// One RSA key pair.
#[derive(Clone)]
pub struct KeyMaterial {
    private: RsaPrivateKey,
}

impl KeyMaterial {
    /// Imports `pem` when present, otherwise generates a
    /// [`DEFAULT_KEY_BITS`] key.
    ///
    /// An empty slice counts as absent. Encrypted keys are imported without
    /// a password, so they fail with [`ParseError::MissingPassword`].
    pub fn new(pem: Option<&[u8]>) -> Result<Self> {
        Self::import_or_generate(pem, DEFAULT_KEY_BITS)
    }

    /// Like [`KeyMaterial::new`], generating `settings.license_key_bits`
    /// bits when no PEM is supplied.
    pub fn with_settings(pem: Option<&[u8]>, settings: &Settings) -> Result<Self> {
        Self::import_or_generate(pem, settings.license_key_bits)
    }

    fn import_or_generate(pem: Option<&[u8]>, bits: usize) -> Result<Self> {
        match pem {
            Some(bytes) if !bytes.is_empty() => Self::from_pem(bytes),
            _ => Self::generate(bits),
        }
    }

    /// Generates a fresh key from the operating system's CSPRNG.
    ///
    /// # Errors
    ///
    /// [`Error::KeyGeneration`] when `bits` is outside
    /// [`MIN_KEY_BITS`]..=[`MAX_KEY_BITS`] or generation fails.
    pub fn generate(bits: usize) -> Result<Self> {
        Self::generate_with_rng(&mut OsRng, bits)
    }

    /// Generates a fresh key from `rng`.
    pub fn generate_with_rng<R: CryptoRngCore + ?Sized>(rng: &mut R, bits: usize) -> Result<Self> {
        if !(MIN_KEY_BITS..=MAX_KEY_BITS).contains(&bits) {
            return Err(Error::KeyGeneration {
                bits,
                reason: format!("supported sizes are {MIN_KEY_BITS} to {MAX_KEY_BITS} bits"),
            });
        }

        debug!(bits, "generating RSA key");
        let private = RsaPrivateKey::new(rng, bits).map_err(|e| Error::KeyGeneration {
            bits,
            reason: e.to_string(),
        })?;
        info!(bits, "generated RSA key");

        Ok(Self::from_private(private))
    }

    /// Imports one unencrypted private key PEM block.
    ///
    /// Accepts `RSA PRIVATE KEY` (PKCS#1) and `PRIVATE KEY` (PKCS#8) blocks.
    ///
    /// # Errors
    ///
    /// - [`Error::Parse`] for malformed input, a non-private-key block,
    ///   more than one block, or an encrypted block.
    /// - [`Error::UnsupportedKeyType`] when the key is not RSA.
    pub fn from_pem(bytes: &[u8]) -> Result<Self> {
        Self::from_pem_with_password(bytes, None)
    }

    /// Imports one private key PEM block, decrypting `ENCRYPTED PRIVATE KEY`
    /// blocks with `password`. The password is ignored for unencrypted
    /// blocks.
    pub fn from_pem_with_password(bytes: &[u8], password: Option<&[u8]>) -> Result<Self> {
        let text = std::str::from_utf8(bytes).map_err(ParseError::from)?;
        let mut blocks = pem::parse_many(text)?;
        if blocks.len() != 1 {
            return Err(ParseError::BlockCount(blocks.len()).into());
        }
        let block = blocks.remove(0);
        debug!(label = %block.label(), "importing private key");
        Self::decode_block(&block, password)
    }

    fn decode_block(pem: &Pem, password: Option<&[u8]>) -> Result<Self> {
        let der: Vec<u8> = pem.decode()?;
        let private = match pem.label() {
            Label::RSAPrivateKey => RsaPrivateKey::from_pkcs1_der(&der)?,
            Label::PrivateKey => rsa_from_pkcs8(&der)?,
            Label::EncryptedPrivateKey => {
                let password = password.ok_or(ParseError::MissingPassword)?;
                let info = EncryptedPrivateKeyInfo::try_from(der.as_slice())
                    .map_err(pkcs8::Error::from)?;
                let document = info.decrypt(password).map_err(ParseError::Decrypt)?;
                rsa_from_pkcs8(document.as_bytes())?
            }
            Label::ECPrivateKey => {
                check_sec1_outline(&der).map_err(pkcs8::Error::from)?;
                return Err(Error::UnsupportedKeyType(KeyAlgorithm::Ec));
            }
            other => return Err(ParseError::UnexpectedLabel(other).into()),
        };

        let key = Self::from_private(private);
        if key.signature_algorithm().is_legacy() {
            warn!(
                bits = key.size(),
                "imported RSA key is below {DEFAULT_KEY_BITS} bits, signatures fall back to SHA-1"
            );
        }
        Ok(key)
    }

    fn from_private(private: RsaPrivateKey) -> Self {
        KeyMaterial { private }
    }

    /// Always [`KeyAlgorithm::Rsa`].
    pub fn algorithm(&self) -> KeyAlgorithm {
        KeyAlgorithm::Rsa
    }

    /// Always `"RSA"`.
    pub fn algorithm_name(&self) -> &'static str {
        self.algorithm().name()
    }

    /// Modulus bit length.
    pub fn size(&self) -> usize {
        self.private.n().bits()
    }

    pub fn public_key(&self) -> PublicKey<'_> {
        PublicKey::new(self.private.as_ref())
    }

    /// Strongest signature algorithm for this key's size, see
    /// [`SignatureAlgorithm::for_key_size`].
    pub fn signature_algorithm(&self) -> SignatureAlgorithm {
        SignatureAlgorithm::for_key_size(self.size())
    }

    /// PKCS#1 private key in an `RSA PRIVATE KEY` PEM block.
    pub fn private_key_pem(&self) -> Result<Vec<u8>> {
        Ok(self.to_pem()?.to_vec())
    }

    /// PKCS#8 private key in a `PRIVATE KEY` PEM block.
    pub fn pkcs8_private_key_pem(&self) -> Result<Vec<u8>> {
        let document = self.private.to_pkcs8_der().map_err(|e| Error::Encode {
            format: "PKCS#8 PrivateKeyInfo",
            reason: e.to_string(),
        })?;
        Ok(Pem::from_bytes(Label::PrivateKey, document.as_bytes()).to_vec())
    }

    /// SubjectPublicKeyInfo in a `PUBLIC KEY` PEM block.
    pub fn public_key_pem(&self) -> Result<Vec<u8>> {
        Ok(self.public_key().to_pem()?.to_vec())
    }

    /// PKCS#1 public key in an `RSA PUBLIC KEY` PEM block.
    pub fn pkcs1_public_key_pem(&self) -> Result<Vec<u8>> {
        Ok(self.public_key().to_pkcs1_pem()?.to_vec())
    }
}

/// Decodes a PKCS#8 PrivateKeyInfo, refusing anything but rsaEncryption.
fn rsa_from_pkcs8(der: &[u8]) -> Result<RsaPrivateKey> {
    let info = PrivateKeyInfo::try_from(der).map_err(pkcs8::Error::from)?;
    let algorithm = KeyAlgorithm::from_oid(&info.algorithm.oid);
    if algorithm != KeyAlgorithm::Rsa {
        return Err(Error::UnsupportedKeyType(algorithm));
    }
    Ok(RsaPrivateKey::from_pkcs8_der(der)?)
}

/// Walks the outer fields of a SEC1 `ECPrivateKey`: a SEQUENCE holding
/// version 1 and the private key OCTET STRING. The optional trailing fields
/// are skipped unparsed.
fn check_sec1_outline(der: &[u8]) -> der::Result<()> {
    let mut reader = SliceReader::new(der)?;
    reader.sequence(|seq| {
        if u8::decode(seq)? != 1 {
            return Err(Tag::Integer.value_error());
        }
        OctetStringRef::decode(seq)?;
        seq.read_slice(seq.remaining_len())?;
        Ok(())
    })?;
    reader.finish(())
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("algorithm", &self.algorithm())
            .field("size", &self.size())
            .field("private", &"[REDACTED]")
            .finish()
    }
}

impl PartialEq for KeyMaterial {
    fn eq(&self, other: &Self) -> bool {
        self.private == other.private
    }
}

impl Eq for KeyMaterial {}

impl ToPem for KeyMaterial {
    type Error = Error;

    fn pem_label(&self) -> Label {
        Label::RSAPrivateKey
    }

    fn to_pem(&self) -> Result<Pem> {
        let document = self.private.to_pkcs1_der().map_err(|e| Error::Encode {
            format: "PKCS#1 RSAPrivateKey",
            reason: e.to_string(),
        })?;
        Ok(Pem::from_bytes(self.pem_label(), document.as_bytes()))
    }
}

impl FromPem for KeyMaterial {
    type Error = Error;

    fn expected_labels() -> &'static [Label] {
        &[Label::RSAPrivateKey, Label::PrivateKey]
    }

    fn from_pem(pem: &Pem) -> Result<Self> {
        Self::decode_block(pem, None)
    }
}

impl DecodableFrom<Pem> for KeyMaterial {}

impl Decoder<Pem, KeyMaterial> for Pem {
    type Error = Error;

    fn decode(&self) -> Result<KeyMaterial> {
        <KeyMaterial as FromPem>::from_pem(self)
    }
}

impl EncodableTo<KeyMaterial> for Pem {}

impl Encoder<KeyMaterial, Pem> for KeyMaterial {
    type Error = Error;

    fn encode(&self) -> Result<Pem> {
        self.to_pem()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use rstest::rstest;

    use super::*;

    fn seeded_key(seed: u64, bits: usize) -> KeyMaterial {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        KeyMaterial::generate_with_rng(&mut rng, bits).unwrap()
    }

    #[test]
    fn test_generate_with_rng_exact_size() {
        let key = seeded_key(1, 1024);
        assert_eq!(1024, key.size());
        assert_eq!(1024, key.public_key().bits());
        assert_eq!(KeyAlgorithm::Rsa, key.algorithm());
        assert_eq!("RSA", key.algorithm_name());
        assert_eq!(SignatureAlgorithm::Sha1WithRsa, key.signature_algorithm());
    }

    // Slow in debug builds.
    #[rstest]
    #[case::sha384_tier(3072, SignatureAlgorithm::Sha384WithRsa)]
    #[case::sha512_tier(4096, SignatureAlgorithm::Sha512WithRsa)]
    fn test_generate_with_rng_large_sizes(#[case] bits: usize, #[case] expected: SignatureAlgorithm) {
        let key = seeded_key(bits as u64, bits);
        assert_eq!(bits, key.size());
        assert_eq!(expected, key.signature_algorithm());
    }

    #[rstest]
    #[case::minimal(vec![0x30, 0x05, 0x02, 0x01, 0x01, 0x04, 0x00], true)]
    #[case::with_parameters(
        vec![0x30, 0x07, 0x02, 0x01, 0x01, 0x04, 0x00, 0xa0, 0x00],
        true
    )]
    #[case::wrong_version(vec![0x30, 0x05, 0x02, 0x01, 0x02, 0x04, 0x00], false)]
    #[case::trailing_bytes(vec![0x30, 0x05, 0x02, 0x01, 0x01, 0x04, 0x00, 0x00], false)]
    #[case::not_a_sequence(vec![0x00, 0x00, 0x00], false)]
    #[case::empty(vec![], false)]
    fn test_check_sec1_outline(#[case] der: Vec<u8>, #[case] valid: bool) {
        assert_eq!(valid, check_sec1_outline(&der).is_ok());
    }

    #[test]
    fn test_generate_with_rng_is_deterministic() {
        assert_eq!(seeded_key(7, 1024), seeded_key(7, 1024));
        assert_ne!(seeded_key(7, 1024), seeded_key(8, 1024));
    }

    #[rstest]
    #[case::zero(0)]
    #[case::too_small(512)]
    #[case::just_below(MIN_KEY_BITS - 1)]
    #[case::too_large(MAX_KEY_BITS + 1)]
    fn test_generate_rejects_unsupported_size(#[case] bits: usize) {
        match KeyMaterial::generate(bits) {
            Err(Error::KeyGeneration { bits: got, .. }) => assert_eq!(bits, got),
            other => panic!("expected KeyGeneration error, got {other:?}"),
        }
    }

    #[test]
    fn test_public_exponent_is_f4() {
        let key = seeded_key(2, 1024);
        assert_eq!(num_bigint::BigUint::from(65537u32), key.public_key().public_exponent());
    }

    #[test]
    fn test_pem_encode_decode_through_traits() {
        let key = seeded_key(3, 1024);
        let pem: Pem = key.encode().unwrap();
        assert_eq!(Label::RSAPrivateKey, pem.label());
        let decoded: KeyMaterial = pem.decode().unwrap();
        assert_eq!(key, decoded);
    }

    #[test]
    fn test_from_pem_refuses_public_key_block() {
        let key = seeded_key(4, 1024);
        let public_pem = key.public_key_pem().unwrap();
        let err = KeyMaterial::from_pem(&public_pem).unwrap_err();
        assert!(matches!(
            err,
            Error::Parse(ParseError::UnexpectedLabel(Label::PublicKey))
        ));
    }

    #[test]
    fn test_debug_redacts_private_material() {
        let key = seeded_key(5, 1024);
        let debug = format!("{key:?}");
        assert!(debug.contains("REDACTED"));
        assert!(debug.contains("1024"));
    }

    #[rstest]
    #[case::absent(None)]
    #[case::empty(Some(&b""[..]))]
    fn test_with_settings_generates_configured_size(#[case] pem: Option<&[u8]>) {
        let settings = Settings {
            license_key_bits: 1024,
            ..Settings::default()
        };
        let key = KeyMaterial::with_settings(pem, &settings).unwrap();
        assert_eq!(1024, key.size());
    }
}
