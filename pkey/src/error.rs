use pem::Label;
use thiserror::Error;

use crate::algorithm::KeyAlgorithm;

/// Errors returned by key generation, import, export and settings loading.
#[derive(Debug, Error)]
pub enum Error {
    /// The random source failed or the bit length is not supported.
    #[error("failed to generate {bits}-bit RSA key: {reason}")]
    KeyGeneration { bits: usize, reason: String },

    #[error("failed to parse private key: {0}")]
    Parse(#[from] ParseError),

    /// The key decoded fine but is not an RSA key.
    #[error("unsupported key type {0}: only RSA keys are supported")]
    UnsupportedKeyType(KeyAlgorithm),

    #[error("failed to encode {format}: {reason}")]
    Encode {
        format: &'static str,
        reason: String,
    },

    #[error("malformed settings: {0}")]
    Config(#[from] serde_json::Error),

    #[error("invalid setting {field}: {reason}")]
    InvalidSetting { field: &'static str, reason: String },

    #[error("invalid license time {value:?}: {source}")]
    LicenseTime {
        value: String,
        source: chrono::ParseError,
    },
}

/// Reasons a PEM private key could not be imported.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("input is not UTF-8 text: {0}")]
    NotUtf8(#[from] std::str::Utf8Error),

    #[error("malformed PEM: {0}")]
    Pem(#[from] pem::error::Error),

    #[error("expected exactly one PEM block, found {0}")]
    BlockCount(usize),

    #[error("PEM block {0} does not hold a private key")]
    UnexpectedLabel(Label),

    #[error("malformed PKCS#1 private key: {0}")]
    Pkcs1(#[from] rsa::pkcs1::Error),

    #[error("malformed PKCS#8 private key: {0}")]
    Pkcs8(#[from] pkcs8::Error),

    #[error("encrypted private key requires a password")]
    MissingPassword,

    #[error("failed to decrypt private key: {0}")]
    Decrypt(pkcs8::Error),
}

impl From<pem::error::Error> for Error {
    fn from(err: pem::error::Error) -> Self {
        Error::Parse(ParseError::Pem(err))
    }
}

impl From<rsa::pkcs1::Error> for Error {
    fn from(err: rsa::pkcs1::Error) -> Self {
        Error::Parse(ParseError::Pkcs1(err))
    }
}

impl From<pkcs8::Error> for Error {
    fn from(err: pkcs8::Error) -> Self {
        Error::Parse(ParseError::Pkcs8(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pem_error_is_parse_error() {
        let err = Error::from(pem::error::Error::MissingData);
        assert!(matches!(err, Error::Parse(ParseError::Pem(_))));
        assert!(err.to_string().contains("missing PEM data"));
    }

    #[test]
    fn test_unsupported_key_type_display() {
        let err = Error::UnsupportedKeyType(KeyAlgorithm::Ec);
        assert_eq!(
            "unsupported key type EC: only RSA keys are supported",
            err.to_string()
        );
    }

    #[test]
    fn test_key_generation_display() {
        let err = Error::KeyGeneration {
            bits: 512,
            reason: "too small".to_string(),
        };
        assert!(err.to_string().contains("512-bit"));
    }
}
