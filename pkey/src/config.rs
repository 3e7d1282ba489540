//! Settings shared with certificate and license issuing code.
//!
//! [`Settings`] is built once (from [`Settings::default`] or a JSON
//! document) and handed to collaborators by reference.

use std::fmt::Write;
use std::net::{IpAddr, Ipv4Addr};

use chrono::format::{Item, ParseErrorKind, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::algorithm::KeyAlgorithm;
use crate::error::{Error, Result};
use crate::key_material::{DEFAULT_KEY_BITS, MAX_KEY_BITS, MIN_KEY_BITS};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Key algorithm of X.509 TLS certificates.
    pub key_algorithm: KeyAlgorithm,
    /// Key size of X.509 TLS certificates.
    pub key_size: usize,
    /// PEM block name of private keys.
    pub private_key_pem_block: String,
    /// PEM block name of certificates.
    pub certificate_pem_block: String,
    /// Name of the license key pair.
    pub license_key_pair: String,
    /// Modulus size of license signing keys.
    pub license_key_bits: usize,
    /// Subject organization of license certificates.
    pub license_org: String,
    pub loopback_ip: IpAddr,
    /// strftime layout of the expiry field in license payloads.
    pub license_time_format: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            key_algorithm: KeyAlgorithm::Rsa,
            key_size: DEFAULT_KEY_BITS,
            private_key_pem_block: "RSA PRIVATE KEY".to_string(),
            certificate_pem_block: "CERTIFICATE".to_string(),
            license_key_pair: "license".to_string(),
            license_key_bits: DEFAULT_KEY_BITS,
            license_org: "xxxx.io".to_string(),
            loopback_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            license_time_format: "%Y-%m-%d %H:%M:%S".to_string(),
        }
    }
}

impl Settings {
    /// Reads settings from JSON. Missing fields keep their defaults.
    pub fn from_json(s: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(s)?;
        settings.validate()?;
        debug!(?settings, "loaded settings");
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.key_algorithm != KeyAlgorithm::Rsa {
            return Err(Error::UnsupportedKeyType(self.key_algorithm));
        }
        for (field, bits) in [
            ("key_size", self.key_size),
            ("license_key_bits", self.license_key_bits),
        ] {
            if !(MIN_KEY_BITS..=MAX_KEY_BITS).contains(&bits) {
                return Err(Error::InvalidSetting {
                    field,
                    reason: format!("{bits} is outside {MIN_KEY_BITS}..={MAX_KEY_BITS}"),
                });
            }
        }
        if self.license_time_format.is_empty()
            || StrftimeItems::new(&self.license_time_format).any(|item| matches!(item, Item::Error))
        {
            return Err(Error::InvalidSetting {
                field: "license_time_format",
                reason: format!("{:?} is not a strftime layout", self.license_time_format),
            });
        }

        // Whatever the layout writes must read back to the same text.
        let sample = Utc.with_ymd_and_hms(2001, 2, 3, 4, 5, 6).single().ok_or_else(|| {
            Error::InvalidSetting {
                field: "license_time_format",
                reason: "sample instant is ambiguous".to_string(),
            }
        })?;
        let text = self.format_license_expiry(&sample)?;
        let reread = self
            .parse_license_expiry(&text)
            .and_then(|at| self.format_license_expiry(&at));
        if reread.ok().as_deref() != Some(text.as_str()) {
            return Err(Error::InvalidSetting {
                field: "license_time_format",
                reason: format!("{:?} cannot be parsed back", self.license_time_format),
            });
        }
        Ok(())
    }

    /// Renders a license expiry time with `license_time_format`.
    pub fn format_license_expiry(&self, at: &DateTime<Utc>) -> Result<String> {
        let mut out = String::new();
        write!(out, "{}", at.format(&self.license_time_format)).map_err(|_| {
            Error::InvalidSetting {
                field: "license_time_format",
                reason: format!("cannot render {:?}", self.license_time_format),
            }
        })?;
        Ok(out)
    }

    /// Parses a license expiry time written with `license_time_format`.
    /// The layout carries no zone, so the value is read as UTC. Date-only
    /// layouts yield midnight.
    pub fn parse_license_expiry(&self, value: &str) -> Result<DateTime<Utc>> {
        let layout = self.license_time_format.as_str();
        NaiveDateTime::parse_from_str(value, layout)
            .or_else(|err| match err.kind() {
                ParseErrorKind::NotEnough => NaiveDate::parse_from_str(value, layout)
                    .map(|date| date.and_time(NaiveTime::MIN)),
                _ => Err(err),
            })
            .map(|naive| naive.and_utc())
            .map_err(|source| Error::LicenseTime {
                value: value.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_default_values() {
        let settings = Settings::default();
        assert_eq!(KeyAlgorithm::Rsa, settings.key_algorithm);
        assert_eq!(2048, settings.key_size);
        assert_eq!("RSA PRIVATE KEY", settings.private_key_pem_block);
        assert_eq!("CERTIFICATE", settings.certificate_pem_block);
        assert_eq!("license", settings.license_key_pair);
        assert_eq!(2048, settings.license_key_bits);
        assert_eq!("xxxx.io", settings.license_org);
        assert_eq!("127.0.0.1", settings.loopback_ip.to_string());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial_override() {
        let settings =
            Settings::from_json(r#"{"license_org": "example.com", "license_key_bits": 3072}"#)
                .unwrap();
        assert_eq!("example.com", settings.license_org);
        assert_eq!(3072, settings.license_key_bits);
        assert_eq!(Settings::default().key_size, settings.key_size);
        assert_eq!(Settings::default().loopback_ip, settings.loopback_ip);
    }

    #[test]
    fn test_json_round_trip() {
        let settings = Settings::default();
        let json = serde_json::to_string(&settings).unwrap();
        assert!(json.contains(r#""key_algorithm":"rsa""#));
        assert_eq!(settings, Settings::from_json(&json).unwrap());
    }

    #[rstest(
        json,
        case(r#"{"key_algorithm": "ec"}"#),
        case(r#"{"key_size": 512}"#),
        case(r#"{"license_key_bits": 100000}"#),
        case(r#"{"license_time_format": "%Q"}"#),
        case(r#"{"license_time_format": ""}"#),
        case(r#"{"license_time_format": "%H:%M"}"#),
        case(r#"{"license_time_format": "%Y"}"#),
        case(r#"{"loopback_ip": "localhost"}"#),
        case(r#"{"license_org": "#)
    )]
    fn test_from_json_rejects(json: &str) {
        assert!(Settings::from_json(json).is_err());
    }

    #[test]
    fn test_from_json_unsupported_algorithm_error() {
        let err = Settings::from_json(r#"{"key_algorithm": "ed25519"}"#).unwrap_err();
        assert!(matches!(err, Error::UnsupportedKeyType(KeyAlgorithm::Ed25519)));
    }

    #[test]
    fn test_license_expiry_round_trip() {
        let settings = Settings::default();
        let at = Utc.with_ymd_and_hms(2027, 3, 14, 15, 9, 26).unwrap();
        let text = settings.format_license_expiry(&at).unwrap();
        assert_eq!("2027-03-14 15:09:26", text);
        assert_eq!(at, settings.parse_license_expiry(&text).unwrap());
    }

    #[rstest(
        layout,
        text,
        case("%Y-%m-%d", "2027-03-14"),
        case("%d/%m/%Y %H:%M", "14/03/2027 15:09"),
        case("%Y%m%dT%H%M%SZ", "20270314T150926Z")
    )]
    fn test_license_expiry_layouts_read_back(layout: &str, text: &str) {
        let json = format!(r#"{{"license_time_format": "{layout}"}}"#);
        let settings = Settings::from_json(&json).unwrap();
        let at = Utc.with_ymd_and_hms(2027, 3, 14, 15, 9, 26).unwrap();
        let written = settings.format_license_expiry(&at).unwrap();
        assert_eq!(text, written);
        let read = settings.parse_license_expiry(&written).unwrap();
        assert_eq!(written, settings.format_license_expiry(&read).unwrap());
    }

    #[test]
    fn test_date_only_layout_reads_midnight() {
        let settings = Settings {
            license_time_format: "%Y-%m-%d".to_string(),
            ..Settings::default()
        };
        assert_eq!(
            Utc.with_ymd_and_hms(2027, 3, 14, 0, 0, 0).unwrap(),
            settings.parse_license_expiry("2027-03-14").unwrap()
        );
    }

    #[rstest(
        value,
        case("2027-03-14"),
        case("2027-03-14T15:09:26Z"),
        case("not a date")
    )]
    fn test_parse_license_expiry_rejects(value: &str) {
        let err = Settings::default().parse_license_expiry(value).unwrap_err();
        assert!(matches!(err, Error::LicenseTime { .. }));
    }
}
