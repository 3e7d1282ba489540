pub mod error;

use std::{
    fmt::{Display, Formatter},
    str::FromStr,
    sync::LazyLock,
};

use base64::{Engine, engine::general_purpose::STANDARD};
use error::Error;
use pkeytools::decoder::{DecodableFrom, Decoder};
use regex::Regex;

const PRIVATE_KEY_LABEL: &str = "PRIVATE KEY";
const ENCRYPTED_PRIVATE_KEY_LABEL: &str = "ENCRYPTED PRIVATE KEY";
const RSA_PRIVATE_KEY_LABEL: &str = "RSA PRIVATE KEY";
const EC_PRIVATE_KEY_LABEL: &str = "EC PRIVATE KEY";
const PUBLIC_KEY_LABEL: &str = "PUBLIC KEY";
const RSA_PUBLIC_KEY_LABEL: &str = "RSA PUBLIC KEY";
const CERTIFICATE_LABEL: &str = "CERTIFICATE";

/// RFC 7468 recommends wrapping the base64 body at 64 columns.
const LINE_WIDTH: usize = 64;

static BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-----(BEGIN|END) ([A-Z0-9 ]+)-----\s*$")
        .expect("boundary pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    /// PKCS#8 private key (non-encrypted)
    PrivateKey,
    /// PKCS#8 encrypted private key
    EncryptedPrivateKey,
    /// PKCS#1 RSA private key
    RSAPrivateKey,
    /// SEC1 EC private key
    ECPrivateKey,
    /// X.509 SubjectPublicKeyInfo
    PublicKey,
    /// PKCS#1 RSA public key
    RSAPublicKey,
    /// X.509 Certificate
    Certificate,
}

impl Label {
    fn as_str(&self) -> &'static str {
        match self {
            Label::PrivateKey => PRIVATE_KEY_LABEL,
            Label::EncryptedPrivateKey => ENCRYPTED_PRIVATE_KEY_LABEL,
            Label::RSAPrivateKey => RSA_PRIVATE_KEY_LABEL,
            Label::ECPrivateKey => EC_PRIVATE_KEY_LABEL,
            Label::PublicKey => PUBLIC_KEY_LABEL,
            Label::RSAPublicKey => RSA_PUBLIC_KEY_LABEL,
            Label::Certificate => CERTIFICATE_LABEL,
        }
    }

    /// Whether a block with this label carries private key material.
    pub fn is_private_key(&self) -> bool {
        matches!(
            self,
            Label::PrivateKey
                | Label::EncryptedPrivateKey
                | Label::RSAPrivateKey
                | Label::ECPrivateKey
        )
    }
}

impl Display for Label {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Label {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            PRIVATE_KEY_LABEL => Ok(Label::PrivateKey),
            ENCRYPTED_PRIVATE_KEY_LABEL => Ok(Label::EncryptedPrivateKey),
            RSA_PRIVATE_KEY_LABEL => Ok(Label::RSAPrivateKey),
            EC_PRIVATE_KEY_LABEL => Ok(Label::ECPrivateKey),
            PUBLIC_KEY_LABEL => Ok(Label::PublicKey),
            RSA_PUBLIC_KEY_LABEL => Ok(Label::RSAPublicKey),
            CERTIFICATE_LABEL => Ok(Label::Certificate),
            other => Err(Error::InvalidLabel(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    Begin,
    End,
}

/// Splits a boundary line into its kind and raw label text.
/// Returns `None` for lines that are not boundaries at all.
fn boundary(line: &str) -> Option<(Boundary, &str)> {
    let captured = BOUNDARY.captures(line)?;
    let kind = match captured.get(1)?.as_str() {
        "BEGIN" => Boundary::Begin,
        _ => Boundary::End,
    };
    Some((kind, captured.get(2)?.as_str()))
}

/*
ref: https://www.rfc-editor.org/rfc/rfc7468.html#section-3
*/

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pem {
    label: Label,
    base64_data: String,
}

impl Pem {
    pub fn new(label: Label, base64_data: String) -> Self {
        Pem { label, base64_data }
    }

    pub fn from_bytes(label: Label, data: &[u8]) -> Self {
        Pem {
            label,
            base64_data: STANDARD.encode(data),
        }
    }

    pub fn label(&self) -> Label {
        self.label
    }

    pub fn data(&self) -> &str {
        &self.base64_data
    }

    /// Renders the block as bytes terminated by a newline, the layout
    /// most PEM consumers expect on disk.
    pub fn to_vec(&self) -> Vec<u8> {
        format!("{self}\n").into_bytes()
    }
}

impl Display for Pem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "-----BEGIN {}-----", self.label)?;
        for chunk in self.base64_data.as_bytes().chunks(LINE_WIDTH) {
            let line = std::str::from_utf8(chunk).map_err(|_| std::fmt::Error)?;
            writeln!(f, "{}", line)?;
        }
        write!(f, "-----END {}-----", self.label)
    }
}

/// Trait for types that can be converted to PEM format
pub trait ToPem {
    /// The error type returned by to_pem
    type Error;

    /// Get the PEM label for this type
    fn pem_label(&self) -> Label;

    /// Convert to PEM format
    fn to_pem(&self) -> Result<Pem, Self::Error>;
}

/// Trait for types that can be constructed from PEM format
pub trait FromPem: Sized {
    /// The error type returned by from_pem
    type Error;

    /// Labels this type accepts
    fn expected_labels() -> &'static [Label];

    /// Construct from PEM format
    fn from_pem(pem: &Pem) -> Result<Self, Self::Error>;
}

impl DecodableFrom<Pem> for Vec<u8> {}

impl Decoder<Pem, Vec<u8>> for Pem {
    type Error = Error;

    fn decode(&self) -> Result<Vec<u8>, Self::Error> {
        STANDARD.decode(self.data()).map_err(Error::Base64Decode)
    }
}

impl DecodableFrom<String> for Pem {}

impl Decoder<String, Pem> for String {
    type Error = Error;

    fn decode(&self) -> Result<Pem, Self::Error> {
        Pem::from_str(self)
    }
}

impl DecodableFrom<&str> for Pem {}

impl Decoder<&str, Pem> for &str {
    type Error = Error;

    fn decode(&self) -> Result<Pem, Self::Error> {
        Pem::from_str(self)
    }
}

/// Parse every PEM block in `s`.
///
/// Text outside of blocks is ignored. At least one block is required.
///
/// # Example
/// ```
/// use pem::parse_many;
///
/// let pem_data = "-----BEGIN CERTIFICATE-----\nAAA=\n-----END CERTIFICATE-----\n-----BEGIN CERTIFICATE-----\nBBB=\n-----END CERTIFICATE-----";
/// let pems = parse_many(pem_data).unwrap();
/// assert_eq!(pems.len(), 2);
/// ```
pub fn parse_many(s: &str) -> Result<Vec<Pem>, Error> {
    // Some producers glue END and BEGIN boundaries onto one line.
    let normalized = s.replace("----------", "-----\n-----");

    let mut pems = Vec::new();
    let mut current_block: Option<(&str, Vec<&str>)> = None;

    for line in normalized.lines() {
        match boundary(line) {
            Some((Boundary::Begin, label)) => {
                if current_block.is_some() {
                    return Err(Error::MissingPostEncapsulationBoundary);
                }
                current_block = Some((label, vec![line]));
            }
            Some((Boundary::End, label)) => {
                let Some((begin, mut lines)) = current_block.take() else {
                    return Err(Error::MissingPreEncapsulationBoundary);
                };
                if begin != label {
                    return Err(Error::LabelMismatch {
                        begin: begin.to_string(),
                        end: label.to_string(),
                    });
                }
                lines.push(line);
                pems.push(Pem::from_str(&lines.join("\n"))?);
            }
            None => {
                if let Some((_, ref mut lines)) = current_block {
                    lines.push(line);
                }
            }
        }
    }

    if current_block.is_some() {
        return Err(Error::MissingPostEncapsulationBoundary);
    }

    if pems.is_empty() {
        return Err(Error::MissingPreEncapsulationBoundary);
    }

    Ok(pems)
}

impl FromStr for Pem {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut state = PemParsingState::default();
        let mut label_text = "";
        let mut base64_lines = vec![];
        let mut base64_finl_lines = vec![];
        let mut lines = s.lines().map(str::trim_end);
        loop {
            match state {
                PemParsingState::Init => match lines.next() {
                    Some(line) => match boundary(line) {
                        Some((Boundary::Begin, l)) => {
                            label_text = l;
                            state = PemParsingState::PreEncapsulationBoundary;
                        }
                        Some((Boundary::End, _)) => {
                            return Err(Error::MissingPreEncapsulationBoundary);
                        }
                        None if line.starts_with("-----BEGIN") => {
                            return Err(Error::InvalidEncapsulationBoundary);
                        }
                        // Explanatory text before the block is skipped.
                        None => {}
                    },
                    None => return Err(Error::MissingPreEncapsulationBoundary),
                },
                PemParsingState::PreEncapsulationBoundary => match lines.next() {
                    Some(line) => {
                        if line.is_empty() || boundary(line).is_some() {
                            return Err(Error::MissingData);
                        }
                        if is_header(line) {
                            return Err(Error::UnsupportedHeader(line.to_string()));
                        }
                        if is_base64_finl(line) {
                            base64_finl_lines.push(line);
                            state = PemParsingState::Base64Finl;
                        } else {
                            base64_lines.push(line);
                            state = PemParsingState::Base64Lines;
                        }
                    }
                    None => return Err(Error::MissingData),
                },
                PemParsingState::Base64Lines => match lines.next() {
                    Some(line) => {
                        if line.is_empty() {
                            return Err(Error::InvalidBase64Line);
                        }
                        if let Some((kind, l)) = boundary(line) {
                            check_post_boundary(kind, label_text, l)?;
                            state = PemParsingState::PostEncapsulationBoundary;
                        } else if is_base64_finl(line) {
                            base64_finl_lines.push(line);
                            state = PemParsingState::Base64Finl;
                        } else {
                            base64_lines.push(line);
                        }
                    }
                    None => return Err(Error::MissingPostEncapsulationBoundary),
                },
                PemParsingState::Base64Finl => match lines.next() {
                    Some(line) => {
                        if line.is_empty() {
                            return Err(Error::InvalidBase64Finl);
                        }
                        if let Some((kind, l)) = boundary(line) {
                            check_post_boundary(kind, label_text, l)?;
                            state = PemParsingState::PostEncapsulationBoundary;
                        } else {
                            if !is_base64_finl(line) {
                                return Err(Error::InvalidBase64Finl);
                            }
                            base64_finl_lines.push(line);
                        }
                    }
                    None => return Err(Error::MissingPostEncapsulationBoundary),
                },
                PemParsingState::PostEncapsulationBoundary => break,
            }
        }

        let label = Label::from_str(label_text)?;
        let finl = base64_finl(&base64_finl_lines)?;
        base64_lines.push(&finl);

        Ok(Pem {
            label,
            base64_data: base64_lines.iter().map(|l| l.trim()).collect(),
        })
    }
}

/*
* pre-eb ->          base64finl -> post-eb
*        -> base64lines-|---------->
*            |_|
 */
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
enum PemParsingState {
    #[default]
    Init,
    PreEncapsulationBoundary,
    Base64Lines,
    Base64Finl,
    PostEncapsulationBoundary,
}

fn check_post_boundary(kind: Boundary, begin: &str, end: &str) -> Result<(), Error> {
    if kind == Boundary::Begin {
        return Err(Error::MissingPostEncapsulationBoundary);
    }
    if begin != end {
        return Err(Error::LabelMismatch {
            begin: begin.to_string(),
            end: end.to_string(),
        });
    }
    Ok(())
}

fn base64_finl(lines: &[&str]) -> Result<String, Error> {
    // base64finl = *base64char (base64pad *WSP eol base64pad / *2base64pad) *WSP eol
    // ..AB=\s\s\s\n
    // =\s\s\n
    // or
    // ..AB==\s\s\n
    if lines.iter().any(|l| l.is_empty()) {
        return Err(Error::InvalidBase64Finl);
    }
    Ok(lines.iter().map(|l| l.trim()).collect())
}

fn is_base64_finl(line: &str) -> bool {
    line.contains('=')
}

// RFC 1421 headers such as `Proc-Type: 4,ENCRYPTED` never appear in base64.
fn is_header(line: &str) -> bool {
    line.contains(':')
}
