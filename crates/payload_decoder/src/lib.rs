use std::{fmt::Display, str::FromStr};

use base64::{
    alphabet,
    engine::{general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD}, DecodePaddingMode},
    Engine as _,
};
use logger_proc_macro::log;
use thiserror::Error;

/// Leading bytes every accepted PDF payload must start with.
pub const PDF_SIGNATURE: &[u8; 4] = b"%PDF";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingType {
    Pdf,
    Html,
    Xml,
}

impl FromStr for EncodingType {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pdf" => Ok(EncodingType::Pdf),
            "html" => Ok(EncodingType::Html),
            "xml" => Ok(EncodingType::Xml),
            other => Err(DecodeError::UnsupportedEncoding(other.to_string())),
        }
    }
}

impl Display for EncodingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodingType::Pdf => write!(f, "pdf"),
            EncodingType::Html => write!(f, "html"),
            EncodingType::Xml => write!(f, "xml"),
        }
    }
}

// Display strings are sent to clients as the `error` field.
#[derive(Error, Debug, PartialEq)]
pub enum DecodeError {
    #[error("Invalid Base64 characters found")]
    InvalidCharacters(Vec<char>),

    #[error("{0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Invalid PDF file")]
    InvalidPdf,

    #[error("Unsupported encoding type")]
    UnsupportedEncoding(String),
}

// Padding must be canonical, but unused bits in the last symbol are ignored.
const LENIENT_TRAILING_BITS: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::RequireCanonical),
);

fn is_base64_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '='
}

/// Every character outside `[A-Za-z0-9+/=]`, in input order, duplicates kept.
pub fn find_invalid_chars(input: &str) -> Vec<char> {
    input.chars().filter(|c| !is_base64_char(*c)).collect()
}

/// Standard-alphabet decode with canonical padding required.
pub fn decode_strict(input: &str) -> Result<Vec<u8>, DecodeError> {
    let invalid = find_invalid_chars(input);
    if !invalid.is_empty() {
        return Err(DecodeError::InvalidCharacters(invalid));
    }

    Ok(LENIENT_TRAILING_BITS.decode(input)?)
}

pub fn encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

pub fn has_pdf_signature(data: &[u8]) -> bool {
    data.starts_with(PDF_SIGNATURE)
}

/// Validates and decodes `input` for the given content type.
///
/// PDF payloads come back re-encoded as Base64 once the signature check
/// passes; HTML and XML payloads come back as text, with invalid UTF-8
/// sequences replaced by U+FFFD.
#[log(debug)]
pub fn decode_payload(encoding: EncodingType, input: &str) -> Result<String, DecodeError> {
    let bytes = decode_strict(input)?;

    match encoding {
        EncodingType::Pdf => {
            if !has_pdf_signature(&bytes) {
                return Err(DecodeError::InvalidPdf);
            }
            Ok(encode(&bytes))
        }
        EncodingType::Html | EncodingType::Xml => Ok(String::from_utf8_lossy(&bytes).into_owned()),
    }
}
