//! Tools of the cryptography workshop page.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use md5::Md5;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Encrypt,
    Decrypt,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CipherError {
    #[error("key must contain letters only")]
    InvalidKey,
    #[error("invalid base64 input: {0}")]
    Base64(String),
    #[error("decoded bytes are not valid UTF-8")]
    NotUtf8,
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

fn shift_letter(c: char, shift: u8) -> char {
    let base = if c.is_ascii_uppercase() { b'A' } else { b'a' };
    // c is an ASCII letter, so the cast is lossless
    let offset = (c as u8 - base + shift) % 26;
    char::from(base + offset)
}

const fn effective_shift(shift: u8, direction: Direction) -> u8 {
    let shift = shift % 26;
    match direction {
        Direction::Encrypt => shift,
        Direction::Decrypt => (26 - shift) % 26,
    }
}

/// Caesar cipher over ASCII letters; everything else passes through.
#[must_use]
pub fn caesar(text: &str, shift: i32, direction: Direction) -> String {
    // rem_euclid keeps negative shifts in 0..26
    let shift = u8::try_from(shift.rem_euclid(26)).unwrap_or(0);
    let shift = effective_shift(shift, direction);
    text.chars()
        .map(|c| {
            if c.is_ascii_alphabetic() {
                shift_letter(c, shift)
            } else {
                c
            }
        })
        .collect()
}

/// Vigenère cipher over ASCII letters.
///
/// The key position advances on every character, letters or not.
///
/// # Errors
///
/// Returns [`CipherError::InvalidKey`] unless the key is non-empty ASCII letters.
pub fn vigenere(text: &str, key: &str, direction: Direction) -> Result<String, CipherError> {
    if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(CipherError::InvalidKey);
    }
    let shifts: Vec<u8> = key
        .bytes()
        .map(|b| effective_shift(b.to_ascii_uppercase() - b'A', direction))
        .collect();
    Ok(text
        .chars()
        .enumerate()
        .map(|(index, c)| {
            if c.is_ascii_alphabetic() {
                shift_letter(c, shifts[index % shifts.len()])
            } else {
                c
            }
        })
        .collect())
}

#[must_use]
pub fn base64_encode(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

/// Decode base64 text back to a UTF-8 string.
///
/// # Errors
///
/// Returns an error for malformed base64 or non UTF-8 payloads.
pub fn base64_decode(encoded: &str) -> Result<String, CipherError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|err| CipherError::Base64(err.to_string()))?;
    String::from_utf8(bytes).map_err(|_| CipherError::NotUtf8)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha256,
}

impl HashAlgorithm {
    /// MD5 and SHA-1 are offered for comparison only; the page warns about
    /// them.
    #[must_use]
    pub const fn is_obsolete(self) -> bool {
        matches!(self, Self::Md5 | Self::Sha1)
    }
}

impl std::str::FromStr for HashAlgorithm {
    type Err = CipherError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "sha1" | "sha-1" => Ok(Self::Sha1),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            other => Err(CipherError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// Lower-case hex digest of the UTF-8 text.
#[must_use]
pub fn digest_hex(text: &str, algorithm: HashAlgorithm) -> String {
    let bytes = match algorithm {
        HashAlgorithm::Md5 => Md5::digest(text.as_bytes()).to_vec(),
        HashAlgorithm::Sha1 => Sha1::digest(text.as_bytes()).to_vec(),
        HashAlgorithm::Sha256 => Sha256::digest(text.as_bytes()).to_vec(),
    };
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
