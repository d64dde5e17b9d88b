//! Content-addressed promise identifiers.
//!
//! A promise is the digest of a human-readable description ("I will say
//! hello") under a named algorithm. Its binary form is a multihash
//! (`varint(code) ‖ varint(len) ‖ digest`, varints minimally encoded); its
//! text form prefixes that binary with a multibase character so a decoder
//! needs no outside context. Base58btc (`z`) is emitted, matching the
//! identifiers other grid nodes put on the wire.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use unsigned_varint::{decode as varint_decode, encode as varint_encode};

use super::algorithm::HashAlgorithm;
use super::error::CodecError;

/// Multibase prefix emitted by [`Promise::to_text`]: base58, bitcoin alphabet.
pub const MULTIBASE_BASE58BTC: char = 'z';
/// Multibase prefix for base64url, no padding (decode only).
pub const MULTIBASE_BASE64URL: char = 'u';
/// Multibase prefix for standard base64, no padding (decode only).
pub const MULTIBASE_BASE64: char = 'm';
/// Multibase prefix for lowercase hex (decode only).
pub const MULTIBASE_BASE16: char = 'f';

/// A content-addressed identifier: `{algorithm, digest}`.
///
/// Two promises are equal iff algorithm and digest bytes match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Promise {
    algorithm: HashAlgorithm,
    digest: Vec<u8>,
}

impl Promise {
    /// Hash `description` under `algorithm`.
    pub fn derive(description: &str, algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            digest: algorithm.digest(description.as_bytes()),
        }
    }

    /// Wrap an existing digest. The length must match the algorithm.
    pub fn from_digest(algorithm: HashAlgorithm, digest: Vec<u8>) -> Result<Self, CodecError> {
        if digest.len() != algorithm.digest_len() {
            return Err(CodecError::MalformedMessage(format!(
                "{} digest must be {} bytes, got {}",
                algorithm,
                algorithm.digest_len(),
                digest.len()
            )));
        }
        Ok(Self { algorithm, digest })
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn digest(&self) -> &[u8] {
        &self.digest
    }

    /// Binary multihash form.
    pub fn to_multihash(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.digest.len() + 4);
        out.extend_from_slice(varint_encode::u64(
            self.algorithm.code(),
            &mut varint_encode::u64_buffer(),
        ));
        out.extend_from_slice(varint_encode::u64(
            self.digest.len() as u64,
            &mut varint_encode::u64_buffer(),
        ));
        out.extend_from_slice(&self.digest);
        out
    }

    /// Parse a binary multihash.
    ///
    /// Non-minimal varints and trailing bytes are rejected, so each promise
    /// has exactly one binary form.
    pub fn from_multihash(bytes: &[u8]) -> Result<Self, CodecError> {
        let (code, rest) = read_uvarint(bytes)?;
        let algorithm = HashAlgorithm::from_code(code)?;
        let (len, digest) = read_uvarint(rest)?;
        if digest.len() as u64 != len {
            return Err(CodecError::MalformedMessage(format!(
                "multihash declares {} digest bytes, found {}",
                len,
                digest.len()
            )));
        }
        Self::from_digest(algorithm, digest.to_vec())
    }

    /// Self-describing text form: `z` + base58btc(multihash).
    pub fn to_text(&self) -> String {
        let mut text = String::with_capacity(48);
        text.push(MULTIBASE_BASE58BTC);
        text.push_str(&bs58::encode(self.to_multihash()).into_string());
        text
    }

    /// Parse the text form produced by [`Promise::to_text`] (or any other
    /// multibase form [`decode_multibase`] understands).
    pub fn parse(text: &str) -> Result<Self, CodecError> {
        let bytes = decode_multibase(text)?;
        Self::from_multihash(&bytes)
    }
}

/// Derive a promise from a description and an algorithm name.
///
/// Fails with [`CodecError::UnsupportedAlgorithm`] when the name is not
/// recognized. Deterministic: the same inputs always give the same promise.
pub fn derive_promise(description: &str, algorithm: &str) -> Result<Promise, CodecError> {
    let algorithm = HashAlgorithm::from_name(algorithm)?;
    Ok(Promise::derive(description, algorithm))
}

/// Decode a multibase string into raw bytes.
///
/// Supported prefixes: `z` (base58btc), `u` (base64url, no padding), `m`
/// (base64, no padding) and `f` (lowercase hex).
pub fn decode_multibase(text: &str) -> Result<Vec<u8>, CodecError> {
    let mut chars = text.chars();
    let prefix = chars
        .next()
        .ok_or_else(|| CodecError::MalformedMessage("empty multibase string".into()))?;
    let body = chars.as_str();
    let decoded = match prefix {
        MULTIBASE_BASE58BTC => bs58::decode(body).into_vec().map_err(|e| e.to_string()),
        MULTIBASE_BASE64URL => URL_SAFE_NO_PAD.decode(body).map_err(|e| e.to_string()),
        MULTIBASE_BASE64 => STANDARD_NO_PAD.decode(body).map_err(|e| e.to_string()),
        MULTIBASE_BASE16 => {
            if body.bytes().any(|b| b.is_ascii_uppercase()) {
                Err("uppercase digits in base16 string".to_string())
            } else {
                hex::decode(body).map_err(|e| e.to_string())
            }
        }
        other => Err(format!("unknown multibase prefix {:?}", other)),
    };
    decoded.map_err(|e| CodecError::MalformedMessage(format!("invalid multibase {:?}: {}", text, e)))
}

fn read_uvarint(bytes: &[u8]) -> Result<(u64, &[u8]), CodecError> {
    varint_decode::u64(bytes)
        .map_err(|e| CodecError::MalformedMessage(format!("invalid multihash varint: {}", e)))
}

impl fmt::Display for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl FromStr for Promise {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Promise {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_text())
    }
}

impl<'de> Deserialize<'de> for Promise {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}
