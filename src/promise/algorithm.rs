//! Digest algorithms usable for promise derivation.
//!
//! Every algorithm carries its multihash code, so identifiers produced by
//! one algorithm stay decodable after others are added.

use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256};

use super::error::CodecError;

/// A named digest algorithm with a stable multihash code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum HashAlgorithm {
    /// SHA2-256, multihash code `0x12`. The default.
    #[default]
    Sha2_256,
    /// BLAKE3 with 32-byte output, multihash code `0x1e`.
    Blake3,
}

impl HashAlgorithm {
    /// All supported algorithms, in code order.
    pub const ALL: [HashAlgorithm; 2] = [HashAlgorithm::Sha2_256, HashAlgorithm::Blake3];

    /// The multihash code identifying this algorithm on the wire.
    pub const fn code(self) -> u64 {
        match self {
            Self::Sha2_256 => 0x12,
            Self::Blake3 => 0x1e,
        }
    }

    /// Look up an algorithm by multihash code.
    pub fn from_code(code: u64) -> Result<Self, CodecError> {
        Self::ALL
            .into_iter()
            .find(|algo| algo.code() == code)
            .ok_or_else(|| CodecError::UnsupportedAlgorithm(format!("multihash code {:#x}", code)))
    }

    /// Canonical name (multicodec table spelling).
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha2_256 => "sha2-256",
            Self::Blake3 => "blake3",
        }
    }

    /// Parse an algorithm name. Case-insensitive; `sha256` is accepted as
    /// an alias for `sha2-256`.
    pub fn from_name(name: &str) -> Result<Self, CodecError> {
        match name.to_ascii_lowercase().as_str() {
            "sha2-256" | "sha256" | "sha2_256" => Ok(Self::Sha2_256),
            "blake3" | "blake3-256" => Ok(Self::Blake3),
            _ => Err(CodecError::UnsupportedAlgorithm(name.to_string())),
        }
    }

    /// Length in bytes of the digests this algorithm produces.
    pub const fn digest_len(self) -> usize {
        match self {
            Self::Sha2_256 | Self::Blake3 => 32,
        }
    }

    /// Hash `data`.
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha2_256 => Sha256::digest(data).to_vec(),
            Self::Blake3 => blake3::hash(data).as_bytes().to_vec(),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}
