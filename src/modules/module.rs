//! The module capability contract.
//!
//! A module is roughly an application in a microkernel: the kernel offers
//! it a request, the module says whether it will take it (`accept`), and
//! only then is it asked to do the work (`handle`). New kinds of module
//! are added by implementing [`Module`]; the kernel never changes.

use std::borrow::Cow;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::ModuleError;
use crate::promise::{HashAlgorithm, Promise};

// ---------------------------------------------------------------------------
// Parm
// ---------------------------------------------------------------------------

/// A request parameter: a string token or raw bytes.
///
/// String tokens form trie paths; bytes carry identifiers and content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Parm {
    Text(String),
    Bytes(Vec<u8>),
}

impl Parm {
    /// The string form used as a trie path token.
    ///
    /// Text is used verbatim; bytes are rendered as lowercase hex. The two
    /// are not tagged, so `Bytes([0xab])` and `Text("ab")` walk the same
    /// trie edge and share learned routes. Wire parameters are always text,
    /// which keeps a byte parameter reachable from the wire by its hex form.
    pub fn token(&self) -> Cow<'_, str> {
        match self {
            Self::Text(s) => Cow::Borrowed(s),
            Self::Bytes(b) => Cow::Owned(hex::encode(b)),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Bytes(_) => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Text(_) => None,
            Self::Bytes(b) => Some(b),
        }
    }

    /// Convert wire parameters (always text) into `Parm`s.
    pub fn from_wire(parms: &[String]) -> Vec<Parm> {
        parms.iter().cloned().map(Parm::Text).collect()
    }
}

impl fmt::Display for Parm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token())
    }
}

impl From<&str> for Parm {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Parm {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Vec<u8>> for Parm {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl From<&[u8]> for Parm {
    fn from(b: &[u8]) -> Self {
        Self::Bytes(b.to_vec())
    }
}

/// A promise travels as its binary multihash.
impl From<&Promise> for Parm {
    fn from(p: &Promise) -> Self {
        Self::Bytes(p.to_multihash())
    }
}

// ---------------------------------------------------------------------------
// Acceptance
// ---------------------------------------------------------------------------

/// A module's answer to `accept`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Acceptance {
    /// Whether the module will attempt `handle`.
    pub will_handle: bool,
    /// Free-form information about the answer.
    #[serde(default)]
    pub metadata: Value,
}

impl Acceptance {
    /// Agree to handle the request.
    pub fn accept(metadata: Value) -> Self {
        Self {
            will_handle: true,
            metadata,
        }
    }

    /// Decline the request.
    pub fn decline(metadata: Value) -> Self {
        Self {
            will_handle: false,
            metadata,
        }
    }
}

// ---------------------------------------------------------------------------
// Module trait
// ---------------------------------------------------------------------------

/// A pluggable capability unit.
///
/// # Contract
///
/// - `accept` is a dry run. It MUST NOT change durable state. An `Err` is
///   treated by the kernel exactly like a decline.
/// - `handle` performs the effect. It MAY fail even after accepting; the
///   kernel logs that as a broken promise and tries the next candidate.
#[async_trait]
pub trait Module: Send + Sync {
    /// Human-readable name for logging and route listings.
    fn name(&self) -> &str;

    /// Content-addressed identity of this module.
    fn module_id(&self) -> Promise {
        Promise::derive(&format!("module:{}", self.name()), HashAlgorithm::Sha2_256)
    }

    /// Decide whether to handle a request with these parameters.
    async fn accept(&self, parms: &[Parm]) -> Result<Acceptance, ModuleError>;

    /// Handle the request and return the result payload.
    async fn handle(&self, parms: &[Parm], payload: Option<&[u8]>) -> Result<Vec<u8>, ModuleError>;
}

impl fmt::Debug for dyn Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module").field("name", &self.name()).finish()
    }
}
