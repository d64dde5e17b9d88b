//! Content-addressed cache module.
//!
//! Derives a storage key from the request itself, never from mutable
//! state, so the same request always re-derives the same key:
//!
//! ```text
//! hex(promise-id) "/" hex(module-id) { "/" percent-encode(arg) }
//! ```
//!
//! Arguments are percent-encoded so a `/` inside an argument can never be
//! confused with a key separator.

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use percent_encoding::{percent_encode, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::json;

use super::error::ModuleError;
use super::module::{Acceptance, Module, Parm};
use crate::promise::decode_multibase;
use crate::store::{ByteStore, StoreError};

/// Everything except RFC 3986 unreserved characters is escaped.
const ARG_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Cache module over an injected [`ByteStore`].
pub struct CacheModule {
    store: Arc<dyn ByteStore>,
}

impl CacheModule {
    pub const NAME: &'static str = "cache";

    pub fn new(store: Arc<dyn ByteStore>) -> Self {
        Self { store }
    }

    /// Build the cache key for a request.
    ///
    /// `parms[0]` is the promise identifier and `parms[1]` the module
    /// identifier, either as raw bytes or as a multibase string (the form
    /// identifiers take on the wire). Remaining parameters are appended as
    /// percent-encoded path segments.
    pub fn cache_key(parms: &[Parm]) -> Result<String, ModuleError> {
        if parms.len() < 2 {
            return Err(ModuleError::InvalidArguments(format!(
                "need a promise id and a module id, got {} argument(s)",
                parms.len()
            )));
        }

        let promise_id = identifier_bytes(&parms[0], "promise id")?;
        let module_id = identifier_bytes(&parms[1], "module id")?;

        let mut key = String::with_capacity(2 * (promise_id.len() + module_id.len()) + 1);
        key.push_str(&hex::encode(promise_id));
        key.push('/');
        key.push_str(&hex::encode(module_id));

        for (offset, arg) in parms[2..].iter().enumerate() {
            key.push('/');
            key.push_str(&encode_arg(arg, offset + 2)?);
        }
        Ok(key)
    }

    /// Read the bytes cached under `key`.
    pub async fn load(&self, key: &str) -> Result<Vec<u8>, ModuleError> {
        match self.store.get(key).await {
            Ok(bytes) => Ok(bytes),
            Err(StoreError::NotFound(k)) => Err(ModuleError::CacheMiss(k)),
            Err(e) => Err(e.into()),
        }
    }

    /// Write `bytes` under `key`. Idempotent.
    pub async fn store(&self, key: &str, bytes: &[u8]) -> Result<(), ModuleError> {
        self.store.put(key, bytes).await?;
        Ok(())
    }
}

fn identifier_bytes<'a>(parm: &'a Parm, what: &str) -> Result<Cow<'a, [u8]>, ModuleError> {
    match parm {
        Parm::Bytes(b) if !b.is_empty() => Ok(Cow::Borrowed(b)),
        Parm::Bytes(_) => Err(ModuleError::InvalidArguments(format!("{} is empty", what))),
        Parm::Text(s) => decode_multibase(s).map(Cow::Owned).map_err(|e| {
            ModuleError::InvalidArguments(format!("{} is not a binary identifier: {}", what, e))
        }),
    }
}

fn encode_arg(arg: &Parm, position: usize) -> Result<String, ModuleError> {
    let encoded = match arg {
        Parm::Text(s) => utf8_percent_encode(s, ARG_ENCODE_SET).to_string(),
        Parm::Bytes(b) => percent_encode(b, ARG_ENCODE_SET).to_string(),
    };
    match encoded.as_str() {
        "" => Err(ModuleError::InvalidArguments(format!(
            "argument {} is empty",
            position
        ))),
        // `.` is unreserved, but a bare `.` or `..` segment is a relative path.
        "." | ".." => Ok(encoded.replace('.', "%2E")),
        _ => Ok(encoded),
    }
}

#[async_trait]
impl Module for CacheModule {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn accept(&self, parms: &[Parm]) -> Result<Acceptance, ModuleError> {
        if parms.len() < 2 {
            return Ok(Acceptance::decline(json!({
                "info": "local cache",
                "reason": "need a promise id and a module id",
            })));
        }
        Ok(Acceptance::accept(json!({ "info": "local cache" })))
    }

    async fn handle(&self, parms: &[Parm], payload: Option<&[u8]>) -> Result<Vec<u8>, ModuleError> {
        let key = Self::cache_key(parms)?;
        match payload {
            Some(bytes) => {
                self.store(&key, bytes).await?;
                Ok(bytes.to_vec())
            }
            None => self.load(&key).await,
        }
    }
}
