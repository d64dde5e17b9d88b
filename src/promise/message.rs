//! Message wire codec.
//!
//! A message is a promise followed by zero or more parameters, separated by
//! single spaces. An optional payload follows a blank line:
//!
//! ```text
//! <encoded-promise> <parm1> <parm2> ...[\n\n<payload-bytes>]
//! ```
//!
//! Payload presence is marked by the blank line itself, never inferred from
//! the payload content, so an empty payload survives a round trip.

use super::algorithm::HashAlgorithm;
use super::error::CodecError;
use super::promise::Promise;

/// Separator between the header line and the payload.
pub const PAYLOAD_SEPARATOR: &[u8] = b"\n\n";

/// The unit of routing: a promise, ordered parameters and an optional
/// opaque payload. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    promise: Promise,
    parms: Vec<String>,
    payload: Option<Vec<u8>>,
}

impl Message {
    /// Build a message, deriving its promise from a description.
    ///
    /// # Arguments
    ///
    /// * `description` - Human-readable promise text.
    /// * `algorithm` - Digest algorithm name, e.g. `"sha256"`.
    /// * `parms` - Ordered parameters (the routing path).
    /// * `payload` - Optional opaque payload.
    pub fn new(
        description: &str,
        algorithm: &str,
        parms: Vec<String>,
        payload: Option<Vec<u8>>,
    ) -> Result<Self, CodecError> {
        let algorithm = HashAlgorithm::from_name(algorithm)?;
        Ok(Self::from_parts(Promise::derive(description, algorithm), parms, payload))
    }

    /// Build a message from an existing promise.
    pub fn from_parts(promise: Promise, parms: Vec<String>, payload: Option<Vec<u8>>) -> Self {
        Self {
            promise,
            parms,
            payload,
        }
    }

    pub fn promise(&self) -> &Promise {
        &self.promise
    }

    pub fn parms(&self) -> &[String] {
        &self.parms
    }

    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    /// Shorthand for [`encode`].
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        encode(self)
    }

    /// Shorthand for [`decode`].
    pub fn from_bytes(data: &[u8]) -> Result<Self, CodecError> {
        decode(data)
    }
}

/// Render a message in wire form.
///
/// Fails with [`CodecError::InvalidParameter`] if a parameter is empty or
/// contains whitespace; the wire form has no escaping.
pub fn encode(message: &Message) -> Result<Vec<u8>, CodecError> {
    for (index, parm) in message.parms.iter().enumerate() {
        if parm.is_empty() || parm.chars().any(char::is_whitespace) {
            return Err(CodecError::InvalidParameter {
                index,
                parameter: parm.clone(),
            });
        }
    }

    let mut header = message.promise.to_text();
    for parm in &message.parms {
        header.push(' ');
        header.push_str(parm);
    }

    let mut buf = header.into_bytes();
    if let Some(payload) = &message.payload {
        buf.reserve(PAYLOAD_SEPARATOR.len() + payload.len());
        buf.extend_from_slice(PAYLOAD_SEPARATOR);
        buf.extend_from_slice(payload);
    }
    Ok(buf)
}

/// Parse a message from wire form.
///
/// Splits on the first blank line; the header is split on whitespace, its
/// first token is the promise and the rest are parameters.
pub fn decode(data: &[u8]) -> Result<Message, CodecError> {
    let (header, payload) = match data
        .windows(PAYLOAD_SEPARATOR.len())
        .position(|w| w == PAYLOAD_SEPARATOR)
    {
        Some(pos) => (&data[..pos], Some(data[pos + PAYLOAD_SEPARATOR.len()..].to_vec())),
        None => (data, None),
    };

    let header = std::str::from_utf8(header)
        .map_err(|e| CodecError::MalformedMessage(format!("header is not UTF-8: {}", e)))?;
    let mut tokens = header.split_whitespace();
    let promise_token = tokens
        .next()
        .ok_or_else(|| CodecError::MalformedMessage("missing promise hash".into()))?;
    let promise = Promise::parse(promise_token)
        .map_err(|e| CodecError::MalformedMessage(format!("invalid promise token: {}", e)))?;
    let parms = tokens.map(str::to_string).collect();

    Ok(Message {
        promise,
        parms,
        payload,
    })
}
