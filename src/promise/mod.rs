//! Promise codec: content-addressed identity for messages.
//!
//! # Modules
//!
//! - [`algorithm`] - `HashAlgorithm`, the digest algorithms and their multihash codes
//! - [`promise`] - `Promise`, `derive_promise`, multibase text form
//! - [`message`] - `Message` and the wire `encode` / `decode` pair
//! - [`error`] - `CodecError`

pub mod algorithm;
pub mod error;
pub mod message;
pub mod promise;

pub use algorithm::HashAlgorithm;
pub use error::CodecError;
pub use message::{decode, encode, Message};
pub use promise::{decode_multibase, derive_promise, Promise};
