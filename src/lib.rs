//! # PromiseGrid
//!
//! A microkernel message router. Every request carries a content-addressed
//! **promise** and an ordered list of parameters. The kernel looks the
//! parameters up in a syscall trie, asks the candidate modules whether they
//! will handle the request, and commits to the first one that keeps its
//! promise. Routes that work are learned back into the trie.
//!
//! - [`promise`] - promise derivation and the wire codec
//! - [`kernel`] - syscall trie and dispatch
//! - [`modules`] - the module contract and the cache module
//! - [`store`] - byte stores behind the cache
//! - [`server`] - HTTP transport
//! - [`config`] - environment configuration

pub mod config;
pub mod kernel;
pub mod modules;
pub mod promise;
pub mod server;
pub mod store;

pub use kernel::{Kernel, KernelError, Outcome, SyscallTrie};
pub use modules::{Acceptance, CacheModule, Module, ModuleError, Parm};
pub use promise::{decode, derive_promise, encode, CodecError, HashAlgorithm, Message, Promise};
pub use store::{ByteStore, FsStore, MemoryStore, StoreError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
