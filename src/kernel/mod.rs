//! Kernel: routes promise-bearing messages to modules.
//!
//! The kernel owns exactly one piece of mutable state, the [`SyscallTrie`].
//! Everything else (storage, caching, transport) lives in modules or at
//! the edges.
//!
//! # Modules
//!
//! - [`trie`] - `SyscallTrie`, literal-prefix matching over parameter paths
//! - [`kernel`] - `Kernel`, negotiation and commit
//! - [`error`] - `KernelError`

pub mod error;
pub mod kernel;
pub mod trie;

// Re-exports
pub use error::{KernelError, Phase};
pub use kernel::{Kernel, Outcome};
pub use trie::{Route, SyscallNode, SyscallTrie};
