//! Module system: pluggable capability units behind one contract.
//!
//! A **module** is offered every request that routes to it. It first
//! answers `accept` (a dry run), and only modules that accepted are asked to
//! `handle`. The kernel owns routing; modules never touch kernel state.
//!
//! # Architecture
//!
//! ```text
//! Kernel::dispatch()
//!   ↓  Module::accept(parms)          → Acceptance { will_handle, metadata }
//!   ↓  Module::handle(parms, payload) → result bytes | broken promise
//! ```
//!
//! [`CacheModule`] is the reference implementation.

pub mod cache;
pub mod error;
pub mod module;

// Re-exports
pub use cache::CacheModule;
pub use error::ModuleError;
pub use module::{Acceptance, Module, Parm};
