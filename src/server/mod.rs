//! HTTP transport for the kernel.
//!
//! Exposes [`Kernel::dispatch`](crate::kernel::Kernel::dispatch) over HTTP so
//! remote callers can send wire messages to the grid.
//!
//! # Endpoints
//!
//! - `GET  /health`   - Liveness probe
//! - `POST /dispatch` - Dispatch a wire message
//! - `GET  /routes`   - Inspect the syscall trie

pub mod routes;

pub use routes::{app_router, AppState};
