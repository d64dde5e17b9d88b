//! promisegrid HTTP server binary.
//!
//! Boots a kernel with the filesystem-backed cache module registered as a
//! root catch-all, and serves it over HTTP.
//!
//! # Environment Variables
//!
//! - `PORT` - HTTP port (default: 8080)
//! - `GRID_CACHE_DIR` - Cache root directory (default: "cache")
//! - `GRID_DISPATCH_TIMEOUT_MS` - Dispatch deadline, 0 to disable (default: 30000)
//! - `RUST_LOG` - Tracing filter (default: "info,promisegrid=debug")
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin server
//! ```

use std::sync::Arc;

use anyhow::Context;
use promisegrid::config::GridConfig;
use promisegrid::kernel::Kernel;
use promisegrid::modules::{CacheModule, Module};
use promisegrid::server::{app_router, AppState};
use promisegrid::store::FsStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,promisegrid=debug".into()),
        )
        .init();

    let config = GridConfig::from_env()?;
    let bind_addr = config.bind_addr();

    let mut kernel = Kernel::new();
    if let Some(timeout) = config.dispatch_timeout() {
        kernel = kernel.with_dispatch_timeout(timeout);
    }

    let store = Arc::new(FsStore::new(config.cache_dir.clone()));
    let cache = Arc::new(CacheModule::new(store));
    tracing::info!(
        "Cache module {} at {}",
        cache.module_id(),
        config.cache_dir.display()
    );
    kernel.register::<&str>(&[], cache);

    let app = app_router(AppState::new(Arc::new(kernel)));

    tracing::info!("promisegrid server starting on {}", bind_addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health   - liveness probe");
    tracing::info!("  POST /dispatch - wire message dispatch");
    tracing::info!("  GET  /routes   - syscall trie routes");

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    axum::serve(listener, app).await.context("Server failed")?;
    Ok(())
}
