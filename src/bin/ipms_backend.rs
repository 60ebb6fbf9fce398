//! Reference backend for local development
//!
//! Usage: `ipms-backend [ADDR]` (default `127.0.0.1:8080`). Log verbosity
//! follows `RUST_LOG`.

use anyhow::Result;
use ipms::server::Backend;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:8080".to_string());

    Backend::new().serve(&addr).await
}
