//! garden: headless client for the plant-care page.
//!
//! Run with:  `RUST_LOG=info garden`, then type commands such as
//! `water rose` or `show` on stdin.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Structured logging; RUST_LOG controls verbosity (default: info).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("garden v{} starting", env!("CARGO_PKG_VERSION"));

    garden_page::run().await.map_err(Into::into)
}
