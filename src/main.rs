use std::io;

use anyhow::Result;
use plotgate::{Config, server::Server};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Logs go to stderr, filtered by `RUST_LOG` (default `info`).
fn init_tracing() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

  tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
  init_tracing();

  let config = Config::load()?;
  info!(users = config.credentials.len(), "configuration loaded");

  Server::new(&config)?.serve().await
}
