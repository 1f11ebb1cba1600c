//! A minimal Plaza deployment: a 600x400 field where browser clients
//! wander around with W/A/S/D.
//!
//! Configuration comes from the environment:
//!   WANDER_ADDR   — bind address (default 0.0.0.0:8080)
//!   WANDER_SECRET — server secret for credential derivation (required)
//!   RUST_LOG      — tracing filter (default "info")

use plaza::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::var("WANDER_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let secret = std::env::var("WANDER_SECRET")
        .map_err(|_| "WANDER_SECRET must be set")?;

    let server = PlazaServerBuilder::new()
        .bind(&addr)
        .secret(secret)
        .field_config(FieldConfig::default())
        .build()
        .await?;

    tracing::info!(%addr, "wander field open");
    server.run().await?;
    Ok(())
}
