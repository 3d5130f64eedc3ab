use std::env;

use anyhow::Result;
use mentor_api::build_app;
use mentor_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("mentor_api");

    let bind = env::var("MENTOR_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let app = build_app();

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(bind = %bind, "finmentor api started");

    axum::serve(listener, app).await?;
    Ok(())
}
