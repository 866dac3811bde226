/**
 * Team Activity Relay Entry Point
 *
 * Loads configuration, starts the relay and serves the WebSocket endpoint
 * until interrupted.
 */

#[cfg(feature = "ssr")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();

    tracing::info!("[STARTUP] Relay initialization started");

    let config = teamhub::shared::RelayConfig::load()?;

    // The relay subscribes before the listener is bound
    let app = teamhub::backend::server::create_app(&config).await?;

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("[STARTUP] Listening on {}", addr);

    let router = app.router.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("[STARTUP] Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("[STARTUP] Shutdown signal received");
        })
        .await?;

    app.shutdown().await;
    Ok(())
}

#[cfg(not(feature = "ssr"))]
fn main() {
    eprintln!("Server requires the 'ssr' feature to be enabled.");
    eprintln!("Run with: cargo run --bin teamhub-relay --features ssr");
    std::process::exit(1);
}
