//! Catalog sync server binary entry point
//!
//! Responsible for:
//! - loading the .env file
//! - creating the working directories
//! - initializing the logging system
//! - starting the server

use sync_server::{Config, Server, ServerState, init_logger_with_file};

/// Prepare the runtime environment (bin only)
fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    // .env support is a bin-level concern only
    dotenvy::dotenv().ok();

    let log_dir = "logs";
    if !std::path::Path::new(log_dir).exists() {
        std::fs::create_dir_all(log_dir)?;
    }

    let json_format = std::env::var("LOG_JSON")
        .unwrap_or_else(|_| "false".to_string())
        .parse()
        .unwrap_or(false);
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    init_logger_with_file(&log_level, json_format, Some(log_dir))?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_environment()?;

    tracing::info!("Catalog sync server starting...");

    let config = Config::from_env();
    let state = ServerState::initialize(&config).await?;

    let server = Server::with_state(config, state);
    let token = server.shutdown_token();

    // ctrl_c and server.run() race; whichever finishes first wins
    let result = tokio::select! {
        r = server.run() => r.map_err(|e| e.into()),
        _ = tokio::signal::ctrl_c() => {
            token.cancel();
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!("Server error: {}", e);
    }

    result
}
