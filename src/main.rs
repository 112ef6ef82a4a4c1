//! RAX File Manager - Entry Point
//!
//! A web file manager with public browsing and a single admin account.

use log::{error, info};
use std::process;

use rax_file_manager::error::{FileManagerError, handle_error};
use rax_file_manager::{Server, ServerConfig};

#[tokio::main]
async fn main() {
    // RUST_LOG overrides the default filter
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Launching file manager...");

    if let Err(e) = run().await {
        handle_error(&e);
        process::exit(1);
    }
}

async fn run() -> Result<(), FileManagerError> {
    let config =
        ServerConfig::load().inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    let server = Server::new(config).await?;
    server.start().await
}
