use axum::Router;
use log::{error, info};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::FileManagerError;
use crate::protocol::{AppState, build_router};

pub struct Server {
    listener: TcpListener,
    router: Router,
    config: Arc<ServerConfig>,
}

impl Server {
    /// Binds the listener and prepares shared state.
    ///
    /// Fails if the socket or the storage root is unusable.
    pub async fn new(config: ServerConfig) -> Result<Self, FileManagerError> {
        let socket = config.listen_socket();

        let listener = match TcpListener::bind(&socket).await {
            Ok(listener) => {
                info!("Server bound to {}", socket);
                listener
            }
            Err(e) => {
                error!("Failed to bind to {}: {}", socket, e);
                return Err(e.into());
            }
        };

        let state = AppState::new(config)?;

        let config = Arc::clone(&state.config);
        let router = build_router(state);

        Ok(Self {
            listener,
            router,
            config,
        })
    }

    pub async fn start(self) -> Result<(), FileManagerError> {
        info!(
            "Starting RAX file manager on {} (max upload {} MB)",
            self.config.listen_socket(),
            self.config.max_upload_mb
        );

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
