pub mod api;
pub mod openapi;

use std::error::Error;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::config::{ reload, Settings };
use crate::logging::Logger;
use self::api::{ build_router, AppState };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    Signal,
    SettingsChanged,
}

pub struct Server {
    settings: Settings,
    state: AppState,
    logger: Arc<Logger>,
}

impl Server {
    pub fn new(settings: Settings, state: AppState, logger: Arc<Logger>) -> Self {
        Self {
            settings,
            state,
            logger,
        }
    }

    /// Serves until `shutdown` resolves, then drains in-flight requests and
    /// reports why it stopped.
    pub async fn run<F>(self, shutdown: F) -> Result<ShutdownReason, Box<dyn Error + Send + Sync>>
        where F: Future<Output = ShutdownReason> + Send + 'static
    {
        let addr = self.settings.bind_addr();
        let listener = TcpListener::bind(&addr).await.map_err(|e| {
            self.logger.error(format_args!("Failed to bind HTTP server to {}: {}", addr, e));
            e
        })?;
        self.logger.info(format_args!("Starting HTTP API server on: http://{}", addr));

        let app = build_router(self.state, &self.settings.allowed_origins);
        let (reason_tx, reason_rx) = oneshot::channel();

        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(async move {
                let reason = shutdown.await;
                let _ = reason_tx.send(reason);
            }).await?;

        let reason = reason_rx.await.unwrap_or(ShutdownReason::Signal);
        self.logger.info(format_args!("HTTP server stopped ({:?})", reason));
        Ok(reason)
    }
}

/// Resolves on Ctrl-C, or when `watch` is given and that settings file changes.
pub async fn shutdown_signal(watch: Option<PathBuf>, poll: Duration) -> ShutdownReason {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
        ShutdownReason::Signal
    };

    match watch {
        Some(path) => {
            tokio::select! {
                reason = ctrl_c => reason,
                _ = reload::wait_for_change(&path, poll) => ShutdownReason::SettingsChanged,
            }
        }
        None => ctrl_c.await,
    }
}
