//! HTTP server setup.
//!
//! # Responsibilities
//! - Compile the application's route table into a [`Dispatcher`]
//! - Wire up middleware (tracing, timeout, request ID)
//! - Mount the admin introspection routes when enabled
//! - Apply configuration updates and recompile without restarting
//! - Serve until the shutdown signal

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::setup_admin_router;
use crate::app::App;
use crate::config::AppConfig;
use crate::error::RouterError;
use crate::http::dispatch::{dispatch, Dispatcher};
use crate::http::request::{MakeRequestUuidV4, X_REQUEST_ID};

/// HTTP server for an application.
pub struct HttpServer {
    app: App,
    dispatcher: Arc<ArcSwap<Dispatcher>>,
    router: Router,
}

impl HttpServer {
    /// Compile the application's routes. Fails on patterns the matcher
    /// cannot represent.
    pub fn new(app: App) -> Result<Self, RouterError> {
        let dispatcher = Dispatcher::compile(&app)?;
        tracing::info!(endpoints = dispatcher.endpoints(), "Route table compiled");

        let dispatcher = Arc::new(ArcSwap::from_pointee(dispatcher));
        let router = Self::build_router(&app.config(), &app, dispatcher.clone());
        Ok(Self {
            app,
            dispatcher,
            router,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, app: &App, dispatcher: Arc<ArcSwap<Dispatcher>>) -> Router {
        let mut router = Router::new().fallback(dispatch).with_state(dispatcher);
        if config.admin.enabled {
            router = router.merge(setup_admin_router(app.clone(), &config.admin));
        }

        router
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4))
    }

    /// The Axum router, for embedding or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    /// Apply a new configuration and recompile the route table.
    ///
    /// The previous table stays active if recompilation fails.
    pub fn reload(&self, config: AppConfig) -> Result<(), RouterError> {
        apply_reload(&self.app, &self.dispatcher, config)
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<AppConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.app.clone();
        let dispatcher = self.dispatcher.clone();
        tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                if let Err(e) = apply_reload(&app, &dispatcher, config) {
                    tracing::error!(error = %e, "Failed to recompile routes. Keeping current table.");
                }
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn apply_reload(
    app: &App,
    dispatcher: &ArcSwap<Dispatcher>,
    config: AppConfig,
) -> Result<(), RouterError> {
    let previous = app.reconfigure(config);
    let compiled = match Dispatcher::compile(app) {
        Ok(compiled) => compiled,
        Err(e) => {
            app.restore_config(previous);
            return Err(e);
        }
    };
    tracing::info!(endpoints = compiled.endpoints(), "Route table recompiled");
    dispatcher.store(Arc::new(compiled));
    Ok(())
}
