//! Demo server for the route group framework.
//!
//! Usage: `route-groups [config.toml]`. Without a path the defaults are
//! used and hot reload is disabled.

use std::path::PathBuf;

use axum::response::IntoResponse;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use route_groups::config::{load_config, watcher::ConfigWatcher};
use route_groups::lifecycle::signals::spawn_signal_listener;
use route_groups::observability::{logging, metrics};
use route_groups::{
    App, AppConfig, Ctx, Handler, HttpServer, Router, Shutdown, StaticConfig, UseArg,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = match &config_path {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    logging::init(&config.observability);
    tracing::info!(app_name = %config.app_name, "route-groups v0.1.0 starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let bind_address = config.listener.bind_address.clone();
    let app = App::new(config);
    build_routes(&app)?;

    let server = HttpServer::new(app)?;
    let listener = TcpListener::bind(&bind_address).await?;

    // Keep the notify watcher alive for the lifetime of the server.
    let (_watcher, config_updates) = match &config_path {
        Some(path) => {
            let (watcher, rx) = ConfigWatcher::new(path);
            (Some(watcher.run()?), rx)
        }
        None => {
            let (_tx, rx) = mpsc::unbounded_channel();
            (None, rx)
        }
    };

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone());
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn build_routes(app: &App) -> Result<(), Box<dyn std::error::Error>> {
    app.use_([UseArg::from(Handler::new(|ctx: Ctx| async move {
        let path = ctx.path().to_string();
        let response = ctx.next().await;
        tracing::debug!(%path, "Request handled");
        response
    }))]);

    app.get("/", text("route-groups demo"), &[]);
    app.name("home")?;

    let api = app.group("/api", &[])?;
    let v1 = api.group("/v1", &[])?;
    v1.name("v1.")?;

    let users = v1.group("/users", &[])?;
    users.name("users.")?;
    users.get("/", text("user list"), &[]);
    users.name("list")?;
    users.get(
        "/:id",
        Handler::new(|ctx: Ctx| async move {
            let id = ctx.param("id").unwrap_or_default().to_string();
            Ok(format!("user {id}").into_response())
        }),
        &[],
    );
    users.name("show")?;

    if let Ok(root) = std::env::current_dir() {
        app.static_files("/public", root.join("public"), StaticConfig::default());
    }

    Ok(())
}

fn text(body: &'static str) -> Handler {
    Handler::new(move |_ctx: Ctx| async move { Ok(body.into_response()) })
}
