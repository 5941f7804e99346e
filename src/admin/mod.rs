//! Admin introspection API.
//!
//! Read-only JSON views of an application's route table and groups,
//! protected by a bearer token.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use crate::app::App;
use crate::config::AdminConfig;
use crate::routing::path::group_path;
use self::auth::admin_auth_middleware;
use self::handlers::*;

pub fn setup_admin_router(app: App, config: &AdminConfig) -> Router {
    let base = group_path(&config.bind_path, "");
    let api_key: Arc<str> = Arc::from(config.api_key.as_str());

    Router::new()
        .route(&group_path(&base, "status"), get(get_status))
        .route(&group_path(&base, "routes"), get(get_routes))
        .route(&group_path(&base, "groups"), get(get_groups))
        .layer(middleware::from_fn_with_state(api_key, admin_auth_middleware))
        .with_state(app)
}
