use axum::{extract::State, Json};
use serde::Serialize;

use crate::app::{App, RouteInfo};
use crate::routing::GroupInfo;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub app_name: String,
    pub routes: usize,
    pub groups: usize,
    pub request_methods: Vec<String>,
}

pub async fn get_status(State(app): State<App>) -> Json<SystemStatus> {
    let config = app.config();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        app_name: config.app_name.clone(),
        routes: app.routes().len(),
        groups: app.groups().len(),
        request_methods: config.request_methods.clone(),
    })
}

pub async fn get_routes(State(app): State<App>) -> Json<Vec<RouteInfo>> {
    Json(app.routes())
}

pub async fn get_groups(State(app): State<App>) -> Json<Vec<GroupInfo>> {
    Json(app.groups())
}
