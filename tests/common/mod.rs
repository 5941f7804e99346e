//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::IntoResponse;
use axum::Router;
use tower::ServiceExt;

use route_groups::{Ctx, Handler};

/// Handler answering with a fixed body.
pub fn text(body: &'static str) -> Handler {
    Handler::new(move |_ctx: Ctx| async move { Ok(body.into_response()) })
}

/// Middleware that appends `label` to `log` and continues the chain.
pub fn trace(label: &'static str, log: &Arc<Mutex<Vec<&'static str>>>) -> Handler {
    let log = log.clone();
    Handler::new(move |ctx: Ctx| {
        log.lock().unwrap().push(label);
        ctx.next()
    })
}

/// Handler that does nothing but continue the chain.
pub fn pass() -> Handler {
    Handler::new(|ctx: Ctx| ctx.next())
}

pub fn new_log() -> Arc<Mutex<Vec<&'static str>>> {
    Arc::new(Mutex::new(Vec::new()))
}

/// Send one request through the router and collect status and body.
pub async fn send(router: &Router, method: &str, uri: &str) -> (StatusCode, String) {
    send_request(
        router,
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

pub async fn send_request(router: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}
