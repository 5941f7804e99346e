//! End-to-end dispatch through the axum router built by `HttpServer`.

use std::fs;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::IntoResponse;
use tower::ServiceExt;

use route_groups::http::X_REQUEST_ID;
use route_groups::{
    App, AppConfig, Ctx, Handler, HandlerError, HttpServer, Router, StaticConfig, UseArg,
};

mod common;

#[tokio::test]
async fn test_middleware_runs_outer_to_inner() {
    let log = common::new_log();
    let app = App::default();
    app.use_([UseArg::from(common::trace("app", &log))]);

    let api = app.group("/api", &[common::trace("group", &log)]).unwrap();
    api.get("/x", common::text("x"), &[common::trace("route", &log)]);
    // Registered after the route, so it does not wrap it.
    api.use_([UseArg::from(common::trace("late", &log))]);

    let server = HttpServer::new(app).unwrap();
    let (status, body) = common::send(&server.router(), "GET", "/api/x").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "x");
    assert_eq!(*log.lock().unwrap(), vec!["app", "group", "route"]);
}

#[tokio::test]
async fn test_group_middleware_scoped_to_prefix() {
    let log = common::new_log();
    let app = App::default();
    let admin = app.group("/admin", &[common::trace("admin", &log)]).unwrap();
    admin.get("/panel", common::text("panel"), &[]);
    app.get("/public", common::text("public"), &[]);

    let server = HttpServer::new(app).unwrap();
    let router = server.router();

    assert_eq!(common::send(&router, "GET", "/public").await.1, "public");
    assert!(log.lock().unwrap().is_empty());

    assert_eq!(common::send(&router, "GET", "/admin/panel").await.1, "panel");
    assert_eq!(*log.lock().unwrap(), vec!["admin"]);
}

#[tokio::test]
async fn test_path_parameters() {
    let app = App::default();
    let users = app.group("/users", &[]).unwrap();
    users.get(
        "/:id",
        Handler::new(|ctx: Ctx| async move {
            let body = format!("{} via {}", ctx.param("id").unwrap_or("?"), ctx.route_path());
            Ok(body.into_response())
        }),
        &[],
    );
    app.get(
        "/files/*",
        Handler::new(|ctx: Ctx| async move {
            Ok(format!("[{}]", ctx.param("*").unwrap_or("")).into_response())
        }),
        &[],
    );

    let server = HttpServer::new(app).unwrap();
    let router = server.router();

    assert_eq!(
        common::send(&router, "GET", "/users/7").await,
        (StatusCode::OK, "7 via /users/:id".to_string())
    );
    assert_eq!(common::send(&router, "GET", "/files/a/b.txt").await.1, "[a/b.txt]");
    assert_eq!(common::send(&router, "GET", "/files").await.1, "[]");
}

#[tokio::test]
async fn test_not_found_and_method_not_allowed() {
    let app = App::default();
    app.get("/only-get", common::text("ok"), &[]);

    let server = HttpServer::new(app).unwrap();
    let router = server.router();

    assert_eq!(
        common::send(&router, "GET", "/missing").await,
        (StatusCode::NOT_FOUND, "Cannot GET /missing".to_string())
    );
    assert_eq!(
        common::send(&router, "POST", "/only-get").await.0,
        StatusCode::METHOD_NOT_ALLOWED
    );
    assert_eq!(common::send(&router, "HEAD", "/only-get").await.0, StatusCode::OK);
}

#[tokio::test]
async fn test_handler_errors_use_default_handler() {
    let app = App::default();
    app.get(
        "/teapot",
        Handler::new(|_ctx: Ctx| async move {
            Err(HandlerError::new(StatusCode::IM_A_TEAPOT, "short and stout"))
        }),
        &[],
    );

    let server = HttpServer::new(app).unwrap();
    assert_eq!(
        common::send(&server.router(), "GET", "/teapot").await,
        (StatusCode::IM_A_TEAPOT, "short and stout".to_string())
    );
}

#[tokio::test]
async fn test_mounted_app_error_handler_scope() {
    let sub = App::default();
    sub.get("/ping", common::text("pong"), &[]);
    sub.set_error_handler(|err| {
        (StatusCode::BAD_REQUEST, format!("sub: {err}")).into_response()
    });

    let app = App::default();
    let api = app.group("/api", &[]).unwrap();
    api.use_([UseArg::from("/sub"), UseArg::from(sub)]);

    let server = HttpServer::new(app).unwrap();
    let router = server.router();

    assert_eq!(common::send(&router, "GET", "/api/sub/ping").await.1, "pong");
    assert_eq!(
        common::send(&router, "GET", "/api/sub/nope").await,
        (StatusCode::BAD_REQUEST, "sub: Cannot GET /api/sub/nope".to_string())
    );
    assert_eq!(
        common::send(&router, "GET", "/api/nope").await.0,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_trailing_slash_and_reload() {
    let app = App::default();
    app.get("/users", common::text("users"), &[]);

    let server = HttpServer::new(app.clone()).unwrap();
    let router = server.router();
    assert_eq!(common::send(&router, "GET", "/users/").await.0, StatusCode::OK);

    // Routes added after startup appear on the next reload.
    app.get("/late", common::text("late"), &[]);
    assert_eq!(common::send(&router, "GET", "/late").await.0, StatusCode::NOT_FOUND);

    let mut config = AppConfig::default();
    config.strict_routing = true;
    server.reload(config).unwrap();

    assert_eq!(common::send(&router, "GET", "/late").await.1, "late");
    assert_eq!(common::send(&router, "GET", "/users/").await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_static_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("hello.txt"), "hello from disk").unwrap();
    fs::create_dir(dir.path().join("docs")).unwrap();
    fs::write(dir.path().join("docs").join("index.html"), "<h1>docs</h1>").unwrap();

    let app = App::default();
    let web = app.group("/web", &[]).unwrap();
    web.static_files(
        "/public",
        dir.path(),
        StaticConfig {
            max_age_secs: 60,
            ..StaticConfig::default()
        },
    );

    let server = HttpServer::new(app).unwrap();
    let router = server.router();

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/web/public/hello.txt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CACHE_CONTROL], "public, max-age=60");

    assert_eq!(
        common::send(&router, "GET", "/web/public/docs/").await.1,
        "<h1>docs</h1>"
    );
    assert_eq!(
        common::send(&router, "GET", "/web/public/absent.txt").await.0,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_request_id_is_set() {
    let app = App::default();
    app.get("/", common::text("root"), &[]);
    let server = HttpServer::new(app).unwrap();

    let response = server
        .router()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let id = response.headers()[X_REQUEST_ID].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(id).is_ok());
}

#[tokio::test]
async fn test_admin_api_requires_key() {
    let mut config = AppConfig::default();
    config.admin.enabled = true;
    config.admin.api_key = "secret".into();

    let app = App::new(config);
    let api = app.group("/api", &[]).unwrap();
    api.name("api.").unwrap();
    api.get("/ping", common::text("pong"), &[]);
    api.name("ping").unwrap();

    let server = HttpServer::new(app).unwrap();
    let router = server.router();

    assert_eq!(
        common::send(&router, "GET", "/admin/routes").await.0,
        StatusCode::UNAUTHORIZED
    );

    let (status, body) = common::send_request(
        &router,
        Request::builder()
            .uri("/admin/routes")
            .header(header::AUTHORIZATION, "Bearer secret")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let routes: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(routes[0]["name"], "api.ping");
    assert_eq!(routes[0]["path"], "/api/ping");
    assert_eq!(routes[0]["kind"], "handler");
}

#[tokio::test]
async fn test_middleware_prefix_answers_without_a_route() {
    let app = App::default();
    app.use_([UseArg::from("/health"), UseArg::from(common::text("ok"))]);
    app.get("/other", common::text("other"), &[]);

    let server = HttpServer::new(app).unwrap();
    let router = server.router();

    assert_eq!(
        common::send(&router, "GET", "/health").await,
        (StatusCode::OK, "ok".to_string())
    );
    assert_eq!(common::send(&router, "POST", "/health/deep").await.1, "ok");
    assert_eq!(common::send(&router, "GET", "/healthz").await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_root_middleware_runs_for_unmatched_requests() {
    let log = common::new_log();
    let app = App::default();
    app.use_([UseArg::from(common::trace("logger", &log))]);
    app.get("/users/:id", common::text("user"), &[]);

    let server = HttpServer::new(app).unwrap();
    let router = server.router();

    assert_eq!(
        common::send(&router, "GET", "/nowhere").await,
        (StatusCode::NOT_FOUND, "Cannot GET /nowhere".to_string())
    );
    assert_eq!(
        common::send(&router, "DELETE", "/users/1").await.0,
        StatusCode::METHOD_NOT_ALLOWED
    );
    assert_eq!(*log.lock().unwrap(), vec!["logger", "logger"]);
}

#[tokio::test]
async fn test_failed_reload_keeps_previous_config() {
    let app = App::default();
    app.get("/items/:id", common::text("item"), &[]);
    let server = HttpServer::new(app.clone()).unwrap();
    let router = server.router();

    // Same position, different parameter name: the matcher rejects it.
    app.get("/items/:name", common::text("other"), &[]);

    let mut config = AppConfig::default();
    config.request_methods = vec!["GET".into()];
    assert!(server.reload(config).is_err());

    assert_eq!(app.config().request_methods.len(), 9);
    assert_eq!(common::send(&router, "GET", "/items/1").await.1, "item");
}
