//! Per-request context handed through a handler chain.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};

use crate::http::handler::{Handler, HandlerError, HandlerResult};
use crate::http::request::RequestIdExt;

/// Name under which `*` wildcards are captured.
pub(crate) const STAR_PARAM: &str = "__star";
/// Name under which `+` wildcards are captured.
pub(crate) const PLUS_PARAM: &str = "__plus";

/// Request context.
///
/// Owns the request while it travels through the chain built for the matched
/// route: `USE` middleware first, then route middleware, then the handler.
pub struct Ctx {
    request: Request<Body>,
    params: Vec<(String, String)>,
    chain: Arc<[Handler]>,
    index: usize,
    route_path: Arc<str>,
}

impl Ctx {
    pub(crate) fn new(
        request: Request<Body>,
        params: Vec<(String, String)>,
        chain: Arc<[Handler]>,
        route_path: Arc<str>,
    ) -> Self {
        Self {
            request,
            params,
            chain,
            index: 0,
            route_path,
        }
    }

    /// Run the next handler in the chain.
    ///
    /// Returns [`HandlerError::NotFound`] once the chain is exhausted.
    pub async fn next(mut self) -> HandlerResult {
        match self.chain.get(self.index).cloned() {
            Some(handler) => {
                self.index += 1;
                handler.call(self).await
            }
            None => Err(HandlerError::NotFound {
                method: self.request.method().to_string(),
                path: self.request.uri().path().to_string(),
            }),
        }
    }

    pub fn request(&self) -> &Request<Body> {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut Request<Body> {
        &mut self.request
    }

    /// Give up the request. The chain cannot continue afterwards.
    pub fn into_request(self) -> Request<Body> {
        self.request
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn path(&self) -> &str {
        self.request.uri().path()
    }

    /// Registered pattern of the matched route, e.g. `/users/:id`.
    pub fn route_path(&self) -> &str {
        &self.route_path
    }

    /// Path parameter by name. Wildcards are available as `*` and `+`.
    pub fn param(&self, name: &str) -> Option<&str> {
        let key = match name {
            "*" => STAR_PARAM,
            "+" => PLUS_PARAM,
            other => other,
        };
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request.request_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    fn request(path: &str) -> Request<Body> {
        Request::builder().uri(path).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_chain_runs_in_order() {
        let chain: Arc<[Handler]> = Arc::from(vec![
            Handler::new(|mut ctx: Ctx| async move {
                ctx.request_mut().headers_mut().insert("x-seen", "1".parse().unwrap());
                ctx.next().await
            }),
            Handler::new(|ctx: Ctx| async move {
                let seen = ctx.request().headers().contains_key("x-seen");
                Ok(format!("seen={seen} id={}", ctx.param("id").unwrap_or("-")).into_response())
            }),
        ]);
        let ctx = Ctx::new(
            request("/users/7"),
            vec![("id".to_string(), "7".to_string())],
            chain,
            Arc::from("/users/:id"),
        );

        let response = ctx.next().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"seen=true id=7");
    }

    #[tokio::test]
    async fn test_exhausted_chain_is_not_found() {
        let chain: Arc<[Handler]> = Arc::from(vec![Handler::new(|ctx: Ctx| ctx.next())]);
        let ctx = Ctx::new(request("/nothing"), Vec::new(), chain, Arc::from("/nothing"));

        let err = ctx.next().await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Cannot GET /nothing");
    }

    #[test]
    fn test_wildcard_params() {
        let ctx = Ctx::new(
            request("/files/a/b"),
            vec![(STAR_PARAM.to_string(), "a/b".to_string())],
            Arc::from(Vec::new()),
            Arc::from("/files/*"),
        );
        assert_eq!(ctx.param("*"), Some("a/b"));
        assert_eq!(ctx.param("+"), None);
    }
}
