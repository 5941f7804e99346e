//! Compiles a route table into a request dispatcher.
//!
//! # Responsibilities
//! - Translate route patterns (`:id`, `:id?`, `*`, `+`) into matcher patterns
//! - Build the handler chain of every route: earlier `USE` middleware whose
//!   path covers the route, then route middleware, then the handler
//! - Run covering `USE` middleware for requests no route accepts
//! - Serve static directories through `ServeDir`
//! - Pick the error handler by mount scope
//!
//! # Design Decisions
//! - Compiled once per table snapshot; recompiled on reload, never mutated
//! - First registration of a method on a path wins
//! - HEAD falls back to GET
//! - `USE` prefixes are not inserted into the matcher: a catch-all at `/`
//!   would conflict with parameter routes. Unmatched requests are checked
//!   against them instead, in registration order

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderValue, Method, Request, Uri};
use axum::response::Response;
use tower::ServiceExt;
use tower_http::services::ServeDir;

use crate::app::mount::ErrorScope;
use crate::app::{App, RouteKind, StaticConfig};
use crate::error::RouterError;
use crate::http::context::{Ctx, PLUS_PARAM, STAR_PARAM};
use crate::http::handler::{default_error_handler, ErrorHandler, Handler, HandlerError};
use crate::observability::metrics;
use crate::routing::method::Methods;
use crate::routing::path::covers;

#[derive(Clone)]
struct Endpoint {
    chain: Arc<[Handler]>,
    route_path: Arc<str>,
}

/// Immutable request dispatcher for one snapshot of an application.
pub struct Dispatcher {
    matcher: matchit::Router<usize>,
    tables: Vec<HashMap<Method, Endpoint>>,
    middleware: Vec<(String, Vec<Handler>)>,
    error_scopes: Vec<ErrorScope>,
    error_handler: ErrorHandler,
    strict_routing: bool,
    endpoints: usize,
}

impl Dispatcher {
    pub fn compile(app: &App) -> Result<Self, RouterError> {
        let resolved = app.resolve();
        let mut matcher = matchit::Router::new();
        let mut tables: Vec<HashMap<Method, Endpoint>> = Vec::new();
        let mut by_pattern: HashMap<String, usize> = HashMap::new();
        let mut endpoints = 0;
        let middleware = resolved
            .routes
            .iter()
            .filter(|route| matches!(route.kind, RouteKind::Middleware))
            .map(|route| (route.path.clone(), route.middleware.clone()))
            .collect();

        for (position, route) in resolved.routes.iter().enumerate() {
            let (terminal, methods, patterns) = match (&route.kind, &route.methods, &route.handler) {
                (RouteKind::Handler, Methods::List(methods), Some(handler)) => {
                    (handler.clone(), methods.clone(), matcher_patterns(&route.path)?)
                }
                (RouteKind::Static { root, config }, Methods::List(methods), _) => {
                    let mut patterns = matcher_patterns(&route.path)?;
                    patterns.push(join_pattern(&escape(&route.path), &format!("{{*{STAR_PARAM}}}")));
                    (static_handler(&route.path, root, config), methods.clone(), patterns)
                }
                _ => continue,
            };

            let chain: Vec<Handler> = resolved.routes[..position]
                .iter()
                .filter(|earlier| {
                    matches!(earlier.kind, RouteKind::Middleware) && covers(&earlier.path, &route.path)
                })
                .flat_map(|earlier| earlier.middleware.iter().cloned())
                .chain(route.middleware.iter().cloned())
                .chain(std::iter::once(terminal))
                .collect();
            let endpoint = Endpoint {
                chain: Arc::from(chain),
                route_path: Arc::from(route.path.as_str()),
            };

            for pattern in patterns {
                let index = match by_pattern.get(&pattern) {
                    Some(index) => *index,
                    None => {
                        let index = tables.len();
                        matcher
                            .insert(pattern.clone(), index)
                            .map_err(|source| RouterError::PathConflict {
                                path: route.path.clone(),
                                source,
                            })?;
                        tables.push(HashMap::new());
                        by_pattern.insert(pattern, index);
                        index
                    }
                };
                for method in &methods {
                    tables[index]
                        .entry(method.clone())
                        .or_insert_with(|| endpoint.clone());
                }
            }
            endpoints += 1;
        }

        Ok(Self {
            matcher,
            tables,
            middleware,
            error_scopes: resolved.error_scopes,
            error_handler: app
                .error_handler()
                .unwrap_or_else(|| Arc::new(default_error_handler)),
            strict_routing: app.config().strict_routing,
            endpoints,
        })
    }

    /// Number of handler and static routes compiled.
    pub fn endpoints(&self) -> usize {
        self.endpoints
    }

    fn lookup_path<'a>(&self, path: &'a str) -> &'a str {
        let lookup = if !self.strict_routing && path.len() > 1 {
            path.trim_end_matches('/')
        } else {
            path
        };
        if lookup.is_empty() {
            "/"
        } else {
            lookup
        }
    }

    fn find(&self, method: &Method, path: &str) -> Result<(Endpoint, Vec<(String, String)>), HandlerError> {
        let lookup = self.lookup_path(path);
        let matched = self.matcher.at(lookup).map_err(|_| HandlerError::NotFound {
            method: method.to_string(),
            path: path.to_string(),
        })?;
        let table = &self.tables[*matched.value];
        let endpoint = table
            .get(method)
            .or_else(|| {
                if *method == Method::HEAD {
                    table.get(&Method::GET)
                } else {
                    None
                }
            })
            .ok_or_else(|| HandlerError::MethodNotAllowed {
                method: method.to_string(),
            })?;

        let params = matched
            .params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Ok((endpoint.clone(), params))
    }

    /// Chain for a request no route accepts: every `USE` entry covering the
    /// path, ending in `miss`. `None` when no middleware covers it.
    fn fallback(&self, path: &str, miss: &HandlerError) -> Option<Endpoint> {
        let lookup = self.lookup_path(path);
        let mut scope = None;
        let mut chain: Vec<Handler> = Vec::new();
        for (prefix, handlers) in &self.middleware {
            if covers(prefix, lookup) {
                chain.extend(handlers.iter().cloned());
                scope = Some(prefix.as_str());
            }
        }
        let scope = scope?;

        // An exhausted chain already answers 404; only a method miss needs
        // its own terminal.
        if let HandlerError::MethodNotAllowed { method } = miss {
            let method = method.clone();
            chain.push(Handler::new(move |_ctx: Ctx| {
                let method = method.clone();
                async move { Err(HandlerError::MethodNotAllowed { method }) }
            }));
        }
        Some(Endpoint {
            chain: Arc::from(chain),
            route_path: Arc::from(scope),
        })
    }

    fn handle_error(&self, path: &str, err: HandlerError) -> Response {
        let handler = self
            .error_scopes
            .iter()
            .find(|scope| covers(&scope.prefix, path))
            .map(|scope| &scope.handler)
            .unwrap_or(&self.error_handler);
        handler(err)
    }
}

/// Axum fallback handler: every request goes through the current dispatcher.
pub async fn dispatch(
    State(dispatcher): State<Arc<ArcSwap<Dispatcher>>>,
    request: Request<Body>,
) -> Response {
    let start = Instant::now();
    let dispatcher = dispatcher.load_full();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let result = match dispatcher.find(&method, &path) {
        Ok((endpoint, params)) => {
            Ctx::new(request, params, endpoint.chain, endpoint.route_path)
                .next()
                .await
        }
        Err(miss) => match dispatcher.fallback(&path, &miss) {
            Some(endpoint) => {
                Ctx::new(request, Vec::new(), endpoint.chain, endpoint.route_path)
                    .next()
                    .await
            }
            None => Err(miss),
        },
    };

    let response = match result {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!(method = %method, path = %path, error = %e, "Request failed");
            dispatcher.handle_error(&path, e)
        }
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), start);
    response
}

/// Matcher patterns for a route path. Optional parameters and `*` expand to
/// one pattern with and one without the segment.
pub(crate) fn matcher_patterns(path: &str) -> Result<Vec<String>, RouterError> {
    let invalid = |reason: &str| RouterError::InvalidPattern {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let mut variants = vec![String::new()];

    for (index, segment) in segments.iter().enumerate() {
        let last = index + 1 == segments.len();
        let (converted, optional) = match *segment {
            "*" if last => (format!("{{*{STAR_PARAM}}}"), true),
            "+" if last => (format!("{{*{PLUS_PARAM}}}"), false),
            "*" | "+" => return Err(invalid("wildcards must be the last segment")),
            param if param.starts_with(':') => {
                let name = &param[1..];
                let (name, optional) = match name.strip_suffix('?') {
                    Some(name) => (name, true),
                    None => (name, false),
                };
                if name.is_empty() || name.contains(['{', '}', ':', '*']) {
                    return Err(invalid("malformed parameter"));
                }
                (format!("{{{name}}}"), optional)
            }
            literal => (escape(literal), false),
        };

        let mut next = Vec::with_capacity(variants.len() * 2);
        for variant in &variants {
            next.push(format!("{variant}/{converted}"));
            if optional {
                next.push(variant.clone());
            }
        }
        variants = next;
    }

    let mut patterns: Vec<String> = variants
        .into_iter()
        .map(|v| if v.is_empty() { "/".to_string() } else { v })
        .collect();
    patterns.dedup();
    Ok(patterns)
}

fn escape(literal: &str) -> String {
    literal.replace('{', "{{").replace('}', "}}")
}

fn join_pattern(base: &str, tail: &str) -> String {
    if base == "/" {
        format!("/{tail}")
    } else {
        format!("{base}/{tail}")
    }
}

fn static_handler(mount: &str, root: &Path, config: &StaticConfig) -> Handler {
    let mut serve = ServeDir::new(root).append_index_html_on_directories(config.index);
    if config.precompressed_gzip {
        serve = serve.precompressed_gzip();
    }
    let cache_control = (config.max_age_secs > 0)
        .then(|| HeaderValue::from_str(&format!("public, max-age={}", config.max_age_secs)).ok())
        .flatten();
    let mount: Arc<str> = Arc::from(mount);

    Handler::new(move |ctx: Ctx| {
        let serve = serve.clone();
        let mount = mount.clone();
        let cache_control = cache_control.clone();
        async move {
            let mut request = ctx.into_request();
            *request.uri_mut() = strip_mount(request.uri(), &mount)?;

            // ServeDir's error type is `Infallible`.
            let response = match serve.oneshot(request).await {
                Ok(response) => response,
                Err(never) => match never {},
            };
            let mut response = response.map(Body::new);
            if let Some(value) = cache_control {
                if response.status().is_success() {
                    response.headers_mut().insert(header::CACHE_CONTROL, value);
                }
            }
            Ok(response)
        }
    })
}

fn strip_mount(uri: &Uri, mount: &str) -> Result<Uri, HandlerError> {
    let rest = if mount == "/" {
        uri.path()
    } else {
        uri.path().strip_prefix(mount).unwrap_or("")
    };
    let rest = if rest.starts_with('/') {
        rest.to_string()
    } else {
        format!("/{rest}")
    };
    let rewritten = match uri.query() {
        Some(query) => format!("{rest}?{query}"),
        None => rest,
    };
    rewritten
        .parse()
        .map_err(|e: axum::http::uri::InvalidUri| HandlerError::Other(Box::new(e)))
}
