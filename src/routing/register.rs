//! Route builder bound to a single path.

use crate::app::App;
use crate::http::handler::Handler;
use crate::routing::method::{Method, Methods};
use crate::routing::path::group_path;

/// Chains several method registrations on one fixed path.
///
/// ```
/// use route_groups::{App, Handler, Router};
///
/// let app = App::default();
/// let api = app.group("/api", &[]).unwrap();
/// api.route("/users")
///     .get(Handler::new(|ctx| ctx.next()), &[])
///     .post(Handler::new(|ctx| ctx.next()), &[]);
///
/// assert_eq!(app.routes().len(), 2);
/// assert!(app.routes().iter().all(|r| r.path == "/api/users"));
/// ```
///
/// Registrations made through a builder have no owning group and leave the
/// group's naming state untouched.
#[derive(Debug, Clone)]
pub struct Registering {
    app: App,
    path: String,
}

impl Registering {
    pub(crate) fn new(app: App, path: String) -> Self {
        Self { app, path }
    }

    /// The resolved absolute path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Builder for a path below this one.
    pub fn route(&self, path: &str) -> Registering {
        Registering::new(self.app.clone(), group_path(&self.path, path))
    }

    /// Middleware for every method on this path.
    pub fn use_(&self, handlers: &[Handler]) -> &Self {
        self.app
            .register(Methods::Use, self.path.clone(), None, None, handlers.to_vec());
        self
    }

    pub fn add(&self, methods: &[Method], handler: Handler, middleware: &[Handler]) -> &Self {
        self.app.register(
            Methods::list(methods),
            self.path.clone(),
            None,
            Some(handler),
            middleware.to_vec(),
        );
        self
    }

    pub fn all(&self, handler: Handler, middleware: &[Handler]) -> &Self {
        let methods = self.app.request_methods();
        self.add(&methods, handler, middleware)
    }

    pub fn get(&self, handler: Handler, middleware: &[Handler]) -> &Self {
        self.add(&[Method::GET], handler, middleware)
    }

    pub fn head(&self, handler: Handler, middleware: &[Handler]) -> &Self {
        self.add(&[Method::HEAD], handler, middleware)
    }

    pub fn post(&self, handler: Handler, middleware: &[Handler]) -> &Self {
        self.add(&[Method::POST], handler, middleware)
    }

    pub fn put(&self, handler: Handler, middleware: &[Handler]) -> &Self {
        self.add(&[Method::PUT], handler, middleware)
    }

    pub fn delete(&self, handler: Handler, middleware: &[Handler]) -> &Self {
        self.add(&[Method::DELETE], handler, middleware)
    }

    pub fn connect(&self, handler: Handler, middleware: &[Handler]) -> &Self {
        self.add(&[Method::CONNECT], handler, middleware)
    }

    pub fn options(&self, handler: Handler, middleware: &[Handler]) -> &Self {
        self.add(&[Method::OPTIONS], handler, middleware)
    }

    pub fn trace(&self, handler: Handler, middleware: &[Handler]) -> &Self {
        self.add(&[Method::TRACE], handler, middleware)
    }

    pub fn patch(&self, handler: Handler, middleware: &[Handler]) -> &Self {
        self.add(&[Method::PATCH], handler, middleware)
    }
}
