//! Routing subsystem: route groups and the registration surface.
//!
//! # Data Flow
//! ```text
//! app.group("/api") → Group { prefix: "/api" }
//!     → group.group("/v1") → Group { prefix: "/api/v1", parent: /api }
//!     → group.get("/users", h) → path.rs: "/api/v1/users"
//!         → App registration table (owner = the /api/v1 group)
//!     → group.name("v1.") → names the group (nothing registered on it yet)
//!                        or the last route (after the first registration)
//! ```
//!
//! # Design Decisions
//! - `App`, `Group` and `Registering` share one verb surface ([`Router`])
//! - Registration never fails; setup errors only come from naming and hooks
//! - Matching is not done here: the table is handed to `http::dispatch`

pub mod group;
pub mod method;
pub mod path;
pub mod register;
pub mod use_args;

use std::path::PathBuf;

pub use group::{Group, GroupId, GroupInfo};
pub use method::{Method, Methods, DEFAULT_METHODS};
pub use path::group_path;
pub use register::Registering;
pub use use_args::UseArg;

use crate::app::StaticConfig;
use crate::error::RouterError;
use crate::http::handler::Handler;

/// Registration surface shared by applications and groups.
///
/// Paths are relative to the router's prefix; an empty path means the
/// prefix itself. Verbs return the router to allow chaining.
pub trait Router: Sized {
    /// Register `handler` for each of `methods`, preceded by `middleware`.
    fn add(&self, methods: &[Method], path: &str, handler: Handler, middleware: &[Handler]) -> &Self;

    /// Register for every method in the application's configured
    /// `request_methods`, as configured at the time of the call.
    fn all(&self, path: &str, handler: Handler, middleware: &[Handler]) -> &Self;

    /// Register middleware under one or more prefixes, or mount an
    /// application. Mounting consumes the first prefix and ends the call.
    ///
    /// ```
    /// use route_groups::{App, Handler, Router, UseArg};
    ///
    /// let app = App::default();
    /// let logger = Handler::new(|ctx| ctx.next());
    /// app.use_([UseArg::from("/api"), UseArg::from(logger)]);
    ///
    /// let admin = App::default();
    /// app.use_([UseArg::from("/admin"), UseArg::from(admin)]);
    /// ```
    fn use_<I>(&self, args: I) -> &Self
    where
        I: IntoIterator<Item = UseArg>;

    /// Serve files below `root` under `prefix`.
    fn static_files(&self, prefix: &str, root: impl Into<PathBuf>, config: StaticConfig) -> &Self;

    /// Assign a name to the most recently registered route (groups: to the
    /// group itself while nothing has been registered on it).
    fn name(&self, name: &str) -> Result<&Self, RouterError>;

    /// Create a nested group. `handlers` are registered as middleware at the
    /// group's prefix, owned by this router.
    fn group(&self, prefix: &str, handlers: &[Handler]) -> Result<Group, RouterError>;

    /// Route builder bound to one path. Registers nothing by itself.
    fn route(&self, path: &str) -> Registering;

    fn get(&self, path: &str, handler: Handler, middleware: &[Handler]) -> &Self {
        self.add(&[Method::GET], path, handler, middleware)
    }

    fn head(&self, path: &str, handler: Handler, middleware: &[Handler]) -> &Self {
        self.add(&[Method::HEAD], path, handler, middleware)
    }

    fn post(&self, path: &str, handler: Handler, middleware: &[Handler]) -> &Self {
        self.add(&[Method::POST], path, handler, middleware)
    }

    fn put(&self, path: &str, handler: Handler, middleware: &[Handler]) -> &Self {
        self.add(&[Method::PUT], path, handler, middleware)
    }

    fn delete(&self, path: &str, handler: Handler, middleware: &[Handler]) -> &Self {
        self.add(&[Method::DELETE], path, handler, middleware)
    }

    fn connect(&self, path: &str, handler: Handler, middleware: &[Handler]) -> &Self {
        self.add(&[Method::CONNECT], path, handler, middleware)
    }

    fn options(&self, path: &str, handler: Handler, middleware: &[Handler]) -> &Self {
        self.add(&[Method::OPTIONS], path, handler, middleware)
    }

    fn trace(&self, path: &str, handler: Handler, middleware: &[Handler]) -> &Self {
        self.add(&[Method::TRACE], path, handler, middleware)
    }

    fn patch(&self, path: &str, handler: Handler, middleware: &[Handler]) -> &Self {
        self.add(&[Method::PATCH], path, handler, middleware)
    }
}
