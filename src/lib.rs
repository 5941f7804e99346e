//! Hierarchical route groups for an HTTP application.
//!
//! An [`App`] owns a registration table. [`Group`]s are lightweight
//! handles that share a path prefix and a name prefix; every verb on a
//! group registers into the owning application. Sub-applications can be
//! mounted under a prefix, and the whole table is served through axum by
//! [`HttpServer`].

pub mod admin;
pub mod app;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use app::{App, HookError, HookKind, Hooks, MountInfo, RouteInfo, StaticConfig};
pub use config::schema::AppConfig;
pub use error::RouterError;
pub use http::{Ctx, Handler, HandlerError, HandlerResult, HttpServer};
pub use lifecycle::Shutdown;
pub use routing::{Group, GroupId, GroupInfo, Method, Registering, Router, UseArg};
