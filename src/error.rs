//! Setup-time errors.
//!
//! Everything that can go wrong while an application's routes and groups are
//! being declared surfaces as a [`RouterError`]. None of these are transient:
//! they point at incorrect setup code, so callers are expected to abort
//! startup rather than retry.

use thiserror::Error;

use crate::app::hooks::{HookError, HookKind};

/// Error raised while building the route table.
#[derive(Debug, Error)]
pub enum RouterError {
    /// A registered hook rejected the operation.
    #[error("{hook} hook failed: {source}")]
    Hook {
        hook: HookKind,
        #[source]
        source: HookError,
    },

    /// `name` was called on an application before any route was registered.
    #[error("cannot assign name `{name}`: no route has been registered yet")]
    NoRouteToName { name: String },

    /// No route carries the requested name.
    #[error("no route named `{name}`")]
    UnknownRoute { name: String },

    /// A parameter required to build a route's URL was not supplied.
    #[error("route `{route}` requires parameter `{param}`")]
    MissingParam { route: String, param: String },

    /// A route pattern cannot be expressed by the path matcher.
    #[error("invalid route pattern `{path}`: {reason}")]
    InvalidPattern { path: String, reason: String },

    /// Two route patterns overlap in a way the path matcher rejects.
    #[error("route `{path}` conflicts with an existing route: {source}")]
    PathConflict {
        path: String,
        #[source]
        source: matchit::InsertError,
    },
}
