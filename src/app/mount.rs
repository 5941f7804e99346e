//! Mounting sub-applications.
//!
//! # Responsibilities
//! - Expand mounted applications into one flat table, paths composed under
//!   the mount point, recursively
//! - Collect the error handler scope of every mounted application
//!
//! # Design Decisions
//! - Expansion happens when the table is read, so routes added to a
//!   sub-application after mounting are still picked up
//! - A mounted application's error handler covers its subtree only; the
//!   parent's handler keeps covering everything else
//! - Mount entries stay in the expanded table as markers

use serde::{Deserialize, Serialize};

use crate::app::stack::{Route, RouteKind};
use crate::app::App;
use crate::http::handler::ErrorHandler;
use crate::routing::group::GroupId;
use crate::routing::path::{covers, group_path};

/// Snapshot passed to `on_mount` hooks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountInfo {
    /// Absolute mount path within the parent application.
    pub path: String,
    pub app_name: String,
    /// Routes registered directly on the sub-application at mount time.
    pub routes: usize,
}

/// Error handler applying under `prefix`.
#[derive(Clone)]
pub struct ErrorScope {
    pub prefix: String,
    pub handler: ErrorHandler,
}

/// Flattened view of an application.
#[derive(Default)]
pub struct Resolved {
    pub routes: Vec<Route>,
    /// Sorted longest prefix first.
    pub error_scopes: Vec<ErrorScope>,
}

impl Resolved {
    /// The error handler responsible for `path`, if a mounted one applies.
    pub fn error_handler_for(&self, path: &str) -> Option<&ErrorHandler> {
        self.error_scopes
            .iter()
            .find(|scope| covers(&scope.prefix, path))
            .map(|scope| &scope.handler)
    }
}

impl App {
    /// Expand this application and everything mounted below it.
    pub fn resolve(&self) -> Resolved {
        let mut resolved = Resolved::default();
        self.flatten_into("", None, &mut resolved);
        resolved
            .error_scopes
            .sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
        resolved
    }

    /// `owner` is the owning group of the mount entry this application sits
    /// under. Group ids of a mounted application refer to its own arena, so
    /// its routes take the mount's owner instead.
    fn flatten_into(&self, base: &str, owner: Option<Option<GroupId>>, out: &mut Resolved) {
        // Copied out so the lock is not held while descending.
        let routes: Vec<Route> = self.lock().stack.routes().to_vec();

        for mut route in routes {
            route.path = group_path(base, &route.path);
            if let Some(owner) = owner {
                route.owner = owner;
            }
            let sub = match &route.kind {
                RouteKind::Mount(sub) => Some(sub.clone()),
                _ => None,
            };
            let mount_path = route.path.clone();
            let mount_owner = route.owner;
            out.routes.push(route);

            if let Some(sub) = sub {
                if let Some(handler) = sub.error_handler() {
                    out.error_scopes.push(ErrorScope {
                        prefix: mount_path.clone(),
                        handler,
                    });
                }
                sub.flatten_into(&mount_path, Some(mount_owner), out);
            }
        }
    }
}
