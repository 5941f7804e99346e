//! The registration table of an application.
//!
//! # Responsibilities
//! - Record handler routes, middleware, static directories and mounts in
//!   registration order
//! - Remember the most recent registration so it can be named
//!
//! # Design Decisions
//! - Entries are append-only; order is execution order
//! - Paths are stored already composed (absolute within the owning app)

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::app::App;
use crate::error::RouterError;
use crate::http::handler::Handler;
use crate::routing::group::GroupId;
use crate::routing::method::{Method, Methods};

/// Options for a static directory registration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticConfig {
    /// Serve `index.html` for directory requests.
    pub index: bool,

    /// Prefer `<file>.gz` when the client accepts gzip.
    pub precompressed_gzip: bool,

    /// `Cache-Control: max-age` in seconds. 0 disables the header.
    pub max_age_secs: u64,
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            index: true,
            precompressed_gzip: false,
            max_age_secs: 0,
        }
    }
}

/// What a table entry does.
#[derive(Clone)]
pub enum RouteKind {
    /// A handler route, possibly with route-level middleware.
    Handler,
    /// A middleware-only registration (`USE`).
    Middleware,
    /// A static directory.
    Static { root: PathBuf, config: StaticConfig },
    /// A mounted sub-application.
    Mount(App),
}

impl RouteKind {
    pub fn tag(&self) -> RouteKindTag {
        match self {
            RouteKind::Handler => RouteKindTag::Handler,
            RouteKind::Middleware => RouteKindTag::Middleware,
            RouteKind::Static { .. } => RouteKindTag::Static,
            RouteKind::Mount(_) => RouteKindTag::Mount,
        }
    }
}

impl fmt::Debug for RouteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteKind::Static { root, config } => f
                .debug_struct("Static")
                .field("root", root)
                .field("config", config)
                .finish(),
            RouteKind::Mount(app) => f.debug_tuple("Mount").field(&app.config().app_name).finish(),
            other => f.write_str(other.tag().as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteKindTag {
    Handler,
    Middleware,
    Static,
    Mount,
}

impl RouteKindTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteKindTag::Handler => "handler",
            RouteKindTag::Middleware => "middleware",
            RouteKindTag::Static => "static",
            RouteKindTag::Mount => "mount",
        }
    }
}

/// One entry of the table.
#[derive(Debug, Clone)]
pub struct Route {
    pub methods: Methods,
    pub path: String,
    pub owner: Option<GroupId>,
    pub handler: Option<Handler>,
    pub middleware: Vec<Handler>,
    pub name: String,
    pub kind: RouteKind,
}

impl Route {
    pub fn info(&self) -> RouteInfo {
        RouteInfo {
            methods: self.methods.tokens(),
            path: self.path.clone(),
            name: self.name.clone(),
            kind: self.kind.tag(),
            group: self.owner,
            handlers: self.middleware.len() + usize::from(self.handler.is_some()),
        }
    }
}

/// Snapshot of a table entry, as seen by hooks and introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteInfo {
    pub methods: Vec<String>,
    pub path: String,
    pub name: String,
    pub kind: RouteKindTag,
    pub group: Option<GroupId>,
    pub handlers: usize,
}

/// Receives registrations from groups and applications.
pub trait RegistrationSink {
    /// Append a handler route, or a middleware-only entry when `methods` is
    /// [`Methods::Use`]. Middleware order is preserved.
    fn register(
        &mut self,
        methods: Methods,
        path: String,
        owner: Option<GroupId>,
        handler: Option<Handler>,
        middleware: Vec<Handler>,
    ) -> RouteInfo;

    /// Append a static directory entry.
    fn register_static(
        &mut self,
        path: String,
        root: PathBuf,
        config: StaticConfig,
        owner: Option<GroupId>,
    ) -> RouteInfo;

    /// Append a mounted sub-application.
    fn register_mount(&mut self, path: String, app: App, owner: Option<GroupId>) -> RouteInfo;

    /// Name the most recent registration. `qualify` returns the name of the
    /// owning group, which is prepended.
    fn name(
        &mut self,
        name: &str,
        qualify: &dyn Fn(GroupId) -> String,
    ) -> Result<RouteInfo, RouterError>;
}

/// In-memory registration table.
#[derive(Debug, Default)]
pub struct RouteStack {
    routes: Vec<Route>,
    latest: Option<usize>,
}

impl RouteStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    fn push(&mut self, route: Route) -> RouteInfo {
        let info = route.info();
        self.routes.push(route);
        info
    }
}

impl RegistrationSink for RouteStack {
    fn register(
        &mut self,
        methods: Methods,
        path: String,
        owner: Option<GroupId>,
        handler: Option<Handler>,
        middleware: Vec<Handler>,
    ) -> RouteInfo {
        let kind = if methods.is_use() {
            RouteKind::Middleware
        } else {
            RouteKind::Handler
        };
        self.latest = Some(self.routes.len());
        self.push(Route {
            methods,
            path,
            owner,
            handler,
            middleware,
            name: String::new(),
            kind,
        })
    }

    fn register_static(
        &mut self,
        path: String,
        root: PathBuf,
        config: StaticConfig,
        owner: Option<GroupId>,
    ) -> RouteInfo {
        self.latest = Some(self.routes.len());
        self.push(Route {
            methods: Methods::List(vec![Method::GET, Method::HEAD]),
            path,
            owner,
            handler: None,
            middleware: Vec::new(),
            name: String::new(),
            kind: RouteKind::Static { root, config },
        })
    }

    fn register_mount(&mut self, path: String, app: App, owner: Option<GroupId>) -> RouteInfo {
        self.push(Route {
            methods: Methods::Use,
            path,
            owner,
            handler: None,
            middleware: Vec::new(),
            name: String::new(),
            kind: RouteKind::Mount(app),
        })
    }

    fn name(
        &mut self,
        name: &str,
        qualify: &dyn Fn(GroupId) -> String,
    ) -> Result<RouteInfo, RouterError> {
        let route = self
            .latest
            .and_then(|index| self.routes.get_mut(index))
            .ok_or_else(|| RouterError::NoRouteToName {
                name: name.to_string(),
            })?;

        route.name = match route.owner {
            Some(group) => format!("{}{}", qualify(group), name),
            None => name.to_string(),
        };
        Ok(route.info())
    }
}
