//! The owning application.
//!
//! # Data Flow
//! ```text
//! App / Group / Registering verbs
//!     → routing::path (compose prefix + path)
//!     → stack.rs (append to the registration table, under the app lock)
//!     → hooks.rs (on_route, on_name, on_group, on_group_name, on_mount)
//!
//! Serving (at startup):
//!     mount.rs (flatten mounted apps under their paths)
//!     → http::dispatch (compile into a path matcher)
//! ```
//!
//! # Design Decisions
//! - One `Arc` shared by every group of an application, never copied
//! - The application owns every group node (arena); groups refer to their
//!   parent by id, so there are no ownership cycles
//! - One application-wide lock guards the table and the arena; group
//!   self-naming holds it across its hook
//! - Config lives in an `ArcSwap` so `all` always sees the latest
//!   request-method list

pub mod hooks;
pub mod mount;
pub mod reverse;
pub mod stack;

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use arc_swap::ArcSwap;
use axum::response::Response;

use crate::config::AppConfig;
use crate::error::RouterError;
use crate::http::handler::{ErrorHandler, Handler, HandlerError};
use crate::observability::metrics;
use crate::routing::group::{Group, GroupId, GroupInfo, GroupNode};
use crate::routing::method::{parse_method, Method, Methods};
use crate::routing::path::group_path;
use crate::routing::register::Registering;
use crate::routing::use_args::{UseArg, UseSet};
use crate::routing::Router;

pub use hooks::{HookError, HookKind, Hooks};
pub use mount::MountInfo;
pub use stack::{RegistrationSink, Route, RouteInfo, RouteKind, RouteKindTag, RouteStack, StaticConfig};

/// State guarded by the application lock.
#[derive(Debug, Default)]
pub(crate) struct AppState {
    pub(crate) stack: RouteStack,
    pub(crate) groups: Vec<GroupNode>,
}

struct AppInner {
    config: ArcSwap<AppConfig>,
    state: Mutex<AppState>,
    hooks: Hooks,
    error_handler: RwLock<Option<ErrorHandler>>,
}

/// An application: the root router and owner of the registration table.
///
/// Cloning is cheap and yields another handle to the same application.
#[derive(Clone)]
pub struct App {
    inner: Arc<AppInner>,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        Self {
            inner: Arc::new(AppInner {
                config: ArcSwap::from_pointee(config),
                state: Mutex::new(AppState::default()),
                hooks: Hooks::default(),
                error_handler: RwLock::new(None),
            }),
        }
    }

    /// Current configuration.
    pub fn config(&self) -> Arc<AppConfig> {
        self.inner.config.load_full()
    }

    /// Replace the configuration. Later registrations observe the new values.
    ///
    /// Returns the configuration that was replaced.
    pub fn reconfigure(&self, config: AppConfig) -> Arc<AppConfig> {
        tracing::info!(app = %config.app_name, methods = ?config.request_methods, "Application reconfigured");
        self.inner.config.swap(Arc::new(config))
    }

    /// Put back a configuration returned by [`App::reconfigure`].
    pub(crate) fn restore_config(&self, previous: Arc<AppConfig>) {
        tracing::warn!(app = %previous.app_name, "Configuration rolled back");
        self.inner.config.store(previous);
    }

    /// The configured request methods, read live. Tokens that are not valid
    /// methods are skipped with a warning.
    pub fn request_methods(&self) -> Vec<Method> {
        self.inner
            .config
            .load()
            .request_methods
            .iter()
            .filter_map(|token| {
                let method = parse_method(token);
                if method.is_none() {
                    tracing::warn!(token = %token, "Ignoring invalid request method");
                }
                method
            })
            .collect()
    }

    pub fn hooks(&self) -> &Hooks {
        &self.inner.hooks
    }

    /// Install a custom error handler. Within a mounted subtree the mounted
    /// application's handler takes precedence.
    pub fn set_error_handler<F>(&self, handler: F)
    where
        F: Fn(HandlerError) -> Response + Send + Sync + 'static,
    {
        *self
            .inner
            .error_handler
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(handler));
    }

    pub fn error_handler(&self) -> Option<ErrorHandler> {
        self.inner
            .error_handler
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn ptr_eq(&self, other: &App) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, AppState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshots of every group created on this application.
    pub fn groups(&self) -> Vec<GroupInfo> {
        let state = self.lock();
        state
            .groups
            .iter()
            .enumerate()
            .filter(|(_, node)| !node.discarded)
            .map(|(index, node)| node.info(GroupId(index)))
            .collect()
    }

    pub fn group_info(&self, id: GroupId) -> Option<GroupInfo> {
        self.lock().groups.get(id.0).map(|node| node.info(id))
    }

    // --- Registration ---

    pub(crate) fn register(
        &self,
        methods: Methods,
        path: String,
        owner: Option<GroupId>,
        handler: Option<Handler>,
        middleware: Vec<Handler>,
    ) {
        let info = self.lock().stack.register(methods, path, owner, handler, middleware);
        self.after_register(&info);
    }

    pub(crate) fn register_static(
        &self,
        path: String,
        root: PathBuf,
        config: StaticConfig,
        owner: Option<GroupId>,
    ) {
        let info = self.lock().stack.register_static(path, root, config, owner);
        self.after_register(&info);
    }

    fn after_register(&self, info: &RouteInfo) {
        tracing::debug!(
            methods = ?info.methods,
            path = %info.path,
            kind = info.kind.as_str(),
            "Route registered"
        );
        metrics::record_route_registered(info.kind);
        if let Err(e) = self.inner.hooks.execute_on_route(info) {
            tracing::error!(path = %info.path, error = %e, "Route hook failed");
        }
    }

    /// Mount `sub` at `path`. Returns false when the mount would create a
    /// cycle and was skipped.
    pub(crate) fn mount(&self, owner: Option<GroupId>, path: String, sub: App) -> bool {
        if sub.reaches(self) {
            tracing::warn!(path = %path, "Refusing to mount an application into itself");
            return false;
        }

        let app_name = sub.config().app_name.clone();
        let routes = sub.lock().stack.len();
        self.lock().stack.register_mount(path.clone(), sub, owner);

        tracing::info!(path = %path, app = %app_name, routes, "Sub-application mounted");
        let info = MountInfo {
            path,
            app_name,
            routes,
        };
        if let Err(e) = self.inner.hooks.execute_on_mount(&info) {
            tracing::error!(path = %info.path, error = %e, "Mount hook failed");
        }
        true
    }

    /// Shared `use_` resolution for applications and groups.
    pub(crate) fn apply_use(&self, base: &str, owner: Option<GroupId>, set: UseSet) {
        let UseSet {
            prefixes,
            sub_app,
            handlers,
        } = set;

        // A mount consumes the first prefix and ends the call.
        if let Some(sub) = sub_app {
            if let Some(prefix) = prefixes.first() {
                self.mount(owner, group_path(base, prefix), sub);
            }
            return;
        }

        for prefix in prefixes {
            self.register(Methods::Use, group_path(base, &prefix), owner, None, handlers.clone());
        }
    }

    // --- Naming ---

    /// Name the most recent registration.
    pub(crate) fn name_route(&self, name: &str) -> Result<RouteInfo, RouterError> {
        let mut guard = self.lock();
        let AppState { stack, groups } = &mut *guard;
        let info = stack.name(name, &|id| {
            groups
                .get(id.0)
                .map(|node| node.name.clone())
                .unwrap_or_default()
        })?;

        tracing::debug!(name = %info.name, path = %info.path, "Route named");
        self.inner.hooks.execute_on_name(&info)?;
        Ok(info)
    }

    /// Name a group itself: `parent.name + name`.
    ///
    /// The whole critical section, hook included, runs under the application
    /// lock. A failing hook leaves the new name in place.
    pub(crate) fn name_group(&self, id: GroupId, name: &str) -> Result<GroupInfo, RouterError> {
        let mut state = self.lock();

        let qualified = match state.groups[id.0].parent {
            Some(parent) => format!("{}{}", state.groups[parent.0].name, name),
            None => name.to_string(),
        };
        state.groups[id.0].name = qualified;
        let info = state.groups[id.0].info(id);

        tracing::info!(group = %info.prefix, name = %info.name, "Group named");
        self.inner.hooks.execute_on_group_name(&info)?;
        Ok(info)
    }

    // --- Groups ---

    /// Create a group under `parent` (or under the application itself).
    pub(crate) fn create_group(
        &self,
        parent: Option<GroupId>,
        parent_prefix: &str,
        prefix: &str,
        handlers: &[Handler],
    ) -> Result<Group, RouterError> {
        let prefix = group_path(parent_prefix, prefix);
        if !handlers.is_empty() {
            self.register(Methods::Use, prefix.clone(), parent, None, handlers.to_vec());
        }

        let (id, info) = {
            let mut state = self.lock();
            let id = GroupId(state.groups.len());
            let node = GroupNode::new(prefix.clone(), parent);
            let info = node.info(id);
            state.groups.push(node);
            (id, info)
        };

        if let Err(e) = self.inner.hooks.execute_on_group(&info) {
            self.lock().groups[id.0].discarded = true;
            return Err(e);
        }

        metrics::record_group_created();
        tracing::debug!(prefix = %prefix, parent = ?parent, "Group created");
        Ok(Group::new(self.clone(), id, prefix))
    }

    pub(crate) fn any_route_defined(&self, id: GroupId) -> bool {
        self.lock().groups[id.0].any_route_defined
    }

    pub(crate) fn mark_route_defined(&self, id: GroupId) {
        let mut state = self.lock();
        let node = &mut state.groups[id.0];
        if !node.any_route_defined {
            node.any_route_defined = true;
        }
    }

    // --- Lookup ---

    /// The full route table, mounted applications expanded under their paths.
    pub fn routes(&self) -> Vec<RouteInfo> {
        self.resolve().routes.iter().map(Route::info).collect()
    }

    /// First route carrying `name`, searching mounted applications too.
    pub fn get_route(&self, name: &str) -> Option<RouteInfo> {
        self.resolve()
            .routes
            .iter()
            .find(|route| route.name == name)
            .map(Route::info)
    }

    /// Build the URL of a named route, filling its parameters.
    ///
    /// ```
    /// use route_groups::{App, Handler, Router};
    ///
    /// let app = App::default();
    /// app.get("/users/:id", Handler::new(|ctx| ctx.next()), &[]);
    /// app.name("user.show").unwrap();
    ///
    /// assert_eq!(app.url_for("user.show", &[("id", "42")]).unwrap(), "/users/42");
    /// ```
    pub fn url_for(&self, name: &str, params: &[(&str, &str)]) -> Result<String, RouterError> {
        let route = self.get_route(name).ok_or_else(|| RouterError::UnknownRoute {
            name: name.to_string(),
        })?;
        reverse::reverse(&route.path, params).map_err(|param| RouterError::MissingParam {
            route: name.to_string(),
            param,
        })
    }

    /// True if `target` is this application or mounted anywhere below it.
    fn reaches(&self, target: &App) -> bool {
        if self.ptr_eq(target) {
            return true;
        }
        self.mounted_apps().iter().any(|sub| sub.reaches(target))
    }

    fn mounted_apps(&self) -> Vec<App> {
        self.lock()
            .stack
            .routes()
            .iter()
            .filter_map(|route| match &route.kind {
                RouteKind::Mount(app) => Some(app.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("app_name", &self.config().app_name)
            .finish_non_exhaustive()
    }
}

/// Routes registered directly on an application have no owning group, and
/// `name` always names the most recent route.
impl Router for App {
    fn add(&self, methods: &[Method], path: &str, handler: Handler, middleware: &[Handler]) -> &Self {
        self.register(
            Methods::list(methods),
            group_path("", path),
            None,
            Some(handler),
            middleware.to_vec(),
        );
        self
    }

    fn all(&self, path: &str, handler: Handler, middleware: &[Handler]) -> &Self {
        let methods = self.request_methods();
        self.add(&methods, path, handler, middleware)
    }

    fn use_<I>(&self, args: I) -> &Self
    where
        I: IntoIterator<Item = UseArg>,
    {
        self.apply_use("", None, UseSet::collect(args));
        self
    }

    fn static_files(&self, prefix: &str, root: impl Into<PathBuf>, config: StaticConfig) -> &Self {
        self.register_static(group_path("", prefix), root.into(), config, None);
        self
    }

    fn name(&self, name: &str) -> Result<&Self, RouterError> {
        self.name_route(name)?;
        Ok(self)
    }

    fn group(&self, prefix: &str, handlers: &[Handler]) -> Result<Group, RouterError> {
        self.create_group(None, "", prefix, handlers)
    }

    fn route(&self, path: &str) -> Registering {
        Registering::new(self.clone(), group_path("", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconfigure_returns_previous() {
        let app = App::default();
        let mut config = AppConfig::default();
        config.app_name = "next".into();

        let previous = app.reconfigure(config);
        assert_eq!(previous.app_name, "route-groups");
        assert_eq!(app.config().app_name, "next");

        app.restore_config(previous);
        assert_eq!(app.config().app_name, "route-groups");
    }

    #[test]
    fn test_invalid_request_methods_are_skipped() {
        let mut config = AppConfig::default();
        config.request_methods = vec!["GET".into(), "NOT A METHOD".into(), "PURGE".into()];
        let app = App::new(config);

        assert_eq!(
            app.request_methods(),
            vec![Method::GET, Method::from_bytes(b"PURGE").unwrap()]
        );
    }
}
