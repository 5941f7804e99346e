//! Route groups.
//!
//! A [`Group`] is a sub-router scoped to a path prefix. Everything registered
//! on it is composed under that prefix and recorded in the owning
//! application's table with the group as owner.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::app::{App, StaticConfig};
use crate::error::RouterError;
use crate::http::handler::Handler;
use crate::routing::method::{Method, Methods};
use crate::routing::path::group_path;
use crate::routing::register::Registering;
use crate::routing::use_args::{UseArg, UseSet};
use crate::routing::Router;

/// Index of a group in its application's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub usize);

/// Arena entry, owned by the application.
#[derive(Debug, Clone)]
pub(crate) struct GroupNode {
    pub(crate) prefix: String,
    pub(crate) parent: Option<GroupId>,
    pub(crate) name: String,
    pub(crate) any_route_defined: bool,
    /// Rejected by an `on_group` hook; never handed out.
    pub(crate) discarded: bool,
}

impl GroupNode {
    pub(crate) fn new(prefix: String, parent: Option<GroupId>) -> Self {
        Self {
            prefix,
            parent,
            name: String::new(),
            any_route_defined: false,
            discarded: false,
        }
    }

    pub(crate) fn info(&self, id: GroupId) -> GroupInfo {
        GroupInfo {
            id,
            prefix: self.prefix.clone(),
            name: self.name.clone(),
            parent: self.parent,
            any_route_defined: self.any_route_defined,
        }
    }
}

/// Snapshot of a group, as seen by hooks and introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInfo {
    pub id: GroupId,
    pub prefix: String,
    pub name: String,
    pub parent: Option<GroupId>,
    pub any_route_defined: bool,
}

/// Handle to a group.
///
/// Handles are cheap to clone; the group itself lives as long as its
/// application. Concurrent registration on one group from several threads is
/// memory safe, but the resulting order is up to the caller.
#[derive(Debug, Clone)]
pub struct Group {
    app: App,
    id: GroupId,
    prefix: String,
}

impl Group {
    pub(crate) fn new(app: App, id: GroupId, prefix: String) -> Self {
        Self { app, id, prefix }
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Absolute prefix of this group.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    /// Name given by the last self-naming call, empty if none.
    pub fn group_name(&self) -> String {
        self.info().name
    }

    /// True once anything was registered directly on this group.
    pub fn any_route_defined(&self) -> bool {
        self.app.any_route_defined(self.id)
    }

    pub fn info(&self) -> GroupInfo {
        self.app.lock().groups[self.id.0].info(self.id)
    }

    fn mark_route_defined(&self) {
        self.app.mark_route_defined(self.id);
    }
}

impl Router for Group {
    fn add(&self, methods: &[Method], path: &str, handler: Handler, middleware: &[Handler]) -> &Self {
        self.app.register(
            Methods::list(methods),
            group_path(&self.prefix, path),
            Some(self.id),
            Some(handler),
            middleware.to_vec(),
        );
        self.mark_route_defined();
        self
    }

    fn all(&self, path: &str, handler: Handler, middleware: &[Handler]) -> &Self {
        let methods = self.app.request_methods();
        self.add(&methods, path, handler, middleware)
    }

    fn use_<I>(&self, args: I) -> &Self
    where
        I: IntoIterator<Item = UseArg>,
    {
        self.app
            .apply_use(&self.prefix, Some(self.id), UseSet::collect(args));
        self.mark_route_defined();
        self
    }

    fn static_files(&self, prefix: &str, root: impl Into<PathBuf>, config: StaticConfig) -> &Self {
        self.app.register_static(
            group_path(&self.prefix, prefix),
            root.into(),
            config,
            Some(self.id),
        );
        self.mark_route_defined();
        self
    }

    /// Names the group itself while nothing was registered on it directly,
    /// the most recently registered route afterwards.
    fn name(&self, name: &str) -> Result<&Self, RouterError> {
        if self.any_route_defined() {
            self.app.name_route(name)?;
        } else {
            self.app.name_group(self.id, name)?;
        }
        Ok(self)
    }

    fn group(&self, prefix: &str, handlers: &[Handler]) -> Result<Group, RouterError> {
        self.app
            .create_group(Some(self.id), &self.prefix, prefix, handlers)
    }

    fn route(&self, path: &str) -> Registering {
        Registering::new(self.app.clone(), group_path(&self.prefix, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::hooks::HookError;
    use crate::app::stack::RouteKindTag;
    use std::sync::{Arc, Mutex};

    fn handler() -> Handler {
        Handler::new(|ctx| ctx.next())
    }

    #[test]
    fn test_nested_group_prefix() {
        let app = App::default();
        let api = app.group("/api", &[]).unwrap();
        let v1 = api.group("/v1", &[]).unwrap();
        assert_eq!(api.prefix(), "/api");
        assert_eq!(v1.prefix(), "/api/v1");

        v1.get("/users", handler(), &[]);
        let routes = app.routes();
        assert_eq!(routes[0].path, "/api/v1/users");
        assert_eq!(routes[0].group, Some(v1.id()));
    }

    #[test]
    fn test_empty_path_is_group_prefix() {
        let app = App::default();
        let api = app.group("/api/", &[]).unwrap();
        api.get("", handler(), &[]).post("/", handler(), &[]);
        let paths: Vec<String> = app.routes().into_iter().map(|r| r.path).collect();
        assert_eq!(paths, vec!["/api", "/api"]);
    }

    #[test]
    fn test_name_before_route_names_group() {
        let app = App::default();
        let users = app.group("/users", &[]).unwrap();
        users.name("user.").unwrap();
        assert_eq!(users.group_name(), "user.");
        assert!(!users.any_route_defined());
    }

    #[test]
    fn test_name_after_route_names_route() {
        let app = App::default();
        let users = app.group("/users", &[]).unwrap();
        users.name("user.").unwrap();
        users.get("/", handler(), &[]).name("index").unwrap();

        assert_eq!(users.group_name(), "user.");
        let route = app.get_route("user.index").unwrap();
        assert_eq!(route.path, "/users");
    }

    #[test]
    fn test_nested_group_name_concatenates() {
        let app = App::default();
        let user = app.group("/user", &[]).unwrap();
        user.name("user.").unwrap();
        let list = user.group("/list", &[]).unwrap();
        list.name("list").unwrap();
        assert_eq!(list.group_name(), "user.list");

        // No separator is inserted.
        let other = user.group("/other", &[]).unwrap();
        other.name("other").unwrap();
        assert_eq!(other.group_name(), "user.other");
    }

    #[test]
    fn test_flag_set_only_on_called_group() {
        let app = App::default();
        let parent = app.group("/p", &[]).unwrap();
        let child = parent.group("/c", &[]).unwrap();
        let grandchild = child.group("/g", &[]).unwrap();

        child.get("/x", handler(), &[]);
        assert!(!parent.any_route_defined());
        assert!(child.any_route_defined());
        assert!(!grandchild.any_route_defined());
    }

    #[test]
    fn test_flag_never_resets() {
        let app = App::default();
        let group = app.group("/g", &[]).unwrap();
        group.use_([UseArg::from(handler())]);
        assert!(group.any_route_defined());

        group.name("after").unwrap();
        let _ = group.group("/nested", &[handler()]).unwrap();
        group.route("/r");
        assert!(group.any_route_defined());
    }

    #[test]
    fn test_every_verb_sets_flag() {
        let fresh = |app: &App| app.group("/g", &[]).unwrap();
        let app = App::default();

        let g = fresh(&app);
        g.static_files("/assets", "./public", StaticConfig::default());
        assert!(g.any_route_defined());

        let g = fresh(&app);
        g.all("/any", handler(), &[]);
        assert!(g.any_route_defined());

        let g = fresh(&app);
        g.use_([UseArg::from("/sub"), UseArg::from(App::default())]);
        assert!(g.any_route_defined());

        // Group creation with middleware registers on the parent but does
        // not count as a route of the parent.
        let g = fresh(&app);
        let _ = g.group("/child", &[handler()]).unwrap();
        assert!(!g.any_route_defined());
    }

    #[test]
    fn test_group_middleware_registered_on_parent() {
        let app = App::default();
        let api = app.group("/api", &[]).unwrap();
        let admin = api.group("/admin", &[handler(), handler()]).unwrap();

        let routes = app.routes();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].kind, RouteKindTag::Middleware);
        assert_eq!(routes[0].path, "/api/admin");
        assert_eq!(routes[0].group, Some(api.id()));
        assert_eq!(routes[0].handlers, 2);
        assert_eq!(admin.info().parent, Some(api.id()));
    }

    #[test]
    fn test_use_with_prefix_list() {
        let app = App::default();
        let api = app.group("/api", &[]).unwrap();
        api.use_([UseArg::from(["/a", "/b"]), UseArg::from(handler())]);

        let routes = app.routes();
        let paths: Vec<&str> = routes.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["/api/a", "/api/b"]);
        assert!(routes.iter().all(|r| r.kind == RouteKindTag::Middleware && r.handlers == 1));
    }

    #[test]
    fn test_use_without_prefix_targets_group() {
        let app = App::default();
        let api = app.group("/api", &[]).unwrap();
        api.use_([UseArg::from(handler())]);
        assert_eq!(app.routes()[0].path, "/api");
    }

    #[test]
    fn test_use_with_sub_app_only_mounts() {
        let sub = App::default();
        sub.get("/hello", handler(), &[]);

        let app = App::default();
        let api = app.group("/api", &[]).unwrap();
        api.use_([
            UseArg::from(["/first", "/second"]),
            UseArg::from(handler()),
            UseArg::from(sub),
        ]);

        let routes = app.routes();
        let kinds: Vec<(&str, RouteKindTag)> =
            routes.iter().map(|r| (r.path.as_str(), r.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("/api/first", RouteKindTag::Mount),
                ("/api/first/hello", RouteKindTag::Handler),
            ]
        );
    }

    #[test]
    fn test_all_reads_methods_live() {
        let app = App::default();
        let group = app.group("/g", &[]).unwrap();
        group.all("/before", handler(), &[]);

        let mut config = (*app.config()).clone();
        config.request_methods = vec!["GET".to_string(), "PROPFIND".to_string()];
        app.reconfigure(config);
        group.all("/after", handler(), &[]);

        let routes = app.routes();
        assert_eq!(routes[0].methods.len(), 9);
        assert_eq!(routes[1].methods, vec!["GET", "PROPFIND"]);
    }

    #[test]
    fn test_group_hook_sees_snapshot_and_can_reject() {
        let app = App::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        app.hooks().on_group(move |info| {
            s.lock().unwrap().push(info.prefix.clone());
            if info.prefix.ends_with("/forbidden") {
                return Err(HookError::new("forbidden prefix"));
            }
            Ok(())
        });

        let api = app.group("/api", &[]).unwrap();
        let err = api.group("/forbidden", &[]).unwrap_err();
        assert!(matches!(err, RouterError::Hook { .. }));
        assert_eq!(*seen.lock().unwrap(), vec!["/api", "/api/forbidden"]);

        let prefixes: Vec<String> = app.groups().into_iter().map(|g| g.prefix).collect();
        assert_eq!(prefixes, vec!["/api"]);
    }

    #[test]
    fn test_group_name_hook_failure_keeps_name() {
        let app = App::default();
        app.hooks()
            .on_group_name(|info| Err(HookError::new(format!("no names: {}", info.name))));
        let group = app.group("/g", &[]).unwrap();

        let err = group.name("g.").unwrap_err();
        assert_eq!(err.to_string(), "on_group_name hook failed: no names: g.");
        assert_eq!(group.group_name(), "g.");
    }

    #[test]
    fn test_route_builder_does_not_register() {
        let app = App::default();
        let group = app.group("/api", &[]).unwrap();
        let builder = group.route("/users");
        assert_eq!(builder.path(), "/api/users");
        assert!(app.routes().is_empty());
        assert!(!group.any_route_defined());
    }
}
