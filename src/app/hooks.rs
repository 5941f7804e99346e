//! Lifecycle hooks.
//!
//! # Responsibilities
//! - Store user callbacks for registration lifecycle events
//! - Run them synchronously, in registration order, stopping at the first error
//!
//! # Design Decisions
//! - Hooks receive immutable snapshots, never live state
//! - Hooks must not call back into the owning [`App`](crate::app::App):
//!   some of them run while the application lock is held

use std::fmt;
use std::sync::{PoisonError, RwLock};

use thiserror::Error;

use crate::app::mount::MountInfo;
use crate::app::stack::RouteInfo;
use crate::error::RouterError;
use crate::observability::metrics;
use crate::routing::group::GroupInfo;

/// Error returned by a hook to reject an operation.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HookError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Which extension point a hook belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    Route,
    Name,
    Group,
    GroupName,
    Mount,
}

impl HookKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookKind::Route => "on_route",
            HookKind::Name => "on_name",
            HookKind::Group => "on_group",
            HookKind::GroupName => "on_group_name",
            HookKind::Mount => "on_mount",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type HookFn<T> = Box<dyn Fn(&T) -> Result<(), HookError> + Send + Sync>;

struct HookList<T>(RwLock<Vec<HookFn<T>>>);

impl<T> Default for HookList<T> {
    fn default() -> Self {
        Self(RwLock::new(Vec::new()))
    }
}

impl<T> HookList<T> {
    fn push(&self, hook: HookFn<T>) {
        self.0
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(hook);
    }

    fn execute(&self, kind: HookKind, value: &T) -> Result<(), RouterError> {
        let hooks = self.0.read().unwrap_or_else(PoisonError::into_inner);
        for hook in hooks.iter() {
            if let Err(source) = hook(value) {
                metrics::record_hook_failure(kind);
                return Err(RouterError::Hook { hook: kind, source });
            }
        }
        Ok(())
    }
}

/// Hook registry of one application.
#[derive(Default)]
pub struct Hooks {
    on_route: HookList<RouteInfo>,
    on_name: HookList<RouteInfo>,
    on_group: HookList<GroupInfo>,
    on_group_name: HookList<GroupInfo>,
    on_mount: HookList<MountInfo>,
}

impl Hooks {
    /// Called for every route registration.
    pub fn on_route<F>(&self, hook: F)
    where
        F: Fn(&RouteInfo) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.on_route.push(Box::new(hook));
    }

    /// Called when a route is named.
    pub fn on_name<F>(&self, hook: F)
    where
        F: Fn(&RouteInfo) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.on_name.push(Box::new(hook));
    }

    /// Called when a group is created, before the caller receives it.
    pub fn on_group<F>(&self, hook: F)
    where
        F: Fn(&GroupInfo) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.on_group.push(Box::new(hook));
    }

    /// Called when a group names itself. Runs under the application lock.
    pub fn on_group_name<F>(&self, hook: F)
    where
        F: Fn(&GroupInfo) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.on_group_name.push(Box::new(hook));
    }

    /// Called when a sub-application is mounted.
    pub fn on_mount<F>(&self, hook: F)
    where
        F: Fn(&MountInfo) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.on_mount.push(Box::new(hook));
    }

    pub(crate) fn execute_on_route(&self, route: &RouteInfo) -> Result<(), RouterError> {
        self.on_route.execute(HookKind::Route, route)
    }

    pub(crate) fn execute_on_name(&self, route: &RouteInfo) -> Result<(), RouterError> {
        self.on_name.execute(HookKind::Name, route)
    }

    pub(crate) fn execute_on_group(&self, group: &GroupInfo) -> Result<(), RouterError> {
        self.on_group.execute(HookKind::Group, group)
    }

    pub(crate) fn execute_on_group_name(&self, group: &GroupInfo) -> Result<(), RouterError> {
        self.on_group_name.execute(HookKind::GroupName, group)
    }

    pub(crate) fn execute_on_mount(&self, mount: &MountInfo) -> Result<(), RouterError> {
        self.on_mount.execute(HookKind::Mount, mount)
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks").finish_non_exhaustive()
    }
}
