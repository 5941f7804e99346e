//! Hot reload of the configuration file.
//!
//! # Design Decisions
//! - Watches the parent directory and filters by file name, so editors that
//!   replace the file instead of writing in place are still seen
//! - Invalid files are logged and skipped; the running config stays
//! - A reload that parses to the config already sent is not forwarded

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::AppConfig;

/// Sends every new, valid version of a config file over a channel.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<AppConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiving end of its updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<AppConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. Updates stop when the returned watcher is dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self { path, update_tx } = self;
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = path.file_name().map(|name| name.to_os_string());
        let mut last_sent: Option<AppConfig> = None;

        let handler_path = path.clone();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let event = match res {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::error!(error = ?e, "Config watch error");
                        return;
                    }
                };
                if !is_relevant(&event, file_name.as_deref()) {
                    return;
                }

                match load_config(&handler_path) {
                    Ok(config) if last_sent.as_ref() == Some(&config) => {
                        tracing::debug!("Config file touched without changes");
                    }
                    Ok(config) => {
                        tracing::info!(path = ?handler_path, "Config file changed, reloading");
                        last_sent = Some(config.clone());
                        if update_tx.send(config).is_err() {
                            tracing::warn!("Config receiver dropped, reload ignored");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Invalid config file, keeping current configuration");
                    }
                }
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        tracing::info!(path = ?path, "Config watcher started");
        Ok(watcher)
    }
}

fn is_relevant(event: &Event, file_name: Option<&std::ffi::OsStr>) -> bool {
    if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
        return false;
    }
    match file_name {
        Some(name) => event
            .paths
            .iter()
            .any(|changed| changed.file_name() == Some(name)),
        None => true,
    }
}
