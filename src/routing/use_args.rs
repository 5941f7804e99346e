//! Arguments accepted by `use_`.
//!
//! One `use_` call mixes path prefixes, prefix lists, a sub-application to
//! mount and middleware handlers. Each argument is one [`UseArg`].

use crate::app::App;
use crate::http::handler::Handler;

/// A single `use_` argument.
#[derive(Debug, Clone)]
pub enum UseArg {
    /// Path prefix, relative to the router it is applied to. The last one wins.
    Prefix(String),
    /// Apply the same middleware under each prefix. The last list wins.
    Prefixes(Vec<String>),
    /// Mount a whole application.
    Mount(App),
    /// Middleware, appended in order.
    Middleware(Handler),
}

impl From<&str> for UseArg {
    fn from(prefix: &str) -> Self {
        UseArg::Prefix(prefix.to_string())
    }
}

impl From<String> for UseArg {
    fn from(prefix: String) -> Self {
        UseArg::Prefix(prefix)
    }
}

impl From<Vec<String>> for UseArg {
    fn from(prefixes: Vec<String>) -> Self {
        UseArg::Prefixes(prefixes)
    }
}

impl From<&[&str]> for UseArg {
    fn from(prefixes: &[&str]) -> Self {
        UseArg::Prefixes(prefixes.iter().map(|p| p.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for UseArg {
    fn from(prefixes: [&str; N]) -> Self {
        UseArg::Prefixes(prefixes.iter().map(|p| p.to_string()).collect())
    }
}

impl From<App> for UseArg {
    fn from(app: App) -> Self {
        UseArg::Mount(app)
    }
}

impl From<Handler> for UseArg {
    fn from(handler: Handler) -> Self {
        UseArg::Middleware(handler)
    }
}

/// `use_` arguments sorted into buckets.
#[derive(Debug)]
pub(crate) struct UseSet {
    /// Never empty: falls back to the single prefix, `""` by default.
    pub(crate) prefixes: Vec<String>,
    pub(crate) sub_app: Option<App>,
    pub(crate) handlers: Vec<Handler>,
}

impl UseSet {
    pub(crate) fn collect<I>(args: I) -> Self
    where
        I: IntoIterator<Item = UseArg>,
    {
        let mut prefix = String::new();
        let mut prefixes = Vec::new();
        let mut sub_app = None;
        let mut handlers = Vec::new();

        for arg in args {
            match arg {
                UseArg::Prefix(p) => prefix = p,
                UseArg::Prefixes(p) => prefixes = p,
                UseArg::Mount(app) => sub_app = Some(app),
                UseArg::Middleware(handler) => handlers.push(handler),
            }
        }

        if prefixes.is_empty() {
            prefixes.push(prefix);
        }

        Self {
            prefixes,
            sub_app,
            handlers,
        }
    }
}
