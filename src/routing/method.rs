//! HTTP method tokens used at registration time.

use std::fmt;

pub use axum::http::Method;

/// Methods recognized when the configuration does not say otherwise.
pub const DEFAULT_METHODS: [&str; 9] = [
    "GET", "HEAD", "POST", "PUT", "DELETE", "CONNECT", "OPTIONS", "TRACE", "PATCH",
];

/// The method side of a registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Methods {
    /// Middleware registration: matches every method.
    Use,
    /// Explicit method list of a handler route.
    List(Vec<Method>),
}

impl Methods {
    pub fn list(methods: &[Method]) -> Self {
        Methods::List(methods.to_vec())
    }

    pub fn is_use(&self) -> bool {
        matches!(self, Methods::Use)
    }

    pub fn contains(&self, method: &Method) -> bool {
        match self {
            Methods::Use => true,
            Methods::List(methods) => methods.contains(method),
        }
    }

    /// Method tokens as strings, `USE` for the wildcard.
    pub fn tokens(&self) -> Vec<String> {
        match self {
            Methods::Use => vec!["USE".to_string()],
            Methods::List(methods) => methods.iter().map(|m| m.as_str().to_string()).collect(),
        }
    }
}

impl fmt::Display for Methods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tokens().join(","))
    }
}

/// Parse a method token. Custom extension methods are accepted.
pub fn parse_method(token: &str) -> Option<Method> {
    Method::from_bytes(token.as_bytes()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_use_matches_everything() {
        assert!(Methods::Use.contains(&Method::GET));
        assert!(Methods::Use.contains(&Method::PATCH));
        assert_eq!(Methods::Use.to_string(), "USE");
    }

    #[test]
    fn test_list() {
        let methods = Methods::list(&[Method::GET, Method::POST]);
        assert!(methods.contains(&Method::POST));
        assert!(!methods.contains(&Method::DELETE));
        assert_eq!(methods.to_string(), "GET,POST");
    }

    #[test]
    fn test_parse_method() {
        assert_eq!(parse_method("GET"), Some(Method::GET));
        assert_eq!(parse_method("PROPFIND").map(|m| m.to_string()), Some("PROPFIND".to_string()));
        assert_eq!(parse_method("BAD METHOD"), None);
        assert_eq!(parse_method(""), None);
    }
}
