//! URL building for named routes.

/// Fill the parameters of a route pattern.
///
/// `:name` is required, `:name?` and `*` are optional, `+` is required.
/// Wildcards are looked up under `*` and `+`. On failure the name of the
/// first missing parameter is returned.
pub fn reverse(pattern: &str, params: &[(&str, &str)]) -> Result<String, String> {
    let lookup = |key: &str| {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
            .filter(|v| !v.is_empty())
    };

    let mut url = String::with_capacity(pattern.len());
    for segment in pattern.split('/').filter(|s| !s.is_empty()) {
        let value = if let Some(param) = segment.strip_prefix(':') {
            let (param, optional) = match param.strip_suffix('?') {
                Some(param) => (param, true),
                None => (param, false),
            };
            match lookup(param) {
                Some(value) => value,
                None if optional => continue,
                None => return Err(param.to_string()),
            }
        } else if segment == "*" || segment == "+" {
            match lookup(segment) {
                Some(value) => value.trim_start_matches('/'),
                None if segment == "*" => continue,
                None => return Err(segment.to_string()),
            }
        } else {
            segment
        };

        url.push('/');
        url.push_str(value);
    }

    if url.is_empty() {
        url.push('/');
    }
    Ok(url)
}
