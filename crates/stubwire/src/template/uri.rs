//! URI helpers shared by the template and regex matchers.
//!
//! Paths are viewed as segment lists without the root: `/app/users/` and
//! `/app/users` both give `["app", "users"]`.

use super::element::literal_eq;
use std::borrow::Cow;
use url::Url;

/// Split an absolute path into decoded segments. One trailing slash is ignored.
pub fn path_segments(path: &str) -> Vec<String> {
    let path = path.strip_prefix('/').unwrap_or(path);
    if path.is_empty() {
        return Vec::new();
    }
    let path = path.strip_suffix('/').unwrap_or(path);
    path.split('/').map(|s| decode(s).into_owned()).collect()
}

/// Scheme, host, port and user-info must all agree.
pub fn is_same_origin(base: &Url, uri: &Url) -> bool {
    base.scheme() == uri.scheme()
        && base.host_str() == uri.host_str()
        && base.port_or_known_default() == uri.port_or_known_default()
        && base.username() == uri.username()
        && base.password() == uri.password()
}

/// Segments of `uri` below the path of `base`, or `None` when `uri` is not under `base`.
pub fn relative_path_segments(base: &Url, uri: &Url) -> Option<Vec<String>> {
    if !is_same_origin(base, uri) {
        return None;
    }

    let base_segments = path_segments(base.path());
    let mut segments = path_segments(uri.path());
    if segments.len() < base_segments.len() {
        return None;
    }
    let is_prefix = base_segments
        .iter()
        .zip(&segments)
        .all(|(b, s)| literal_eq(b, s));
    if !is_prefix {
        return None;
    }

    Some(segments.split_off(base_segments.len()))
}

pub fn is_base_address_match(base: &Url, uri: &Url) -> bool {
    relative_path_segments(base, uri).is_some()
}

/// Path and query of `uri` relative to the path of `base`, without a leading slash.
///
/// The base path must end at a segment boundary: `/app` is a prefix of
/// `/app/users` but not of `/application`.
pub fn relative_uri(base: &Url, uri: &Url) -> Option<String> {
    if !is_same_origin(base, uri) {
        return None;
    }

    let base_path = base.path().trim_matches('/');
    let mut path_and_query = uri.path().to_string();
    if let Some(query) = uri.query() {
        path_and_query.push('?');
        path_and_query.push_str(query);
    }
    let path_and_query = path_and_query.trim_start_matches('/');
    if base_path.is_empty() {
        return Some(path_and_query.to_string());
    }

    let head = path_and_query.get(..base_path.len())?;
    if !literal_eq(head, base_path) {
        return None;
    }
    let rest = &path_and_query[base_path.len()..];
    if !(rest.is_empty() || rest.starts_with('/') || rest.starts_with('?')) {
        return None;
    }
    Some(rest.trim_start_matches('/').to_string())
}

/// Parse a query string into `(key, value)` pairs.
///
/// A leading `?` is tolerated. Pairs without `=` or with an empty key are
/// skipped. Values are percent-decoded; keys are kept verbatim.
pub fn query_pairs(query: &str) -> Vec<(String, String)> {
    let query = query.strip_prefix('?').unwrap_or(query);
    query
        .split('&')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), decode(value).into_owned()))
        })
        .collect()
}

/// Parse a request URI into an absolute URL; relative request targets give `None`.
pub fn absolute_url(uri: &hyper::Uri) -> Option<Url> {
    uri.scheme()?;
    Url::parse(&uri.to_string()).ok()
}

fn decode(value: &str) -> Cow<'_, str> {
    urlencoding::decode(value).unwrap_or(Cow::Borrowed(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_path_segments_ignore_root_and_trailing_slash() {
        assert!(path_segments("/").is_empty());
        assert!(path_segments("").is_empty());
        assert_eq!(path_segments("/app/"), ["app"]);
        assert_eq!(path_segments("/app/users"), ["app", "users"]);
        assert_eq!(path_segments("/a//b"), ["a", "", "b"]);
        assert_eq!(path_segments("/a%20b"), ["a b"]);
    }

    #[test]
    fn test_relative_path_segments() {
        let base = url("http://host/app");
        assert_eq!(
            relative_path_segments(&base, &url("http://host/APP/user/1")),
            Some(vec!["user".to_string(), "1".to_string()])
        );
        assert_eq!(
            relative_path_segments(&base, &url("http://host/app")),
            Some(vec![])
        );
        assert_eq!(relative_path_segments(&base, &url("http://host/")), None);
        assert_eq!(relative_path_segments(&base, &url("http://host/other/1")), None);
    }

    #[test]
    fn test_origin_must_match() {
        let base = url("http://host/app");
        assert!(!is_base_address_match(&base, &url("https://host/app")));
        assert!(!is_base_address_match(&base, &url("http://other/app")));
        assert!(!is_base_address_match(&base, &url("http://host:8080/app")));
        assert!(!is_base_address_match(&base, &url("http://user@host/app")));
        assert!(is_base_address_match(&base, &url("http://host:80/app/x")));
    }

    #[test]
    fn test_relative_uri() {
        let base = url("http://host/app/");
        assert_eq!(
            relative_uri(&base, &url("http://host/app/path/1?x=2")).as_deref(),
            Some("path/1?x=2")
        );
        assert_eq!(relative_uri(&base, &url("http://host/app")).as_deref(), Some(""));
        assert_eq!(relative_uri(&base, &url("http://host/application")), None);
        assert_eq!(
            relative_uri(&url("http://host"), &url("http://host/a/b")).as_deref(),
            Some("a/b")
        );
    }

    #[test]
    fn test_query_pairs() {
        assert_eq!(
            query_pairs("?a=1&b=&c&=x&d=hello%20world"),
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), String::new()),
                ("d".to_string(), "hello world".to_string()),
            ]
        );
        assert!(query_pairs("").is_empty());
    }

    #[test]
    fn test_absolute_url_rejects_relative_targets() {
        let relative: hyper::Uri = "/only/path".parse().unwrap();
        assert!(absolute_url(&relative).is_none());
        let absolute: hyper::Uri = "http://host/a?b=1".parse().unwrap();
        assert_eq!(absolute_url(&absolute).unwrap().query(), Some("b=1"));
    }
}
