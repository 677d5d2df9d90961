//! Header extraction
//!
//! Normalizes whatever the transport exposes into a canonical [`HeaderMap`]
//! keyed by CGI-style names (`HTTP_AUTHORIZATION`, `HTTP_USER_AGENT`, ...).

use std::collections::BTreeMap;
use std::ffi::OsString;

/// Marker prefix every canonical header key carries
pub const HEADER_PREFIX: &str = "HTTP_";

/// Canonical key of the Authorization header
pub const AUTHORIZATION: &str = "HTTP_AUTHORIZATION";

/// Header names translated from a native header list
pub const TRANSLATED_HEADERS: [&str; 6] = [
    "Content-Type",
    "Accept",
    "Authorization",
    "Content-Length",
    "User-Agent",
    "Host",
];

/// Canonical header name to value, scoped to one request
pub type HeaderMap = BTreeMap<String, String>;

/// Anything that can produce the canonical header map of a request
pub trait HeaderSource: Send + Sync {
    fn headers(&self) -> HeaderMap;
}

/// Header list as exposed by the transport itself (name, value)
#[derive(Debug, Clone, Default)]
pub struct NativeHeaders {
    entries: Vec<(String, String)>,
}

impl NativeHeaders {
    pub fn new(entries: Vec<(String, String)>) -> Self {
        Self { entries }
    }

    /// Collect from a hyper header map, skipping values that are not visible ASCII
    pub fn from_hyper(headers: &hyper::HeaderMap) -> Self {
        let entries = headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        Self { entries }
    }
}

impl HeaderSource for NativeHeaders {
    fn headers(&self) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in &self.entries {
            let Some(allowed) = TRANSLATED_HEADERS
                .iter()
                .find(|h| h.eq_ignore_ascii_case(name))
            else {
                continue;
            };
            map.insert(canonical_name(allowed), value.clone());
        }
        map
    }
}

/// Generic server-variable map (CGI environment)
#[derive(Debug, Clone, Default)]
pub struct ServerVariables {
    vars: BTreeMap<String, String>,
}

impl ServerVariables {
    pub fn new(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            vars: vars.into_iter().collect(),
        }
    }

    /// Build from OS strings, replacing invalid UTF-8 with U+FFFD
    pub fn from_os(vars: impl IntoIterator<Item = (OsString, OsString)>) -> Self {
        Self::new(vars.into_iter().map(|(key, value)| {
            (
                key.to_string_lossy().into_owned(),
                value.to_string_lossy().into_owned(),
            )
        }))
    }

    /// Synthesize CGI variables from a native header list
    pub fn from_hyper(headers: &hyper::HeaderMap) -> Self {
        let vars = headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (canonical_name(name.as_str()), v.to_string()))
            })
            .collect();
        Self { vars }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl HeaderSource for ServerVariables {
    fn headers(&self) -> HeaderMap {
        self.vars
            .iter()
            .filter(|(key, _)| key.starts_with(HEADER_PREFIX))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

/// `User-Agent` -> `HTTP_USER_AGENT`
pub fn canonical_name(header: &str) -> String {
    format!("{HEADER_PREFIX}{}", header.to_ascii_uppercase().replace('-', "_"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_canonical_name() {
        assert_eq!(canonical_name("User-Agent"), "HTTP_USER_AGENT");
        assert_eq!(canonical_name("authorization"), "HTTP_AUTHORIZATION");
    }

    #[test]
    fn test_native_translates_allow_list_only() {
        let source = NativeHeaders::new(pairs(&[
            ("Authorization", "validtoken123"),
            ("Content-Type", "text/xml"),
            ("Host", "example.org"),
            ("X-Forwarded-For", "10.0.0.1"),
            ("Cookie", "a=b"),
        ]));
        let map = source.headers();
        assert_eq!(map.len(), 3);
        assert_eq!(map[AUTHORIZATION], "validtoken123");
        assert_eq!(map["HTTP_CONTENT_TYPE"], "text/xml");
        assert_eq!(map["HTTP_HOST"], "example.org");
        assert!(!map.contains_key("HTTP_X_FORWARDED_FOR"));
    }

    #[test]
    fn test_native_is_case_insensitive() {
        let source = NativeHeaders::new(pairs(&[("authorization", "t"), ("user-agent", "curl")]));
        let map = source.headers();
        assert_eq!(map[AUTHORIZATION], "t");
        assert_eq!(map["HTTP_USER_AGENT"], "curl");
    }

    #[test]
    fn test_server_variables_filtered_by_prefix() {
        let source = ServerVariables::new(pairs(&[
            ("HTTP_AUTHORIZATION", "validtoken123"),
            ("HTTP_X_CUSTOM", "1"),
            ("REQUEST_URI", "/server.php/bird_course"),
            ("SCRIPT_NAME", "/server.php"),
            ("REMOTE_ADDR", "127.0.0.1"),
        ]));
        let map = source.headers();
        assert_eq!(map.len(), 2);
        assert_eq!(map[AUTHORIZATION], "validtoken123");
        assert_eq!(map["HTTP_X_CUSTOM"], "1");
        assert!(!map.contains_key("REQUEST_URI"));
    }

    #[cfg(unix)]
    #[test]
    fn test_from_os_is_lossy() {
        use std::os::unix::ffi::OsStringExt;

        let vars = ServerVariables::from_os([
            (
                OsString::from("HTTP_USER_AGENT"),
                OsString::from_vec(b"caf\xe9".to_vec()),
            ),
            (OsString::from("HTTP_AUTHORIZATION"), OsString::from("abc")),
        ]);
        assert_eq!(vars.get("HTTP_USER_AGENT"), Some("caf\u{fffd}"));
        assert_eq!(vars.headers()[AUTHORIZATION], "abc");
    }

    #[test]
    fn test_empty_sources() {
        assert!(NativeHeaders::default().headers().is_empty());
        assert!(ServerVariables::default().headers().is_empty());
    }

    #[test]
    fn test_from_hyper() {
        let mut headers = hyper::HeaderMap::new();
        headers.insert("authorization", "abc".parse().unwrap());
        headers.insert("x-trace", "t1".parse().unwrap());

        let native = NativeHeaders::from_hyper(&headers).headers();
        assert_eq!(native[AUTHORIZATION], "abc");
        assert!(!native.contains_key("HTTP_X_TRACE"));

        let vars = ServerVariables::from_hyper(&headers).headers();
        assert_eq!(vars[AUTHORIZATION], "abc");
        assert_eq!(vars["HTTP_X_TRACE"], "t1");
    }
}
