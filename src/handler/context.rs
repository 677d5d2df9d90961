//! Per-request context
//!
//! Built once at the transport boundary and handed to the dispatcher. Nothing
//! below the boundary reads process-wide request state.

use std::fmt;
use std::net::IpAddr;

use super::headers::{HeaderSource, ServerVariables};

pub struct RequestContext {
    /// Path info supplied by the transport, if any
    pub path_info: Option<String>,
    /// Full request URI (path only)
    pub request_uri: Option<String>,
    /// Script/mount path the service lives under
    pub script_name: Option<String>,
    pub remote_addr: Option<IpAddr>,
    pub headers: Box<dyn HeaderSource>,
}

impl RequestContext {
    /// Build a context from CGI-style server variables
    pub fn from_server_variables(vars: ServerVariables) -> Self {
        let owned = |name: &str| vars.get(name).map(ToString::to_string);
        Self {
            path_info: owned("PATH_INFO"),
            request_uri: owned("REQUEST_URI"),
            script_name: owned("SCRIPT_NAME"),
            remote_addr: vars.get("REMOTE_ADDR").and_then(|a| a.parse().ok()),
            headers: Box::new(vars),
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self {
            path_info: None,
            request_uri: None,
            script_name: None,
            remote_addr: None,
            headers: Box::new(ServerVariables::default()),
        }
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("path_info", &self.path_info)
            .field("request_uri", &self.request_uri)
            .field("script_name", &self.script_name)
            .field("remote_addr", &self.remote_addr)
            .finish_non_exhaustive()
    }
}
