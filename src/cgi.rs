//! CGI transport
//!
//! Selected at startup when the process runs under a CGI-capable web server.
//! The environment is the request; one reply is written to stdout.

use std::io::Write;
use std::sync::Arc;

use crate::config::{AppState, HeaderSourceKind};
use crate::handler::{NativeHeaders, RequestContext, ServerVariables};
use crate::http::Reply;

/// Environment variable every CGI host sets
pub const GATEWAY_INTERFACE: &str = "GATEWAY_INTERFACE";

/// Whether the process was started by a CGI host
pub fn is_cgi_environment() -> bool {
    std::env::var_os(GATEWAY_INTERFACE).is_some()
}

/// Build the request context from server variables, honoring the header source
pub fn build_context(vars: ServerVariables, header_source: HeaderSourceKind) -> RequestContext {
    match header_source {
        HeaderSourceKind::Native => {
            let headers = NativeHeaders::new(native_header_list(&vars));
            RequestContext {
                headers: Box::new(headers),
                ..RequestContext::from_server_variables(vars)
            }
        }
        HeaderSourceKind::ServerVariables | HeaderSourceKind::Auto => {
            RequestContext::from_server_variables(vars)
        }
    }
}

/// `HTTP_USER_AGENT` -> `USER-AGENT`
fn native_header_list(vars: &ServerVariables) -> Vec<(String, String)> {
    vars.iter()
        .filter_map(|(key, value)| {
            key.strip_prefix("HTTP_")
                .map(|name| (name.replace('_', "-"), value.to_string()))
        })
        .collect()
}

/// Current process environment as server variables
///
/// Hosts may pass non-UTF-8 bytes (e.g. a Latin-1 `HTTP_USER_AGENT`); those
/// are replaced rather than aborting the request.
pub fn environment() -> ServerVariables {
    ServerVariables::from_os(std::env::vars_os())
}

/// Dispatch the single request described by `vars`
pub async fn serve(vars: ServerVariables, state: &AppState) -> Reply {
    let ctx = build_context(vars, state.header_source);
    state.dispatcher.dispatch(&ctx).await
}

/// Serve `vars` and render the CGI output, without a body for HEAD requests
pub async fn respond(vars: ServerVariables, state: &AppState) -> Vec<u8> {
    let is_head = vars.get("REQUEST_METHOD") == Some("HEAD");
    serve(vars, state).await.to_cgi(is_head)
}

/// Run one CGI request from the process environment
pub async fn run(state: Arc<AppState>) -> std::io::Result<()> {
    let output = respond(environment(), &state).await;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&output)?;
    stdout.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{TokenEntry, TokenTable};
    use crate::config::Config;
    use hyper::StatusCode;

    fn vars(items: &[(&str, &str)]) -> ServerVariables {
        ServerVariables::new(
            items
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string())),
        )
    }

    fn state(dir: &std::path::Path, header_source: HeaderSourceKind) -> AppState {
        let mut cfg = Config::load_from("does/not/exist/config").unwrap();
        cfg.service.resource_dir = dir.to_string_lossy().into_owned();
        cfg.service.header_source = header_source;
        cfg.logging.event_log = false;
        let table = TokenTable::new([TokenEntry {
            token: "validtoken123".to_string(),
            principal: "7".to_string(),
            valid_until: None,
            ip_restriction: Vec::new(),
        }])
        .unwrap();
        AppState::with_authenticator(&cfg, true, Arc::new(table))
    }

    #[test]
    fn test_native_header_list() {
        let list = native_header_list(&vars(&[
            ("HTTP_AUTHORIZATION", "abc"),
            ("HTTP_USER_AGENT", "curl"),
            ("PATH_INFO", "/bird_course"),
        ]));
        assert_eq!(list.len(), 2);
        assert!(list.contains(&("USER-AGENT".to_string(), "curl".to_string())));
    }

    #[tokio::test]
    async fn test_serve_with_path_info() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bird_academy.xml"), "<academy/>").unwrap();

        for source in [HeaderSourceKind::Auto, HeaderSourceKind::Native] {
            let reply = serve(
                vars(&[
                    ("REQUEST_METHOD", "GET"),
                    ("PATH_INFO", "/bird_academy"),
                    ("HTTP_AUTHORIZATION", "validtoken123"),
                ]),
                &state(dir.path(), source),
            )
            .await;
            assert_eq!(reply.status, StatusCode::OK);
            assert_eq!(&reply.body[..], b"<academy/>");
        }
    }

    #[tokio::test]
    async fn test_head_and_missing_auth() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bird_course.xml"), "<course/>").unwrap();
        let state = state(dir.path(), HeaderSourceKind::Auto);

        let head = respond(
            vars(&[
                ("REQUEST_METHOD", "HEAD"),
                ("PATH_INFO", "/bird_course"),
                ("HTTP_AUTHORIZATION", "validtoken123"),
            ]),
            &state,
        )
        .await;
        let head = String::from_utf8(head).unwrap();
        assert!(head.starts_with("Status: 200 OK\r\n"));
        // Same length a GET would report
        assert!(head.contains("Content-Length: 9\r\n"));
        assert!(head.ends_with("\r\n\r\n"));

        let denied = respond(vars(&[("PATH_INFO", "/bird_course")]), &state).await;
        let cgi = String::from_utf8(denied).unwrap();
        assert!(cgi.starts_with("Status: 403 Forbidden\r\n"));
        assert!(cgi.contains("X-Response-Code: 403\r\n"));
        assert!(cgi.contains("<ERRORCODE>noauthheader</ERRORCODE>"));
    }

    #[cfg(unix)]
    #[test]
    fn test_environment_tolerates_invalid_unicode() {
        use std::os::unix::ffi::OsStrExt;

        let key = "HTTP_X_BIRD_LATIN1_AGENT";
        std::env::set_var(key, std::ffi::OsStr::from_bytes(b"f\xffo"));
        let vars = environment();
        std::env::remove_var(key);

        assert_eq!(vars.get(key), Some("f\u{fffd}o"));
    }
}
