//! HTTP entry point
//!
//! Turns a hyper request into a [`RequestContext`], runs the dispatcher and
//! writes the access log line.

use crate::config::{AppState, HeaderSourceKind};
use crate::handler::context::RequestContext;
use crate::handler::headers::{HeaderSource, NativeHeaders, ServerVariables};
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let is_head = req.method() == Method::HEAD;

    let ctx = build_context(&req, &state, peer_addr);
    let dispatched = state.dispatcher.dispatch_detailed(&ctx).await;

    if state.config.logging.access_log {
        let mut entry = AccessLogEntry::new(
            peer_addr.ip().to_string(),
            req.method().to_string(),
            req.uri().path().to_string(),
        );
        entry.http_version = http_version(req.version()).to_string();
        entry.status = dispatched.reply.status.as_u16();
        entry.body_bytes = if is_head { 0 } else { dispatched.reply.body.len() };
        entry.referer = header_string(&req, "referer");
        entry.user_agent = header_string(&req, "user-agent");
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        entry.endpoint = dispatched.endpoint.map(|e| e.as_str().to_string());
        entry.principal = dispatched.principal;
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(dispatched.reply.into_response(is_head))
}

/// Build the per-request context from the configured header source
pub fn build_context<B>(
    req: &Request<B>,
    state: &AppState,
    peer_addr: SocketAddr,
) -> RequestContext {
    let request_uri = req.uri().path().to_string();
    let script_name = state.config.server.mount_path.clone();

    match state.header_source {
        HeaderSourceKind::ServerVariables => {
            let mut vars = ServerVariables::from_hyper(req.headers());
            vars.insert("REQUEST_URI", request_uri);
            vars.insert("SCRIPT_NAME", script_name);
            vars.insert("REMOTE_ADDR", peer_addr.ip().to_string());
            RequestContext::from_server_variables(vars)
        }
        HeaderSourceKind::Native | HeaderSourceKind::Auto => {
            let headers: Box<dyn HeaderSource> =
                Box::new(NativeHeaders::from_hyper(req.headers()));
            RequestContext {
                path_info: None,
                request_uri: Some(request_uri),
                script_name: Some(script_name),
                remote_addr: Some(peer_addr.ip()),
                headers,
            }
        }
    }
}

fn header_string<B>(req: &Request<B>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

const fn http_version(version: hyper::Version) -> &'static str {
    match version {
        hyper::Version::HTTP_09 => "0.9",
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        hyper::Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{TokenEntry, TokenTable};
    use crate::config::Config;
    use crate::handler::Endpoint;
    use http_body_util::BodyExt;
    use hyper::StatusCode;

    fn state(dir: &std::path::Path, header_source: HeaderSourceKind) -> Arc<AppState> {
        let mut cfg = Config::load_from("does/not/exist/config").unwrap();
        cfg.service.resource_dir = dir.to_string_lossy().into_owned();
        cfg.service.header_source = header_source;
        cfg.logging.access_log = false;
        cfg.logging.event_log = false;
        let table = TokenTable::new([TokenEntry {
            token: "validtoken123".to_string(),
            principal: "42".to_string(),
            valid_until: None,
            ip_restriction: vec!["127.0.0.1".parse().unwrap()],
        }])
        .unwrap();
        Arc::new(AppState::with_authenticator(&cfg, false, Arc::new(table)))
    }

    fn get(path: &str, token: Option<&str>) -> Request<()> {
        let mut builder = Request::builder().uri(path);
        if let Some(token) = token {
            builder = builder.header("Authorization", token);
        }
        builder.body(()).unwrap()
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:50000".parse().unwrap()
    }

    #[tokio::test]
    async fn test_serves_artifact_under_mount_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bird_course.xml"), "<course/>").unwrap();

        for source in [HeaderSourceKind::Native, HeaderSourceKind::ServerVariables] {
            let response = handle_request(
                get("/webservice/bird/server.php/bird_course/", Some("validtoken123")),
                state(dir.path(), source),
                peer(),
            )
            .await
            .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(
                response.headers()["content-type"],
                "application/xml; charset=utf-8"
            );
            let body = response.into_body().collect().await.unwrap().to_bytes();
            assert_eq!(&body[..], b"<course/>");
        }
    }

    #[tokio::test]
    async fn test_path_outside_mount_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bird_course.xml"), "<course/>").unwrap();

        for source in [HeaderSourceKind::Native, HeaderSourceKind::ServerVariables] {
            let response = handle_request(
                get("/bird_course", Some("validtoken123")),
                state(dir.path(), source),
                peer(),
            )
            .await
            .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_missing_authorization() {
        let dir = tempfile::tempdir().unwrap();
        let response = handle_request(
            get("/webservice/bird/server.php/bird_course", None),
            state(dir.path(), HeaderSourceKind::Native),
            peer(),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response.headers()["x-response-code"], "403");
    }

    #[tokio::test]
    async fn test_ip_restriction_uses_peer_address() {
        let dir = tempfile::tempdir().unwrap();
        let response = handle_request(
            get("/webservice/bird/server.php/bird_course", Some("validtoken123")),
            state(dir.path(), HeaderSourceKind::Native),
            "10.9.8.7:40000".parse().unwrap(),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_head_has_no_body() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bird_module.xml"), "<module/>").unwrap();
        let req = Request::builder()
            .method(Method::HEAD)
            .uri("/webservice/bird/server.php/bird_module")
            .header("Authorization", "validtoken123")
            .body(())
            .unwrap();
        let response = handle_request(req, state(dir.path(), HeaderSourceKind::Native), peer())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-length"], "9");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }

    #[test]
    fn test_build_context_native() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path(), HeaderSourceKind::Native);
        let ctx = build_context(
            &get("/webservice/bird/server.php/bird_program", Some("t")),
            &state,
            peer(),
        );
        assert!(ctx.path_info.is_none());
        assert_eq!(
            ctx.request_uri.as_deref(),
            Some("/webservice/bird/server.php/bird_program")
        );
        assert_eq!(ctx.remote_addr, Some(peer().ip()));
        assert_eq!(
            crate::handler::endpoint::resolve_endpoint(&ctx).unwrap(),
            Endpoint::BirdProgram
        );
    }
}
