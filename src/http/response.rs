//! HTTP response building module
//!
//! Every reply, success or error, carries the same XML header set. Replies are
//! transport neutral and converted to hyper responses or CGI output at the
//! edge.

use chrono::{DateTime, Utc};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

use super::xml;
use crate::handler::DispatchError;

pub const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";
pub const CONTENT_DISPOSITION: &str = "inline; filename=\"response.xml\"";
pub const CACHE_CONTROL: &str = "private, must-revalidate, pre-check=0, post-check=0, max-age=0";
/// Echoes the status code as a header for clients that cannot read the status line
pub const RESPONSE_CODE_HEADER: &str = "X-Response-Code";

/// A fully rendered response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: StatusCode,
    pub headers: Vec<(&'static str, String)>,
    pub body: Bytes,
}

impl Reply {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Convert into a hyper response, dropping the body for HEAD requests
    pub fn into_response(self, is_head: bool) -> Response<Full<Bytes>> {
        let mut builder = Response::builder()
            .status(self.status)
            .header("Content-Length", self.body.len());
        for (name, value) in &self.headers {
            builder = builder.header(*name, value.as_str());
        }
        let body = if is_head { Bytes::new() } else { self.body };

        builder.body(Full::new(body)).unwrap_or_else(|e| {
            log_build_error(self.status.as_str(), &e);
            let mut fallback = Response::new(Full::new(Bytes::new()));
            *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
    }

    /// Serialize as a CGI response (`Status:` line, headers, blank line, body)
    ///
    /// HEAD output keeps the `Content-Length` of the full body.
    pub fn to_cgi(&self, is_head: bool) -> Vec<u8> {
        let mut out = format!(
            "Status: {} {}\r\n",
            self.status.as_u16(),
            self.status.canonical_reason().unwrap_or("")
        );
        for (name, value) in &self.headers {
            out.push_str(&format!("{name}: {value}\r\n"));
        }
        out.push_str(&format!("Content-Length: {}\r\n\r\n", self.body.len()));

        let mut bytes = out.into_bytes();
        if !is_head {
            bytes.extend_from_slice(&self.body);
        }
        bytes
    }
}

/// `Expires` value: the Unix epoch in HTTP date format
pub fn expired_date() -> String {
    DateTime::<Utc>::UNIX_EPOCH
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// Transport headers shared by success and error replies
pub fn xml_headers(status: StatusCode) -> Vec<(&'static str, String)> {
    vec![
        ("Content-Type", XML_CONTENT_TYPE.to_string()),
        ("Content-Disposition", CONTENT_DISPOSITION.to_string()),
        (RESPONSE_CODE_HEADER, status.as_u16().to_string()),
        ("Cache-Control", CACHE_CONTROL.to_string()),
        ("Expires", expired_date()),
        ("Pragma", "no-cache".to_string()),
        ("Accept-Ranges", "none".to_string()),
        ("Access-Control-Allow-Origin", "*".to_string()),
    ]
}

/// Build 200 reply carrying an artifact verbatim
pub fn build_artifact_reply(body: Bytes) -> Reply {
    Reply {
        status: StatusCode::OK,
        headers: xml_headers(StatusCode::OK),
        body,
    }
}

/// Build the structured error reply for a failure
pub fn build_error_reply(err: &DispatchError, debug: bool) -> Reply {
    build_error_reply_with_status(err, err.status(), debug)
}

/// Build an error reply with a caller-supplied status
pub fn build_error_reply_with_status(
    err: &DispatchError,
    status: StatusCode,
    debug: bool,
) -> Reply {
    Reply {
        status,
        headers: xml_headers(status),
        body: Bytes::from(xml::error_document(err, debug)),
    }
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
