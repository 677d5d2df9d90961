//! Request dispatcher
//!
//! Runs the fixed sequence for every request:
//! extract headers, authenticate, resolve the endpoint, emit the observed
//! event, serve the artifact. The first failure short-circuits into a single
//! error reply.

use hyper::body::Bytes;
use std::sync::Arc;

use super::artifact::ArtifactStore;
use super::context::RequestContext;
use super::endpoint::{resolve_endpoint, Endpoint};
use super::error::DispatchError;
use super::headers::{HeaderMap, AUTHORIZATION};
use crate::auth::{Authenticator, Principal};
use crate::events::{EventSink, RequestObserved};
use crate::http::{self, Reply};
use crate::logger;

/// Outcome of a dispatched request, kept for access logging
#[derive(Debug, Clone)]
pub struct Dispatched {
    pub reply: Reply,
    pub endpoint: Option<Endpoint>,
    pub principal: Option<String>,
}

pub struct Dispatcher {
    authenticator: Arc<dyn Authenticator>,
    events: Arc<dyn EventSink>,
    artifacts: ArtifactStore,
    debug: bool,
    show_headers: bool,
}

/// What a successful pass through the pipeline produced
struct Served {
    endpoint: Endpoint,
    principal: Principal,
    body: Bytes,
}

impl Dispatcher {
    pub fn new(
        authenticator: Arc<dyn Authenticator>,
        events: Arc<dyn EventSink>,
        artifacts: ArtifactStore,
        debug: bool,
    ) -> Self {
        Self {
            authenticator,
            events,
            artifacts,
            debug,
            show_headers: false,
        }
    }

    /// Log the canonical header count of every request
    #[must_use]
    pub const fn with_show_headers(mut self, show: bool) -> Self {
        self.show_headers = show;
        self
    }

    pub const fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    /// Dispatch a request and render exactly one reply
    pub async fn dispatch(&self, ctx: &RequestContext) -> Reply {
        self.dispatch_detailed(ctx).await.reply
    }

    pub async fn dispatch_detailed(&self, ctx: &RequestContext) -> Dispatched {
        match self.process(ctx).await {
            Ok(served) => Dispatched {
                reply: http::build_artifact_reply(served.body),
                endpoint: Some(served.endpoint),
                principal: Some(served.principal.id),
            },
            Err(err) => {
                self.log_failure(&err);
                Dispatched {
                    reply: http::build_error_reply(&err, self.debug),
                    endpoint: None,
                    principal: None,
                }
            }
        }
    }

    async fn process(&self, ctx: &RequestContext) -> Result<Served, DispatchError> {
        let headers = ctx.headers.headers();
        logger::log_headers_count(headers.len(), self.show_headers);

        let token = auth_token(&headers)?;
        let principal = self
            .authenticator
            .authenticate(token, ctx.remote_addr)
            .await?;

        let endpoint = resolve_endpoint(ctx)?;

        let event = RequestObserved::new(
            endpoint,
            ctx.remote_addr.map(|addr| addr.to_string()),
            principal.id.clone(),
        );
        if let Err(e) = self.events.emit(&event) {
            logger::log_warning(&format!("Failed to emit event for {endpoint}: {e}"));
        }

        let body = self.artifacts.load(endpoint).await?;
        Ok(Served {
            endpoint,
            principal,
            body,
        })
    }

    fn log_failure(&self, err: &DispatchError) {
        match err {
            DispatchError::ArtifactUnavailable { .. } => logger::log_error(&format!(
                "{err}: {}",
                err.debug_info().unwrap_or_default()
            )),
            _ => logger::log_warning(&format!(
                "Request rejected ({} {}): {err}",
                err.status().as_u16(),
                err.error_code()
            )),
        }
    }
}

/// The Authorization header is checked locally; absence never reaches the authenticator
fn auth_token(headers: &HeaderMap) -> Result<&str, DispatchError> {
    headers
        .get(AUTHORIZATION)
        .map(String::as_str)
        .ok_or(DispatchError::MissingAuthHeader)
}
