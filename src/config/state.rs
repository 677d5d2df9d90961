// Application state module
// Wires configuration into the dispatcher shared by all connections

use std::sync::Arc;

use super::types::{Config, HeaderSourceKind};
use crate::auth::{TokenStoreError, TokenTable};
use crate::events::{EventSink, LogEventSink, NullEventSink};
use crate::handler::{ArtifactStore, Dispatcher};
use crate::logger;

/// Application state
pub struct AppState {
    pub config: Config,
    pub dispatcher: Dispatcher,
    /// Header source after `auto` has been resolved for the running transport
    pub header_source: HeaderSourceKind,
}

impl AppState {
    /// Build state for the HTTP transport (`cgi = false`) or the CGI transport
    pub fn new(config: &Config, cgi: bool) -> Result<Self, TokenStoreError> {
        let tokens = TokenTable::load(&config.auth.tokens, config.auth.tokens_file.as_deref())?;
        if tokens.is_empty() {
            logger::log_warning("No access tokens configured, every request will be rejected");
        }
        Ok(Self::with_authenticator(config, cgi, Arc::new(tokens)))
    }

    pub fn with_authenticator(
        config: &Config,
        cgi: bool,
        authenticator: Arc<dyn crate::auth::Authenticator>,
    ) -> Self {
        let events: Arc<dyn EventSink> = if config.logging.event_log {
            Arc::new(LogEventSink)
        } else {
            Arc::new(NullEventSink)
        };
        let dispatcher = Dispatcher::new(
            authenticator,
            events,
            ArtifactStore::new(&config.service.resource_dir),
            config.service.debug,
        )
        .with_show_headers(config.logging.show_headers);

        Self {
            config: config.clone(),
            dispatcher,
            header_source: config.service.header_source.resolve(cgi),
        }
    }
}

impl HeaderSourceKind {
    /// Pick the concrete source for the running transport
    pub const fn resolve(self, cgi: bool) -> Self {
        match self {
            Self::Auto if cgi => Self::ServerVariables,
            Self::Auto => Self::Native,
            other => other,
        }
    }
}
