//! Request-observed events
//!
//! One event is emitted for every request that was authenticated and resolved
//! to an endpoint. Emission is fire-and-forget: a failing sink is logged and
//! never changes the response.

use chrono::{DateTime, Local};
use serde::Serialize;
use thiserror::Error;

use crate::handler::Endpoint;
use crate::logger;

/// Audit record for a served endpoint
#[derive(Debug, Clone, Serialize)]
pub struct RequestObserved {
    pub endpoint: Endpoint,
    pub remote_addr: Option<String>,
    pub principal: String,
    pub time: DateTime<Local>,
}

impl RequestObserved {
    pub fn new(endpoint: Endpoint, remote_addr: Option<String>, principal: String) -> Self {
        Self {
            endpoint,
            remote_addr,
            principal,
            time: Local::now(),
        }
    }
}

#[derive(Debug, Error)]
pub enum EventError {
    #[error("Failed to serialize event: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Event sink unavailable: {0}")]
    Unavailable(String),
}

/// Destination for request-observed events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &RequestObserved) -> Result<(), EventError>;
}

/// Writes events as JSON lines through the logger
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn emit(&self, event: &RequestObserved) -> Result<(), EventError> {
        let json = serde_json::to_string(event)?;
        logger::log_event(&json);
        Ok(())
    }
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&self, _event: &RequestObserved) -> Result<(), EventError> {
        Ok(())
    }
}
