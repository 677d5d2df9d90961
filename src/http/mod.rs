//! HTTP protocol layer module
//!
//! Response header set, reply rendering and the XML error envelope.

pub mod response;
pub mod xml;

// Re-export commonly used types
pub use response::{build_artifact_reply, build_error_reply, build_error_reply_with_status, Reply};
