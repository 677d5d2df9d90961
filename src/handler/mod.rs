//! Request handler module
//!
//! Transport-independent core: header extraction, endpoint resolution,
//! artifact loading and the dispatcher tying them together.

pub mod artifact;
pub mod context;
pub mod dispatcher;
pub mod endpoint;
pub mod error;
pub mod headers;
pub mod router;

pub use artifact::ArtifactStore;
pub use context::RequestContext;
pub use dispatcher::{Dispatched, Dispatcher};
pub use endpoint::Endpoint;
pub use error::DispatchError;
pub use headers::{HeaderMap, HeaderSource, NativeHeaders, ServerVariables};

// Re-export main entry point
pub use router::handle_request;
