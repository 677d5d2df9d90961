//! Authenticated endpoint service for BIRD metadata documents.
//!
//! Requests carry a permanent token in the `Authorization` header and name one
//! of four endpoints in the trailing path segment; the matching pre-built XML
//! document is returned verbatim, any failure as an XML `<EXCEPTION>` envelope.

pub mod auth;
pub mod cgi;
pub mod config;
pub mod events;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
