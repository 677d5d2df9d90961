//! Token authentication boundary
//!
//! The dispatcher only depends on the [`Authenticator`] trait. The shipped
//! implementation is [`TokenTable`], a table of permanent tokens loaded from
//! configuration.

mod token;

pub use token::{TokenEntry, TokenStoreError, TokenTable};

use async_trait::async_trait;
use std::net::IpAddr;
use thiserror::Error;

/// The identity bound to a request once its token has been accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
}

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Token rejection reasons
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid token - token not found")]
    InvalidToken,

    #[error("Invalid token - token expired")]
    Expired { valid_until: String },

    #[error("Invalid token - IP not allowed")]
    IpRestricted { remote_addr: Option<IpAddr> },

    #[error("Token store unavailable")]
    Store(String),
}

impl AuthError {
    /// Error code carried in the `<ERRORCODE>` element
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidToken => "invalidtoken",
            Self::Expired { .. } => "invalidtimedtoken",
            Self::IpRestricted { .. } => "invalidiptoken",
            Self::Store(_) => "tokenstoreerror",
        }
    }

    /// Diagnostic detail, only rendered in debug mode
    pub fn debug_info(&self) -> Option<String> {
        match self {
            Self::InvalidToken => None,
            Self::Expired { valid_until } => Some(format!("token was valid until {valid_until}")),
            Self::IpRestricted { remote_addr } => Some(match remote_addr {
                Some(addr) => format!("remote address {addr} is not in the token's ip restriction"),
                None => "remote address unknown, token has an ip restriction".to_string(),
            }),
            Self::Store(detail) => Some(detail.clone()),
        }
    }
}

/// External token validation capability
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Validate `token` for a request coming from `remote_addr`
    async fn authenticate(
        &self,
        token: &str,
        remote_addr: Option<IpAddr>,
    ) -> Result<Principal, AuthError>;
}
