// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

use crate::auth::TokenEntry;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub service: ServiceConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    /// Script path stripped from the request URI when resolving the endpoint
    pub mount_path: String,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub access_log: bool,
    pub show_headers: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
    /// Emit a request-observed event for every served endpoint
    #[serde(default = "default_event_log")]
    pub event_log: bool,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_event_log() -> bool {
    true
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// Endpoint service configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    /// Directory holding one `<endpoint>.xml` artifact per endpoint
    pub resource_dir: String,
    /// Include `<DEBUGINFO>` in error documents
    pub debug: bool,
    #[serde(default)]
    pub header_source: HeaderSourceKind,
}

/// Which header-exposure mechanism feeds the header extractor
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum HeaderSourceKind {
    /// Native headers under HTTP, server variables under CGI
    #[default]
    Auto,
    Native,
    ServerVariables,
}

/// Token authentication configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthConfig {
    /// Inline permanent tokens
    #[serde(default)]
    pub tokens: Vec<TokenEntry>,
    /// Optional TOML file with additional `[[tokens]]` entries
    #[serde(default)]
    pub tokens_file: Option<String>,
}
