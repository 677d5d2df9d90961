//! Endpoint resolution
//!
//! Maps the trailing path segment of a request onto the closed set of
//! endpoints this service answers for.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::context::RequestContext;
use super::error::DispatchError;

/// The four addressable resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    BirdAcademy,
    BirdProgram,
    BirdModule,
    BirdCourse,
}

impl Endpoint {
    pub const ALL: [Self; 4] = [
        Self::BirdAcademy,
        Self::BirdProgram,
        Self::BirdModule,
        Self::BirdCourse,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BirdAcademy => "bird_academy",
            Self::BirdProgram => "bird_program",
            Self::BirdModule => "bird_module",
            Self::BirdCourse => "bird_course",
        }
    }

    /// File name of the artifact served for this endpoint
    pub fn artifact_name(self) -> String {
        format!("{}.xml", self.as_str())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Endpoint {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bird_academy" => Ok(Self::BirdAcademy),
            "bird_program" => Ok(Self::BirdProgram),
            "bird_module" => Ok(Self::BirdModule),
            "bird_course" => Ok(Self::BirdCourse),
            other => Err(DispatchError::InvalidEndpoint(other.to_string())),
        }
    }
}

/// Resolve the endpoint addressed by a request
///
/// Path info wins when the transport supplies it. Otherwise the request URI is
/// cut after the last occurrence of the script name; a URI that does not
/// contain the script name addresses no endpoint.
pub fn resolve_endpoint(ctx: &RequestContext) -> Result<Endpoint, DispatchError> {
    let raw = match (&ctx.path_info, &ctx.request_uri) {
        (Some(path_info), _) => path_info.as_str(),
        (None, Some(uri)) => strip_script_name(uri, ctx.script_name.as_deref())
            .ok_or_else(|| DispatchError::InvalidEndpoint(uri.clone()))?,
        (None, None) => "",
    };
    raw.trim_matches('/').parse()
}

fn strip_script_name<'a>(uri: &'a str, script_name: Option<&str>) -> Option<&'a str> {
    match script_name {
        Some(script) if !script.is_empty() => uri
            .rfind(script)
            .map(|pos| &uri[pos + script.len()..]),
        _ => Some(uri),
    }
}
