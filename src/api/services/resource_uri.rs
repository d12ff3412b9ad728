//! Resource reference resolver.
//!
//! A resource reference addresses one resource on one server:
//!
//! ```text
//! [async+]<protocol>://<server>@<mode>/<resource_type>/<name>
//! ```
//!
//! for example `async+kafka://kafka_server@write/topic/orders`. The `async+`
//! prefix is optional on input and always present on output.

use crate::models::{Protocol, ResourceMode, ResourceType};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

const SCHEME_PREFIX: &str = "async+";

static SEGMENT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.\-]*$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceUriError {
    #[error("malformed resource reference: {0}")]
    Malformed(String),
    #[error("unknown protocol '{0}'")]
    UnknownProtocol(String),
    #[error("server name is missing")]
    MissingServer,
    #[error("mode is missing")]
    MissingMode,
    #[error("unknown mode '{0}'")]
    UnknownMode(String),
    #[error("unknown resource type '{0}'")]
    UnknownResourceType(String),
    #[error("expected path /<type>/<name>, got '{0}'")]
    InvalidPath(String),
    #[error("invalid {segment} '{value}'")]
    InvalidSegment { segment: &'static str, value: String },
    #[error("unexpected {0} in resource reference")]
    UnexpectedComponent(&'static str),
}

/// A parsed resource reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceReference {
    pub protocol: Protocol,
    pub server: String,
    pub mode: ResourceMode,
    pub resource_type: ResourceType,
    pub name: String,
}

/// Prefix the protocol token with `async+` unless it already carries it.
pub fn normalize(uri: &str) -> String {
    if uri.starts_with(SCHEME_PREFIX) {
        uri.to_string()
    } else {
        format!("{SCHEME_PREFIX}{uri}")
    }
}

/// Whether `value` can appear as the server or name segment of a reference.
pub fn is_valid_segment(value: &str) -> bool {
    SEGMENT_PATTERN.is_match(value)
}

fn check_segment(segment: &'static str, value: &str) -> Result<(), ResourceUriError> {
    if is_valid_segment(value) {
        Ok(())
    } else {
        Err(ResourceUriError::InvalidSegment {
            segment,
            value: value.to_string(),
        })
    }
}

impl ResourceReference {
    pub fn new(
        protocol: Protocol,
        server: impl Into<String>,
        mode: ResourceMode,
        resource_type: ResourceType,
        name: impl Into<String>,
    ) -> Self {
        Self {
            protocol,
            server: server.into(),
            mode,
            resource_type,
            name: name.into(),
        }
    }

    /// Parse a resource reference string.
    pub fn parse(uri: &str) -> Result<Self, ResourceUriError> {
        let uri = normalize(uri.trim());
        // Non-special schemes keep the host opaque, so the mode is not
        // lowercased or IDNA-mapped.
        let url = Url::parse(&uri).map_err(|e| ResourceUriError::Malformed(e.to_string()))?;

        if url.cannot_be_a_base() {
            return Err(ResourceUriError::Malformed(format!(
                "'{uri}' has no '//' authority"
            )));
        }
        if url.password().is_some() {
            return Err(ResourceUriError::UnexpectedComponent("password"));
        }
        if url.port().is_some() {
            return Err(ResourceUriError::UnexpectedComponent("port"));
        }
        if url.query().is_some() {
            return Err(ResourceUriError::UnexpectedComponent("query"));
        }
        if url.fragment().is_some() {
            return Err(ResourceUriError::UnexpectedComponent("fragment"));
        }

        let protocol_token = url
            .scheme()
            .strip_prefix(SCHEME_PREFIX)
            .unwrap_or(url.scheme());
        let protocol = Protocol::from_str(protocol_token)
            .map_err(|_| ResourceUriError::UnknownProtocol(protocol_token.to_string()))?;

        let server = url.username();
        if server.is_empty() {
            return Err(ResourceUriError::MissingServer);
        }
        check_segment("server name", server)?;

        let mode_token = url.host_str().unwrap_or_default();
        if mode_token.is_empty() {
            return Err(ResourceUriError::MissingMode);
        }
        let mode = ResourceMode::from_str(mode_token)
            .map_err(|_| ResourceUriError::UnknownMode(mode_token.to_string()))?;

        let segments: Vec<&str> = url
            .path_segments()
            .map(|segments| segments.collect())
            .unwrap_or_default();
        let [type_token, name] = segments.as_slice() else {
            return Err(ResourceUriError::InvalidPath(url.path().to_string()));
        };
        if type_token.is_empty() || name.is_empty() {
            return Err(ResourceUriError::InvalidPath(url.path().to_string()));
        }
        let resource_type = ResourceType::from_str(type_token)
            .map_err(|_| ResourceUriError::UnknownResourceType(type_token.to_string()))?;
        check_segment("resource name", name)?;

        Ok(Self::new(protocol, server, mode, resource_type, *name))
    }
}

impl FromStr for ResourceReference {
    type Err = ResourceUriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ResourceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{SCHEME_PREFIX}{}://{}@{}/{}/{}",
            self.protocol, self.server, self.mode, self.resource_type, self.name
        )
    }
}
