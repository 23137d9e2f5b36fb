//! HTTP action provider abstraction.
//!
//! Integration nodes make outbound requests through this interface rather
//! than owning an HTTP client themselves.

use crate::error::HttpActionError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::str::FromStr;

/// Supported HTTP methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Returns the uppercase wire name of this method.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an HTTP method from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMethodError {
    /// The rejected input.
    pub input: String,
}

impl std::fmt::Display for ParseMethodError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unsupported HTTP method: {}", self.input)
    }
}

impl std::error::Error for ParseMethodError {}

impl FromStr for HttpMethod {
    type Err = ParseMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            _ => Err(ParseMethodError {
                input: s.to_string(),
            }),
        }
    }
}

/// The response from an HTTP action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpActionResponse {
    /// HTTP status code.
    pub status_code: u16,
    /// Response body, parsed as JSON when possible, else a string.
    pub body: JsonValue,
    /// Response headers.
    pub headers: HashMap<String, String>,
}

/// Trait for HTTP action providers.
#[async_trait]
pub trait HttpActionProvider: Send + Sync {
    /// Performs an HTTP request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent or the response
    /// indicates failure.
    async fn request(
        &self,
        method: HttpMethod,
        url: &str,
        headers: &HashMap<String, String>,
        body: Option<&JsonValue>,
    ) -> Result<HttpActionResponse, HttpActionError>;
}
