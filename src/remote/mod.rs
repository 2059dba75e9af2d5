//! Clients for the remote services that predict consequences and map proteins to structures.
//!
//! Each service is described by a trait that captures the typed "submit query, get response"
//! contract the pipeline needs.  The `*Client` types implement them over HTTP with `reqwest`;
//! tests substitute in-memory implementations.

use std::time::Duration;

use crate::error::{Error, Result};

pub mod pdbe;
pub mod uniprot;
pub mod vep;

/// Timeout for a single HTTP request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Base URLs of the remote services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub vep: String,
    pub pdbe: String,
    pub uniprot: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            vep: vep::DEFAULT_BASE_URL.to_string(),
            pdbe: pdbe::DEFAULT_BASE_URL.to_string(),
            uniprot: uniprot::DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Build the HTTP client shared by all service clients.
pub fn build_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(format!("varstruct/{}", crate::common::version()))
        .timeout(REQUEST_TIMEOUT)
        .gzip(true)
        .build()
        .map_err(|e| Error::remote(format!("could not build HTTP client: {}", e)))
}

/// `Error::Remote` for a non-success answer, including the start of the body.
pub(crate) fn status_error(service: &str, status: reqwest::StatusCode, body: &[u8]) -> Error {
    let body = String::from_utf8_lossy(body)
        .chars()
        .take(200)
        .collect::<String>();
    Error::remote(format!(
        "{} answered with status {}: {}",
        service, status, body
    ))
}

/// Turn a non-success response into `Error::Remote`.
pub(crate) async fn error_for_status(
    service: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.bytes().await.unwrap_or_default();
    Err(status_error(service, status, &body))
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    #[test]
    fn status_error() {
        let body = "x".repeat(500);
        let error = super::status_error(
            "VEP",
            reqwest::StatusCode::SERVICE_UNAVAILABLE,
            body.as_bytes(),
        );
        assert_eq!(
            error.to_string(),
            format!(
                "remote service error: VEP answered with status 503 Service Unavailable: {}",
                "x".repeat(200)
            )
        );
    }
}
