//! Wayback Machine HTTP client.
//!
//! Two calls are used:
//! - CDX search for the latest status-200 capture of a URL
//! - SavePageNow to request a fresh capture

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use ureq::Agent;

use crate::consts::{
    CDX_ENDPOINT, CONNECT_TIMEOUT, READ_TIMEOUT, SAVE_ENDPOINT, WAYBACK_ORIGIN,
};
use crate::error::ArchiveError;

/// Characters escaped in query and path components (form-component rules).
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'*')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_');

/// Remote archive operations.
///
/// Implementations must be thread-safe; documents are rendered in parallel.
pub trait ArchiveService: Send + Sync {
    /// Latest existing capture of `url`, if any.
    fn lookup(&self, url: &str) -> Result<Option<String>, ArchiveError>;

    /// Request a new capture of `url`; returns its archive URL when the
    /// service reports one.
    fn submit(&self, url: &str) -> Result<Option<String>, ArchiveError>;
}

/// Create HTTP agent with archive timeouts.
///
/// Non-2xx statuses are returned as responses so callers can log them.
pub fn create_agent() -> Agent {
    Agent::config_builder()
        .timeout_connect(Some(CONNECT_TIMEOUT))
        .timeout_recv_response(Some(READ_TIMEOUT))
        .timeout_recv_body(Some(READ_TIMEOUT))
        .http_status_as_error(false)
        .build()
        .into()
}

/// [`ArchiveService`] talking to `web.archive.org`.
pub struct WaybackClient {
    agent: Agent,
    user_agent: String,
}

impl WaybackClient {
    #[must_use]
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            agent: create_agent(),
            user_agent: user_agent.into(),
        }
    }
}

impl ArchiveService for WaybackClient {
    fn lookup(&self, url: &str) -> Result<Option<String>, ArchiveError> {
        let query = cdx_query_url(url);
        tracing::debug!(url = %query, "CDX lookup");

        let response = self
            .agent
            .get(&query)
            .header("User-Agent", &self.user_agent)
            .call()?;

        let status = response.status().as_u16();
        if status >= 400 {
            return Err(ArchiveError::Status(status));
        }

        let mut body = response.into_body();
        let body = body.read_to_string()?;
        Ok(parse_cdx(&body, url)?)
    }

    fn submit(&self, url: &str) -> Result<Option<String>, ArchiveError> {
        let endpoint = format!("{SAVE_ENDPOINT}{}", encode_component(url));

        let response = self
            .agent
            .get(&endpoint)
            .header("User-Agent", &self.user_agent)
            .call()?;

        let location = response
            .headers()
            .get("content-location")
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty());

        match location {
            Some(location) => Ok(Some(format!("{WAYBACK_ORIGIN}{location}"))),
            None => {
                tracing::debug!(
                    url,
                    status = response.status().as_u16(),
                    "SavePageNow returned no location"
                );
                Ok(None)
            }
        }
    }
}

/// Percent-encode a URL for use as a query value or path segment.
#[must_use]
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// CDX query for the latest status-200 capture of `url`.
#[must_use]
pub fn cdx_query_url(url: &str) -> String {
    format!(
        "{CDX_ENDPOINT}?url={}&output=json&filter=statuscode:200&limit=-1&fl=timestamp,original",
        encode_component(url)
    )
}

/// Archive URL from a CDX JSON response.
///
/// The first row is a header; the last row holds the latest capture.
pub fn parse_cdx(body: &str, url: &str) -> Result<Option<String>, serde_json::Error> {
    let rows: Vec<Vec<String>> = serde_json::from_str(body)?;
    if rows.len() <= 1 {
        return Ok(None);
    }
    Ok(rows
        .last()
        .and_then(|row| row.first())
        .filter(|timestamp| !timestamp.is_empty())
        .map(|timestamp| format!("{WAYBACK_ORIGIN}/web/{timestamp}/{url}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cdx_query_url() {
        assert_eq!(
            cdx_query_url("https://example.com/a b?x=1"),
            "https://web.archive.org/cdx/search/cdx?url=https%3A%2F%2Fexample.com%2Fa%20b%3Fx%3D1\
             &output=json&filter=statuscode:200&limit=-1&fl=timestamp,original"
        );
    }

    #[test]
    fn test_encode_component_keeps_unreserved() {
        assert_eq!(encode_component("a-b_c.d*e~f"), "a-b_c.d*e%7Ef");
    }

    #[test]
    fn test_parse_cdx_latest_row() {
        let body = r#"[["timestamp","original"],
            ["20200101000000","https://example.com"],
            ["20230505120000","https://example.com"]]"#;
        assert_eq!(
            parse_cdx(body, "https://example.com").unwrap(),
            Some("https://web.archive.org/web/20230505120000/https://example.com".to_owned())
        );
    }

    #[test]
    fn test_parse_cdx_header_only() {
        assert_eq!(parse_cdx(r#"[["timestamp","original"]]"#, "x").unwrap(), None);
        assert_eq!(parse_cdx("[]", "x").unwrap(), None);
    }

    #[test]
    fn test_parse_cdx_invalid() {
        assert!(parse_cdx("", "x").is_err());
        assert!(parse_cdx("<html>", "x").is_err());
    }
}
