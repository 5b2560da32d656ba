//! Master-side reads of aggregated session and performance data.
//!
//! These pulls never touch the mode or the event buffer.

use crate::endpoint::Endpoint;
use crate::transport::{Interpretation, Transport, TransportError};
use std::sync::Arc;

/// Errors surfaced to the caller of a pull.
#[derive(Debug)]
pub enum PullError {
    /// `setup` has not been called, so there is no root URL
    NotConfigured,
    /// The request itself failed; nothing was decoded
    Transport(TransportError),
    /// The body arrived but is not valid JSON
    Decode(String),
}

impl std::fmt::Display for PullError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PullError::NotConfigured => write!(f, "Pull failed: client is not set up"),
            PullError::Transport(e) => write!(f, "Pull failed: {e}"),
            PullError::Decode(msg) => write!(f, "Pull decode error: {msg}"),
        }
    }
}

impl std::error::Error for PullError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PullError::Transport(e) => Some(e),
            PullError::NotConfigured | PullError::Decode(_) => None,
        }
    }
}

impl From<TransportError> for PullError {
    fn from(e: TransportError) -> Self {
        PullError::Transport(e)
    }
}

/// Pulls JSON blobs previously pushed by other clients.
#[derive(Clone)]
pub struct AggregateReader {
    transport: Arc<dyn Transport>,
    root_url: String,
}

impl AggregateReader {
    pub fn new(transport: Arc<dyn Transport>, root_url: impl Into<String>) -> Self {
        Self {
            transport,
            root_url: root_url.into(),
        }
    }

    /// All session reports stored on the server.
    pub async fn pull_session_data(&self) -> Result<serde_json::Value, PullError> {
        self.pull_json(Endpoint::PullSessionData).await
    }

    /// All performance batches stored on the server.
    pub async fn pull_performance_data(&self) -> Result<serde_json::Value, PullError> {
        self.pull_json(Endpoint::PullPerformanceData).await
    }

    async fn pull_json(&self, endpoint: Endpoint) -> Result<serde_json::Value, PullError> {
        let url = endpoint.url(&self.root_url);

        let response = self
            .transport
            .pull(&url, Interpretation::Json)
            .await
            .map_err(|e| {
                tracing::warn!(url = %url, error = %e, "pull failed");
                PullError::from(e)
            })?;

        response.json().map_err(|e| {
            tracing::warn!(url = %url, error = %e, "pull returned malformed JSON");
            PullError::Decode(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::{RecordingTransport, Request};
    use crate::transport::RawResponse;

    const ROOT: &str = "http://collect.test/";

    fn reader(transport: &Arc<RecordingTransport>) -> AggregateReader {
        AggregateReader::new(transport.clone(), ROOT)
    }

    #[tokio::test]
    async fn test_pull_decodes_json() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond_text("http://collect.test/pull_session_data.php", r#"{"a":1}"#);

        let value = reader(&transport).pull_session_data().await.unwrap();
        assert_eq!(value, serde_json::json!({"a": 1}));
        assert_eq!(
            transport.requests(),
            vec![Request::Pull {
                url: "http://collect.test/pull_session_data.php".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond_text("http://collect.test/pull_performance_data.php", "<html>oops");

        let err = reader(&transport).pull_performance_data().await.unwrap_err();
        assert!(matches!(err, PullError::Decode(_)));
    }

    #[tokio::test]
    async fn test_transport_failure_is_surfaced() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond(
            "http://collect.test/pull_performance_data.php",
            Err(TransportError::Network("connection refused".to_string())),
        );

        let err = reader(&transport).pull_performance_data().await.unwrap_err();
        match err {
            PullError::Transport(TransportError::Network(msg)) => {
                assert_eq!(msg, "connection refused")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_array_payload() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond(
            "http://collect.test/pull_performance_data.php",
            Ok(RawResponse::new(
                br#"[{"UserTouchData":"X1Y2-X3Y4"},{"UserTouchData":"X5Y6"}]"#.to_vec(),
            )),
        );

        let value = reader(&transport).pull_performance_data().await.unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(2));
        assert_eq!(value[1]["UserTouchData"], "X5Y6");
    }
}
