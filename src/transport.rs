//! Transport abstraction used by the client.
//!
//! Every request is a POST. Pulls send an empty body and read the response;
//! pushes send a form body and ignore what comes back.

use futures::future::BoxFuture;

/// How the caller intends to read a pull response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpretation {
    Text,
    Json,
}

impl Interpretation {
    /// Value for the `Accept` header.
    pub fn accept(&self) -> &'static str {
        match self {
            Interpretation::Text => "text/plain",
            Interpretation::Json => "application/json",
        }
    }
}

/// Raw response body from a successful request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self { body: body.into() }
    }

    /// Body as text. Invalid UTF-8 is replaced rather than rejected.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body parsed as JSON. Top-level fragments such as `42` are accepted.
    pub fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Transport error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection, TLS or timeout failure
    Network(String),
    /// Server answered with a non-success status
    Status { status: u16, body: String },
    /// Request could not be built
    Encoding(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Network(msg) => write!(f, "Transport network error: {msg}"),
            TransportError::Status { status, body } => {
                write!(f, "Transport server error ({status}): {body}")
            }
            TransportError::Encoding(msg) => write!(f, "Transport encoding error: {msg}"),
        }
    }
}

impl std::error::Error for TransportError {}

/// Performs the actual requests.
pub trait Transport: Send + Sync {
    /// POST with an empty body and return the response.
    fn pull<'a>(
        &'a self,
        url: &'a str,
        interpretation: Interpretation,
    ) -> BoxFuture<'a, Result<RawResponse, TransportError>>;

    /// POST `body` and return the response.
    fn push<'a>(
        &'a self,
        url: &'a str,
        body: Vec<u8>,
    ) -> BoxFuture<'a, Result<RawResponse, TransportError>>;
}

/// Transport backed by a `reqwest` client.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl HttpTransport {
    /// Create a transport with the given request timeout.
    pub fn new(timeout: std::time::Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Encoding(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }

    async fn post(
        &self,
        url: &str,
        accept: &str,
        body: Vec<u8>,
    ) -> Result<RawResponse, TransportError> {
        let response = self
            .client
            .post(url)
            .header("Cache-Control", "no-cache")
            .header("Accept", accept)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(RawResponse::new(bytes.to_vec()))
    }
}

#[cfg(feature = "http")]
impl Transport for HttpTransport {
    fn pull<'a>(
        &'a self,
        url: &'a str,
        interpretation: Interpretation,
    ) -> BoxFuture<'a, Result<RawResponse, TransportError>> {
        Box::pin(self.post(url, interpretation.accept(), Vec::new()))
    }

    fn push<'a>(
        &'a self,
        url: &'a str,
        body: Vec<u8>,
    ) -> BoxFuture<'a, Result<RawResponse, TransportError>> {
        Box::pin(self.post(url, Interpretation::Text.accept(), body))
    }
}
