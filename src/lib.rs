//! XV Telemetry - mode-gated session and interaction telemetry.
//!
//! An embedded client that asks a collection server how much to collect,
//! reports the session once, and sends user interactions in small batches.
//!
//! # Collection Guarantees
//!
//! - **Server decides**: nothing is collected until the server answers with a
//!   known mode; unknown answers mean off
//! - **Bounded memory**: at most four events wait in the buffer
//! - **Best effort**: failed sends are logged and dropped, never retried
//! - **Non-blocking**: `record` never waits on the network
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        TelemetryClient                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐         │
//! │  │    Mode     │──▶│   Session   │   │    Event    │         │
//! │  │  Resolver   │   │  Reporter   │   │   Buffer    │         │
//! │  └─────────────┘   └─────────────┘   └─────────────┘         │
//! │         │                 │                 │                 │
//! │         ▼                 ▼                 ▼                 │
//! │  ┌───────────────────────────────────────────────────┐       │
//! │  │            Transport (POST, reqwest)              │       │
//! │  └───────────────────────────────────────────────────┘       │
//! │                           ▲                                   │
//! │                  ┌─────────────────┐                          │
//! │                  │ AggregateReader │  (master role)           │
//! │                  └─────────────────┘                          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use xv_telemetry::{host_device_id, ClientConfig, TelemetryClient};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::new("https://collect.example.org/xv/", "refraktions", "2.1");
//! let client = TelemetryClient::http(&config, host_device_id(), tokio::runtime::Handle::current())?;
//!
//! client.setup_with(&config).await;
//! client.record(3, 12);
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod buffer;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod identity;
pub mod mode;
pub mod session;
pub mod stats;
pub mod transport;

// Re-export key types at crate root for convenience
pub use aggregate::{AggregateReader, PullError};
pub use buffer::{Batch, EventBuffer, EventRecord, BATCH_CAPACITY};
pub use client::TelemetryClient;
pub use config::{ClientConfig, ConfigError};
pub use endpoint::Endpoint;
pub use identity::{host_device_id, ClientIdentity};
pub use mode::{ModeState, OperatingMode};
pub use stats::{StatsSnapshot, TelemetryStats};
pub use transport::{Interpretation, RawResponse, Transport, TransportError};

#[cfg(feature = "http")]
pub use transport::HttpTransport;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
