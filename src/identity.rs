//! Client identity sent with the session report.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who is reporting: the collection server, the app and the device.
///
/// Built once per `setup` and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientIdentity {
    /// Base URL the endpoint paths are appended to
    pub root_url: String,
    pub app_id: String,
    pub app_version: String,
    /// Opaque, stable per install
    pub device_id: String,
}

impl ClientIdentity {
    pub fn new(
        root_url: impl Into<String>,
        app_id: impl Into<String>,
        app_version: impl Into<String>,
        device_id: impl Into<String>,
    ) -> Self {
        Self {
            root_url: root_url.into(),
            app_id: app_id.into(),
            app_version: app_version.into(),
            device_id: device_id.into(),
        }
    }
}

/// Derive a device ID from the host name.
///
/// The ID is a name-based UUID, so it stays the same across runs on the same
/// host without anything being written to disk.
pub fn host_device_id() -> String {
    let hostname = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    device_id_for(&hostname)
}

fn device_id_for(hostname: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_DNS, hostname.as_bytes())
        .to_string()
        .to_uppercase()
}
