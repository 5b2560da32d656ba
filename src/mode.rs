//! Operating mode reported by the collection server.
//!
//! The server answers the mode pull with a bare text token. Only two tokens
//! enable collection; everything else, including an empty body, maps to
//! [`OperatingMode::Off`].

use serde::{Deserialize, Serialize};

/// Wire token for [`OperatingMode::SessionOnly`].
pub const SESSION_TOKEN: &str = "SESSION";

/// Wire token for [`OperatingMode::SessionAndPerformance`].
pub const PERFORMANCE_TOKEN: &str = "PERFORMANCE";

/// Wire token for [`OperatingMode::Off`].
pub const OFF_TOKEN: &str = "OFF";

/// How much telemetry the client collects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatingMode {
    /// No collection at all
    #[default]
    Off,
    /// One session report per setup, no interaction events
    SessionOnly,
    /// Session report plus batched interaction events
    SessionAndPerformance,
}

impl OperatingMode {
    /// Map a server response to a mode.
    ///
    /// Matching is exact and case-sensitive. Unknown tokens are not an error.
    pub fn from_wire(token: &str) -> Self {
        match token {
            PERFORMANCE_TOKEN => OperatingMode::SessionAndPerformance,
            SESSION_TOKEN => OperatingMode::SessionOnly,
            _ => OperatingMode::Off,
        }
    }

    /// The token the server uses for this mode.
    pub fn as_wire(&self) -> &'static str {
        match self {
            OperatingMode::Off => OFF_TOKEN,
            OperatingMode::SessionOnly => SESSION_TOKEN,
            OperatingMode::SessionAndPerformance => PERFORMANCE_TOKEN,
        }
    }

    /// Whether a session report is sent after resolution.
    pub fn reports_session(&self) -> bool {
        !matches!(self, OperatingMode::Off)
    }

    /// Whether `record` accepts interaction events.
    pub fn records_events(&self) -> bool {
        matches!(self, OperatingMode::SessionAndPerformance)
    }
}

impl std::fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperatingMode::Off => write!(f, "off"),
            OperatingMode::SessionOnly => write!(f, "session only"),
            OperatingMode::SessionAndPerformance => write!(f, "session and performance"),
        }
    }
}

/// Resolution state of the mode within one process.
///
/// `Unresolved` gates exactly like `Off`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModeState {
    /// No answer from the server yet
    #[default]
    Unresolved,
    /// The server answered; unknown answers resolve to `Off`
    Resolved(OperatingMode),
}

impl ModeState {
    /// The mode used for gating checks.
    pub fn effective(&self) -> OperatingMode {
        match self {
            ModeState::Unresolved => OperatingMode::Off,
            ModeState::Resolved(mode) => *mode,
        }
    }
}
