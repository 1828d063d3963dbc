//! Per-request challenge and timestamp generation.

use chrono::Utc;
use uuid::Uuid;

/// Generate a fresh single-use challenge token.
///
/// Every call draws a new random UUID; callers must not cache the result
/// across requests.
pub fn generate_challenge() -> String {
    Uuid::new_v4().to_string()
}

/// Current Unix time in whole seconds, as decimal ASCII.
pub fn current_epoch_time() -> String {
    Utc::now().timestamp().to_string()
}

/// The two per-request values the signer injects besides the protocol version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonFields {
    pub time: String,
    pub challenge: String,
}

impl CommonFields {
    /// Read the clock and draw a new challenge.
    pub fn fresh() -> Self {
        Self {
            time: current_epoch_time(),
            challenge: generate_challenge(),
        }
    }

    /// Fixed values, for replaying a known request.
    pub fn fixed(time: impl Into<String>, challenge: impl Into<String>) -> Self {
        Self {
            time: time.into(),
            challenge: challenge.into(),
        }
    }
}
