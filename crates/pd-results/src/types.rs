//! Result data types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub type RunId = String;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunManifest {
    pub run_id: RunId,
    pub name: String,
    /// RFC 3339 creation time
    pub timestamp: String,
    pub tableau: String,
    pub h: f64,
    pub n_steps: usize,
    /// Wall-clock seconds per history entry when animating
    pub frame_interval_s: f64,
    pub solver_version: String,
}

/// One history snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryRecord {
    pub step: usize,
    pub time_s: f64,
    pub values: BTreeMap<String, f64>,
}

/// Current UTC time in the manifest timestamp format.
pub fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339()
}

impl RunManifest {
    /// Parsed [`timestamp`](Self::timestamp); `None` if it is not RFC 3339.
    pub fn created_at(&self) -> Option<chrono::DateTime<chrono::FixedOffset>> {
        chrono::DateTime::parse_from_rfc3339(&self.timestamp).ok()
    }
}
