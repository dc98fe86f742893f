use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of one dispatcher call.
///
/// The external process failing is not an error of the launcher: it is
/// recorded here as a nonzero `exit_code` and left to the caller to surface.
#[derive(Debug, Clone, Serialize)]
pub struct LaunchReport {
    pub command_line: String,
    pub argv: Vec<String>,
    pub exit_code: i32,
    pub success: bool,
    /// Why the process never started, when it did not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spawn_error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl LaunchReport {
    pub fn elapsed_secs(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}
