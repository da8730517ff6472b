//! Tunable behaviour of a sync pass.

use serde::{Deserialize, Serialize};

/// Options for one sync pass. The defaults match the provider's conventions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncOptions {
    /// Detail text marking a "Goal" event as an own goal
    pub own_goal_detail: String,
    /// Detail text marking a "Goal" event as a missed penalty
    pub missed_penalty_detail: String,
    /// Register participants referenced only by events
    pub capture_feed_only: bool,
    /// Replace (delete + create) an event slot whose minute, kind, team or
    /// participant changed, instead of updating it in place
    pub replace_shifted_events: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            own_goal_detail: "Own Goal".to_string(),
            missed_penalty_detail: "Missed Penalty".to_string(),
            capture_feed_only: true,
            replace_shifted_events: true,
        }
    }
}
