//! Pilot and administrative commands.
//!
//! Commands are produced by a boundary component (network ingestion, the
//! runner's IPC loop) and drained by the engine against the current
//! state before each integration step — never during one, and never
//! partially.

use crate::types::{Navmode, Timestamp};
use serde::{Deserialize, Serialize};

/// All commands a flight client can issue.
/// Variants are added over time — never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    // ── Flight controls (apply to the active craft) ───
    SetThrottle { throttle: f64 },
    AdjustThrottle { delta: f64 },
    AdjustSpin { delta: f64 },
    IgniteSrb,
    DeployParachute { deployed: bool },
    Undock,

    // ── Simulation controls ───────────────────────────
    SetTimeAcc { factor: f64 },
    SetReference { name: String },
    SetTarget { name: String },
    SetNavmode { mode: Navmode },
}

/// A queued command with its submission metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedCommand {
    pub command_id: String,
    /// Simulation timestamp at which the command was enqueued.
    pub queued_at:  Timestamp,
    pub command:    Command,
}
