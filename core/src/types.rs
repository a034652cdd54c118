//! Shared primitive types and well-known simulation constants.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Simulation time, in seconds since the simulation epoch.
pub type Timestamp = f64;

/// The player-flyable crew vessel.
pub const HABITAT: &str = "Habitat";

/// The deep-space mothership. The only entity craft can dock with.
pub const AYSE: &str = "AYSE";

/// srb_time value meaning the boosters are armed but have not been lit.
pub const SRB_UNLIT: f64 = -1.0;

/// Solid-rocket-booster burn duration once lit, in seconds.
pub const SRB_BURN_SECONDS: f64 = 120.0;

/// Autopilot navigation modes, selected by the pilot and shown in
/// flight clients. `Manual` leaves the heading under direct control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Navmode {
    #[default]
    Manual,
    CcwPrograde,
    CwRetrograde,
    DepartReference,
    ApproachTarget,
    ProTargetVelocity,
    AntiTargetVelocity,
}

impl Navmode {
    /// The label flight clients display for this mode.
    pub fn label(self) -> &'static str {
        match self {
            Navmode::Manual             => "Manual",
            Navmode::CcwPrograde        => "CCW Prograde",
            Navmode::CwRetrograde       => "CW Retrograde",
            Navmode::DepartReference    => "Depart Reference",
            Navmode::ApproachTarget     => "Approach Target",
            Navmode::ProTargetVelocity  => "Pro Targ Velocity",
            Navmode::AntiTargetVelocity => "Anti Targ Velocity",
        }
    }
}

impl fmt::Display for Navmode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
