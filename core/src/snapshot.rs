//! The structured snapshot — the complete, transmissible description of
//! the system at one instant. This is the form savefiles, the network
//! layer and flight clients consume; `PhysicsState` is built from it and
//! externalizes back to it.

use crate::entity::Entity;
use crate::types::{Navmode, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalSnapshot {
    pub timestamp: Timestamp,
    /// Solid-rocket-booster burn timer. See `types::SRB_UNLIT`.
    pub srb_time: f64,
    /// Time-acceleration factor, e.g. 1.0 or 50.0.
    pub time_acc: f64,
    pub parachute_deployed: bool,
    /// Name of the reference-frame entity.
    pub reference: String,
    /// Name of the landing/docking target entity.
    pub target: String,
    pub navmode: Navmode,
    /// Entity order defines the stable integer indices of any state built
    /// from this snapshot.
    pub entities: Vec<Entity>,
}

impl PhysicalSnapshot {
    pub fn entity_named(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }
}
