//! Structured entity records.

use crate::state::StateId;
use crate::types::AYSE;
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};

/// One simulated body (spacecraft, planet, moon) in structured form.
///
/// `name` through `atmosphere_scaling` never change during simulation;
/// the rest are the mutable fields that also live in the numeric buffer
/// of the state built from this record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub mass: f64,
    pub radius: f64,
    pub artificial: bool,
    pub atmosphere_thickness: f64,
    pub atmosphere_scaling: f64,

    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub heading: f64,
    pub spin: f64,
    pub fuel: f64,
    pub throttle: f64,
    /// Name of the entity this one is landed on, if any.
    pub landed_on: Option<String>,
    pub broken: bool,
}

impl Entity {
    pub fn pos(&self) -> [f64; 2] {
        [self.x, self.y]
    }

    pub fn velocity(&self) -> [f64; 2] {
        [self.vx, self.vy]
    }

    /// Whether craft can dock with this entity.
    pub fn dockable(&self) -> bool {
        self.name == AYSE
    }

    /// Whether this entity is landed on (or docked with) another.
    pub fn landed(&self) -> bool {
        self.landed_on.is_some()
    }
}

/// A detached read/write facade over one structured entity record.
///
/// Records detached from an `EntityView` remember which state slot they
/// came from, which lets `PhysicsState::set_entity` skip the copy when a
/// record is assigned straight back to its own slot.
#[derive(Debug, Clone)]
pub struct EntityRecord {
    entity: Entity,
    origin: Option<(StateId, usize)>,
}

impl EntityRecord {
    pub fn new(entity: Entity) -> Self {
        Self { entity, origin: None }
    }

    pub(crate) fn with_origin(entity: Entity, state: StateId, index: usize) -> Self {
        Self { entity, origin: Some((state, index)) }
    }

    pub(crate) fn origin(&self) -> Option<(StateId, usize)> {
        self.origin
    }

    pub fn into_entity(self) -> Entity {
        self.entity
    }
}

impl From<Entity> for EntityRecord {
    fn from(entity: Entity) -> Self {
        Self::new(entity)
    }
}

impl Deref for EntityRecord {
    type Target = Entity;

    fn deref(&self) -> &Entity {
        &self.entity
    }
}

impl DerefMut for EntityRecord {
    fn deref_mut(&mut self) -> &mut Entity {
        // A write may diverge from the originating slot, so the record
        // stops counting as already-in-place.
        self.origin = None;
        &mut self.entity
    }
}
