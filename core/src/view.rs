//! Zero-copy entity views bound to an owning state.
//!
//! A view is (owning state, entity index). Mutable numeric fields are
//! read straight out of the owning buffer at block·n + index; unchanging
//! fields come from the owned snapshot. No accessor allocates. The borrow
//! ties every view's lifetime to its state, so a view cannot outlive the
//! state it indexes into — superseding a state invalidates its views at
//! compile time.

use crate::entity::{Entity, EntityRecord};
use crate::error::SimResult;
use crate::schema::{MutableField, NO_INDEX};
use crate::state::PhysicsState;
use crate::types::AYSE;
use std::fmt;

/// Read-only view of one entity.
#[derive(Clone, Copy)]
pub struct EntityView<'a> {
    state: &'a PhysicsState,
    index: usize,
}

impl<'a> EntityView<'a> {
    pub(crate) fn new(state: &'a PhysicsState, index: usize) -> Self {
        Self { state, index }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    // ── Unchanging fields, from the owned snapshot ─────────────

    pub fn name(&self) -> &'a str {
        &self.state.record_at(self.index).name
    }

    pub fn mass(&self) -> f64 {
        self.state.record_at(self.index).mass
    }

    pub fn radius(&self) -> f64 {
        self.state.record_at(self.index).radius
    }

    pub fn artificial(&self) -> bool {
        self.state.record_at(self.index).artificial
    }

    pub fn atmosphere_thickness(&self) -> f64 {
        self.state.record_at(self.index).atmosphere_thickness
    }

    pub fn atmosphere_scaling(&self) -> f64 {
        self.state.record_at(self.index).atmosphere_scaling
    }

    // ── Mutable fields, from the owning buffer ─────────────────

    #[inline]
    pub fn x(&self) -> f64 {
        self.state.slot(MutableField::X, self.index)
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.state.slot(MutableField::Y, self.index)
    }

    #[inline]
    pub fn vx(&self) -> f64 {
        self.state.slot(MutableField::Vx, self.index)
    }

    #[inline]
    pub fn vy(&self) -> f64 {
        self.state.slot(MutableField::Vy, self.index)
    }

    #[inline]
    pub fn heading(&self) -> f64 {
        self.state.slot(MutableField::Heading, self.index)
    }

    #[inline]
    pub fn spin(&self) -> f64 {
        self.state.slot(MutableField::Spin, self.index)
    }

    #[inline]
    pub fn fuel(&self) -> f64 {
        self.state.slot(MutableField::Fuel, self.index)
    }

    #[inline]
    pub fn throttle(&self) -> f64 {
        self.state.slot(MutableField::Throttle, self.index)
    }

    #[inline]
    pub fn broken(&self) -> bool {
        self.state.slot(MutableField::Broken, self.index) != 0.0
    }

    /// Name of the entity this one is landed on, decoded through the
    /// state's fixed name table.
    pub fn landed_on(&self) -> Option<&'a str> {
        self.state.landed_index(self.index).map(|i| self.state.name_of(i))
    }

    // ── Derived ────────────────────────────────────────────────

    pub fn pos(&self) -> [f64; 2] {
        [self.x(), self.y()]
    }

    pub fn velocity(&self) -> [f64; 2] {
        [self.vx(), self.vy()]
    }

    pub fn dockable(&self) -> bool {
        self.name() == AYSE
    }

    pub fn landed(&self) -> bool {
        self.state.landed_index(self.index).is_some()
    }

    /// Detach a full record. The record remembers this slot, so
    /// assigning it straight back is detected as a no-op.
    pub fn to_record(&self) -> EntityRecord {
        EntityRecord::with_origin(self.to_entity(), self.state.id(), self.index)
    }

    /// Copy out a plain structured record of this entity's current
    /// values.
    pub fn to_entity(&self) -> Entity {
        let unchanging = self.state.record_at(self.index);
        Entity {
            name: unchanging.name.clone(),
            mass: unchanging.mass,
            radius: unchanging.radius,
            artificial: unchanging.artificial,
            atmosphere_thickness: unchanging.atmosphere_thickness,
            atmosphere_scaling: unchanging.atmosphere_scaling,
            x: self.x(),
            y: self.y(),
            vx: self.vx(),
            vy: self.vy(),
            heading: self.heading(),
            spin: self.spin(),
            fuel: self.fuel(),
            throttle: self.throttle(),
            landed_on: self.landed_on().map(str::to_string),
            broken: self.broken(),
        }
    }
}

/// Two views denote the same logical entity when they share an owning
/// state and index.
impl PartialEq for EntityView<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.state.id() == other.state.id() && self.index == other.index
    }
}

impl Eq for EntityView<'_> {}

impl fmt::Debug for EntityView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityView")
            .field("name", &self.name())
            .field("index", &self.index)
            .finish()
    }
}

/// Read/write view of one entity. Holds the exclusive borrow of the
/// owning state, so at most one exists at a time.
pub struct EntityViewMut<'a> {
    state: &'a mut PhysicsState,
    index: usize,
}

impl<'a> EntityViewMut<'a> {
    pub(crate) fn new(state: &'a mut PhysicsState, index: usize) -> Self {
        Self { state, index }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Reborrow as a read-only view.
    pub fn as_view(&self) -> EntityView<'_> {
        EntityView::new(self.state, self.index)
    }

    pub fn name(&self) -> &str {
        &self.state.record_at(self.index).name
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.state.slot(MutableField::X, self.index)
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.state.slot(MutableField::Y, self.index)
    }

    #[inline]
    pub fn vx(&self) -> f64 {
        self.state.slot(MutableField::Vx, self.index)
    }

    #[inline]
    pub fn vy(&self) -> f64 {
        self.state.slot(MutableField::Vy, self.index)
    }

    #[inline]
    pub fn heading(&self) -> f64 {
        self.state.slot(MutableField::Heading, self.index)
    }

    #[inline]
    pub fn spin(&self) -> f64 {
        self.state.slot(MutableField::Spin, self.index)
    }

    #[inline]
    pub fn fuel(&self) -> f64 {
        self.state.slot(MutableField::Fuel, self.index)
    }

    #[inline]
    pub fn throttle(&self) -> f64 {
        self.state.slot(MutableField::Throttle, self.index)
    }

    #[inline]
    pub fn broken(&self) -> bool {
        self.state.slot(MutableField::Broken, self.index) != 0.0
    }

    pub fn landed_on(&self) -> Option<&str> {
        self.state.landed_index(self.index).map(|i| self.state.name_of(i))
    }

    pub fn landed(&self) -> bool {
        self.state.landed_index(self.index).is_some()
    }

    // ── Mutable field writes, into the owning buffer ───────────

    #[inline]
    pub fn set_x(&mut self, val: f64) {
        self.state.write_slot(MutableField::X, self.index, val);
    }

    #[inline]
    pub fn set_y(&mut self, val: f64) {
        self.state.write_slot(MutableField::Y, self.index, val);
    }

    #[inline]
    pub fn set_vx(&mut self, val: f64) {
        self.state.write_slot(MutableField::Vx, self.index, val);
    }

    #[inline]
    pub fn set_vy(&mut self, val: f64) {
        self.state.write_slot(MutableField::Vy, self.index, val);
    }

    #[inline]
    pub fn set_heading(&mut self, val: f64) {
        self.state.write_slot(MutableField::Heading, self.index, val);
    }

    #[inline]
    pub fn set_spin(&mut self, val: f64) {
        self.state.write_slot(MutableField::Spin, self.index, val);
    }

    #[inline]
    pub fn set_fuel(&mut self, val: f64) {
        self.state.write_slot(MutableField::Fuel, self.index, val);
    }

    #[inline]
    pub fn set_throttle(&mut self, val: f64) {
        self.state.write_slot(MutableField::Throttle, self.index, val);
    }

    pub fn set_broken(&mut self, broken: bool) {
        let encoded = if broken { 1.0 } else { 0.0 };
        self.state.write_slot(MutableField::Broken, self.index, encoded);
    }

    pub fn set_pos(&mut self, pos: [f64; 2]) {
        self.set_x(pos[0]);
        self.set_y(pos[1]);
    }

    pub fn set_velocity(&mut self, v: [f64; 2]) {
        self.set_vx(v[0]);
        self.set_vy(v[1]);
    }

    /// Resolve `name` through the state's name table and store its
    /// index. Fails without touching the buffer if the name is unknown.
    /// Hot paths should prefer `set_landed_on_index`.
    pub fn set_landed_on(&mut self, name: Option<&str>) -> SimResult<()> {
        let encoded = match name {
            None => NO_INDEX,
            Some(name) => self.state.index_of(name)? as f64,
        };
        self.state.write_slot(MutableField::LandedOn, self.index, encoded);
        Ok(())
    }

    /// Index-based landed-on write; skips name resolution.
    pub fn set_landed_on_index(&mut self, target: Option<usize>) {
        debug_assert!(target.map_or(true, |t| t < self.state.len()));
        let encoded = target.map_or(NO_INDEX, |t| t as f64);
        self.state.write_slot(MutableField::LandedOn, self.index, encoded);
    }

    // ── Unchanging field writes, into the owned snapshot ───────

    pub fn set_mass(&mut self, mass: f64) {
        self.state.record_at_mut(self.index).mass = mass;
    }

    pub fn set_radius(&mut self, radius: f64) {
        self.state.record_at_mut(self.index).radius = radius;
    }

    pub fn set_artificial(&mut self, artificial: bool) {
        self.state.record_at_mut(self.index).artificial = artificial;
    }
}

impl fmt::Debug for EntityViewMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityViewMut")
            .field("name", &self.name())
            .field("index", &self.index)
            .finish()
    }
}
