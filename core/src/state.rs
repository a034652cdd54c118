//! The physics state: one structured snapshot plus one flat numeric
//! buffer, kept in sync.
//!
//! The buffer is field-major: block b holds mutable field b's value for
//! every entity in snapshot order, so the integrator and any vectorized
//! computation can take one field across all entities as a single
//! contiguous slice, while entity views still get O(1) per-field access
//! at block·n + index. The final two slots hold the SRB burn timer and
//! the time-acceleration factor.
//!
//! RULES:
//!   - Entity count and order are fixed at construction. An entity's
//!     index is stable for the lifetime of the state.
//!   - Heading is renormalized into [0, 2π) whenever a buffer is
//!     ingested; the integrator is free to run it out of range.
//!   - Validation happens once, at construction. Accessors assume a
//!     validly shaped state.

use std::collections::HashMap;
use std::f64::consts::TAU;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::entity::{Entity, EntityRecord};
use crate::error::{SimError, SimResult};
use crate::schema::{FieldLayout, MutableField, NO_INDEX, TRAILING_SCALARS};
use crate::snapshot::PhysicalSnapshot;
use crate::types::{Navmode, AYSE, HABITAT, SRB_UNLIT};
use crate::view::{EntityView, EntityViewMut};

/// Process-unique identity of one constructed state. Detached records
/// carry this, so a record assigned back to its own slot is detectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateId(u64);

fn next_state_id() -> StateId {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    StateId(COUNTER.fetch_add(1, Ordering::Relaxed))
}

#[derive(Debug)]
pub struct PhysicsState {
    id: StateId,
    /// Unchanging per-entity fields and scalar globals. The per-entity
    /// mutable fields in here are stale; the buffer is authoritative.
    snapshot: PhysicalSnapshot,
    /// Fixed-order entity name table. Positions never change.
    names: Vec<String>,
    index_by_name: HashMap<String, usize>,
    /// n·k mutable field blocks plus the two trailing scalars.
    buf: Vec<f64>,
    n: usize,
    /// Indices of entities with a nonzero atmosphere, fixed at
    /// construction.
    atmospheres: Vec<usize>,
}

impl PhysicsState {
    /// Build a state from a structured snapshot alone: every mutable
    /// field of every entity is copied into a freshly derived buffer.
    /// O(n·k). Fails if an entity claims to be landed on a name that is
    /// not in the entity set.
    pub fn from_snapshot(snapshot: PhysicalSnapshot) -> SimResult<Self> {
        let layout = FieldLayout::standard();
        let n = snapshot.entities.len();
        let (names, index_by_name) = name_tables(&snapshot);

        let mut buf = vec![0.0; n * layout.mutable_count() + TRAILING_SCALARS];
        for spec in layout.mutable_fields() {
            let base = spec.block * n;
            for (i, entity) in snapshot.entities.iter().enumerate() {
                buf[base + i] = encode_field(entity, spec.field, &index_by_name)?;
            }
        }
        let len = buf.len();
        buf[len - 2] = snapshot.srb_time;
        buf[len - 1] = snapshot.time_acc;

        log::debug!("state derived from snapshot: {n} entities, buffer length {len}");
        Ok(Self::finish(snapshot, names, index_by_name, buf, n))
    }

    /// Adopt a buffer produced by the integrator, taking unchanging
    /// fields and scalar globals from `snapshot`. No per-entity copies.
    /// A buffer whose length disagrees with the entity count and field
    /// schema is a contract violation between the integrator and the
    /// state layer; the resulting error is not recoverable.
    pub fn from_buffer(buf: Vec<f64>, mut snapshot: PhysicalSnapshot) -> SimResult<Self> {
        let layout = FieldLayout::standard();
        let n = snapshot.entities.len();
        let expected = n * layout.mutable_count() + TRAILING_SCALARS;
        if buf.len() != expected {
            return Err(SimError::ShapeMismatch { expected, actual: buf.len() });
        }

        let (names, index_by_name) = name_tables(&snapshot);
        snapshot.srb_time = buf[buf.len() - 2];
        snapshot.time_acc = buf[buf.len() - 1];

        Ok(Self::finish(snapshot, names, index_by_name, buf, n))
    }

    /// Shared construction tail: heading renormalization and the
    /// atmosphere index cache.
    fn finish(
        snapshot: PhysicalSnapshot,
        names: Vec<String>,
        index_by_name: HashMap<String, usize>,
        mut buf: Vec<f64>,
        n: usize,
    ) -> Self {
        let base = MutableField::Heading.block() * n;
        for heading in &mut buf[base..base + n] {
            *heading = heading.rem_euclid(TAU);
        }

        let atmospheres = atmosphere_indices(&snapshot.entities);

        Self {
            id: next_state_id(),
            snapshot,
            names,
            index_by_name,
            buf,
            n,
            atmospheres,
        }
    }

    /// Zero-entity state, used while a buffer is on loan to the
    /// integrator.
    pub(crate) fn placeholder() -> Self {
        let snapshot = PhysicalSnapshot {
            timestamp: 0.0,
            srb_time: SRB_UNLIT,
            time_acc: 1.0,
            parachute_deployed: false,
            reference: String::new(),
            target: String::new(),
            navmode: Navmode::Manual,
            entities: Vec::new(),
        };
        Self {
            id: next_state_id(),
            buf: vec![SRB_UNLIT, 1.0],
            snapshot,
            names: Vec::new(),
            index_by_name: HashMap::new(),
            n: 0,
            atmospheres: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn entity_names(&self) -> &[String] {
        &self.names
    }

    /// Resolve an entity name to its fixed index.
    pub fn index_of(&self, name: &str) -> SimResult<usize> {
        self.index_by_name
            .get(name)
            .copied()
            .ok_or_else(|| SimError::NoSuchEntity { name: name.to_string() })
    }

    pub fn entity(&self, index: usize) -> EntityView<'_> {
        assert!(index < self.n, "entity index {index} out of range");
        EntityView::new(self, index)
    }

    pub fn entity_by_name(&self, name: &str) -> SimResult<EntityView<'_>> {
        Ok(self.entity(self.index_of(name)?))
    }

    pub fn entity_mut(&mut self, index: usize) -> EntityViewMut<'_> {
        assert!(index < self.n, "entity index {index} out of range");
        EntityViewMut::new(self, index)
    }

    pub fn entity_mut_by_name(&mut self, name: &str) -> SimResult<EntityViewMut<'_>> {
        let index = self.index_of(name)?;
        Ok(self.entity_mut(index))
    }

    /// Views over every entity, in index order.
    pub fn entities(&self) -> impl Iterator<Item = EntityView<'_>> {
        (0..self.n).map(move |i| EntityView::new(self, i))
    }

    /// Copy a record's fields into the entity slot at `index`.
    ///
    /// The slot's name is the per-state identity key and is preserved. A
    /// record detached from this same state and slot is already in place
    /// and is skipped without re-resolving its landed-on name. A
    /// landed-on name not in the entity set fails before anything is
    /// written.
    pub fn set_entity(&mut self, index: usize, record: &EntityRecord) -> SimResult<()> {
        assert!(index < self.n, "entity index {index} out of range");
        if record.origin() == Some((self.id, index)) {
            return Ok(());
        }

        let landed = match &record.landed_on {
            None => NO_INDEX,
            Some(name) => self.index_of(name)? as f64,
        };

        let atmosphere_changed;
        {
            let slot = &mut self.snapshot.entities[index];
            atmosphere_changed = slot.atmosphere_thickness != record.atmosphere_thickness
                || slot.atmosphere_scaling != record.atmosphere_scaling;
            slot.mass = record.mass;
            slot.radius = record.radius;
            slot.artificial = record.artificial;
            slot.atmosphere_thickness = record.atmosphere_thickness;
            slot.atmosphere_scaling = record.atmosphere_scaling;
        }

        self.write_slot(MutableField::X, index, record.x);
        self.write_slot(MutableField::Y, index, record.y);
        self.write_slot(MutableField::Vx, index, record.vx);
        self.write_slot(MutableField::Vy, index, record.vy);
        self.write_slot(MutableField::Heading, index, record.heading);
        self.write_slot(MutableField::Spin, index, record.spin);
        self.write_slot(MutableField::Fuel, index, record.fuel);
        self.write_slot(MutableField::Throttle, index, record.throttle);
        self.write_slot(MutableField::LandedOn, index, landed);
        self.write_slot(
            MutableField::Broken,
            index,
            if record.broken { 1.0 } else { 0.0 },
        );

        if atmosphere_changed {
            self.atmospheres = atmosphere_indices(&self.snapshot.entities);
        }
        Ok(())
    }

    pub fn set_entity_by_name(&mut self, name: &str, record: &EntityRecord) -> SimResult<()> {
        let index = self.index_of(name)?;
        self.set_entity(index, record)
    }

    /// Externalize to a fresh structured snapshot: unchanging fields and
    /// globals from the owned snapshot, mutable fields filled in from the
    /// buffer. O(n·k) — never call this on the integration hot path.
    pub fn to_snapshot(&self) -> PhysicalSnapshot {
        let mut out = self.snapshot.clone();
        for (i, entity) in out.entities.iter_mut().enumerate() {
            entity.x = self.slot(MutableField::X, i);
            entity.y = self.slot(MutableField::Y, i);
            entity.vx = self.slot(MutableField::Vx, i);
            entity.vy = self.slot(MutableField::Vy, i);
            entity.heading = self.slot(MutableField::Heading, i);
            entity.spin = self.slot(MutableField::Spin, i);
            entity.fuel = self.slot(MutableField::Fuel, i);
            entity.throttle = self.slot(MutableField::Throttle, i);
            entity.landed_on = self.landed_index(i).map(|j| self.names[j].clone());
            entity.broken = self.slot(MutableField::Broken, i) != 0.0;
        }
        out
    }

    /// The contiguous buffer slice holding `field` for every entity.
    /// A view into the live buffer, not a copy.
    #[inline]
    pub fn field(&self, field: MutableField) -> &[f64] {
        let base = field.block() * self.n;
        &self.buf[base..base + self.n]
    }

    #[inline]
    pub fn field_mut(&mut self, field: MutableField) -> &mut [f64] {
        let base = field.block() * self.n;
        &mut self.buf[base..base + self.n]
    }

    /// Mapping from entity index to the index it is landed on, covering
    /// only entities that are currently landed. Derived from live buffer
    /// values at call time.
    pub fn landed_on_map(&self) -> HashMap<usize, usize> {
        self.field(MutableField::LandedOn)
            .iter()
            .enumerate()
            .filter(|(_, &target)| target != NO_INDEX)
            .map(|(i, &target)| (i, target as usize))
            .collect()
    }

    /// Indices of entities with a nonzero atmosphere. Cached at
    /// construction; atmosphere parameters are unchanging.
    pub fn atmospheres(&self) -> &[usize] {
        &self.atmospheres
    }

    // ── Scalar globals ─────────────────────────────────────────

    pub fn timestamp(&self) -> f64 {
        self.snapshot.timestamp
    }

    pub fn set_timestamp(&mut self, t: f64) {
        self.snapshot.timestamp = t;
    }

    pub fn srb_time(&self) -> f64 {
        self.snapshot.srb_time
    }

    /// Writes both the snapshot scalar and the trailing buffer slot, so
    /// either representation reflects the latest value.
    pub fn set_srb_time(&mut self, val: f64) {
        self.snapshot.srb_time = val;
        let len = self.buf.len();
        self.buf[len - 2] = val;
    }

    pub fn time_acc(&self) -> f64 {
        self.snapshot.time_acc
    }

    pub fn set_time_acc(&mut self, acc: f64) {
        self.snapshot.time_acc = acc;
        let len = self.buf.len();
        self.buf[len - 1] = acc;
    }

    pub fn parachute_deployed(&self) -> bool {
        self.snapshot.parachute_deployed
    }

    pub fn set_parachute_deployed(&mut self, deployed: bool) {
        self.snapshot.parachute_deployed = deployed;
    }

    pub fn reference(&self) -> &str {
        &self.snapshot.reference
    }

    pub fn set_reference(&mut self, name: &str) {
        self.snapshot.reference = name.to_string();
    }

    pub fn target(&self) -> &str {
        &self.snapshot.target
    }

    pub fn set_target(&mut self, name: &str) {
        self.snapshot.target = name.to_string();
    }

    pub fn navmode(&self) -> Navmode {
        self.snapshot.navmode
    }

    pub fn set_navmode(&mut self, navmode: Navmode) {
        self.snapshot.navmode = navmode;
    }

    // ── Derived resolution ─────────────────────────────────────

    /// The entity currently under pilot control. Not backed by a stored
    /// field: if neither pilotable entity exists there is no craft; if
    /// only one exists it is the craft; if both exist, docking decides —
    /// a Habitat landed on AYSE means AYSE has control authority.
    pub fn craft(&self) -> Option<&str> {
        let hab = self.index_by_name.get(HABITAT);
        let ayse = self.index_by_name.get(AYSE);
        match (hab, ayse) {
            (None, None) => None,
            (Some(_), None) => Some(HABITAT),
            (None, Some(_)) => Some(AYSE),
            (Some(&h), Some(&a)) => {
                if self.field(MutableField::LandedOn)[h] == a as f64 {
                    Some(AYSE)
                } else {
                    Some(HABITAT)
                }
            }
        }
    }

    /// Full view of the active craft, if any.
    pub fn craft_entity(&self) -> Option<EntityView<'_>> {
        self.craft().map(|name| {
            let index = self.index_by_name[name];
            self.entity(index)
        })
    }

    /// View of the reference-frame entity named in the globals.
    pub fn reference_entity(&self) -> SimResult<EntityView<'_>> {
        self.entity_by_name(&self.snapshot.reference)
    }

    /// View of the target entity named in the globals.
    pub fn target_entity(&self) -> SimResult<EntityView<'_>> {
        self.entity_by_name(&self.snapshot.target)
    }

    // ── Integrator handoff ─────────────────────────────────────

    /// The live numeric buffer, length n·k + 2.
    pub fn buffer(&self) -> &[f64] {
        &self.buf
    }

    /// Tear the state apart for the integrator handoff: the buffer and
    /// the snapshot (whose per-entity mutable fields are stale). Pair
    /// with `from_buffer` to install the successor state. Consuming
    /// `self` is what ends the lifetime of every outstanding view.
    pub fn into_parts(self) -> (Vec<f64>, PhysicalSnapshot) {
        (self.buf, self.snapshot)
    }

    // ── View plumbing ──────────────────────────────────────────

    pub(crate) fn id(&self) -> StateId {
        self.id
    }

    #[inline]
    pub(crate) fn slot(&self, field: MutableField, index: usize) -> f64 {
        self.buf[field.block() * self.n + index]
    }

    #[inline]
    pub(crate) fn write_slot(&mut self, field: MutableField, index: usize, val: f64) {
        self.buf[field.block() * self.n + index] = val;
    }

    /// The snapshot record at `index`. Only its unchanging fields are
    /// current.
    pub(crate) fn record_at(&self, index: usize) -> &Entity {
        &self.snapshot.entities[index]
    }

    pub(crate) fn record_at_mut(&mut self, index: usize) -> &mut Entity {
        &mut self.snapshot.entities[index]
    }

    /// Decoded landed-on slot: the target's index, or `None` for the
    /// sentinel.
    pub(crate) fn landed_index(&self, index: usize) -> Option<usize> {
        let target = self.slot(MutableField::LandedOn, index);
        (target != NO_INDEX).then(|| target as usize)
    }

    pub(crate) fn name_of(&self, index: usize) -> &str {
        &self.names[index]
    }
}

fn name_tables(snapshot: &PhysicalSnapshot) -> (Vec<String>, HashMap<String, usize>) {
    let names: Vec<String> = snapshot.entities.iter().map(|e| e.name.clone()).collect();
    let index_by_name = names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), i))
        .collect();
    (names, index_by_name)
}

fn atmosphere_indices(entities: &[Entity]) -> Vec<usize> {
    entities
        .iter()
        .enumerate()
        .filter(|(_, e)| e.atmosphere_thickness != 0.0 && e.atmosphere_scaling != 0.0)
        .map(|(i, _)| i)
        .collect()
}

/// Encode one mutable field of a structured record into its f64 buffer
/// representation.
fn encode_field(
    entity: &Entity,
    field: MutableField,
    index_by_name: &HashMap<String, usize>,
) -> SimResult<f64> {
    Ok(match field {
        MutableField::X => entity.x,
        MutableField::Y => entity.y,
        MutableField::Vx => entity.vx,
        MutableField::Vy => entity.vy,
        MutableField::Heading => entity.heading,
        MutableField::Spin => entity.spin,
        MutableField::Fuel => entity.fuel,
        MutableField::Throttle => entity.throttle,
        MutableField::LandedOn => match &entity.landed_on {
            None => NO_INDEX,
            Some(name) => *index_by_name
                .get(name)
                .ok_or_else(|| SimError::NoSuchEntity { name: name.clone() })?
                as f64,
        },
        MutableField::Broken => {
            if entity.broken {
                1.0
            } else {
                0.0
            }
        }
    })
}
