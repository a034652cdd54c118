//! Entity view addressing, landed-on resolution, equality and the
//! record-replace fast path.

use orbsim_core::entity::Entity;
use orbsim_core::error::SimError;
use orbsim_core::schema::MutableField;
use orbsim_core::snapshot::PhysicalSnapshot;
use orbsim_core::state::PhysicsState;
use orbsim_core::types::Navmode;

fn planet() -> Entity {
    Entity {
        name: "Vesta".into(),
        mass: 2.59e20,
        radius: 262_700.0,
        atmosphere_thickness: 0.0,
        atmosphere_scaling: 0.0,
        x: 1.0,
        y: 2.0,
        vx: 3.0,
        vy: 4.0,
        heading: 0.5,
        spin: 0.01,
        ..Entity::default()
    }
}

fn hab() -> Entity {
    Entity {
        name: "Habitat".into(),
        mass: 2.75e5,
        radius: 15.0,
        artificial: true,
        x: 10.0,
        y: 20.0,
        vx: 30.0,
        vy: 40.0,
        heading: 1.0,
        spin: 0.2,
        fuel: 500.0,
        throttle: 0.5,
        landed_on: Some("Vesta".into()),
        broken: true,
        ..Entity::default()
    }
}

fn snapshot() -> PhysicalSnapshot {
    PhysicalSnapshot {
        timestamp: 0.0,
        srb_time: -1.0,
        time_acc: 1.0,
        parachute_deployed: false,
        reference: "Vesta".into(),
        target: "Habitat".into(),
        navmode: Navmode::Manual,
        entities: vec![planet(), hab()],
    }
}

#[test]
fn view_accessors_match_direct_buffer_slots() {
    let state = PhysicsState::from_snapshot(snapshot()).expect("state");
    let n = state.len();
    let buf = state.buffer();

    for i in 0..n {
        let view = state.entity(i);
        let direct = |f: MutableField| buf[f.block() * n + i];

        assert_eq!(view.x(), direct(MutableField::X));
        assert_eq!(view.y(), direct(MutableField::Y));
        assert_eq!(view.vx(), direct(MutableField::Vx));
        assert_eq!(view.vy(), direct(MutableField::Vy));
        assert_eq!(view.heading(), direct(MutableField::Heading));
        assert_eq!(view.spin(), direct(MutableField::Spin));
        assert_eq!(view.fuel(), direct(MutableField::Fuel));
        assert_eq!(view.throttle(), direct(MutableField::Throttle));
        assert_eq!(view.broken(), direct(MutableField::Broken) != 0.0);
    }

    // The landed-on slot holds the target's float-encoded index.
    assert_eq!(buf[MutableField::LandedOn.block() * n + 1], 0.0);
    assert_eq!(state.entity(1).landed_on(), Some("Vesta"));
    assert_eq!(buf[MutableField::LandedOn.block() * n], -1.0);
    assert_eq!(state.entity(0).landed_on(), None);
}

#[test]
fn unchanging_fields_read_from_snapshot() {
    let state = PhysicsState::from_snapshot(snapshot()).expect("state");
    let view = state.entity(1);

    assert_eq!(view.name(), "Habitat");
    assert_eq!(view.mass(), 2.75e5);
    assert_eq!(view.radius(), 15.0);
    assert!(view.artificial());
    assert_eq!(view.atmosphere_thickness(), 0.0);
}

#[test]
fn derived_view_properties() {
    let state = PhysicsState::from_snapshot(snapshot()).expect("state");

    assert_eq!(state.entity(1).pos(), [10.0, 20.0]);
    assert_eq!(state.entity(1).velocity(), [30.0, 40.0]);
    assert!(state.entity(1).landed());
    assert!(!state.entity(0).landed());
    assert!(!state.entity(0).dockable());
}

#[test]
fn failed_landed_on_write_leaves_buffer_unchanged() {
    let mut state = PhysicsState::from_snapshot(snapshot()).expect("state");
    let before = state.buffer().to_vec();

    let err = state.entity_mut(0).set_landed_on(Some("Ghost")).unwrap_err();
    assert!(matches!(err, SimError::NoSuchEntity { name } if name == "Ghost"));
    assert_eq!(state.buffer(), &before[..]);
}

#[test]
fn landed_on_write_by_name_and_by_index_agree() {
    let mut state = PhysicsState::from_snapshot(snapshot()).expect("state");

    state.entity_mut(0).set_landed_on(Some("Habitat")).expect("write");
    assert_eq!(state.entity(0).landed_on(), Some("Habitat"));

    state.entity_mut(0).set_landed_on_index(None);
    assert_eq!(state.entity(0).landed_on(), None);

    state.entity_mut(0).set_landed_on_index(Some(1));
    assert_eq!(state.entity(0).landed_on(), Some("Habitat"));
}

#[test]
fn view_equality_means_same_state_and_index() {
    let state_a = PhysicsState::from_snapshot(snapshot()).expect("state a");
    let state_b = PhysicsState::from_snapshot(snapshot()).expect("state b");

    assert_eq!(state_a.entity(0), state_a.entity(0));
    assert_ne!(state_a.entity(0), state_a.entity(1));
    // Same index, different owning state: not the same logical entity.
    assert_ne!(state_a.entity(0), state_b.entity(0));
}

#[test]
fn record_assigned_back_to_its_own_slot_is_a_noop() {
    let mut state = PhysicsState::from_snapshot(snapshot()).expect("state");

    let record = state.entity(1).to_record();
    state.set_entity(1, &record).expect("same-slot assignment");
    assert_eq!(state.entity(1).throttle(), 0.5);

    // Once the record is edited it no longer counts as in place.
    let mut record = state.entity(1).to_record();
    record.throttle = 0.9;
    state.set_entity(1, &record).expect("edited assignment");
    assert_eq!(state.entity(1).throttle(), 0.9);
}

#[test]
fn replace_copies_fields_but_keeps_slot_name() {
    let mut state = PhysicsState::from_snapshot(snapshot()).expect("state");

    let record = state.entity(1).to_record();
    state.set_entity(0, &record).expect("cross-slot assignment");

    let dst = state.entity(0);
    assert_eq!(dst.name(), "Vesta");
    assert_eq!(dst.mass(), 2.75e5);
    assert_eq!(dst.x(), 10.0);
    assert_eq!(dst.landed_on(), Some("Vesta"));
}

#[test]
fn replace_with_unknown_landed_on_fails_before_writing() {
    let mut state = PhysicsState::from_snapshot(snapshot()).expect("state");
    let before = state.buffer().to_vec();

    let mut record = state.entity(1).to_record();
    record.landed_on = Some("Ghost".into());
    assert!(state.set_entity(1, &record).is_err());
    assert_eq!(state.buffer(), &before[..]);
}

#[test]
fn view_writes_are_visible_through_field_slices() {
    let mut state = PhysicsState::from_snapshot(snapshot()).expect("state");

    state.entity_mut(0).set_fuel(123.0);
    state.entity_mut(1).set_broken(false);

    assert_eq!(state.field(MutableField::Fuel)[0], 123.0);
    assert_eq!(state.field(MutableField::Broken)[1], 0.0);
}
