//! Buffer shape, adoption, per-field slices and derived caches.

use orbsim_core::entity::Entity;
use orbsim_core::error::SimError;
use orbsim_core::schema::{MutableField, MUTABLE_FIELD_COUNT};
use orbsim_core::snapshot::PhysicalSnapshot;
use orbsim_core::state::PhysicsState;
use orbsim_core::types::Navmode;

fn body(name: &str, x: f64) -> Entity {
    Entity {
        name: name.to_string(),
        mass: 1.0e22,
        radius: 1_000.0,
        x,
        vx: x / 100.0,
        ..Entity::default()
    }
}

fn snapshot(entities: Vec<Entity>) -> PhysicalSnapshot {
    PhysicalSnapshot {
        timestamp: 0.0,
        srb_time: -1.0,
        time_acc: 1.0,
        parachute_deployed: false,
        reference: "a".into(),
        target: "b".into(),
        navmode: Navmode::Manual,
        entities,
    }
}

#[test]
fn buffer_length_is_n_times_k_plus_two() {
    for n in [1usize, 2, 7] {
        let entities = (0..n).map(|i| body(&format!("b{i}"), i as f64)).collect();
        let state = PhysicsState::from_snapshot(snapshot(entities)).expect("state");
        assert_eq!(state.buffer().len(), n * MUTABLE_FIELD_COUNT + 2);
        assert_eq!(state.len(), n);
    }
}

#[test]
fn from_buffer_reproduces_identical_view_values() {
    let entities = vec![body("a", 10.0), body("b", 20.0), body("c", 30.0)];
    let original = PhysicsState::from_snapshot(snapshot(entities.clone())).expect("state");

    let rebuilt = PhysicsState::from_buffer(original.buffer().to_vec(), snapshot(entities))
        .expect("rebuilt state");

    assert_eq!(rebuilt.len(), original.len());
    for i in 0..original.len() {
        let (a, b) = (original.entity(i), rebuilt.entity(i));
        assert_eq!(a.name(), b.name());
        for field in MutableField::ALL {
            assert_eq!(
                original.field(field)[i],
                rebuilt.field(field)[i],
                "field {} diverged at entity {i}",
                field.name()
            );
        }
    }
}

#[test]
fn from_buffer_rejects_wrong_length() {
    let entities = vec![body("a", 1.0), body("b", 2.0)];
    let expected = 2 * MUTABLE_FIELD_COUNT + 2;

    let err = PhysicsState::from_buffer(vec![0.0; expected + 1], snapshot(entities)).unwrap_err();
    match err {
        SimError::ShapeMismatch { expected: e, actual } => {
            assert_eq!(e, expected);
            assert_eq!(actual, expected + 1);
        }
        other => panic!("expected ShapeMismatch, got {other:?}"),
    }
}

#[test]
fn from_buffer_adopts_values_and_mirrors_trailing_scalars() {
    let entities = vec![body("a", 1.0), body("b", 2.0)];
    let n = entities.len();

    let mut buf = vec![0.0; n * MUTABLE_FIELD_COUNT + 2];
    buf[MutableField::X.block() * n] = 42.0; // a.x
    buf[MutableField::Heading.block() * n + 1] = 10.0; // b.heading, out of range
    buf[MutableField::LandedOn.block() * n] = 1.0; // a landed on b
    buf[MutableField::LandedOn.block() * n + 1] = -1.0;
    let len = buf.len();
    buf[len - 2] = 60.0;
    buf[len - 1] = 250.0;

    let state = PhysicsState::from_buffer(buf, snapshot(entities)).expect("state");

    assert_eq!(state.entity(0).x(), 42.0);
    assert_eq!(state.entity(0).landed_on(), Some("b"));
    assert_eq!(state.srb_time(), 60.0);
    assert_eq!(state.time_acc(), 250.0);
    assert_eq!(state.to_snapshot().srb_time, 60.0);

    // Out-of-range heading from the integrator gets renormalized.
    let heading = state.entity(1).heading();
    assert!(heading >= 0.0 && heading < std::f64::consts::TAU);
}

#[test]
fn field_slices_are_contiguous_and_live() {
    let entities = vec![body("a", 10.0), body("b", 20.0), body("c", 30.0)];
    let mut state = PhysicsState::from_snapshot(snapshot(entities)).expect("state");

    assert_eq!(state.field(MutableField::X), &[10.0, 20.0, 30.0]);
    assert_eq!(state.field(MutableField::Vx), &[0.1, 0.2, 0.3]);

    // Writes through the slice are visible through views, and vice versa.
    state.field_mut(MutableField::X)[1] = 99.0;
    assert_eq!(state.entity(1).x(), 99.0);

    state.entity_mut(2).set_vx(7.0);
    assert_eq!(state.field(MutableField::Vx)[2], 7.0);
}

#[test]
fn landed_on_map_covers_only_landed_entities() {
    let mut a = body("a", 1.0);
    let b = body("b", 2.0);
    let mut c = body("c", 3.0);
    a.landed_on = Some("b".into());
    c.landed_on = Some("b".into());

    let state = PhysicsState::from_snapshot(snapshot(vec![a, b, c])).expect("state");
    let map = state.landed_on_map();

    assert_eq!(map.len(), 2);
    assert_eq!(map.get(&0), Some(&1));
    assert_eq!(map.get(&2), Some(&1));
    assert_eq!(map.get(&1), None);
}

#[test]
fn atmosphere_cache_requires_both_parameters_nonzero() {
    let mut thick_only = body("thick", 1.0);
    thick_only.atmosphere_thickness = 50_000.0;

    let mut scaled_only = body("scaled", 2.0);
    scaled_only.atmosphere_scaling = 8.0;

    let mut full = body("full", 3.0);
    full.atmosphere_thickness = 50_000.0;
    full.atmosphere_scaling = 8.0;

    let bare = body("bare", 4.0);

    let state =
        PhysicsState::from_snapshot(snapshot(vec![thick_only, scaled_only, full, bare]))
            .expect("state");

    assert_eq!(state.atmospheres(), &[2usize]);
}
