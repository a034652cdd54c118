//! Active-craft, reference and target resolution.

use orbsim_core::entity::Entity;
use orbsim_core::error::SimError;
use orbsim_core::snapshot::PhysicalSnapshot;
use orbsim_core::state::PhysicsState;
use orbsim_core::types::{Navmode, AYSE, HABITAT};

fn craft(name: &str) -> Entity {
    Entity {
        name: name.to_string(),
        mass: 3.0e5,
        radius: 20.0,
        artificial: true,
        ..Entity::default()
    }
}

fn snapshot(entities: Vec<Entity>) -> PhysicalSnapshot {
    PhysicalSnapshot {
        timestamp: 0.0,
        srb_time: -1.0,
        time_acc: 1.0,
        parachute_deployed: false,
        reference: HABITAT.into(),
        target: AYSE.into(),
        navmode: Navmode::Manual,
        entities,
    }
}

#[test]
fn docked_habitat_cedes_control_to_ayse() {
    let mut hab = craft(HABITAT);
    hab.landed_on = Some(AYSE.into());
    let state = PhysicsState::from_snapshot(snapshot(vec![hab, craft(AYSE)])).expect("state");

    assert_eq!(state.craft(), Some(AYSE));
    assert_eq!(state.craft_entity().map(|e| e.index()), Some(1));
}

#[test]
fn undocked_habitat_keeps_control() {
    let mut state =
        PhysicsState::from_snapshot(snapshot(vec![craft(HABITAT), craft(AYSE)])).expect("state");
    assert_eq!(state.craft(), Some(HABITAT));

    // Dock, then clear the relation again through a view.
    state
        .entity_mut_by_name(HABITAT)
        .expect("habitat")
        .set_landed_on(Some(AYSE))
        .expect("dock");
    assert_eq!(state.craft(), Some(AYSE));

    state
        .entity_mut_by_name(HABITAT)
        .expect("habitat")
        .set_landed_on_index(None);
    assert_eq!(state.craft(), Some(HABITAT));
}

#[test]
fn habitat_landed_on_a_planet_keeps_control() {
    let mut planet = craft("Earth");
    planet.artificial = false;
    let mut hab = craft(HABITAT);
    hab.landed_on = Some("Earth".into());

    let state =
        PhysicsState::from_snapshot(snapshot(vec![planet, hab, craft(AYSE)])).expect("state");
    assert_eq!(state.craft(), Some(HABITAT));
}

#[test]
fn single_pilotable_entity_is_the_craft() {
    let state = PhysicsState::from_snapshot(snapshot(vec![craft(HABITAT)])).expect("state");
    assert_eq!(state.craft(), Some(HABITAT));

    let state = PhysicsState::from_snapshot(snapshot(vec![craft(AYSE)])).expect("state");
    assert_eq!(state.craft(), Some(AYSE));
}

#[test]
fn no_pilotable_entity_means_no_craft() {
    let mut rock = craft("Ceres");
    rock.artificial = false;
    let state = PhysicsState::from_snapshot(snapshot(vec![rock])).expect("state");

    assert_eq!(state.craft(), None);
    assert!(state.craft_entity().is_none());
}

#[test]
fn reference_and_target_resolve_to_views() {
    let state =
        PhysicsState::from_snapshot(snapshot(vec![craft(HABITAT), craft(AYSE)])).expect("state");

    assert_eq!(state.reference_entity().expect("reference").name(), HABITAT);
    let target = state.target_entity().expect("target");
    assert_eq!(target.name(), AYSE);
    assert!(target.dockable());
}

#[test]
fn stale_reference_name_is_a_recoverable_error() {
    let mut snap = snapshot(vec![craft(HABITAT)]);
    snap.reference = "Scrapped Station".into();

    let state = PhysicsState::from_snapshot(snap).expect("state");
    let err = state.reference_entity().unwrap_err();
    assert!(matches!(err, SimError::NoSuchEntity { name } if name == "Scrapped Station"));
}
