//! End-to-end behaviour of a tread system driven through its public API.

use rapier2d::prelude::*;
use tank_treads::{
    FlatGround, TankConfig, Terrain, TipCorrection, TreadError, TreadState, TreadSystem,
};

const DT: f32 = 1.0 / 60.0;

fn run<G: tank_treads::GroundContactProvider>(system: &mut TreadSystem<G>, ticks: usize) {
    for _ in 0..ticks {
        system.fixed_tick(DT);
        system.tick(DT);
    }
}

#[test]
fn double_initialize_matches_single_initialize() {
    let mut once = TreadSystem::from_config(TankConfig::heavy(), FlatGround::new(0.0));
    once.initialize().unwrap();

    let mut twice = TreadSystem::from_config(TankConfig::heavy(), FlatGround::new(0.0));
    twice.initialize().unwrap();
    twice.initialize().unwrap();

    assert_eq!(once.wheels(), twice.wheels());

    run(&mut once, 120);
    run(&mut twice, 120);

    assert_eq!(once.wheels(), twice.wheels());
    assert_eq!(once.chassis().pose(), twice.chassis().pose());
}

#[test]
fn empty_wheel_list_is_a_configuration_error() {
    let mut config = TankConfig::heavy();
    config.wheels.clear();
    config.stability.extra_wheels = 0;

    let mut system = TreadSystem::from_config(config, FlatGround::new(0.0));
    let err = system.initialize().unwrap_err();

    assert!(matches!(err, TreadError::NoWheels));
    assert_eq!(system.state(), TreadState::Uninitialized);
    assert_eq!(system.speed(), 0.0);
}

#[test]
fn tank_comes_to_rest_on_terrain_strip() {
    let mut system = TreadSystem::from_config(TankConfig::light(), Terrain::flat(0.0, 100.0));
    system.initialize().unwrap();
    run(&mut system, 600);

    assert_eq!(system.grounded_count(), 4);
    assert!(system.speed() < 0.5);
    assert_eq!(system.last_tip_correction(), TipCorrection::Upright);
}

#[test]
fn reverse_gear_backs_up() {
    let mut system = TreadSystem::from_config(TankConfig::light(), FlatGround::new(0.0));
    system.initialize().unwrap();
    run(&mut system, 240);

    let x0 = system.chassis().position().x;
    assert_eq!(system.change_gear(-10), -3);
    run(&mut system, 240);

    assert!(system.chassis().linvel().x < -1.0);
    assert!(system.chassis().position().x < x0);
}

#[test]
fn neutral_after_driving_slows_the_tank() {
    let mut system = TreadSystem::from_config(TankConfig::heavy(), FlatGround::new(0.0));
    system.initialize().unwrap();
    run(&mut system, 240);

    system.change_gear(2);
    run(&mut system, 300);
    let cruising = system.speed();

    system.change_gear(0);
    run(&mut system, 600);

    assert!(cruising > 5.0);
    assert!(system.speed() < cruising * 0.25, "{} vs {}", system.speed(), cruising);
}

#[test]
fn cargo_shifts_mass_and_telemetry_reports_it() {
    let mut system = TreadSystem::from_config(TankConfig::heavy(), FlatGround::new(0.0));
    system.initialize().unwrap();

    let cargo: Vec<Vector<Real>> = (0..10).map(|i| vector![-1.0 + i as Real * 0.2, 0.6]).collect();
    system.notify_structure_changed(&cargo);
    run(&mut system, 300);

    let t = system.telemetry();
    assert_eq!(t.structure.cell_count, 10);
    assert_eq!(t.mass, 2_400.0 + 500.0);
    assert_eq!(t.grounded, 6);
    assert!(t.wheels.iter().filter(|w| w.grounded).count() == 6);
}
