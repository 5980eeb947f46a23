//! Property-based tests for the tread locomotion invariants.
//!
//! Random terrain seeds, gear schedules and run lengths are driven through a
//! full TreadSystem; the pure solver maths is checked over random inputs.
//!
//! Run with: cargo test --test proptest_treads

use proptest::prelude::*;
use rapier2d::prelude::*;
use tank_treads::treads::suspension::compression_at;
use tank_treads::treads::traction::{solve_traction, traction_scale};
use tank_treads::{
    GroundContact, MassConfig, MassModel, TankConfig, Terrain, TreadSystem, Wheel, WheelConfig,
};

const DT: f32 = 1.0 / 60.0;

// =============================================================================
// Strategies
// =============================================================================

fn arb_preset() -> impl Strategy<Value = TankConfig> {
    prop_oneof![Just(TankConfig::heavy()), Just(TankConfig::light())]
}

/// (tick at which to shift, requested gear); out-of-range gears included.
fn arb_gear_script() -> impl Strategy<Value = Vec<(usize, i32)>> {
    prop::collection::vec((0usize..240, -4i32..=4), 1..5)
}

fn arb_member() -> impl Strategy<Value = [f32; 2]> {
    prop::array::uniform2(-10.0f32..10.0)
}

// =============================================================================
// Full-system invariants
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn tick_invariants_hold_on_random_terrain(
        config in arb_preset(),
        seed in 0u64..10_000,
        script in arb_gear_script(),
        ticks in 60usize..240,
    ) {
        let limit = config.stability.max_tip_angle;
        let max_step = config.drivetrain.max_acceleration * DT;

        let terrain = Terrain::rolling(seed, 200.0, 2.0, 1.5);
        let mut system = TreadSystem::from_config(config, terrain);
        system.initialize().unwrap();

        let mut previous = system.drivetrain().throttle();
        for t in 0..ticks {
            for &(at, gear) in &script {
                if at == t {
                    system.change_gear(gear);
                }
            }
            system.fixed_tick(DT);

            let throttle = system.drivetrain().throttle();
            prop_assert!(throttle.abs() <= 1.0);
            prop_assert!((throttle - previous).abs() <= max_step + 1e-6);
            previous = throttle;

            prop_assert!(system.chassis().rotation().abs() <= limit);
            for wheel in system.wheels() {
                prop_assert!((0.0..=1.0).contains(&wheel.compression));
            }
            prop_assert!(system.grounded_count() <= system.wheels().len());
        }
    }
}

// =============================================================================
// Solver properties
// =============================================================================

proptest! {
    #[test]
    fn compression_is_always_normalized(
        distance in -5.0f32..5.0,
        radius in 0.05f32..2.0,
        rest in 0.01f32..2.0,
    ) {
        let c = compression_at(distance, radius, rest);
        prop_assert!((0.0..=1.0).contains(&c));
    }

    #[test]
    fn traction_scale_is_monotonic_and_capped(total in 1usize..16, extra in 0usize..16) {
        let mut last = 0.0;
        for grounded in 0..=total {
            let s = traction_scale(grounded, total, extra);
            prop_assert!(s >= last);
            prop_assert!(s <= 1.0);
            last = s;
        }
        if extra < total {
            prop_assert_eq!(traction_scale(total - extra, total, extra), 1.0);
        }
    }

    #[test]
    fn traction_never_produces_non_finite_forces(
        grounded in 0usize..6,
        vx in -20.0f32..20.0,
        target in -20.0f32..20.0,
        slope in -0.7f32..0.7,
    ) {
        let normal = vector![-slope.sin(), slope.cos()];
        let wheels: Vec<Wheel> = (0..6)
            .map(|i| {
                let mut w = Wheel::new(WheelConfig::new([i as f32, -0.8], 0.4, 0.5, 4_000.0, 600.0));
                w.grounded = i < grounded;
                w.last_contact = Some(GroundContact { point: point![i as f32, 0.0], normal });
                w
            })
            .collect();

        let forces = solve_traction(&wheels, vector![target, 0.0], vector![vx, 0.0], 1_500.0, 1, DT);
        prop_assert_eq!(forces.len(), if vx == target { 0 } else { grounded });
        for f in &forces {
            prop_assert!(f.force.x.is_finite() && f.force.y.is_finite());
        }
    }

    #[test]
    fn mass_snapshot_stays_in_envelope(members in prop::collection::vec(arb_member(), 0..40)) {
        let model = MassModel::new(MassConfig::default());
        let cells: Vec<Vector<Real>> = members.iter().map(|[x, y]| vector![*x, *y]).collect();
        let snap = model.recalculate(&cells);

        prop_assert_eq!(snap.cell_count, members.len());
        prop_assert_eq!(snap.total_weight, members.len() as f32 * 50.0);
        let [w, h] = MassConfig::default().com_envelope;
        prop_assert!(snap.center_offset[0].abs() <= w);
        prop_assert!(snap.center_offset[1].abs() <= h);
        prop_assert!(snap.average_position.iter().all(|v| v.is_finite()));
    }
}
