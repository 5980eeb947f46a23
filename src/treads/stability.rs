// ==============================================================================
// stability.rs - AIR DRAG, ANGULAR DRAG, ANTI-TIP GOVERNOR
// ------------------------------------------------------------------------------
// Runs after traction, every fixed tick:
//
// - Air drag torque:   base_air_drag_force * dt * v_x
//   Wind on the hull tilts the chassis with speed and direction of travel.
// - Angular drag:      min(grounded / total, 1) * max_angular_drag
//   More wheels on the ground, more resistance to spinning.
// - Tip prevention, with limit = max_tip_angle and edge = limit - buffer_zone:
//     |rot| <= edge          upright, nothing to do
//     edge < |rot| <= limit  buffer: torque = -sign(rot) * t * tip_prevention_force
//                            t = inverse_lerp(edge, limit, |rot|)
//     |rot| > limit          crisis: clamp rot to +-limit, zero angvel, then
//                            apply the full corrective torque
//
// enforce_limit() repeats the crisis clamp after the chassis integrates so
// |rotation| <= max_tip_angle holds when a tick completes.
// ==============================================================================

use serde::{Deserialize, Serialize};

use crate::chassis::Chassis;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityConfig {
    pub max_tip_angle: f32,         // radians
    pub buffer_zone: f32,           // radians inside max_tip_angle
    pub tip_prevention_force: f32,  // N*m at the limit
    pub base_air_drag_force: f32,   // N*m per (m/s) per second
    pub max_angular_drag: f32,      // rapier angular damping, all wheels down
    pub extra_wheels: usize,        // wheels excluded from traction scaling
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            max_tip_angle: 0.6,
            buffer_zone: 0.15,
            tip_prevention_force: 40_000.0,
            base_air_drag_force: 600.0,
            max_angular_drag: 4.0,
            extra_wheels: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum TipCorrection {
    Upright,
    Buffer { torque: f32 },
    Crisis { clamped: f32, torque: f32 },
}

impl TipCorrection {
    pub fn torque(&self) -> f32 {
        match *self {
            TipCorrection::Upright => 0.0,
            TipCorrection::Buffer { torque } | TipCorrection::Crisis { torque, .. } => torque,
        }
    }
}

#[inline]
pub fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    if (b - a).abs() <= f32::EPSILON {
        return if value >= b { 1.0 } else { 0.0 };
    }
    ((value - a) / (b - a)).clamp(0.0, 1.0)
}

pub fn air_drag_torque(config: &StabilityConfig, horizontal_velocity: f32, dt: f32) -> f32 {
    config.base_air_drag_force * dt * horizontal_velocity
}

pub fn angular_drag(config: &StabilityConfig, grounded: usize, total_wheels: usize) -> f32 {
    if total_wheels == 0 {
        return 0.0;
    }
    (grounded as f32 / total_wheels as f32).min(1.0) * config.max_angular_drag
}

/// Classify a chassis angle and compute the corrective torque for it.
pub fn tip_correction(config: &StabilityConfig, rotation: f32) -> TipCorrection {
    let limit = config.max_tip_angle.abs();
    let edge = (limit - config.buffer_zone.max(0.0)).max(0.0);
    let magnitude = rotation.abs();

    if magnitude <= edge {
        return TipCorrection::Upright;
    }

    let sign = rotation.signum();
    if magnitude > limit {
        // t saturates at 1 once clamped to the limit
        return TipCorrection::Crisis {
            clamped: sign * limit,
            torque: -sign * config.tip_prevention_force,
        };
    }

    let t = inverse_lerp(edge, limit, magnitude);
    TipCorrection::Buffer {
        torque: -sign * t * config.tip_prevention_force,
    }
}

#[derive(Debug, Clone)]
pub struct StabilityGovernor {
    config: StabilityConfig,
}

impl StabilityGovernor {
    pub fn new(config: StabilityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StabilityConfig {
        &self.config
    }

    /// Drag and tip correction for one fixed tick, before integration.
    pub fn apply(
        &self,
        chassis: &mut Chassis,
        grounded: usize,
        total_wheels: usize,
        dt: f32,
    ) -> TipCorrection {
        let horizontal = chassis.linvel().x;
        chassis.add_torque(air_drag_torque(&self.config, horizontal, dt));
        chassis.set_angular_drag(angular_drag(&self.config, grounded, total_wheels));

        let correction = tip_correction(&self.config, chassis.rotation());
        if let TipCorrection::Crisis { clamped, .. } = correction {
            tracing::debug!(rotation = chassis.rotation(), clamped, "tip crisis clamp");
            chassis.set_rotation_within(clamped, self.config.max_tip_angle);
            chassis.set_angvel(0.0);
        }
        chassis.add_torque(correction.torque());

        correction
    }

    /// Hard clamp after integration. Returns true when it had to act.
    pub fn enforce_limit(&self, chassis: &mut Chassis) -> bool {
        let limit = self.config.max_tip_angle.abs();
        let rotation = chassis.rotation();
        if rotation.abs() <= limit {
            return false;
        }

        chassis.set_rotation_within(rotation.signum() * limit, limit);
        chassis.set_angvel(0.0);
        tracing::trace!(rotation, limit, "post-step tip clamp");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chassis::ChassisConfig;

    fn config() -> StabilityConfig {
        StabilityConfig {
            max_tip_angle: 0.5,
            buffer_zone: 0.2,
            tip_prevention_force: 1_000.0,
            base_air_drag_force: 10.0,
            max_angular_drag: 4.0,
            extra_wheels: 0,
        }
    }

    fn weightless() -> Chassis {
        Chassis::from_config(&ChassisConfig {
            gravity: [0.0, 0.0],
            ..ChassisConfig::default()
        })
    }

    #[test]
    fn upright_inside_buffer_edge() {
        assert_eq!(tip_correction(&config(), 0.29), TipCorrection::Upright);
        assert_eq!(tip_correction(&config(), -0.3), TipCorrection::Upright);
    }

    #[test]
    fn buffer_torque_ramps_against_the_lean() {
        let mid = tip_correction(&config(), 0.4);
        assert!((mid.torque() + 500.0).abs() < 1e-2);

        let mirrored = tip_correction(&config(), -0.4);
        assert!((mirrored.torque() - 500.0).abs() < 1e-2);

        let at_limit = tip_correction(&config(), 0.5);
        assert!(matches!(at_limit, TipCorrection::Buffer { .. }));
        assert!((at_limit.torque() + 1_000.0).abs() < 1e-2);
    }

    #[test]
    fn crisis_clamps_to_limit() {
        let c = tip_correction(&config(), -0.9);
        assert_eq!(c, TipCorrection::Crisis { clamped: -0.5, torque: 1_000.0 });
    }

    #[test]
    fn zero_width_buffer_only_corrects_past_the_limit() {
        let cfg = StabilityConfig { buffer_zone: 0.0, ..config() };
        assert_eq!(tip_correction(&cfg, 0.5), TipCorrection::Upright);
        assert!(matches!(tip_correction(&cfg, 0.51), TipCorrection::Crisis { .. }));
        assert_eq!(inverse_lerp(0.5, 0.5, 0.6), 1.0);
    }

    #[test]
    fn angular_drag_follows_grounded_share() {
        assert_eq!(angular_drag(&config(), 0, 4), 0.0);
        assert_eq!(angular_drag(&config(), 2, 4), 2.0);
        assert_eq!(angular_drag(&config(), 6, 4), 4.0);
        assert_eq!(angular_drag(&config(), 1, 0), 0.0);
    }

    #[test]
    fn air_drag_scales_with_speed_and_direction() {
        assert!((air_drag_torque(&config(), 5.0, 0.1) - 5.0).abs() < 1e-6);
        assert!(air_drag_torque(&config(), -5.0, 0.1) < 0.0);
    }

    #[test]
    fn apply_clamps_crisis_before_torque() {
        let governor = StabilityGovernor::new(config());
        let mut chassis = weightless();
        chassis.set_rotation(0.8);
        chassis.set_angvel(2.0);

        let c = governor.apply(&mut chassis, 2, 4, 1.0 / 60.0);
        assert!(matches!(c, TipCorrection::Crisis { .. }));
        assert!(chassis.rotation() <= 0.5);
        assert!(0.5 - chassis.rotation() < 1e-5);
        assert_eq!(chassis.angvel(), 0.0);
        assert_eq!(chassis.angular_drag(), 2.0);
    }

    #[test]
    fn enforce_limit_holds_rotation_after_step() {
        let governor = StabilityGovernor::new(config());
        let mut chassis = weightless();
        chassis.set_rotation_within(0.5, 0.5);
        chassis.set_angvel(30.0);
        chassis.integrate(1.0 / 60.0);
        assert!(chassis.rotation() > 0.5);

        assert!(governor.enforce_limit(&mut chassis));
        assert!(chassis.rotation() <= 0.5);
        assert_eq!(chassis.angvel(), 0.0);
        assert!(!governor.enforce_limit(&mut chassis));
    }

    #[test]
    fn enforce_limit_is_exact_for_any_limit() {
        let mut chassis = weightless();
        for i in 0..2_000 {
            let limit = 0.05 + i as f32 * 0.0012;
            let governor = StabilityGovernor::new(StabilityConfig {
                max_tip_angle: limit,
                ..config()
            });

            chassis.set_rotation(-(limit + 0.2));
            chassis.set_angvel(-3.0);
            governor.enforce_limit(&mut chassis);

            assert!(chassis.rotation().abs() <= limit, "limit {limit}: {}", chassis.rotation());
            assert!(chassis.rotation() < 0.0);
            assert_eq!(chassis.angvel(), 0.0);
            assert!(!governor.enforce_limit(&mut chassis));
        }
    }
}
