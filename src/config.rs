// ==============================================================================
// config.rs - TANK TUNING (PRESETS + TOML)
// ------------------------------------------------------------------------------
// One TankConfig per vehicle type. Every section has serde defaults, so a TOML
// file only needs to list what it changes plus the wheel set:
//
//   [chassis]        base mass, hull box, spawn pose, gravity
//   [[wheels]]       one table per wheel, front to back or any order
//   [suspension]     stickiness + ground tolerance shared by all wheels
//   [drivetrain]     gears, top speed, throttle smoothing
//   [stability]      tip limits, drag, extra (non-traction) wheel count
//   [mass]           cell weight, centre-of-mass envelope
// ==============================================================================

use std::f32::consts::PI;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::chassis::ChassisConfig;
use crate::error::{TreadError, TreadResult};
use crate::treads::{DrivetrainConfig, MassConfig, StabilityConfig, SuspensionTuning};
use crate::wheel::WheelConfig;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TankConfig {
    #[serde(default)]
    pub chassis: ChassisConfig,
    #[serde(default)]
    pub wheels: Vec<WheelConfig>,
    #[serde(default)]
    pub suspension: SuspensionTuning,
    #[serde(default)]
    pub drivetrain: DrivetrainConfig,
    #[serde(default)]
    pub stability: StabilityConfig,
    #[serde(default)]
    pub mass: MassConfig,
}

fn check(ok: bool, msg: impl FnOnce() -> String) -> TreadResult<()> {
    if ok { Ok(()) } else { Err(TreadError::InvalidConfig(msg())) }
}

impl TankConfig {
    /// Six sprung road wheels plus raised front/rear idlers. The idlers only
    /// carry the hull over obstacles and do not count toward traction.
    pub fn heavy() -> Self {
        let mut wheels: Vec<WheelConfig> = (0..6)
            .map(|i| {
                let x = -2.5 + i as f32;
                WheelConfig::new([x, -0.9], 0.45, 0.6, 8_000.0, 2_000.0)
            })
            .collect();

        for x in [-3.1, 3.1] {
            wheels.push(WheelConfig::new([x, -0.5], 0.35, 0.4, 4_000.0, 800.0).with_non_stick(true));
        }

        Self {
            chassis: ChassisConfig {
                base_mass: 2_400.0,
                half_extents: [3.2, 0.8],
                ..ChassisConfig::default()
            },
            wheels,
            suspension: SuspensionTuning::default(),
            drivetrain: DrivetrainConfig {
                gear_positions: 5,
                max_speed: 12.0,
                max_acceleration: 0.5,
                acceleration_damping: 0.1,
            },
            stability: StabilityConfig {
                extra_wheels: 2,
                ..StabilityConfig::default()
            },
            mass: MassConfig::default(),
        }
    }

    /// Four-wheel scout: lighter, quicker, less tip authority.
    pub fn light() -> Self {
        let wheels = [[-1.3, -0.6], [-0.45, -0.6], [0.45, -0.6], [1.3, -0.6]]
            .into_iter()
            .map(|offset| WheelConfig::new(offset, 0.35, 0.45, 3_500.0, 700.0))
            .collect();

        Self {
            chassis: ChassisConfig {
                base_mass: 800.0,
                half_extents: [1.8, 0.5],
                spawn_position: [0.0, 2.0],
                center_of_mass: [0.0, -0.1],
                ..ChassisConfig::default()
            },
            wheels,
            suspension: SuspensionTuning {
                stickiness: 300.0,
                ..SuspensionTuning::default()
            },
            drivetrain: DrivetrainConfig {
                gear_positions: 7,
                max_speed: 16.0,
                max_acceleration: 0.8,
                acceleration_damping: 0.2,
            },
            stability: StabilityConfig {
                max_tip_angle: 0.5,
                buffer_zone: 0.12,
                tip_prevention_force: 12_000.0,
                base_air_drag_force: 200.0,
                max_angular_drag: 3.0,
                extra_wheels: 0,
            },
            mass: MassConfig {
                unit_weight: 25.0,
                com_envelope: [0.6, 0.2],
                apply_center_of_mass: true,
            },
        }
    }

    pub fn from_toml_str(text: &str) -> TreadResult<Self> {
        let config: TankConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> TreadResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| TreadError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_toml_str(&text)?;
        tracing::info!(path = %path.display(), wheels = config.wheels.len(), "tank config loaded");
        Ok(config)
    }

    /// Reject configs the simulation cannot run sensibly.
    pub fn validate(&self) -> TreadResult<()> {
        if self.wheels.is_empty() {
            return Err(TreadError::NoWheels);
        }

        let extra = self.stability.extra_wheels;
        if extra >= self.wheels.len() {
            return Err(TreadError::TooManyExtraWheels {
                extra,
                wheels: self.wheels.len(),
            });
        }

        for (index, wheel) in self.wheels.iter().enumerate() {
            let reason = if !(wheel.offset[0].is_finite() && wheel.offset[1].is_finite()) {
                Some("offset must be finite")
            } else if !(wheel.radius > 0.0 && wheel.radius.is_finite()) {
                Some("radius must be > 0")
            } else if !(wheel.rest_length > 0.0 && wheel.rest_length.is_finite()) {
                Some("rest_length must be > 0")
            } else if !(wheel.stiffness >= 0.0 && wheel.stiffness.is_finite()) {
                Some("stiffness must be >= 0")
            } else if !(wheel.damper >= 0.0 && wheel.damper.is_finite()) {
                Some("damper must be >= 0")
            } else {
                None
            };

            if let Some(reason) = reason {
                return Err(TreadError::InvalidWheel {
                    index,
                    reason: reason.to_string(),
                });
            }
        }

        let c = &self.chassis;
        check(c.base_mass > 0.0 && c.base_mass.is_finite(), || {
            format!("chassis.base_mass must be > 0, got {}", c.base_mass)
        })?;
        check(c.half_extents.iter().all(|h| *h > 0.0 && h.is_finite()), || {
            format!("chassis.half_extents must be > 0, got {:?}", c.half_extents)
        })?;

        let d = &self.drivetrain;
        check(d.gear_positions >= 1, || "drivetrain.gear_positions must be >= 1".into())?;
        check(d.max_speed >= 0.0 && d.max_speed.is_finite(), || {
            format!("drivetrain.max_speed must be >= 0, got {}", d.max_speed)
        })?;
        check(d.max_acceleration >= 0.0, || {
            format!("drivetrain.max_acceleration must be >= 0, got {}", d.max_acceleration)
        })?;
        check((0.0..=1.0).contains(&d.acceleration_damping), || {
            format!("drivetrain.acceleration_damping must be in [0, 1], got {}", d.acceleration_damping)
        })?;
        if d.gear_positions % 2 == 0 {
            tracing::warn!(gear_positions = d.gear_positions, "even gear count has no neutral");
        }

        let s = &self.stability;
        check(s.max_tip_angle > 0.0 && s.max_tip_angle < PI, || {
            format!("stability.max_tip_angle must be in (0, pi), got {}", s.max_tip_angle)
        })?;
        check(s.buffer_zone >= 0.0 && s.buffer_zone <= s.max_tip_angle, || {
            format!("stability.buffer_zone must be in [0, max_tip_angle], got {}", s.buffer_zone)
        })?;
        check(s.tip_prevention_force >= 0.0 && s.max_angular_drag >= 0.0, || {
            "stability forces must be >= 0".into()
        })?;

        check(self.suspension.stickiness >= 0.0, || "suspension.stickiness must be >= 0".into())?;
        check(self.mass.unit_weight >= 0.0, || "mass.unit_weight must be >= 0".into())?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_validate() {
        TankConfig::heavy().validate().unwrap();
        TankConfig::light().validate().unwrap();
        assert_eq!(TankConfig::heavy().wheels.len(), 8);
    }

    #[test]
    fn default_config_has_no_wheels() {
        assert!(matches!(TankConfig::default().validate(), Err(TreadError::NoWheels)));
    }

    #[test]
    fn all_extra_wheels_is_rejected() {
        let mut cfg = TankConfig::light();
        cfg.stability.extra_wheels = 4;
        assert!(matches!(
            cfg.validate(),
            Err(TreadError::TooManyExtraWheels { extra: 4, wheels: 4 })
        ));
    }

    #[test]
    fn bad_wheel_reports_its_index() {
        let mut cfg = TankConfig::light();
        cfg.wheels[2].rest_length = 0.0;
        match cfg.validate() {
            Err(TreadError::InvalidWheel { index, .. }) => assert_eq!(index, 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn buffer_wider_than_limit_is_rejected() {
        let mut cfg = TankConfig::heavy();
        cfg.stability.buffer_zone = 1.0;
        assert!(matches!(cfg.validate(), Err(TreadError::InvalidConfig(_))));
    }

    #[test]
    fn toml_fills_defaults() {
        let text = r#"
            [chassis]
            base_mass = 1500.0

            [[wheels]]
            offset = [-1.0, -0.7]
            radius = 0.4
            rest_length = 0.5
            stiffness = 5000.0
            damper = 900.0

            [[wheels]]
            offset = [1.0, -0.7]
            radius = 0.4
            rest_length = 0.5
            stiffness = 5000.0
            damper = 900.0
            stiffness_curve = [[0.0, 0.0], [0.5, 0.3], [1.0, 1.0]]

            [drivetrain]
            max_speed = 9.0
        "#;
        let cfg = TankConfig::from_toml_str(text).unwrap();

        assert_eq!(cfg.chassis.base_mass, 1500.0);
        assert_eq!(cfg.chassis.half_extents, ChassisConfig::default().half_extents);
        assert_eq!(cfg.wheels.len(), 2);
        assert_eq!(cfg.wheels[1].stiffness_curve.keys().len(), 3);
        assert_eq!(cfg.drivetrain.max_speed, 9.0);
        assert_eq!(cfg.drivetrain.gear_positions, 5);
    }

    #[test]
    fn unsorted_curve_fails_to_parse() {
        let text = r#"
            [[wheels]]
            offset = [0.0, -0.7]
            radius = 0.4
            rest_length = 0.5
            stiffness = 5000.0
            damper = 900.0
            stiffness_curve = [[1.0, 1.0], [0.0, 0.0]]
        "#;
        assert!(matches!(TankConfig::from_toml_str(text), Err(TreadError::ConfigParse(_))));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = TankConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, TreadError::ConfigRead { .. }));
    }

    #[test]
    fn shipped_heavy_config_loads() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/configs/heavy_tank.toml");
        let cfg = TankConfig::load(path).unwrap();
        let preset = TankConfig::heavy();

        assert_eq!(cfg.wheels.len(), preset.wheels.len());
        assert_eq!(cfg.stability.extra_wheels, 2);
        assert_eq!(cfg.drivetrain.gear_positions, preset.drivetrain.gear_positions);
        assert_eq!(cfg.wheels.iter().filter(|w| w.non_stick).count(), 2);
    }
}
