// ==============================================================================
// drivetrain.rs - GEARS -> SMOOTHED THROTTLE -> TARGET VELOCITY
// ------------------------------------------------------------------------------
// Gear selection is immediate; all smoothing happens on the throttle.
//
//   target   = gear / max_gear                          (normalized to [-1, 1])
//   target   = lerp(throttle, target, acceleration_damping)
//   throttle = move_towards(throttle, target, max_acceleration * dt)
//
// The lerp softens the step a gear change introduces, the rate limit caps how
// fast the throttle may move per tick. Together they give the heavy, eased
// spool-up / spool-down a tank should have.
//
//   target_velocity = chassis_forward * max_speed * throttle
// ==============================================================================

use rapier2d::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrivetrainConfig {
    pub gear_positions: u32,       // odd counts give a neutral gear
    pub max_speed: f32,            // m/s at full throttle
    pub max_acceleration: f32,     // throttle units per second
    pub acceleration_damping: f32, // 0..1 lerp factor per tick
}

impl Default for DrivetrainConfig {
    fn default() -> Self {
        Self {
            gear_positions: 5,
            max_speed: 12.0,
            max_acceleration: 0.5,
            acceleration_damping: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct GearState {
    pub gear: i32,
    pub throttle: f32,      // -1..1
    pub time_in_gear: f32,  // s
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    let delta = target - current;
    if delta.abs() <= max_delta {
        target
    } else {
        current + delta.signum() * max_delta
    }
}

#[derive(Debug, Clone)]
pub struct Drivetrain {
    config: DrivetrainConfig,
    state: GearState,
}

impl Drivetrain {
    pub fn new(config: DrivetrainConfig) -> Self {
        Self {
            config,
            state: GearState::default(),
        }
    }

    pub fn config(&self) -> &DrivetrainConfig {
        &self.config
    }

    pub fn gear_state(&self) -> GearState {
        self.state
    }

    pub fn gear(&self) -> i32 {
        self.state.gear
    }

    pub fn throttle(&self) -> f32 {
        self.state.throttle
    }

    /// Highest forward gear; reverse mirrors it.
    pub fn max_gear(&self) -> i32 {
        (self.config.gear_positions.saturating_sub(1) / 2) as i32
    }

    /// Select a gear immediately. Out-of-range requests are clamped; the
    /// applied gear is returned.
    pub fn change_gear(&mut self, target: i32) -> i32 {
        let max = self.max_gear();
        let gear = target.clamp(-max, max);
        if gear != target {
            tracing::warn!(requested = target, applied = gear, "gear request out of range");
        }

        self.state.gear = gear;
        self.state.time_in_gear = 0.0;
        gear
    }

    /// Normalized throttle the current gear asks for.
    pub fn gear_target(&self) -> f32 {
        let max = self.max_gear();
        if max == 0 {
            return 0.0;
        }
        (self.state.gear as f32 / max as f32).clamp(-1.0, 1.0)
    }

    /// Advance the throttle one fixed tick and return it.
    pub fn update(&mut self, dt: f32) -> f32 {
        let damping = self.config.acceleration_damping.clamp(0.0, 1.0);
        let max_step = self.config.max_acceleration.max(0.0) * dt.max(0.0);

        let current = self.state.throttle;
        let target = lerp(current, self.gear_target(), damping);
        let throttle = move_towards(current, target, max_step).clamp(-1.0, 1.0);

        self.state.throttle = throttle;
        self.state.time_in_gear += dt.max(0.0);
        throttle
    }

    pub fn target_velocity(&self, chassis_forward: Vector<Real>) -> Vector<Real> {
        chassis_forward * self.config.max_speed * self.state.throttle
    }
}
