// ==============================================================================
// suspension.rs - GROUND QUERY + SPRING/DAMPER + STICKINESS
// ------------------------------------------------------------------------------
// Two passes per wheel per fixed tick:
//
// sense_ground(...)
// - Queries the ground provider at the wheel anchor with
//     reach = radius + rest_length + ground_tolerance
// - compression  = clamp(1 - (distance - radius) / rest_length, 0, 1)
// - spring_speed = (compression - previous) / dt   (0 while airborne)
//
// solve_suspension(...)
// - support = (stiffness_curve(c) * stiffness + damper * spring_speed) * up
// - stick   = -normal * stickiness * (-spring_speed) * (1 - c) * stick_curve(c)
//   only while decompressing (spring_speed < 0) and not flagged non_stick.
//   Keeps wheels cresting a bump from visibly hopping off the ground.
//
// Airborne wheels produce nothing.
// ==============================================================================

use rapier2d::prelude::*;
use serde::{Deserialize, Serialize};

use crate::curve::ResponseCurve;
use crate::ground::GroundContactProvider;
use crate::wheel::{Wheel, WheelConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuspensionTuning {
    pub stickiness: f32,             // N per unit of decompression speed
    pub stick_curve: ResponseCurve,  // compression -> stick scale
    pub ground_tolerance: f32,       // m of extra reach past full extension
}

impl Default for SuspensionTuning {
    fn default() -> Self {
        Self {
            stickiness: 800.0,
            stick_curve: ResponseCurve::linear(1.0, 0.25),
            ground_tolerance: 0.05,
        }
    }
}

/// Forces one grounded wheel puts on the chassis this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuspensionForces {
    pub support: Vector<Real>, // along chassis up, at the anchor
    pub stick: Vector<Real>,   // along -contact normal, at the anchor
}

pub fn ground_reach(wheel: &WheelConfig, tuning: &SuspensionTuning) -> f32 {
    wheel.radius + wheel.rest_length + tuning.ground_tolerance.max(0.0)
}

/// Normalized compression from anchor-to-ground distance.
pub fn compression_at(distance: f32, radius: f32, rest_length: f32) -> f32 {
    let travel = (distance - radius) / rest_length.max(f32::EPSILON);
    (1.0 - travel).clamp(0.0, 1.0)
}

/// Spring + damper magnitude along chassis up.
pub fn suspension_magnitude(wheel: &WheelConfig, compression: f32, spring_speed: f32) -> f32 {
    let spring = wheel.stiffness_curve.evaluate(compression) * wheel.stiffness;
    let drag = wheel.damper * spring_speed;
    spring + drag
}

/// Anti-bounce magnitude; zero unless the wheel is leaving the ground.
pub fn stick_magnitude(
    tuning: &SuspensionTuning,
    non_stick: bool,
    compression: f32,
    spring_speed: f32,
) -> f32 {
    if non_stick || spring_speed >= 0.0 {
        return 0.0;
    }
    let compression = compression.clamp(0.0, 1.0);
    let m = tuning.stickiness
        * (-spring_speed)
        * (1.0 - compression)
        * tuning.stick_curve.evaluate(compression);
    m.max(0.0)
}

/// Refresh a wheel's ground contact and suspension state.
pub fn sense_ground<G: GroundContactProvider + ?Sized>(
    wheel: &mut Wheel,
    anchor: Point<Real>,
    ground: &G,
    tuning: &SuspensionTuning,
    dt: f32,
) {
    let reach = ground_reach(&wheel.config, tuning);
    let previous = wheel.compression;

    match ground.query_ground(anchor, reach) {
        Some(contact) => {
            let distance = (anchor - contact.point).norm();
            let compression =
                compression_at(distance, wheel.config.radius, wheel.config.rest_length);

            wheel.spring_speed = if dt > 0.0 { (compression - previous) / dt } else { 0.0 };
            wheel.compression = compression;
            wheel.grounded = true;
            wheel.last_contact = Some(contact);
        }
        None => {
            wheel.compression = 0.0;
            wheel.spring_speed = 0.0;
            wheel.grounded = false;
        }
    }
}

pub fn solve_suspension(
    wheel: &Wheel,
    chassis_up: Vector<Real>,
    tuning: &SuspensionTuning,
) -> Option<SuspensionForces> {
    let contact = wheel.contact()?;

    let support = chassis_up
        * suspension_magnitude(&wheel.config, wheel.compression, wheel.spring_speed);

    let stick = -contact.normal
        * stick_magnitude(tuning, wheel.config.non_stick, wheel.compression, wheel.spring_speed);

    Some(SuspensionForces { support, stick })
}
