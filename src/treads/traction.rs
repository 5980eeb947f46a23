// ==============================================================================
// traction.rs - CHASSIS ACCELERATION -> PER-WHEEL DRIVE FORCES
// ------------------------------------------------------------------------------
// 1) ideal_accel = (target_velocity - current_velocity) / dt
// 2) scale by min(grounded / drive_wheels, 1), drive_wheels = total - extra
//    Few wheels on the ground means little shove: no launches off a crest,
//    no wheelies from a single rear wheel.
// 3) per grounded wheel:
//      dir   = tangent of the contact normal (along the slope, chassis-forward)
//      accel = (scaled_ideal . dir) * dir / drive_wheels
//      force = accel * chassis_mass, applied at the contact point
//
// Projecting onto each contact's own slope is what lets the tank climb: only
// the component a tread can actually push along is applied.
// ==============================================================================

use rapier2d::prelude::*;

use crate::wheel::Wheel;

/// Drive force for one grounded wheel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TractionForce {
    pub wheel: usize,
    pub point: Point<Real>,
    pub force: Vector<Real>,
}

/// Wheels that count toward traction scaling. Never zero.
pub fn drive_wheel_count(total_wheels: usize, extra_wheels: usize) -> usize {
    total_wheels.saturating_sub(extra_wheels).max(1)
}

/// Grounded count as used by traction: capped at the drive wheel count.
pub fn effective_grounded(grounded: usize, total_wheels: usize, extra_wheels: usize) -> usize {
    grounded.min(drive_wheel_count(total_wheels, extra_wheels))
}

pub fn traction_scale(grounded: usize, total_wheels: usize, extra_wheels: usize) -> f32 {
    let drive = drive_wheel_count(total_wheels, extra_wheels);
    let grounded = effective_grounded(grounded, total_wheels, extra_wheels);
    (grounded as f32 / drive as f32).min(1.0)
}

pub fn ideal_acceleration(
    target_velocity: Vector<Real>,
    current_velocity: Vector<Real>,
    dt: f32,
) -> Vector<Real> {
    if !(dt > 0.0 && dt.is_finite()) {
        return Vector::zeros();
    }
    (target_velocity - current_velocity) / dt
}

/// Unit direction along the ground at a contact, facing +X for a level
/// surface (normal rotated a quarter turn clockwise).
pub fn traction_direction(normal: Vector<Real>) -> Vector<Real> {
    vector![normal.y, -normal.x]
}

pub fn solve_traction(
    wheels: &[Wheel],
    target_velocity: Vector<Real>,
    current_velocity: Vector<Real>,
    chassis_mass: f32,
    extra_wheels: usize,
    dt: f32,
) -> Vec<TractionForce> {
    let grounded = wheels.iter().filter(|w| w.grounded).count();
    if grounded == 0 {
        return Vec::new();
    }

    let ideal = ideal_acceleration(target_velocity, current_velocity, dt);
    if ideal.norm_squared() == 0.0 {
        return Vec::new();
    }

    let drive = drive_wheel_count(wheels.len(), extra_wheels) as f32;
    let scaled = ideal * traction_scale(grounded, wheels.len(), extra_wheels);

    wheels
        .iter()
        .enumerate()
        .filter_map(|(index, wheel)| {
            let contact = wheel.contact()?;
            let dir = traction_direction(contact.normal);
            let accel = dir * (scaled.dot(&dir) / drive);

            Some(TractionForce {
                wheel: index,
                point: contact.point,
                force: accel * chassis_mass,
            })
        })
        .collect()
}
