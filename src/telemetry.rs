// ==============================================================================
// telemetry.rs - READ-ONLY SNAPSHOTS FOR RENDERERS / UI / LOGS
// ------------------------------------------------------------------------------
// Defines serializable state captured after a tick:
// - TreadTelemetry: chassis pose, drivetrain, grounded count, tip state
// - WheelTelemetry: per-wheel render centre + suspension numbers
//
// Helpers:
// - wheel_telemetry(): builds WheelTelemetry for every wheel at a chassis pose
//
// Capturing a snapshot never mutates simulation state; tread renderers may do
// it at their own cadence.
// ==============================================================================

use rapier2d::prelude::*;
use serde::Serialize;

use crate::treads::{MassSnapshot, TipCorrection};
use crate::wheel::Wheel;

#[derive(Debug, Clone, Serialize)]
pub struct TreadTelemetry {
    pub tick: u64,
    pub gear: i32,
    pub throttle: f32,
    pub speed: f32,                 // m/s
    pub position: [f32; 2],
    pub rotation: f32,              // radians
    pub mass: f32,                  // kg, hull + structure
    pub grounded: usize,
    pub tip: TipCorrection,
    pub structure: MassSnapshot,
    pub wheels: Vec<WheelTelemetry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WheelTelemetry {
    pub index: usize,
    pub center: [f32; 2],           // world space
    pub radius: f32,
    pub grounded: bool,
    pub compression: f32,
    pub spring_speed: f32,
    pub spin: f32,                  // radians
}

pub fn wheel_telemetry(
    wheels: &[Wheel],
    pose: &Isometry<Real>,
    up: Vector<Real>,
) -> Vec<WheelTelemetry> {
    wheels
        .iter()
        .enumerate()
        .map(|(index, wheel)| {
            let center = wheel.center(pose, up);
            WheelTelemetry {
                index,
                center: [center.x, center.y],
                radius: wheel.config.radius,
                grounded: wheel.grounded,
                compression: wheel.compression,
                spring_speed: wheel.spring_speed,
                spin: wheel.spin,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wheel::WheelConfig;

    #[test]
    fn wheel_rows_follow_wheel_order() {
        let wheels = vec![
            Wheel::new(WheelConfig::new([-1.0, -0.5], 0.3, 0.4, 1_000.0, 100.0)),
            Wheel::new(WheelConfig::new([1.0, -0.5], 0.5, 0.4, 1_000.0, 100.0)),
        ];
        let pose = Isometry::new(vector![0.0, 2.0], 0.0);

        let rows = wheel_telemetry(&wheels, &pose, vector![0.0, 1.0]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].index, 1);
        assert_eq!(rows[1].radius, 0.5);
        assert!(!rows[0].grounded);
        assert!((rows[0].center[1] - 1.1).abs() < 1e-5);
    }

    #[test]
    fn serializes_tip_state_as_tagged_json() {
        let json = serde_json::to_value(TipCorrection::Buffer { torque: -2.0 }).unwrap();
        assert_eq!(json["state"], "buffer");
        assert_eq!(json["torque"], -2.0);
    }
}
