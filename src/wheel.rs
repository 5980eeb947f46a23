// ==============================================================================
// wheel.rs - ROAD WHEEL GEOMETRY + PER-WHEEL SUSPENSION STATE
// ------------------------------------------------------------------------------
// WheelConfig is static tuning (chassis-local mount, radius, spring, damper).
// Wheel is the runtime state the suspension solver updates every fixed tick:
//
//     compression   0 = fully extended, 1 = fully compressed
//     spring_speed  d(compression)/dt, > 0 while compressing
//     grounded      contact found within reach this tick
//     last_contact  most recent ground point + normal (kept while airborne)
//     spin          visual roll angle for tread rendering (radians)
// ==============================================================================

use rapier2d::prelude::*;
use serde::{Deserialize, Serialize};

use crate::curve::ResponseCurve;
use crate::ground::GroundContact;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelConfig {
    pub offset: [f32; 2],                 // mount point in chassis space
    pub radius: f32,                      // m
    pub rest_length: f32,                 // m of suspension travel
    pub stiffness: f32,                   // N at curve value 1.0
    #[serde(default = "default_stiffness_curve")]
    pub stiffness_curve: ResponseCurve,   // compression -> stiffness scale
    pub damper: f32,                      // N per unit of compression / s
    #[serde(default)]
    pub non_stick: bool,                  // skip the anti-bounce stick force
}

fn default_stiffness_curve() -> ResponseCurve {
    ResponseCurve::linear(0.0, 1.0)
}

impl WheelConfig {
    pub fn new(offset: [f32; 2], radius: f32, rest_length: f32, stiffness: f32, damper: f32) -> Self {
        Self {
            offset,
            radius,
            rest_length,
            stiffness,
            stiffness_curve: default_stiffness_curve(),
            damper,
            non_stick: false,
        }
    }

    pub fn with_non_stick(mut self, non_stick: bool) -> Self {
        self.non_stick = non_stick;
        self
    }

    pub fn local_anchor(&self) -> Point<Real> {
        point![self.offset[0], self.offset[1]]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Wheel {
    pub config: WheelConfig,
    pub compression: f32,
    pub spring_speed: f32,
    pub grounded: bool,
    pub last_contact: Option<GroundContact>,
    pub spin: f32,
}

impl Wheel {
    pub fn new(config: WheelConfig) -> Self {
        Self {
            config,
            compression: 0.0,
            spring_speed: 0.0,
            grounded: false,
            last_contact: None,
            spin: 0.0,
        }
    }

    /// World-space mount point.
    pub fn anchor(&self, pose: &Isometry<Real>) -> Point<Real> {
        pose * self.config.local_anchor()
    }

    /// Contact for this tick, `None` while airborne.
    pub fn contact(&self) -> Option<&GroundContact> {
        if self.grounded { self.last_contact.as_ref() } else { None }
    }

    /// Hub centre for rendering.
    ///
    /// Grounded wheels sit on the contact point; airborne wheels hang at full
    /// extension below their mount.
    pub fn center(&self, pose: &Isometry<Real>, up: Vector<Real>) -> Point<Real> {
        let anchor = self.anchor(pose);
        match self.contact() {
            Some(contact) => {
                let on_ground = contact.point + contact.normal * self.config.radius;
                // never render above the mount
                if (on_ground - anchor).dot(&up) > 0.0 { anchor } else { on_ground }
            }
            None => anchor - up * self.config.rest_length,
        }
    }
}
