//! tank_treads - planar multi-wheel tank locomotion on rapier2d
//!
//! A [`TreadSystem`] owns a [`Chassis`] and its wheels and runs suspension,
//! traction, drivetrain and stability solvers once per fixed physics tick.
//! Ground is supplied through [`GroundContactProvider`].

pub mod chassis;
pub mod config;
pub mod curve;
pub mod error;
pub mod ground;
pub mod telemetry;
pub mod tread_system;
pub mod treads;
pub mod wheel;

pub use chassis::{Chassis, ChassisConfig};
pub use config::TankConfig;
pub use curve::ResponseCurve;
pub use error::{TreadError, TreadResult};
pub use ground::{FlatGround, GroundContact, GroundContactProvider, Terrain};
pub use telemetry::{TreadTelemetry, WheelTelemetry};
pub use tread_system::{TreadState, TreadSystem};
pub use treads::{
    Drivetrain, DrivetrainConfig, GearState, MassConfig, MassModel, MassSnapshot,
    StabilityConfig, StabilityGovernor, StructureProvider, SuspensionTuning, TipCorrection,
};
pub use wheel::{Wheel, WheelConfig};
