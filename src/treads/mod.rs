//! treads - per-tick locomotion solvers (suspension, traction, drivetrain,
//! stability) and the on-demand mass model

pub mod suspension;
pub mod traction;
pub mod drivetrain;
pub mod stability;
pub mod mass;

pub use suspension::{SuspensionForces, SuspensionTuning};
pub use traction::TractionForce;
pub use drivetrain::{Drivetrain, DrivetrainConfig, GearState};
pub use stability::{StabilityConfig, StabilityGovernor, TipCorrection};
pub use mass::{MassConfig, MassModel, MassSnapshot, StructureProvider};
