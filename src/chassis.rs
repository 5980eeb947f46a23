// ==============================================================================
// chassis.rs - PLANAR CHASSIS RIGID BODY (rapier2d)
// ------------------------------------------------------------------------------
// The chassis is one dynamic rapier2d body living in its own private world.
// It has no collider: wheels carry it through suspension forces only, the same
// way a raycast vehicle rides on its suspension rays.
//
// Per tick the tread system:
// 1) reset_forces()            rapier user forces persist until cleared
// 2) add_force_at_point() / add_torque()
// 3) integrate(dt)             one pipeline step + exploding-body guard
//
// Frame convention: +Y up, +X forward at rotation 0, counter-clockwise
// rotation is positive.
// ==============================================================================

use rapier2d::prelude::*;
use serde::{Deserialize, Serialize};

/// Beyond this distance from the origin the chassis is considered exploded.
const MAX_TRAVEL: Real = 100_000.0;

/// atan2 read-back of a stored angle is off by a few ulps at most.
const MAX_ROTATION_NUDGES: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChassisConfig {
    pub base_mass: f32,              // kg, empty hull
    pub half_extents: [f32; 2],      // [hx, hy] meters, used for inertia
    pub spawn_position: [f32; 2],    // world meters
    pub spawn_rotation: f32,         // radians
    pub center_of_mass: [f32; 2],    // local offset before any structure is added
    pub linear_damping: f32,
    pub gravity: [f32; 2],           // m/s^2
}

impl Default for ChassisConfig {
    fn default() -> Self {
        Self {
            base_mass: 2_000.0,
            half_extents: [3.0, 0.8],
            spawn_position: [0.0, 3.0],
            spawn_rotation: 0.0,
            center_of_mass: [0.0, -0.2],
            linear_damping: 0.1,
            gravity: [0.0, -9.81],
        }
    }
}

pub struct Chassis {
    gravity: Vector<Real>,
    pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd: CCDSolver,
    handle: RigidBodyHandle,

    half_extents: Vector<Real>,
    spawn: Isometry<Real>,
    mass: Real,
    local_com: Vector<Real>,
}

/// Box inertia about the centre of mass.
fn box_inertia(mass: Real, half_extents: Vector<Real>) -> Real {
    let w = half_extents.x * 2.0;
    let h = half_extents.y * 2.0;
    (mass * (w * w + h * h) / 12.0).max(1e-3)
}

impl Chassis {
    pub fn from_config(config: &ChassisConfig) -> Self {
        let [px, py] = config.spawn_position;
        let [hx, hy] = config.half_extents;
        let [cx, cy] = config.center_of_mass;
        let half_extents = vector![hx.abs(), hy.abs()];
        let local_com = vector![cx, cy];
        let mass = config.base_mass.max(1e-3);

        let props = MassProperties::new(Point::from(local_com), mass, box_inertia(mass, half_extents));

        let rb = RigidBodyBuilder::dynamic()
            .translation(vector![px, py])
            .rotation(config.spawn_rotation)
            .linear_damping(config.linear_damping)
            .additional_mass_properties(props)
            .can_sleep(false)
            .build();

        let mut bodies = RigidBodySet::new();
        let handle = bodies.insert(rb);

        tracing::debug!(mass, x = px, y = py, "chassis body created");

        Self {
            gravity: vector![config.gravity[0], config.gravity[1]],
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies,
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            handle,
            half_extents,
            spawn: Isometry::new(vector![px, py], config.spawn_rotation),
            mass,
            local_com,
        }
    }

    #[inline]
    fn body(&self) -> &RigidBody {
        &self.bodies[self.handle]
    }

    #[inline]
    fn body_mut(&mut self) -> &mut RigidBody {
        &mut self.bodies[self.handle]
    }

    // --------------------------------------------------
    // Read side
    // --------------------------------------------------

    pub fn pose(&self) -> Isometry<Real> {
        *self.body().position()
    }

    pub fn position(&self) -> Point<Real> {
        Point::from(*self.body().translation())
    }

    /// Signed rotation in radians, (-pi, pi].
    pub fn rotation(&self) -> Real {
        self.body().rotation().angle()
    }

    pub fn forward(&self) -> Vector<Real> {
        *self.body().rotation() * vector![1.0, 0.0]
    }

    pub fn up(&self) -> Vector<Real> {
        *self.body().rotation() * vector![0.0, 1.0]
    }

    pub fn linvel(&self) -> Vector<Real> {
        *self.body().linvel()
    }

    pub fn angvel(&self) -> Real {
        self.body().angvel()
    }

    pub fn speed(&self) -> Real {
        self.body().linvel().norm()
    }

    /// Mass as last configured; rapier only folds changes in on the next step.
    pub fn mass(&self) -> Real {
        self.mass
    }

    /// Centre-of-mass offset in chassis space.
    pub fn local_center_of_mass(&self) -> Vector<Real> {
        self.local_com
    }

    pub fn angular_drag(&self) -> Real {
        self.body().angular_damping()
    }

    // --------------------------------------------------
    // Write side
    // --------------------------------------------------

    pub fn reset_forces(&mut self) {
        let body = self.body_mut();
        body.reset_forces(true);
        body.reset_torques(true);
    }

    pub fn add_force_at_point(&mut self, force: Vector<Real>, point: Point<Real>) {
        if !(force.x.is_finite() && force.y.is_finite()) {
            tracing::warn!(?force, "dropping non-finite chassis force");
            return;
        }
        self.body_mut().add_force_at_point(force, point, true);
    }

    pub fn add_torque(&mut self, torque: Real) {
        if !torque.is_finite() {
            tracing::warn!(torque, "dropping non-finite chassis torque");
            return;
        }
        self.body_mut().add_torque(torque, true);
    }

    pub fn set_angular_drag(&mut self, drag: Real) {
        self.body_mut().set_angular_damping(drag.max(0.0));
    }

    pub fn set_rotation(&mut self, angle: Real) {
        let translation = *self.body().translation();
        self.body_mut()
            .set_position(Isometry::new(translation, angle), true);
    }

    /// Set the rotation to `angle` held inside `±bound`, stepping the
    /// magnitude toward zero one ulp at a time until the angle read back
    /// from the stored unit complex is within the bound as well.
    pub fn set_rotation_within(&mut self, angle: Real, bound: Real) {
        let bound = bound.abs();
        let sign = if angle < 0.0 { -1.0 } else { 1.0 };
        let mut magnitude = angle.abs().min(bound);

        self.set_rotation(sign * magnitude);
        for _ in 0..MAX_ROTATION_NUDGES {
            if self.rotation().abs() <= bound || magnitude <= 0.0 {
                return;
            }
            magnitude = Real::from_bits(magnitude.to_bits() - 1);
            self.set_rotation(sign * magnitude);
        }
        tracing::warn!(angle, bound, rotation = self.rotation(), "rotation clamp did not settle");
    }

    pub fn set_angvel(&mut self, angvel: Real) {
        self.body_mut().set_angvel(angvel, true);
    }

    pub fn set_linvel(&mut self, linvel: Vector<Real>) {
        self.body_mut().set_linvel(linvel, true);
    }

    /// Replace mass and centre of mass. Inertia follows the hull box.
    pub fn set_mass_properties(&mut self, mass: Real, local_com: Vector<Real>) {
        let mass = mass.max(1e-3);
        let inertia = box_inertia(mass, self.half_extents);
        let props = MassProperties::new(Point::from(local_com), mass, inertia);

        self.body_mut().set_additional_mass_properties(props, true);
        self.mass = mass;
        self.local_com = local_com;
    }

    /// Advance the chassis by one fixed step.
    pub fn integrate(&mut self, dt: Real) {
        let params = IntegrationParameters {
            dt,
            ..IntegrationParameters::default()
        };

        self.pipeline.step(
            &self.gravity,
            &params,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            None,
            &(),
            &(),
        );

        // Safety: keep a blown-up chassis from poisoning every later tick
        let pos = *self.body().translation();
        let angle = self.rotation();
        let bad = !pos.x.is_finite()
            || !pos.y.is_finite()
            || !angle.is_finite()
            || pos.x.abs() > MAX_TRAVEL
            || pos.y.abs() > MAX_TRAVEL;

        if bad {
            let spawn = self.spawn;
            let body = self.body_mut();
            body.set_position(spawn, true);
            body.set_linvel(vector![0.0, 0.0], true);
            body.set_angvel(0.0, true);
            tracing::warn!(?pos, "chassis state exploded; reset to spawn");
        }
    }
}
