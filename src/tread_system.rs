// ==============================================================================
// tread_system.rs - TANK LOCOMOTION ORCHESTRATOR
// ------------------------------------------------------------------------------
// Owns the chassis, the wheel array and every solver, and runs them in a fixed
// order once per physics tick:
//
// fixed_tick(dt)
// 1) reset chassis forces
// 2) Drivetrain      gear -> smoothed throttle
// 3) sense ground    ground query, compression, spring speed
// 4) suspension      support + stick force at each grounded anchor
// 5) traction        drive force at each grounded contact point
// 6) governor        air drag, angular drag, tip correction
// 7) integrate chassis
// 8) governor        post-step hard clamp of the tip angle
//
// tick(dt) is the render-rate side: it only advances wheel spin for treads.
//
// States: Uninitialized -> Active via initialize() (idempotent). Nothing is
// applied to the chassis while Uninitialized.
//
// Mass is recalculated out of band when the structure owner reports a change,
// between ticks, never during one.
// ==============================================================================

use std::f32::consts::TAU;

use rapier2d::prelude::*;

use crate::chassis::Chassis;
use crate::config::TankConfig;
use crate::error::TreadResult;
use crate::ground::GroundContactProvider;
use crate::telemetry::{TreadTelemetry, wheel_telemetry};
use crate::treads::suspension::{sense_ground, solve_suspension};
use crate::treads::traction::solve_traction;
use crate::treads::{
    Drivetrain, MassModel, MassSnapshot, StabilityGovernor, StructureProvider, TipCorrection,
};
use crate::wheel::Wheel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreadState {
    Uninitialized,
    Active,
}

pub struct TreadSystem<G: GroundContactProvider> {
    config: TankConfig,
    ground: G,
    chassis: Chassis,
    wheels: Vec<Wheel>,
    drivetrain: Drivetrain,
    governor: StabilityGovernor,
    mass_model: MassModel,

    state: TreadState,
    grounded: usize,
    last_tip: TipCorrection,
    last_mass: MassSnapshot,
    tick: u64,
}

impl<G: GroundContactProvider> TreadSystem<G> {
    pub fn new(config: TankConfig, ground: G, chassis: Chassis) -> Self {
        Self {
            drivetrain: Drivetrain::new(config.drivetrain.clone()),
            governor: StabilityGovernor::new(config.stability.clone()),
            mass_model: MassModel::new(config.mass.clone()),
            config,
            ground,
            chassis,
            wheels: Vec::new(),
            state: TreadState::Uninitialized,
            grounded: 0,
            last_tip: TipCorrection::Upright,
            last_mass: MassSnapshot::default(),
            tick: 0,
        }
    }

    /// Build the chassis from `config.chassis` as well.
    pub fn from_config(config: TankConfig, ground: G) -> Self {
        let chassis = Chassis::from_config(&config.chassis);
        Self::new(config, ground, chassis)
    }

    /// Validate the tank and build wheel state. Calling it again once active
    /// does nothing.
    pub fn initialize(&mut self) -> TreadResult<()> {
        if self.state == TreadState::Active {
            tracing::debug!("tread system already initialized");
            return Ok(());
        }

        if let Err(err) = self.config.validate() {
            tracing::error!(error = %err, "tread system failed to initialize");
            return Err(err);
        }

        self.wheels = self.config.wheels.iter().cloned().map(Wheel::new).collect();

        // structure reported before initialize still counts
        self.apply_mass(self.last_mass);

        self.state = TreadState::Active;
        tracing::info!(
            wheels = self.wheels.len(),
            extra = self.config.stability.extra_wheels,
            mass = self.chassis.mass(),
            "tread system initialized"
        );
        Ok(())
    }

    // --------------------------------------------------
    // Physics rate
    // --------------------------------------------------

    pub fn fixed_tick(&mut self, dt: f32) {
        if self.state != TreadState::Active {
            return;
        }
        if !(dt > 0.0 && dt.is_finite()) {
            tracing::warn!(dt, "ignoring fixed tick with invalid dt");
            return;
        }

        self.chassis.reset_forces();
        self.drivetrain.update(dt);

        // Ground query + suspension
        let pose = self.chassis.pose();
        let up = self.chassis.up();
        let tuning = &self.config.suspension;

        for wheel in self.wheels.iter_mut() {
            let anchor = wheel.anchor(&pose);
            sense_ground(wheel, anchor, &self.ground, tuning, dt);

            if let Some(forces) = solve_suspension(wheel, up, tuning) {
                self.chassis
                    .add_force_at_point(forces.support + forces.stick, anchor);
            }
        }
        self.grounded = self.wheels.iter().filter(|w| w.grounded).count();

        // Traction
        let target = self.drivetrain.target_velocity(self.chassis.forward());
        let drive = solve_traction(
            &self.wheels,
            target,
            self.chassis.linvel(),
            self.chassis.mass(),
            self.config.stability.extra_wheels,
            dt,
        );
        for f in &drive {
            self.chassis.add_force_at_point(f.force, f.point);
        }

        // Stability, integrate, hard clamp
        self.last_tip = self
            .governor
            .apply(&mut self.chassis, self.grounded, self.wheels.len(), dt);
        self.chassis.integrate(dt);
        self.governor.enforce_limit(&mut self.chassis);

        self.tick += 1;
        tracing::trace!(
            tick = self.tick,
            grounded = self.grounded,
            throttle = self.drivetrain.throttle(),
            rotation = self.chassis.rotation(),
            "fixed tick"
        );
    }

    // --------------------------------------------------
    // Render rate
    // --------------------------------------------------

    /// Roll each wheel by the distance the chassis covered along its forward
    /// axis.
    pub fn tick(&mut self, dt: f32) {
        if self.state != TreadState::Active || !(dt > 0.0 && dt.is_finite()) {
            return;
        }

        let forward_speed = self.chassis.linvel().dot(&self.chassis.forward());
        for wheel in self.wheels.iter_mut() {
            let radius = wheel.config.radius.max(f32::EPSILON);
            // clockwise roll when driving forward
            wheel.spin = (wheel.spin - forward_speed * dt / radius).rem_euclid(TAU);
        }
    }

    // --------------------------------------------------
    // Collaborator entry points
    // --------------------------------------------------

    /// Select a gear immediately; returns the gear actually applied.
    pub fn change_gear(&mut self, gear: i32) -> i32 {
        let applied = self.drivetrain.change_gear(gear);
        tracing::info!(gear = applied, "gear changed");
        applied
    }

    /// Recompute structural weight and push it into the chassis.
    pub fn recalculate_mass<S: StructureProvider + ?Sized>(&mut self, structure: &S) -> MassSnapshot {
        let snapshot = self.mass_model.recalculate(structure);
        let (mass, com) = self.apply_mass(snapshot);

        tracing::info!(
            cells = snapshot.cell_count,
            weight = snapshot.total_weight,
            mass,
            com_x = com.x,
            com_y = com.y,
            "mass recalculated"
        );
        snapshot
    }

    /// Hull plus structure into the chassis; returns the applied mass and
    /// local centre of mass.
    fn apply_mass(&mut self, snapshot: MassSnapshot) -> (Real, Vector<Real>) {
        let [cx, cy] = self.config.chassis.center_of_mass;
        let base_com = vector![cx, cy];
        let com = if self.mass_model.config().apply_center_of_mass {
            base_com + snapshot.center_offset()
        } else {
            base_com
        };
        let mass = self.config.chassis.base_mass + snapshot.total_weight;

        self.chassis.set_mass_properties(mass, com);
        self.last_mass = snapshot;
        (mass, com)
    }

    /// Structure owner hook: rooms or cargo were added or removed.
    pub fn notify_structure_changed<S: StructureProvider + ?Sized>(
        &mut self,
        structure: &S,
    ) -> MassSnapshot {
        tracing::debug!("structure changed");
        self.recalculate_mass(structure)
    }

    /// Chassis speed magnitude in m/s.
    pub fn speed(&self) -> f32 {
        self.chassis.speed()
    }

    // --------------------------------------------------
    // Accessors
    // --------------------------------------------------

    pub fn state(&self) -> TreadState {
        self.state
    }

    pub fn config(&self) -> &TankConfig {
        &self.config
    }

    pub fn ground(&self) -> &G {
        &self.ground
    }

    pub fn chassis(&self) -> &Chassis {
        &self.chassis
    }

    pub fn chassis_mut(&mut self) -> &mut Chassis {
        &mut self.chassis
    }

    pub fn wheels(&self) -> &[Wheel] {
        &self.wheels
    }

    pub fn drivetrain(&self) -> &Drivetrain {
        &self.drivetrain
    }

    pub fn grounded_count(&self) -> usize {
        self.grounded
    }

    pub fn last_tip_correction(&self) -> TipCorrection {
        self.last_tip
    }

    pub fn last_mass(&self) -> MassSnapshot {
        self.last_mass
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn telemetry(&self) -> TreadTelemetry {
        let pose = self.chassis.pose();
        let position = self.chassis.position();

        TreadTelemetry {
            tick: self.tick,
            gear: self.drivetrain.gear(),
            throttle: self.drivetrain.throttle(),
            speed: self.speed(),
            position: [position.x, position.y],
            rotation: self.chassis.rotation(),
            mass: self.chassis.mass(),
            grounded: self.grounded,
            tip: self.last_tip,
            structure: self.last_mass,
            wheels: wheel_telemetry(&self.wheels, &pose, self.chassis.up()),
        }
    }
}
