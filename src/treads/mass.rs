// ==============================================================================
// mass.rs - STRUCTURAL WEIGHT + CENTRE-OF-MASS PLACEMENT
// ------------------------------------------------------------------------------
// Recomputed on demand when rooms / cargo cells are added or removed, never
// per tick.
//
//   total_weight     = cell_count * unit_weight
//   average_position = mean of finite member positions (origin when none)
//   center_offset    = average_position clamped to +-com_envelope
//
// The tread system then sets
//   chassis mass = base_mass + total_weight
//   chassis com  = base com + center_offset   (only with apply_center_of_mass)
// ==============================================================================

use rapier2d::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MassConfig {
    pub unit_weight: f32,           // kg per structural cell
    pub com_envelope: [f32; 2],     // max |offset| along chassis x / y
    pub apply_center_of_mass: bool, // false = weight-only recalculation
}

impl Default for MassConfig {
    fn default() -> Self {
        Self {
            unit_weight: 50.0,
            com_envelope: [1.0, 0.3],
            apply_center_of_mass: true,
        }
    }
}

/// Anything that owns the tank's structural members (rooms, cargo cells).
pub trait StructureProvider {
    /// Chassis-local position of every member.
    fn member_positions(&self) -> Vec<Vector<Real>>;
}

impl StructureProvider for [Vector<Real>] {
    fn member_positions(&self) -> Vec<Vector<Real>> {
        self.to_vec()
    }
}

impl StructureProvider for Vec<Vector<Real>> {
    fn member_positions(&self) -> Vec<Vector<Real>> {
        self.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MassSnapshot {
    pub cell_count: usize,
    pub total_weight: f32,            // kg
    pub average_position: [f32; 2],   // chassis space, unclamped
    pub center_offset: [f32; 2],      // chassis space, clamped to the envelope
}

impl Default for MassSnapshot {
    fn default() -> Self {
        Self {
            cell_count: 0,
            total_weight: 0.0,
            average_position: [0.0, 0.0],
            center_offset: [0.0, 0.0],
        }
    }
}

impl MassSnapshot {
    pub fn center_offset(&self) -> Vector<Real> {
        vector![self.center_offset[0], self.center_offset[1]]
    }
}

#[derive(Debug, Clone)]
pub struct MassModel {
    config: MassConfig,
}

impl MassModel {
    pub fn new(config: MassConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MassConfig {
        &self.config
    }

    pub fn clamp_offset(&self, offset: Vector<Real>) -> Vector<Real> {
        let [w, h] = self.config.com_envelope;
        let (w, h) = (w.abs(), h.abs());
        vector![offset.x.clamp(-w, w), offset.y.clamp(-h, h)]
    }

    pub fn recalculate<S: StructureProvider + ?Sized>(&self, structure: &S) -> MassSnapshot {
        let members = structure.member_positions();
        let cell_count = members.len();
        if cell_count == 0 {
            return MassSnapshot::default();
        }

        // every member weighs in; only finite positions place the average
        let (sum, placed) = members
            .iter()
            .filter(|p| p.x.is_finite() && p.y.is_finite())
            .fold((Vector::<Real>::zeros(), 0usize), |(acc, n), p| (acc + p, n + 1));
        let average = if placed == 0 { Vector::zeros() } else { sum / placed as Real };
        let offset = self.clamp_offset(average);

        MassSnapshot {
            cell_count,
            total_weight: cell_count as f32 * self.config.unit_weight,
            average_position: [average.x, average.y],
            center_offset: [offset.x, offset.y],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_structure_is_weightless_at_origin() {
        let model = MassModel::new(MassConfig::default());
        let snap = model.recalculate(&Vec::<Vector<Real>>::new());

        assert_eq!(snap, MassSnapshot::default());
        assert!(snap.total_weight == 0.0);
        assert!(snap.average_position.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn weight_is_count_times_unit() {
        let model = MassModel::new(MassConfig { unit_weight: 75.0, ..MassConfig::default() });
        let cells: [Vector<Real>; 3] = [vector![0.0, 0.0], vector![0.5, 0.0], vector![-0.5, 0.0]];
        let snap = model.recalculate(&cells[..]);

        assert_eq!(snap.cell_count, 3);
        assert_eq!(snap.total_weight, 225.0);
        assert_eq!(snap.average_position, [0.0, 0.0]);
    }

    #[test]
    fn lopsided_build_is_clamped_to_envelope() {
        let model = MassModel::new(MassConfig {
            com_envelope: [1.0, 0.3],
            ..MassConfig::default()
        });
        let cells: Vec<Vector<Real>> = vec![vector![2.5, 1.0], vector![3.5, 1.0]];
        let snap = model.recalculate(&cells);

        assert_eq!(snap.average_position, [3.0, 1.0]);
        assert_eq!(snap.center_offset, [1.0, 0.3]);
    }

    #[test]
    fn non_finite_members_weigh_in_but_do_not_place_the_average() {
        let model = MassModel::new(MassConfig::default());
        let cells: Vec<Vector<Real>> = vec![vector![f32::NAN, 0.0], vector![0.2, 0.1]];
        let snap = model.recalculate(&cells);

        assert_eq!(snap.cell_count, 2);
        assert_eq!(snap.total_weight, 100.0);
        assert_eq!(snap.average_position, [0.2, 0.1]);
    }

    #[test]
    fn only_non_finite_members_average_at_origin() {
        let model = MassModel::new(MassConfig::default());
        let cells: Vec<Vector<Real>> = vec![vector![f32::INFINITY, 0.0], vector![0.0, f32::NAN]];
        let snap = model.recalculate(&cells);

        assert_eq!(snap.cell_count, 2);
        assert_eq!(snap.total_weight, 100.0);
        assert_eq!(snap.average_position, [0.0, 0.0]);
        assert_eq!(snap.center_offset, [0.0, 0.0]);
    }
}
