// ==============================================================================
// ground.rs - GROUND CONTACT PROVIDERS
// ------------------------------------------------------------------------------
// The tread core only ever asks one question of the world:
//
//     query_ground(position, radius) -> Option<GroundContact>
//
// "Is there ground within `radius` of this wheel anchor, and if so where is the
// closest point and which way does the surface face?"
//
// Providers:
// - FlatGround: analytic horizontal plane (tests, trivial hosts)
// - Terrain:    rapier2d polyline colliders + QueryPipeline point projection
//
// Normals are unit length and never point downward. A wheel anchor that sinks
// below a polyline still gets an upward normal.
// ==============================================================================

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rapier2d::prelude::*;

use crate::error::{TreadError, TreadResult};

/// Closest ground point and outward surface normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundContact {
    pub point: Point<Real>,
    pub normal: Vector<Real>,
}

pub trait GroundContactProvider {
    /// `None` means no ground within `radius` of `position`.
    fn query_ground(&self, position: Point<Real>, radius: Real) -> Option<GroundContact>;
}

impl<G: GroundContactProvider + ?Sized> GroundContactProvider for &G {
    fn query_ground(&self, position: Point<Real>, radius: Real) -> Option<GroundContact> {
        (**self).query_ground(position, radius)
    }
}

impl<G: GroundContactProvider + ?Sized> GroundContactProvider for Box<G> {
    fn query_ground(&self, position: Point<Real>, radius: Real) -> Option<GroundContact> {
        (**self).query_ground(position, radius)
    }
}

/// Infinite horizontal ground at `height`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatGround {
    pub height: Real,
}

impl FlatGround {
    pub fn new(height: Real) -> Self {
        Self { height }
    }
}

impl GroundContactProvider for FlatGround {
    fn query_ground(&self, position: Point<Real>, radius: Real) -> Option<GroundContact> {
        if position.y - self.height > radius {
            return None;
        }
        Some(GroundContact {
            point: point![position.x, self.height],
            normal: vector![0.0, 1.0],
        })
    }
}

/// Static terrain made of polyline colliders.
pub struct Terrain {
    bodies: RigidBodySet,
    colliders: ColliderSet,
    query_pipeline: QueryPipeline,
}

impl Terrain {
    /// Horizontal strip from `-half_width` to `half_width` at `height`.
    pub fn flat(height: Real, half_width: Real) -> Self {
        let profile = vec![point![-half_width, height], point![half_width, height]];
        Self::build(profile)
    }

    /// Ground following `points` left to right.
    pub fn from_profile(points: Vec<Point<Real>>) -> TreadResult<Self> {
        if points.len() < 2 {
            return Err(TreadError::TerrainTooShort(points.len()));
        }
        Ok(Self::build(points))
    }

    /// Seeded rolling hills starting at x = 0.
    ///
    /// Heights follow a random walk bounded by `amplitude`, so slopes stay
    /// drivable for a tracked vehicle.
    pub fn rolling(seed: u64, length: Real, spacing: Real, amplitude: Real) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let spacing = spacing.max(0.1);
        let count = ((length / spacing).ceil() as usize).max(1) + 1;

        let mut height: Real = 0.0;
        let mut points = Vec::with_capacity(count + 1);

        // run-up so spawns near x = 0 sit on flat ground
        points.push(point![-spacing * 4.0, 0.0]);
        for i in 0..count {
            if i > 2 && amplitude > 0.0 {
                let step = rng.gen_range(-0.35_f32..=0.35) * spacing;
                height = (height + step).clamp(-amplitude, amplitude);
            }
            points.push(point![i as Real * spacing, height]);
        }

        Self::build(points)
    }

    fn build(points: Vec<Point<Real>>) -> Self {
        let bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();
        let mut query_pipeline = QueryPipeline::new();

        let collider = ColliderBuilder::polyline(points, None)
            .friction(1.2)
            .restitution(0.0)
            .build();
        colliders.insert(collider);
        query_pipeline.update(&colliders);

        tracing::debug!(colliders = colliders.len(), "terrain built");

        Self {
            bodies,
            colliders,
            query_pipeline,
        }
    }
}

impl GroundContactProvider for Terrain {
    fn query_ground(&self, position: Point<Real>, radius: Real) -> Option<GroundContact> {
        let (_handle, projection) = self.query_pipeline.project_point(
            &self.bodies,
            &self.colliders,
            &position,
            true,
            QueryFilter::default(),
        )?;

        let offset = position - projection.point;
        let distance = offset.norm();
        if distance > radius {
            return None;
        }

        let up = vector![0.0, 1.0];
        let mut normal = if distance > 1e-6 { offset / distance } else { up };
        if normal.y < 0.0 {
            normal = -normal;
        }

        Some(GroundContact {
            point: projection.point,
            normal,
        })
    }
}
