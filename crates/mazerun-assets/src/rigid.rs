//! Rigid-body metadata derived from collision hulls.

use crate::error::AssetError;
use crate::obj::SourceMesh;
use mazerun_core::Vec3;

/// Static and dynamic friction coefficients.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Friction {
    /// Static coefficient.
    pub mu_s: f32,
    /// Dynamic coefficient.
    pub mu_d: f32,
}

/// One collision primitive of an object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CollisionPrimitive {
    /// Convex hull, by index into the imported hull list.
    Hull {
        /// Hull index.
        hull_idx: u32,
    },
    /// Infinite ground plane through the origin, facing +z.
    Plane,
}

/// Input description of one collision object.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceCollisionObject {
    /// Primitives making up the object.
    pub prims: Vec<CollisionPrimitive>,
    /// Inverse mass; `0` makes the object static.
    pub inv_mass: f32,
    /// Surface friction.
    pub friction: Friction,
}

/// Processed mass and shape properties of one object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RigidBodyMetadata {
    /// Half extents of the object's axis-aligned bounds.
    pub half_extents: Vec3,
    /// Inverse mass.
    pub inv_mass: f32,
    /// Diagonal of the inverse inertia tensor.
    pub inv_inertia: Vec3,
    /// Surface friction.
    pub friction: Friction,
}

/// Processed rigid-body data for every object, indexed like the input.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RigidBodyAssets {
    /// Per-object metadata.
    pub metadatas: Vec<RigidBodyMetadata>,
}

impl RigidBodyAssets {
    /// Validate hulls and derive rigid-body metadata.
    ///
    /// Each object's bounds are the union of its hulls' bounds. Inertia
    /// is that of a solid box filling the bounds; static objects get zero
    /// inverse inertia.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::MissingHull`] for dangling hull references
    /// and [`AssetError::InvalidHull`] for hulls that are too small,
    /// reference missing vertices, or are flat along an axis.
    pub fn process(
        hulls: &[SourceMesh],
        objects: &[SourceCollisionObject],
    ) -> Result<Self, AssetError> {
        let metadatas = objects
            .iter()
            .enumerate()
            .map(|(object, src)| {
                let mut lo = Vec3::new(f32::MAX, f32::MAX, f32::MAX);
                let mut hi = Vec3::new(f32::MIN, f32::MIN, f32::MIN);
                let mut has_hull = false;

                for prim in &src.prims {
                    let CollisionPrimitive::Hull { hull_idx } = *prim else {
                        continue;
                    };
                    let hull = hulls.get(hull_idx as usize).ok_or(AssetError::MissingHull {
                        object,
                        hull: hull_idx,
                        available: hulls.len(),
                    })?;
                    validate_hull(hull).map_err(|reason| AssetError::InvalidHull {
                        object,
                        reason,
                    })?;
                    for p in &hull.positions {
                        lo = Vec3::new(lo.x.min(p.x), lo.y.min(p.y), lo.z.min(p.z));
                        hi = Vec3::new(hi.x.max(p.x), hi.y.max(p.y), hi.z.max(p.z));
                    }
                    has_hull = true;
                }

                let half_extents = if has_hull {
                    (hi - lo) * 0.5
                } else {
                    Vec3::ZERO
                };
                Ok(RigidBodyMetadata {
                    half_extents,
                    inv_mass: src.inv_mass,
                    inv_inertia: box_inv_inertia(half_extents, src.inv_mass),
                    friction: src.friction,
                })
            })
            .collect::<Result<Vec<_>, AssetError>>()?;

        Ok(Self { metadatas })
    }
}

fn validate_hull(hull: &SourceMesh) -> Result<(), String> {
    if hull.positions.len() < 4 {
        return Err(format!("{} vertices, need at least 4", hull.positions.len()));
    }
    if hull.num_triangles() < 4 {
        return Err(format!("{} triangles, need at least 4", hull.num_triangles()));
    }
    if let Some(bad) = hull
        .indices
        .iter()
        .find(|&&i| i as usize >= hull.positions.len())
    {
        return Err(format!("index {bad} out of range"));
    }
    let first = hull.positions[0];
    let (mut lo, mut hi) = (first, first);
    for p in &hull.positions {
        lo = Vec3::new(lo.x.min(p.x), lo.y.min(p.y), lo.z.min(p.z));
        hi = Vec3::new(hi.x.max(p.x), hi.y.max(p.y), hi.z.max(p.z));
    }
    let extent = hi - lo;
    if extent.x <= 1e-6 || extent.y <= 1e-6 || extent.z <= 1e-6 {
        return Err("hull is flat along at least one axis".into());
    }
    Ok(())
}

/// Inverse inertia diagonal of a solid box with the given half extents.
fn box_inv_inertia(h: Vec3, inv_mass: f32) -> Vec3 {
    if inv_mass == 0.0 {
        return Vec3::ZERO;
    }
    let (x2, y2, z2) = (4.0 * h.x * h.x, 4.0 * h.y * h.y, 4.0 * h.z * h.z);
    let inv = |a: f32, b: f32| if a + b > 0.0 { 12.0 * inv_mass / (a + b) } else { 0.0 };
    Vec3::new(inv(y2, z2), inv(x2, z2), inv(x2, y2))
}
