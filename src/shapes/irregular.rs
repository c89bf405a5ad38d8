//! Catmull-Clark patches next to extraordinary vertices.
//!
//! A face with at least one corner of valence other than four is not a
//! B-spline patch. It is stored as the four one-rings of its corners
//! instead; repeated subdivision shrinks the irregular region towards
//! the extraordinary corners, and every child whose corners all end up
//! with valence four turns into a regular patch.
//!
//! Ring layout around a centre vertex `vtx` of valence `n`: the `2n`
//! neighbours alternate between edge neighbours (even slots) and the
//! diagonal vertex of the face between two edges (odd slots), in
//! counter-clockwise order. Face `k` is `(vtx, ring[2k], ring[2k+1],
//! ring[2k+2])`. For the corner `i` of a patch, face 0 is the patch
//! itself, so `ring[0]`, `ring[1]` and `ring[2]` are the corners `i+1`,
//! `i+2` and `i+3`.

// others
use smallvec::SmallVec;
// subdiv
use crate::core::common::Float;
use crate::core::error::{Result, SubdivError};
use crate::core::geometry::{bnd3_union_pnt3f, pnt3_lerp, Bounds3f, Point3f};
use crate::shapes::catmullclark::RegularCatmullClarkPatch;
use crate::shapes::patch::Patch;

pub const MIN_VALENCE: usize = 3;

/// Number of refinement steps taken by **eval()** before it falls back
/// to bilinear interpolation of limit positions.
pub const MAX_EVAL_LEVEL: usize = 20;

pub type RingPoints = SmallVec<[Point3f; 16]>;

#[derive(Debug, Clone, PartialEq)]
pub struct CatmullClark1Ring {
    pub vtx: Point3f,
    pub ring: RingPoints,
    pub valence: usize,
}

impl CatmullClark1Ring {
    pub fn new(vtx: Point3f, ring: &[Point3f]) -> Result<Self> {
        let valence: usize = ring.len() / 2;
        if valence < MIN_VALENCE {
            return Err(SubdivError::InvalidValence {
                valence,
                min: MIN_VALENCE,
            });
        }
        if ring.len() != 2 * valence {
            return Err(SubdivError::RingSize {
                valence,
                expected: 2 * valence,
                got: ring.len(),
            });
        }
        Ok(CatmullClark1Ring {
            vtx,
            ring: ring.iter().cloned().collect(),
            valence,
        })
    }
    pub fn is_regular(&self) -> bool {
        self.valence == 4
    }
    /// Position of the centre vertex on the limit surface.
    pub fn limit_vertex(&self) -> Point3f {
        let n: Float = self.valence as Float;
        let mut edges: Point3f = Point3f::default();
        let mut diagonals: Point3f = Point3f::default();
        for k in 0..self.valence {
            edges += self.ring[2 * k];
            diagonals += self.ring[2 * k + 1];
        }
        (self.vtx * (n * n) + edges * 4.0 as Float + diagonals) / (n * (n + 5.0 as Float))
    }
    /// The ring one subdivision level finer around the same vertex.
    pub fn refine(&self) -> CatmullClark1Ring {
        let n: usize = self.valence;
        let r = &self.ring;
        let faces: SmallVec<[Point3f; 8]> = (0..n)
            .map(|k| (self.vtx + r[2 * k] + r[2 * k + 1] + r[(2 * k + 2) % (2 * n)]) * 0.25 as Float)
            .collect();
        let mut ring: RingPoints = SmallVec::with_capacity(2 * n);
        let mut edge_sum: Point3f = Point3f::default();
        let mut face_sum: Point3f = Point3f::default();
        for k in 0..n {
            let prev: Point3f = faces[(k + n - 1) % n];
            ring.push((self.vtx + r[2 * k] + prev + faces[k]) * 0.25 as Float);
            ring.push(faces[k]);
            edge_sum += r[2 * k];
            face_sum += faces[k];
        }
        let nf: Float = n as Float;
        let vtx: Point3f =
            self.vtx * ((nf - 2.0 as Float) / nf) + edge_sum / (nf * nf) + face_sum / (nf * nf);
        CatmullClark1Ring {
            vtx,
            ring,
            valence: n,
        }
    }
    /// Same ring with the neighbour order starting *shift* slots later.
    fn rotated(&self, shift: usize) -> CatmullClark1Ring {
        let len: usize = self.ring.len();
        CatmullClark1Ring {
            vtx: self.vtx,
            ring: (0..len).map(|k| self.ring[(k + shift) % len]).collect(),
            valence: self.valence,
        }
    }
    fn bounds(&self, b: &Bounds3f) -> Bounds3f {
        self.ring
            .iter()
            .fold(bnd3_union_pnt3f(b, &self.vtx), |acc, p| bnd3_union_pnt3f(&acc, p))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrregularCatmullClarkPatch {
    pub ring: [CatmullClark1Ring; 4],
}

impl IrregularCatmullClarkPatch {
    pub fn new(ring: [CatmullClark1Ring; 4]) -> Self {
        IrregularCatmullClarkPatch { ring }
    }
    /// The same face described by the one-rings of its corners.
    pub fn from_regular(patch: &RegularCatmullClarkPatch) -> Self {
        let v = &patch.v;
        let ring = |vtx: Point3f, r: [Point3f; 8]| CatmullClark1Ring {
            vtx,
            ring: r.iter().cloned().collect(),
            valence: 4,
        };
        IrregularCatmullClarkPatch {
            ring: [
                ring(
                    v[1][1],
                    [v[1][2], v[2][2], v[2][1], v[2][0], v[1][0], v[0][0], v[0][1], v[0][2]],
                ),
                ring(
                    v[1][2],
                    [v[2][2], v[2][1], v[1][1], v[0][1], v[0][2], v[0][3], v[1][3], v[2][3]],
                ),
                ring(
                    v[2][2],
                    [v[2][1], v[1][1], v[1][2], v[1][3], v[2][3], v[3][3], v[3][2], v[3][1]],
                ),
                ring(
                    v[2][1],
                    [v[1][1], v[1][2], v[2][2], v[3][2], v[3][1], v[3][0], v[2][0], v[1][0]],
                ),
            ],
        }
    }
    pub fn is_regular(&self) -> bool {
        self.ring.iter().all(|r| r.is_regular())
    }
    /// The 4x4 B-spline grid, if every corner has valence four.
    pub fn to_regular(&self) -> Option<RegularCatmullClarkPatch> {
        if !self.is_regular() {
            return None;
        }
        let r = &self.ring;
        Some(RegularCatmullClarkPatch {
            v: [
                [r[0].ring[5], r[0].ring[6], r[0].ring[7], r[1].ring[5]],
                [r[0].ring[4], r[0].vtx, r[1].vtx, r[1].ring[6]],
                [r[0].ring[3], r[3].vtx, r[2].vtx, r[1].ring[7]],
                [r[3].ring[5], r[2].ring[7], r[2].ring[6], r[2].ring[5]],
            ],
        })
    }
    pub fn limit_corners(&self) -> [Point3f; 4] {
        [
            self.ring[0].limit_vertex(),
            self.ring[1].limit_vertex(),
            self.ring[2].limit_vertex(),
            self.ring[3].limit_vertex(),
        ]
    }
    pub fn bounds(&self) -> Bounds3f {
        self.ring
            .iter()
            .fold(Bounds3f::default(), |acc, r| r.bounds(&acc))
    }
    /// Four children in quadrant order; children without an
    /// extraordinary corner come back as regular patches.
    pub fn subdivide(&self) -> [Patch; 4] {
        let mut refined: [CatmullClark1Ring; 4] = [
            self.ring[0].refine(),
            self.ring[1].refine(),
            self.ring[2].refine(),
            self.ring[3].refine(),
        ];
        // points shared by neighbouring rings are taken from one source
        let center: Point3f = refined[0].ring[1];
        for i in 0..4 {
            let next: usize = (i + 1) % 4;
            let n: usize = refined[i].valence;
            let edge: Point3f = refined[i].ring[0];
            let across: Point3f = refined[i].ring[2 * n - 1];
            refined[i].ring[1] = center;
            refined[next].ring[2] = edge;
            refined[next].ring[3] = across;
        }
        // rings around the new edge points
        let edge_ring = |i: usize| -> CatmullClark1Ring {
            let cur = &refined[i];
            let next = &refined[(i + 1) % 4];
            let n: usize = cur.valence;
            let r: [Point3f; 8] = [
                center,
                cur.ring[2],
                cur.vtx,
                cur.ring[2 * n - 2],
                cur.ring[2 * n - 1],
                next.ring[4],
                next.vtx,
                next.ring[0],
            ];
            CatmullClark1Ring {
                vtx: cur.ring[0],
                ring: r.iter().cloned().collect(),
                valence: 4,
            }
        };
        let edges: [CatmullClark1Ring; 4] = [edge_ring(0), edge_ring(1), edge_ring(2), edge_ring(3)];
        // ring around the new face point
        let face_points: [Point3f; 8] = [
            edges[3].vtx,
            refined[0].vtx,
            edges[0].vtx,
            refined[1].vtx,
            edges[1].vtx,
            refined[2].vtx,
            edges[2].vtx,
            refined[3].vtx,
        ];
        let face: CatmullClark1Ring = CatmullClark1Ring {
            vtx: center,
            ring: face_points.iter().cloned().collect(),
            valence: 4,
        };
        let child = |i: usize| -> Patch {
            // corner k of child i sits in slot (i + k) % 4
            let ring_at = |slot: usize| -> CatmullClark1Ring {
                match (slot + 4 - i) % 4 {
                    0 => refined[i].clone(),
                    1 => edges[i].clone(),
                    2 => face.rotated(2 * i),
                    _ => edges[(i + 3) % 4].rotated(6),
                }
            };
            let patch: IrregularCatmullClarkPatch = IrregularCatmullClarkPatch {
                ring: [ring_at(0), ring_at(1), ring_at(2), ring_at(3)],
            };
            match patch.to_regular() {
                Some(regular) => Patch::Regular(regular),
                None => Patch::Irregular(patch),
            }
        };
        [child(0), child(1), child(2), child(3)]
    }
    /// Limit surface position.
    ///
    /// Regular patches are evaluated as B-splines; corners use the
    /// limit position of their vertex; everything else refines towards
    /// (u,v) until a regular child or a corner is reached.
    pub fn eval(&self, u: Float, v: Float) -> Point3f {
        if let Some(regular) = self.to_regular() {
            return regular.eval(u, v);
        }
        let mut patch: IrregularCatmullClarkPatch = self.clone();
        let (mut u, mut v) = (u, v);
        for _level in 0..MAX_EVAL_LEVEL {
            if let Some(corner) = corner_index(u, v) {
                return patch.ring[corner].limit_vertex();
            }
            let (quadrant, cu, cv) = descend(u, v);
            u = cu;
            v = cv;
            let children: [Patch; 4] = patch.subdivide();
            match &children[quadrant] {
                Patch::Irregular(child) => patch = child.clone(),
                child => return child.eval(u, v),
            }
        }
        let c: [Point3f; 4] = patch.limit_corners();
        let bottom: Point3f = pnt3_lerp(u, &c[0], &c[1]);
        let top: Point3f = pnt3_lerp(u, &c[3], &c[2]);
        pnt3_lerp(v, &bottom, &top)
    }
}

fn corner_index(u: Float, v: Float) -> Option<usize> {
    match (u == 0.0 as Float, u == 1.0 as Float, v == 0.0 as Float, v == 1.0 as Float) {
        (true, _, true, _) => Some(0),
        (_, true, true, _) => Some(1),
        (_, true, _, true) => Some(2),
        (true, _, _, true) => Some(3),
        _ => None,
    }
}

/// Quadrant containing (u,v) and the coordinates within it.
fn descend(u: Float, v: Float) -> (usize, Float, Float) {
    let half: Float = 0.5 as Float;
    let two: Float = 2.0 as Float;
    match (u < half, v < half) {
        (true, true) => (0, u * two, v * two),
        (false, true) => (1, u * two - 1.0, v * two),
        (false, false) => (2, u * two - 1.0, v * two - 1.0),
        (true, false) => (3, u * two, v * two - 1.0),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::geometry::pnt3_distancef;

    fn wavy_grid() -> RegularCatmullClarkPatch {
        let mut patch: RegularCatmullClarkPatch = RegularCatmullClarkPatch::flat(-1.0, 1.0, -1.0, 1.0, 0.0);
        for i in 0..4 {
            for j in 0..4 {
                patch.v[i][j].z = ((i + 2 * j) % 3) as Float * 0.5 - 0.25;
            }
        }
        patch
    }

    /// Face of a valence-5 vertex at the origin: a regular 3x3 block of
    /// quads with an extra wedge inserted at corner 0.
    fn valence5_patch() -> IrregularCatmullClarkPatch {
        let grid: RegularCatmullClarkPatch = wavy_grid();
        let mut patch: IrregularCatmullClarkPatch = IrregularCatmullClarkPatch::from_regular(&grid);
        let vtx: Point3f = patch.ring[0].vtx;
        let mut ring: Vec<Point3f> = patch.ring[0].ring.iter().cloned().collect();
        let extra_e: Point3f = Point3f::new(-0.55, -0.8, 0.1);
        let extra_d: Point3f = Point3f::new(-0.5, -1.3, 0.3);
        ring.insert(6, extra_d);
        ring.insert(6, extra_e);
        patch.ring[0] = CatmullClark1Ring::new(vtx, &ring).unwrap();
        patch
    }

    #[test]
    fn rings_reject_bad_sizes() {
        let p: Point3f = Point3f::default();
        assert_eq!(
            CatmullClark1Ring::new(p, &[p; 4]),
            Err(SubdivError::InvalidValence { valence: 2, min: 3 })
        );
        assert_eq!(
            CatmullClark1Ring::new(p, &[p; 9]),
            Err(SubdivError::RingSize {
                valence: 4,
                expected: 8,
                got: 9
            })
        );
        assert!(CatmullClark1Ring::new(p, &[p; 10]).is_ok());
    }

    #[test]
    fn regular_rings_round_trip_to_the_grid() {
        let grid: RegularCatmullClarkPatch = wavy_grid();
        let patch: IrregularCatmullClarkPatch = IrregularCatmullClarkPatch::from_regular(&grid);
        assert_eq!(patch.to_regular(), Some(grid));
    }

    #[test]
    fn ring_subdivision_matches_grid_stencils() {
        let grid: RegularCatmullClarkPatch = wavy_grid();
        let patch: IrregularCatmullClarkPatch = IrregularCatmullClarkPatch::from_regular(&grid);
        let expected: [RegularCatmullClarkPatch; 4] = grid.subdivide();
        let children: [Patch; 4] = patch.subdivide();
        for (child, want) in children.iter().zip(expected.iter()) {
            match child {
                Patch::Regular(got) => {
                    for i in 0..4 {
                        for j in 0..4 {
                            assert!(pnt3_distancef(&got.v[i][j], &want.v[i][j]) < 1e-5);
                        }
                    }
                }
                _ => panic!("valence four children must be regular"),
            }
        }
    }

    #[test]
    fn limit_vertex_matches_bspline_corner() {
        let grid: RegularCatmullClarkPatch = wavy_grid();
        let patch: IrregularCatmullClarkPatch = IrregularCatmullClarkPatch::from_regular(&grid);
        let corners: [Point3f; 4] = patch.limit_corners();
        let expected: [Point3f; 4] = grid.limit_corners();
        for k in 0..4 {
            assert!(pnt3_distancef(&corners[k], &expected[k]) < 1e-5);
        }
    }

    #[test]
    fn extraordinary_child_stays_irregular() {
        let patch: IrregularCatmullClarkPatch = valence5_patch();
        assert!(patch.to_regular().is_none());
        let children: [Patch; 4] = patch.subdivide();
        assert!(children[0].is_irregular());
        for child in children[1..].iter() {
            assert!(!child.is_irregular());
        }
    }

    #[test]
    fn eval_is_continuous_across_children() {
        let patch: IrregularCatmullClarkPatch = valence5_patch();
        let children: [Patch; 4] = patch.subdivide();
        // shared edge between child 0 and child 1 at u = 0.5
        for k in 0..=4 {
            let t: Float = k as Float / 4.0;
            let a: Point3f = children[0].eval(1.0, t);
            let b: Point3f = children[1].eval(0.0, t);
            assert!(pnt3_distancef(&a, &b) < 1e-4);
            let c: Point3f = patch.eval(0.5, 0.5 * t);
            assert!(pnt3_distancef(&a, &c) < 1e-4);
        }
        let corner: Point3f = patch.eval(0.0, 0.0);
        assert!(pnt3_distancef(&corner, &patch.ring[0].limit_vertex()) < 1e-6);
        let near: Point3f = patch.eval(1e-4, 1e-4);
        assert!(pnt3_distancef(&corner, &near) < 1e-2);
    }

    #[test]
    fn bounds_contain_children_and_limit_points() {
        let patch: IrregularCatmullClarkPatch = valence5_patch();
        let b: Bounds3f = patch.bounds();
        for child in patch.subdivide().iter() {
            let cb: Bounds3f = child.bounds();
            assert!(crate::core::geometry::bnd3_inside_bnd3(&cb, &b));
        }
        for c in patch.limit_corners().iter() {
            assert!(crate::core::geometry::pnt3_inside_bnd3(c, &b));
        }
    }
}
