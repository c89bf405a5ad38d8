//! Ray intersection with the bilinear quads of a tessellated patch.
//!
//! A quad `v0, v1, v2, v3` (counter-clockwise in parameter space) is
//! split along the diagonal `v0`-`v2` into the triangles `(v0, v1, v2)`
//! and `(v0, v2, v3)`. Both are tested at once in the first two lanes
//! of a four-wide Möller-Trumbore test:
//!
//! ```text
//! e1 = v1 - v0, e2 = v2 - v0, P = d x e2, det = e1 . P
//! T = o - v0, u = (T . P) / det, Q = T x e1, v = (d . Q) / det
//! t = (e2 . Q) / det
//! ```
//!
//! A lane is valid if `det` is non-zero (positive with backface
//! culling), `u >= 0`, `v >= 0`, `u + v <= 1`, `t_near < t < t_far` and
//! every computed value is finite. Lanes that fail any test never touch
//! the ray packet.

// subdiv
use crate::core::common::Float;
use crate::core::geometry::{Normal3f, Point3f};
use crate::core::raypacket::{Hit, RayPacket};
use crate::core::simd::{vec3x4_cross, vec3x4_dot, Bool4, Float4, Vec3x4};
use crate::shapes::patch::ParamInterval;

/// Valid candidates of one quad test.
#[derive(Debug, Copy, Clone)]
pub struct QuadCandidates {
    pub valid: Bool4,
    pub t: Float4,
    pub u: Float4,
    pub v: Float4,
    /// unnormalized geometric normal `e1 x e2` per lane
    pub ng: Vec3x4,
}

impl QuadCandidates {
    /// Lane with the smallest valid distance; the first triangle wins
    /// ties.
    pub fn closest(&self) -> Option<usize> {
        self.t.min_lane(&self.valid)
    }
    /// Coordinates of lane *i* within the quad: (0,0) at `v0`, (1,0)
    /// at `v1`, (1,1) at `v2` and (0,1) at `v3`.
    pub fn quad_uv(&self, i: usize) -> (Float, Float) {
        let b1: Float = self.u.lane(i);
        let b2: Float = self.v.lane(i);
        if i == 0 {
            (b1 + b2, b2)
        } else {
            (b1, b1 + b2)
        }
    }
}

/// Runs the two-triangle test for one lane of a packet.
pub fn quad_candidates(
    packet: &RayPacket,
    lane: usize,
    quad: &[Point3f; 4],
    backface_culling: bool,
) -> QuadCandidates {
    let v0: Vec3x4 = Vec3x4::from_points(&[quad[0], quad[0], quad[0], quad[0]]);
    let v1: Vec3x4 = Vec3x4::from_points(&[quad[1], quad[2], quad[1], quad[2]]);
    let v2: Vec3x4 = Vec3x4::from_points(&[quad[2], quad[3], quad[2], quad[3]]);
    let org: Vec3x4 = Vec3x4::splat_point(&packet.org[lane]);
    let dir: Vec3x4 = Vec3x4::splat(&packet.dir[lane]);
    let e1: Vec3x4 = v1 - v0;
    let e2: Vec3x4 = v2 - v0;
    let p: Vec3x4 = vec3x4_cross(&dir, &e2);
    let det: Float4 = vec3x4_dot(&e1, &p);
    let tv: Vec3x4 = org - v0;
    let q: Vec3x4 = vec3x4_cross(&tv, &e1);
    let inv_det: Float4 = Float4::splat(1.0 as Float) / det;
    let u: Float4 = vec3x4_dot(&tv, &p) * inv_det;
    let v: Float4 = vec3x4_dot(&dir, &q) * inv_det;
    let t: Float4 = vec3x4_dot(&e2, &q) * inv_det;
    let zero: Float4 = Float4::splat(0.0 as Float);
    let one: Float4 = Float4::splat(1.0 as Float);
    let t_near: Float4 = Float4::splat(packet.t_near[lane]);
    let t_far: Float4 = Float4::splat(packet.t_far[lane]);
    // lanes 2 and 3 only pad the vector
    let mut valid: Bool4 = Bool4([true, true, false, false]);
    valid = valid & if backface_culling {
        det.cmp_gt(&zero)
    } else {
        det.is_nonzero()
    };
    valid = valid & u.cmp_ge(&zero) & v.cmp_ge(&zero) & (u + v).cmp_le(&one);
    valid = valid & t.cmp_gt(&t_near) & t.cmp_lt(&t_far);
    valid = valid & t.is_finite() & u.is_finite() & v.is_finite();
    QuadCandidates {
        valid,
        t,
        u,
        v,
        ng: vec3x4_cross(&e1, &e2),
    }
}

/// Closest-hit test of one packet lane against a quad.
///
/// On a hit the lane's `t_far` becomes the hit distance and (u,v) is
/// reported in the parameter space of the patch, mapped through the
/// quad's *interval*.
pub fn intersect1_quad(
    packet: &mut RayPacket,
    lane: usize,
    quad: &[Point3f; 4],
    interval: &ParamInterval,
    geom_id: u32,
    prim_id: u32,
    backface_culling: bool,
) -> bool {
    let c: QuadCandidates = quad_candidates(packet, lane, quad, backface_culling);
    if let Some(i) = c.closest() {
        let (qu, qv) = c.quad_uv(i);
        let (u, v) = interval.lerp(qu, qv);
        let ng: Normal3f = Normal3f::from(c.ng.lane(i));
        packet.record_hit(
            lane,
            &Hit {
                t: c.t.lane(i),
                u,
                v,
                ng,
                geom_id,
                prim_id,
            },
        );
        true
    } else {
        false
    }
}

/// Any-hit test of one packet lane against a quad; only sets the
/// lane's `terminated` flag.
pub fn occluded1_quad(
    packet: &mut RayPacket,
    lane: usize,
    quad: &[Point3f; 4],
    backface_culling: bool,
) -> bool {
    let c: QuadCandidates = quad_candidates(packet, lane, quad, backface_culling);
    if c.valid.any() {
        packet.terminated[lane] = true;
        true
    } else {
        false
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::geometry::{Ray, Vector3f};

    fn unit_quad(z: Float) -> [Point3f; 4] {
        [
            Point3f::new(-1.0, -1.0, z),
            Point3f::new(1.0, -1.0, z),
            Point3f::new(1.0, 1.0, z),
            Point3f::new(-1.0, 1.0, z),
        ]
    }

    fn down_packet(x: Float, y: Float) -> RayPacket {
        RayPacket::splat(&Ray::new(Point3f::new(x, y, 5.0), Vector3f::new(0.0, 0.0, -1.0)))
    }

    #[test]
    fn hit_reports_distance_normal_and_quad_coordinates() {
        let mut packet: RayPacket = down_packet(0.5, -0.5);
        let iv: ParamInterval = ParamInterval::default();
        assert!(intersect1_quad(&mut packet, 0, &unit_quad(0.0), &iv, 3, 9, false));
        let hit = packet.hit(0).unwrap();
        assert!((hit.t - 5.0).abs() < 1e-5);
        assert!((hit.u - 0.75).abs() < 1e-5);
        assert!((hit.v - 0.25).abs() < 1e-5);
        assert!(hit.ng.z > 0.0 && hit.ng.x == 0.0 && hit.ng.y == 0.0);
        assert_eq!((hit.geom_id, hit.prim_id), (3, 9));
        // the second triangle maps to the upper-left half
        let mut packet: RayPacket = down_packet(-0.5, 0.5);
        assert!(intersect1_quad(&mut packet, 2, &unit_quad(0.0), &iv, 0, 0, false));
        assert!((packet.u[2] - 0.25).abs() < 1e-5);
        assert!((packet.v[2] - 0.75).abs() < 1e-5);
    }

    #[test]
    fn uv_is_mapped_through_the_interval() {
        let mut packet: RayPacket = down_packet(0.0, 0.0);
        let iv: ParamInterval = ParamInterval::new(0.5, 1.0, 0.0, 0.5);
        assert!(intersect1_quad(&mut packet, 0, &unit_quad(0.0), &iv, 0, 0, false));
        assert!((packet.u[0] - 0.75).abs() < 1e-5);
        assert!((packet.v[0] - 0.25).abs() < 1e-5);
    }

    #[test]
    fn farther_quads_do_not_replace_closer_hits() {
        let mut packet: RayPacket = down_packet(0.1, 0.2);
        let iv: ParamInterval = ParamInterval::default();
        assert!(intersect1_quad(&mut packet, 0, &unit_quad(1.0), &iv, 1, 1, false));
        assert!(!intersect1_quad(&mut packet, 0, &unit_quad(0.0), &iv, 2, 2, false));
        assert_eq!(packet.geom_id[0], 1);
        assert!((packet.t_far[0] - 4.0).abs() < 1e-5);
    }

    #[test]
    fn backface_culling_rejects_the_back_side() {
        let mut quad: [Point3f; 4] = unit_quad(0.0);
        quad.swap(1, 3);
        let iv: ParamInterval = ParamInterval::default();
        let mut packet: RayPacket = down_packet(0.2, 0.3);
        assert!(!intersect1_quad(&mut packet, 0, &quad, &iv, 0, 0, true));
        assert!(intersect1_quad(&mut packet, 0, &quad, &iv, 0, 0, false));
    }

    #[test]
    fn parallel_rays_never_write() {
        let mut packet: RayPacket = RayPacket::splat(&Ray::new(
            Point3f::new(0.0, 0.0, 0.0),
            Vector3f::new(1.0, 0.0, 0.0),
        ));
        let before: RayPacket = packet.clone();
        let iv: ParamInterval = ParamInterval::default();
        assert!(!intersect1_quad(&mut packet, 0, &unit_quad(0.0), &iv, 0, 0, false));
        assert!(!occluded1_quad(&mut packet, 0, &unit_quad(0.0), false));
        assert_eq!(packet, before);
    }

    #[test]
    fn occlusion_only_sets_terminated() {
        let mut packet: RayPacket = down_packet(0.0, 0.5);
        let before: RayPacket = packet.clone();
        assert!(occluded1_quad(&mut packet, 1, &unit_quad(0.0), false));
        assert!(packet.terminated[1]);
        packet.terminated[1] = false;
        assert_eq!(packet, before);
    }
}
