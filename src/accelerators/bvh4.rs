//! Four-wide BVH nodes for the per-patch mini-BVH.
//!
//! Every node stores the boxes of its four children in
//! structure-of-arrays layout (one lane per child), so a single
//! **Float4** slab test decides which children a ray enters. Child
//! references are an explicit tagged union: an inner node index, a
//! leaf index into the parameter intervals of a cache entry, or empty.

// std
use std::cmp::Ordering;
// others
use smallvec::SmallVec;
use strum::IntoEnumIterator;
// subdiv
use crate::core::common::{gamma, rcp_safe, Float};
use crate::core::geometry::{bnd3_union_bnd3f, Bounds3f, Point3f, Ray, Vector3f, XYZEnum};
use crate::core::raypacket::RayPacket;
use crate::core::simd::{Bool4, Float4};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NodeRef {
    Empty,
    Node(u32),
    Leaf(u32),
}

impl Default for NodeRef {
    fn default() -> Self {
        NodeRef::Empty
    }
}

impl NodeRef {
    pub fn is_empty(&self) -> bool {
        *self == NodeRef::Empty
    }
    pub fn is_leaf(&self) -> bool {
        match self {
            NodeRef::Leaf(_) => true,
            _ => false,
        }
    }
}

/// Ray prepared for repeated box tests.
#[derive(Debug, Copy, Clone)]
pub struct BoxQuery {
    pub org: Point3f,
    pub inv_dir: Vector3f,
    pub dir_is_neg: [bool; 3],
    pub t_near: Float,
    pub t_far: Float,
}

impl BoxQuery {
    pub fn new(ray: &Ray) -> Self {
        let inv_dir: Vector3f = Vector3f {
            x: rcp_safe(ray.d.x),
            y: rcp_safe(ray.d.y),
            z: rcp_safe(ray.d.z),
        };
        BoxQuery {
            org: ray.o,
            inv_dir,
            dir_is_neg: [inv_dir.x < 0.0, inv_dir.y < 0.0, inv_dir.z < 0.0],
            t_near: ray.t_min,
            t_far: ray.t_max,
        }
    }
    pub fn from_packet(packet: &RayPacket, lane: usize) -> Self {
        BoxQuery::new(&packet.ray(lane))
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BVH4Node {
    /// per-axis lower corners, one lane per child
    pub lower: [[Float; 4]; 3],
    /// per-axis upper corners, one lane per child
    pub upper: [[Float; 4]; 3],
    pub children: [NodeRef; 4],
}

impl Default for BVH4Node {
    fn default() -> Self {
        BVH4Node {
            lower: [[std::f32::MAX; 4]; 3],
            upper: [[std::f32::MIN; 4]; 3],
            children: [NodeRef::Empty; 4],
        }
    }
}

impl BVH4Node {
    pub fn set_bounds(&mut self, i: usize, b: &Bounds3f) {
        for (axis, dim) in XYZEnum::iter().enumerate() {
            self.lower[axis][i] = b.p_min[dim];
            self.upper[axis][i] = b.p_max[dim];
        }
    }
    pub fn bounds(&self, i: usize) -> Bounds3f {
        Bounds3f {
            p_min: Point3f {
                x: self.lower[0][i],
                y: self.lower[1][i],
                z: self.lower[2][i],
            },
            p_max: Point3f {
                x: self.upper[0][i],
                y: self.upper[1][i],
                z: self.upper[2][i],
            },
        }
    }
    /// Union of the boxes of all non-empty children.
    pub fn union_bounds(&self) -> Bounds3f {
        let mut b: Bounds3f = Bounds3f::default();
        for i in 0..4 {
            if !self.children[i].is_empty() {
                b = bnd3_union_bnd3f(&b, &self.bounds(i));
            }
        }
        b
    }
    /// Slab test of all four child boxes. Returns the lanes whose box
    /// overlaps `[t_near, t_far]` and the entry distance of each lane.
    pub fn intersect(&self, query: &BoxQuery) -> (Bool4, Float4) {
        let mut t_min: Float4 = Float4::splat(query.t_near);
        let mut t_max: Float4 = Float4::splat(query.t_far);
        let far_scale: Float = 1.0 as Float + 2.0 as Float * gamma(3_i32);
        for (axis, dim) in XYZEnum::iter().enumerate() {
            let (near, far) = if query.dir_is_neg[axis] {
                (&self.upper[axis], &self.lower[axis])
            } else {
                (&self.lower[axis], &self.upper[axis])
            };
            let o: Float4 = Float4::splat(query.org[dim]);
            let r: Float4 = Float4::splat(query.inv_dir[dim]);
            let t0: Float4 = (Float4::from_array(*near) - o) * r;
            let t1: Float4 = (Float4::from_array(*far) - o) * r * far_scale;
            t_min = t0.max(&t_min);
            t_max = t1.min(&t_max);
        }
        let mut valid: Bool4 = t_min.cmp_le(&t_max);
        for i in 0..4 {
            if self.children[i].is_empty() {
                valid.0[i] = false;
            }
        }
        (valid, t_min)
    }
    /// Children hit by the query, nearest first.
    pub fn hit_children(&self, query: &BoxQuery) -> SmallVec<[(usize, Float); 4]> {
        let (valid, dist) = self.intersect(query);
        let mut hits: SmallVec<[(usize, Float); 4]> =
            valid.iter().map(|i| (i, dist.lane(i))).collect();
        hits.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        hits
    }
}
