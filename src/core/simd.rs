//! Four-wide lane vectors.
//!
//! The mini-BVH tests the four child boxes of a node at once and the
//! quad intersector tests both triangles of a quad at once. Both are
//! written against **Float4** (four floats), **Bool4** (four lane
//! masks) and **Vec3x4** (four 3D vectors in structure-of-arrays
//! layout). With the `simd` feature the floats live in a
//! `wide::f32x4`; without it a plain array is used. Every operation is
//! lane-wise IEEE arithmetic in both variants, so the two produce
//! identical results lane by lane.

// std
use std::fmt;
use std::ops;
// subdiv
use crate::core::common::Float;
use crate::core::geometry::{Point3f, Vector3f};

#[cfg(feature = "simd")]
mod lanes {
    // others
    use wide::{f32x4, CmpGe, CmpGt, CmpLe, CmpLt};
    // subdiv
    use super::Bool4;
    use crate::core::common::Float;

    #[derive(Copy, Clone)]
    pub struct Float4(f32x4);

    fn to_bool4(mask: f32x4) -> Bool4 {
        let bits: i32 = mask.move_mask();
        Bool4([
            bits & 1 != 0,
            bits & 2 != 0,
            bits & 4 != 0,
            bits & 8 != 0,
        ])
    }

    fn to_mask(m: &Bool4) -> f32x4 {
        let on: f32 = f32::from_bits(u32::MAX);
        f32x4::from([
            if m.0[0] { on } else { 0.0 },
            if m.0[1] { on } else { 0.0 },
            if m.0[2] { on } else { 0.0 },
            if m.0[3] { on } else { 0.0 },
        ])
    }

    impl Float4 {
        pub fn splat(x: Float) -> Self {
            Float4(f32x4::splat(x))
        }
        pub fn from_array(a: [Float; 4]) -> Self {
            Float4(f32x4::from(a))
        }
        pub fn to_array(&self) -> [Float; 4] {
            self.0.into()
        }
        pub(super) fn add_lanes(&self, o: &Float4) -> Float4 {
            Float4(self.0 + o.0)
        }
        pub(super) fn sub_lanes(&self, o: &Float4) -> Float4 {
            Float4(self.0 - o.0)
        }
        pub(super) fn mul_lanes(&self, o: &Float4) -> Float4 {
            Float4(self.0 * o.0)
        }
        pub(super) fn div_lanes(&self, o: &Float4) -> Float4 {
            Float4(self.0 / o.0)
        }
        pub fn cmp_lt(&self, o: &Float4) -> Bool4 {
            to_bool4(self.0.cmp_lt(o.0))
        }
        pub fn cmp_le(&self, o: &Float4) -> Bool4 {
            to_bool4(self.0.cmp_le(o.0))
        }
        pub fn cmp_gt(&self, o: &Float4) -> Bool4 {
            to_bool4(self.0.cmp_gt(o.0))
        }
        pub fn cmp_ge(&self, o: &Float4) -> Bool4 {
            to_bool4(self.0.cmp_ge(o.0))
        }
        /// Lanes of `a` where `mask` is set, lanes of `b` elsewhere.
        pub fn select(mask: &Bool4, a: &Float4, b: &Float4) -> Float4 {
            Float4(to_mask(mask).blend(a.0, b.0))
        }
    }
}

#[cfg(not(feature = "simd"))]
mod lanes {
    // subdiv
    use super::Bool4;
    use crate::core::common::Float;

    #[derive(Copy, Clone)]
    pub struct Float4([Float; 4]);

    impl Float4 {
        fn zip<F>(&self, o: &Float4, f: F) -> Float4
        where
            F: Fn(Float, Float) -> Float,
        {
            Float4([
                f(self.0[0], o.0[0]),
                f(self.0[1], o.0[1]),
                f(self.0[2], o.0[2]),
                f(self.0[3], o.0[3]),
            ])
        }
        fn test<F>(&self, o: &Float4, f: F) -> Bool4
        where
            F: Fn(Float, Float) -> bool,
        {
            Bool4([
                f(self.0[0], o.0[0]),
                f(self.0[1], o.0[1]),
                f(self.0[2], o.0[2]),
                f(self.0[3], o.0[3]),
            ])
        }
        pub fn splat(x: Float) -> Self {
            Float4([x; 4])
        }
        pub fn from_array(a: [Float; 4]) -> Self {
            Float4(a)
        }
        pub fn to_array(&self) -> [Float; 4] {
            self.0
        }
        pub(super) fn add_lanes(&self, o: &Float4) -> Float4 {
            self.zip(o, |a, b| a + b)
        }
        pub(super) fn sub_lanes(&self, o: &Float4) -> Float4 {
            self.zip(o, |a, b| a - b)
        }
        pub(super) fn mul_lanes(&self, o: &Float4) -> Float4 {
            self.zip(o, |a, b| a * b)
        }
        pub(super) fn div_lanes(&self, o: &Float4) -> Float4 {
            self.zip(o, |a, b| a / b)
        }
        pub fn cmp_lt(&self, o: &Float4) -> Bool4 {
            self.test(o, |a, b| a < b)
        }
        pub fn cmp_le(&self, o: &Float4) -> Bool4 {
            self.test(o, |a, b| a <= b)
        }
        pub fn cmp_gt(&self, o: &Float4) -> Bool4 {
            self.test(o, |a, b| a > b)
        }
        pub fn cmp_ge(&self, o: &Float4) -> Bool4 {
            self.test(o, |a, b| a >= b)
        }
        /// Lanes of `a` where `mask` is set, lanes of `b` elsewhere.
        pub fn select(mask: &Bool4, a: &Float4, b: &Float4) -> Float4 {
            Float4([
                if mask.0[0] { a.0[0] } else { b.0[0] },
                if mask.0[1] { a.0[1] } else { b.0[1] },
                if mask.0[2] { a.0[2] } else { b.0[2] },
                if mask.0[3] { a.0[3] } else { b.0[3] },
            ])
        }
    }
}

pub use self::lanes::Float4;

pub const LANES: usize = 4;

impl Float4 {
    pub fn new(a: Float, b: Float, c: Float, d: Float) -> Self {
        Float4::from_array([a, b, c, d])
    }
    pub fn lane(&self, i: usize) -> Float {
        self.to_array()[i]
    }
    /// Lane-wise minimum; the second operand wins where the first is NaN.
    pub fn min(&self, o: &Float4) -> Float4 {
        Float4::select(&self.cmp_lt(o), self, o)
    }
    /// Lane-wise maximum; the second operand wins where the first is NaN.
    pub fn max(&self, o: &Float4) -> Float4 {
        Float4::select(&self.cmp_gt(o), self, o)
    }
    /// Lanes that are neither infinite nor NaN.
    pub fn is_finite(&self) -> Bool4 {
        let a: [Float; 4] = self.to_array();
        Bool4([
            a[0].is_finite(),
            a[1].is_finite(),
            a[2].is_finite(),
            a[3].is_finite(),
        ])
    }
    /// Lanes that compare unequal to zero (NaN lanes are false).
    pub fn is_nonzero(&self) -> Bool4 {
        let zero: Float4 = Float4::splat(0.0 as Float);
        self.cmp_lt(&zero) | self.cmp_gt(&zero)
    }
    /// Smallest lane.
    pub fn reduce_min(&self) -> Float {
        let a: [Float; 4] = self.to_array();
        a[0].min(a[1]).min(a[2].min(a[3]))
    }
    /// Index of the smallest lane among the active ones; the lowest
    /// index wins ties.
    pub fn min_lane(&self, active: &Bool4) -> Option<usize> {
        let a: [Float; 4] = self.to_array();
        let mut best: Option<usize> = None;
        for i in active.iter() {
            match best {
                Some(b) if a[b] <= a[i] => {}
                _ => best = Some(i),
            }
        }
        best
    }
}

impl Default for Float4 {
    fn default() -> Self {
        Float4::splat(0.0 as Float)
    }
}

impl PartialEq for Float4 {
    fn eq(&self, other: &Float4) -> bool {
        self.to_array() == other.to_array()
    }
}

impl fmt::Debug for Float4 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Float4{:?}", self.to_array())
    }
}

impl From<[Float; 4]> for Float4 {
    fn from(a: [Float; 4]) -> Self {
        Float4::from_array(a)
    }
}

impl_op_ex!(+|a: &Float4, b: &Float4| -> Float4 { a.add_lanes(b) });
impl_op_ex!(-|a: &Float4, b: &Float4| -> Float4 { a.sub_lanes(b) });
impl_op_ex!(*|a: &Float4, b: &Float4| -> Float4 { a.mul_lanes(b) });
impl_op_ex!(/|a: &Float4, b: &Float4| -> Float4 { a.div_lanes(b) });
impl_op_ex!(*|a: &Float4, b: Float| -> Float4 { a.mul_lanes(&Float4::splat(b)) });
impl_op!(-|a: Float4| -> Float4 { Float4::splat(0.0 as Float).sub_lanes(&a) });

/// One boolean per lane.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Bool4(pub [bool; 4]);

impl Bool4 {
    pub fn splat(b: bool) -> Self {
        Bool4([b; 4])
    }
    pub fn any(&self) -> bool {
        self.0.iter().any(|b| *b)
    }
    pub fn all(&self) -> bool {
        self.0.iter().all(|b| *b)
    }
    pub fn none(&self) -> bool {
        !self.any()
    }
    pub fn count(&self) -> usize {
        self.0.iter().filter(|b| **b).count()
    }
    /// Indices of the set lanes in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> {
        let m: [bool; 4] = self.0;
        (0..LANES).filter(move |i| m[*i])
    }
}

impl ops::BitAnd for Bool4 {
    type Output = Bool4;
    fn bitand(self, b: Bool4) -> Bool4 {
        Bool4([
            self.0[0] && b.0[0],
            self.0[1] && b.0[1],
            self.0[2] && b.0[2],
            self.0[3] && b.0[3],
        ])
    }
}

impl ops::BitOr for Bool4 {
    type Output = Bool4;
    fn bitor(self, b: Bool4) -> Bool4 {
        Bool4([
            self.0[0] || b.0[0],
            self.0[1] || b.0[1],
            self.0[2] || b.0[2],
            self.0[3] || b.0[3],
        ])
    }
}

impl_op!(!|a: Bool4| -> Bool4 { Bool4([!a.0[0], !a.0[1], !a.0[2], !a.0[3]]) });

/// Four 3D vectors in structure-of-arrays layout.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Vec3x4 {
    pub x: Float4,
    pub y: Float4,
    pub z: Float4,
}

impl Vec3x4 {
    pub fn splat(v: &Vector3f) -> Self {
        Vec3x4 {
            x: Float4::splat(v.x),
            y: Float4::splat(v.y),
            z: Float4::splat(v.z),
        }
    }
    pub fn splat_point(p: &Point3f) -> Self {
        Vec3x4 {
            x: Float4::splat(p.x),
            y: Float4::splat(p.y),
            z: Float4::splat(p.z),
        }
    }
    pub fn from_points(p: &[Point3f; 4]) -> Self {
        Vec3x4 {
            x: Float4::new(p[0].x, p[1].x, p[2].x, p[3].x),
            y: Float4::new(p[0].y, p[1].y, p[2].y, p[3].y),
            z: Float4::new(p[0].z, p[1].z, p[2].z, p[3].z),
        }
    }
    pub fn lane(&self, i: usize) -> Vector3f {
        Vector3f {
            x: self.x.lane(i),
            y: self.y.lane(i),
            z: self.z.lane(i),
        }
    }
}

impl_op_ex!(-|a: &Vec3x4, b: &Vec3x4| -> Vec3x4 {
    Vec3x4 {
        x: a.x - b.x,
        y: a.y - b.y,
        z: a.z - b.z,
    }
});

pub fn vec3x4_dot(a: &Vec3x4, b: &Vec3x4) -> Float4 {
    a.x * b.x + a.y * b.y + a.z * b.z
}

pub fn vec3x4_cross(a: &Vec3x4, b: &Vec3x4) -> Vec3x4 {
    Vec3x4 {
        x: a.y * b.z - a.z * b.y,
        y: a.z * b.x - a.x * b.z,
        z: a.x * b.y - a.y * b.x,
    }
}
