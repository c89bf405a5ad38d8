//! The closed set of patch representations and the parametric
//! sub-rectangles used while tessellating them.
//!
//! All three variants answer the same three questions: where is the
//! surface at (u,v), what are the four patches covering the quadrants
//! of the parameter domain, and which box contains the surface. The
//! children of **Patch::subdivide()** are ordered like the rectangles
//! returned by **ParamInterval::quadrants()**, so a caller can carry
//! the interval of every child along without further bookkeeping.

// subdiv
use crate::core::common::Float;
use crate::core::geometry::{Bounds3f, Point3f};
use crate::shapes::catmullclark::RegularCatmullClarkPatch;
use crate::shapes::gregory::GregoryPatch;
use crate::shapes::irregular::IrregularCatmullClarkPatch;

/// A sub-rectangle `[s0, s1] x [t0, t1]` of the unit parameter square.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ParamInterval {
    pub s: [Float; 2],
    pub t: [Float; 2],
}

impl Default for ParamInterval {
    fn default() -> Self {
        ParamInterval {
            s: [0.0 as Float, 1.0 as Float],
            t: [0.0 as Float, 1.0 as Float],
        }
    }
}

impl ParamInterval {
    pub fn new(s0: Float, s1: Float, t0: Float, t1: Float) -> Self {
        ParamInterval {
            s: [s0, s1],
            t: [t0, t1],
        }
    }
    /// The four halves in the order (s_lo,t_lo), (s_hi,t_lo),
    /// (s_hi,t_hi), (s_lo,t_hi).
    pub fn quadrants(&self) -> [ParamInterval; 4] {
        let s_mid: Float = 0.5 as Float * (self.s[0] + self.s[1]);
        let t_mid: Float = 0.5 as Float * (self.t[0] + self.t[1]);
        [
            ParamInterval::new(self.s[0], s_mid, self.t[0], t_mid),
            ParamInterval::new(s_mid, self.s[1], self.t[0], t_mid),
            ParamInterval::new(s_mid, self.s[1], t_mid, self.t[1]),
            ParamInterval::new(self.s[0], s_mid, t_mid, self.t[1]),
        ]
    }
    /// Corners in counter-clockwise order starting at (s0,t0).
    pub fn corners(&self) -> [(Float, Float); 4] {
        [
            (self.s[0], self.t[0]),
            (self.s[1], self.t[0]),
            (self.s[1], self.t[1]),
            (self.s[0], self.t[1]),
        ]
    }
    /// Maps local coordinates of the rectangle to the enclosing domain.
    pub fn lerp(&self, u: Float, v: Float) -> (Float, Float) {
        (
            self.s[0] + u * (self.s[1] - self.s[0]),
            self.t[0] + v * (self.t[1] - self.t[0]),
        )
    }
    pub fn contains(&self, u: Float, v: Float) -> bool {
        u >= self.s[0] && u <= self.s[1] && v >= self.t[0] && v <= self.t[1]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    Regular(RegularCatmullClarkPatch),
    Irregular(IrregularCatmullClarkPatch),
    Gregory(GregoryPatch),
}

impl Patch {
    /// Limit surface position at (u,v) in `[0,1]^2`.
    pub fn eval(&self, u: Float, v: Float) -> Point3f {
        match self {
            Patch::Regular(patch) => patch.eval(u, v),
            Patch::Irregular(patch) => patch.eval(u, v),
            Patch::Gregory(patch) => patch.eval(u, v),
        }
    }
    /// Four children covering the quadrants of the parameter domain.
    pub fn subdivide(&self) -> [Patch; 4] {
        match self {
            Patch::Regular(patch) => {
                let [c0, c1, c2, c3] = patch.subdivide();
                [
                    Patch::Regular(c0),
                    Patch::Regular(c1),
                    Patch::Regular(c2),
                    Patch::Regular(c3),
                ]
            }
            Patch::Irregular(patch) => patch.subdivide(),
            Patch::Gregory(patch) => {
                let [c0, c1, c2, c3] = patch.subdivide();
                [
                    Patch::Gregory(c0),
                    Patch::Gregory(c1),
                    Patch::Gregory(c2),
                    Patch::Gregory(c3),
                ]
            }
        }
    }
    /// Box around all control points, which contains the limit surface
    /// and every quad tessellating it.
    pub fn bounds(&self) -> Bounds3f {
        match self {
            Patch::Regular(patch) => patch.bounds(),
            Patch::Irregular(patch) => patch.bounds(),
            Patch::Gregory(patch) => patch.bounds(),
        }
    }
    /// Limit positions at (0,0), (1,0), (1,1) and (0,1).
    pub fn limit_corners(&self) -> [Point3f; 4] {
        match self {
            Patch::Regular(patch) => patch.limit_corners(),
            Patch::Irregular(patch) => patch.limit_corners(),
            Patch::Gregory(patch) => patch.limit_corners(),
        }
    }
    /// Positions at the four corners of a parameter rectangle, in the
    /// order of **ParamInterval::corners()**.
    pub fn eval_corners(&self, interval: &ParamInterval) -> [Point3f; 4] {
        let c: [(Float, Float); 4] = interval.corners();
        [
            self.eval(c[0].0, c[0].1),
            self.eval(c[1].0, c[1].1),
            self.eval(c[2].0, c[2].1),
            self.eval(c[3].0, c[3].1),
        ]
    }
    pub fn is_irregular(&self) -> bool {
        match self {
            Patch::Irregular(_) => true,
            _ => false,
        }
    }
}

impl From<RegularCatmullClarkPatch> for Patch {
    fn from(patch: RegularCatmullClarkPatch) -> Self {
        Patch::Regular(patch)
    }
}

impl From<IrregularCatmullClarkPatch> for Patch {
    fn from(patch: IrregularCatmullClarkPatch) -> Self {
        Patch::Irregular(patch)
    }
}

impl From<GregoryPatch> for Patch {
    fn from(patch: GregoryPatch) -> Self {
        Patch::Gregory(patch)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn quadrants_tile_the_interval() {
        let iv: ParamInterval = ParamInterval::new(0.0, 0.5, 0.5, 1.0);
        let q: [ParamInterval; 4] = iv.quadrants();
        assert_eq!(q[0], ParamInterval::new(0.0, 0.25, 0.5, 0.75));
        assert_eq!(q[1], ParamInterval::new(0.25, 0.5, 0.5, 0.75));
        assert_eq!(q[2], ParamInterval::new(0.25, 0.5, 0.75, 1.0));
        assert_eq!(q[3], ParamInterval::new(0.0, 0.25, 0.75, 1.0));
        for c in q.iter() {
            assert!(iv.contains(c.s[0], c.t[0]) && iv.contains(c.s[1], c.t[1]));
        }
    }

    #[test]
    fn lerp_maps_local_coordinates() {
        let iv: ParamInterval = ParamInterval::new(0.5, 1.0, 0.25, 0.5);
        assert_eq!(iv.lerp(0.0, 0.0), (0.5, 0.25));
        assert_eq!(iv.lerp(0.5, 1.0), (0.75, 0.5));
        assert_eq!(iv.corners()[2], (1.0, 0.5));
    }
}
