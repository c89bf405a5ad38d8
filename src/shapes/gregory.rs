//! Gregory patches.
//!
//! A Gregory patch is a bicubic Bézier patch whose four interior
//! control points are split in two: one face point belongs to the
//! boundary curve running along u, the other to the boundary curve
//! running along v. At (u,v) each interior control point is the
//! rational blend of its pair, so that the tangent planes along all
//! four boundaries can be prescribed independently. This is what makes
//! Gregory patches useful to approximate Catmull-Clark faces next to
//! extraordinary vertices.
//!
//! The rational blend is not closed under control point subdivision.
//! Children of a Gregory patch therefore keep the control points and
//! shrink the parametric **domain** they cover instead. Their boxes
//! still shrink with the domain: every blended point lies between the
//! component-wise minimum and maximum of its pair, so the surface over
//! a domain lies between the Bézier patches of the minimum and maximum
//! nets restricted to that domain.

// subdiv
use crate::core::common::Float;
use crate::core::geometry::{pnt3_lerp, pnt3_max_pnt3, pnt3_min_pnt3, Bounds3f, Point3f};
use crate::shapes::catmullclark::RegularCatmullClarkPatch;
use crate::shapes::patch::ParamInterval;

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct GregoryPatch {
    /// Bézier grid `v[row][column]`, row along v; the interior entries
    /// are the face points tied to the boundary rows (v = 0 and v = 1)
    pub v: [[Point3f; 4]; 4],
    /// face points tied to the boundary columns (u = 0 and u = 1),
    /// `f[i][j]` pairs with `v[i + 1][j + 1]`
    pub f: [[Point3f; 2]; 2],
    /// part of the root patch's parameter square covered by this patch
    pub domain: ParamInterval,
}

/// Cubic Bernstein polynomials at *t*.
pub fn bernstein_basis(t: Float) -> [Float; 4] {
    let s: Float = 1.0 as Float - t;
    [s * s * s, 3.0 * t * s * s, 3.0 * t * t * s, t * t * t]
}

fn bspline_to_bezier(p: &[Point3f; 4]) -> [Point3f; 4] {
    let sixth: Float = 1.0 as Float / 6.0 as Float;
    let third: Float = 1.0 as Float / 3.0 as Float;
    [
        (p[0] + p[1] * 4.0 + p[2]) * sixth,
        (p[1] * 2.0 + p[2]) * third,
        (p[1] + p[2] * 2.0) * third,
        (p[1] + p[2] * 4.0 + p[3]) * sixth,
    ]
}

/// Blossom of the cubic Bézier curve *p* at (*t[0]*, *t[1]*, *t[2]*).
fn blossom(p: &[Point3f; 4], t: [Float; 3]) -> Point3f {
    let mut q: [Point3f; 4] = *p;
    for (level, &tl) in t.iter().enumerate() {
        for i in 0..3 - level {
            q[i] = pnt3_lerp(tl, &q[i], &q[i + 1]);
        }
    }
    q[0]
}

/// Control points of the cubic Bézier curve *p* over `[a, b]`.
fn restrict_bezier(p: &[Point3f; 4], a: Float, b: Float) -> [Point3f; 4] {
    [
        blossom(p, [a, a, a]),
        blossom(p, [a, a, b]),
        blossom(p, [a, b, b]),
        blossom(p, [b, b, b]),
    ]
}

/// Control net of the Bézier patch *net* over *domain*.
fn restrict_net(net: &[[Point3f; 4]; 4], domain: &ParamInterval) -> [[Point3f; 4]; 4] {
    let mut rows: [[Point3f; 4]; 4] = [[Point3f::default(); 4]; 4];
    for i in 0..4 {
        rows[i] = restrict_bezier(&net[i], domain.s[0], domain.s[1]);
    }
    let mut out: [[Point3f; 4]; 4] = [[Point3f::default(); 4]; 4];
    for j in 0..4 {
        let column: [Point3f; 4] = restrict_bezier(
            &[rows[0][j], rows[1][j], rows[2][j], rows[3][j]],
            domain.t[0],
            domain.t[1],
        );
        for i in 0..4 {
            out[i][j] = column[i];
        }
    }
    out
}

impl GregoryPatch {
    pub fn new(v: [[Point3f; 4]; 4], f: [[Point3f; 2]; 2]) -> Self {
        GregoryPatch {
            v,
            f,
            domain: ParamInterval::default(),
        }
    }
    /// Gregory patch with coinciding face points, i.e. a plain bicubic
    /// Bézier patch.
    pub fn from_bezier(v: [[Point3f; 4]; 4]) -> Self {
        let f: [[Point3f; 2]; 2] = [[v[1][1], v[1][2]], [v[2][1], v[2][2]]];
        GregoryPatch::new(v, f)
    }
    /// Exact Bézier form of a regular Catmull-Clark patch.
    pub fn from_bspline(patch: &RegularCatmullClarkPatch) -> Self {
        let mut rows: [[Point3f; 4]; 4] = [[Point3f::default(); 4]; 4];
        for i in 0..4 {
            rows[i] = bspline_to_bezier(&patch.v[i]);
        }
        let mut v: [[Point3f; 4]; 4] = [[Point3f::default(); 4]; 4];
        for j in 0..4 {
            let column: [Point3f; 4] = bspline_to_bezier(&[rows[0][j], rows[1][j], rows[2][j], rows[3][j]]);
            for i in 0..4 {
                v[i][j] = column[i];
            }
        }
        GregoryPatch::from_bezier(v)
    }
    /// The Bézier grid with the interior points blended for the
    /// root-patch parameters (*u*, *v*).
    fn blended(&self, u: Float, v: Float) -> [[Point3f; 4]; 4] {
        let mut b: [[Point3f; 4]; 4] = self.v;
        for i in 1..3 {
            for j in 1..3 {
                let d_row: Float = if i == 1 { v } else { 1.0 as Float - v };
                let d_col: Float = if j == 1 { u } else { 1.0 as Float - u };
                let row_point: Point3f = self.v[i][j];
                let col_point: Point3f = self.f[i - 1][j - 1];
                let sum: Float = d_row + d_col;
                b[i][j] = if sum > 0.0 as Float {
                    (row_point * d_col + col_point * d_row) / sum
                } else {
                    (row_point + col_point) * 0.5 as Float
                };
            }
        }
        b
    }
    pub fn eval(&self, u: Float, v: Float) -> Point3f {
        let (u, v) = self.domain.lerp(u, v);
        let b: [[Point3f; 4]; 4] = self.blended(u, v);
        let bu: [Float; 4] = bernstein_basis(u);
        let bv: [Float; 4] = bernstein_basis(v);
        let mut p: Point3f = Point3f::default();
        for i in 0..4 {
            let mut row: Point3f = Point3f::default();
            for j in 0..4 {
                row += b[i][j] * bu[j];
            }
            p += row * bv[i];
        }
        p
    }
    pub fn subdivide(&self) -> [GregoryPatch; 4] {
        let q: [ParamInterval; 4] = self.domain.quadrants();
        let child = |domain: ParamInterval| GregoryPatch {
            v: self.v,
            f: self.f,
            domain,
        };
        [child(q[0]), child(q[1]), child(q[2]), child(q[3])]
    }
    /// Box around the surface over `domain`: the lower corner comes
    /// from the net of pair-wise minima, the upper corner from the net
    /// of pair-wise maxima, both restricted to the domain. Over the
    /// whole square this is the box of all twenty control points.
    pub fn bounds(&self) -> Bounds3f {
        let mut lo: [[Point3f; 4]; 4] = self.v;
        let mut hi: [[Point3f; 4]; 4] = self.v;
        for i in 1..3 {
            for j in 1..3 {
                lo[i][j] = pnt3_min_pnt3(&self.v[i][j], &self.f[i - 1][j - 1]);
                hi[i][j] = pnt3_max_pnt3(&self.v[i][j], &self.f[i - 1][j - 1]);
            }
        }
        if self.domain != ParamInterval::default() {
            lo = restrict_net(&lo, &self.domain);
            hi = restrict_net(&hi, &self.domain);
        }
        let mut b: Bounds3f = Bounds3f::default();
        for (lo_row, hi_row) in lo.iter().zip(hi.iter()) {
            for (l, h) in lo_row.iter().zip(hi_row.iter()) {
                b.p_min = pnt3_min_pnt3(&b.p_min, l);
                b.p_max = pnt3_max_pnt3(&b.p_max, h);
            }
        }
        b
    }
    pub fn limit_corners(&self) -> [Point3f; 4] {
        [
            self.eval(0.0, 0.0),
            self.eval(1.0, 0.0),
            self.eval(1.0, 1.0),
            self.eval(0.0, 1.0),
        ]
    }
}
