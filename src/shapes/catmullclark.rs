//! Regular Catmull-Clark patches.
//!
//! Away from extraordinary vertices the limit surface of a
//! Catmull-Clark mesh is a uniform bicubic B-spline. A face whose four
//! corners all have valence four is therefore fully described by the
//! 4x4 grid of control points around it:
//!
//! ```text
//!  v[3][0] v[3][1] v[3][2] v[3][3]
//!  v[2][0] v[2][1] v[2][2] v[2][3]     ^ v (row)
//!  v[1][0] v[1][1] v[1][2] v[1][3]     |
//!  v[0][0] v[0][1] v[0][2] v[0][3]     +--> u (column)
//! ```
//!
//! The face itself spans the inner 2x2 points; `v[1][1]`, `v[1][2]`,
//! `v[2][2]` and `v[2][1]` are its corners at (u,v) = (0,0), (1,0),
//! (1,1) and (0,1).

// subdiv
use crate::core::common::Float;
use crate::core::geometry::{Bounds3f, Point3f};

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct RegularCatmullClarkPatch {
    pub v: [[Point3f; 4]; 4],
}

/// Uniform cubic B-spline basis functions at *t*.
pub fn bspline_basis(t: Float) -> [Float; 4] {
    let t2: Float = t * t;
    let t3: Float = t2 * t;
    let s: Float = 1.0 as Float - t;
    let one_sixth: Float = 1.0 as Float / 6.0 as Float;
    [
        s * s * s * one_sixth,
        (3.0 * t3 - 6.0 * t2 + 4.0) * one_sixth,
        (-3.0 * t3 + 3.0 * t2 + 3.0 * t + 1.0) * one_sixth,
        t3 * one_sixth,
    ]
}

fn average4(a: &Point3f, b: &Point3f, c: &Point3f, d: &Point3f) -> Point3f {
    (*a + *b + *c + *d) * 0.25 as Float
}

impl RegularCatmullClarkPatch {
    pub fn new(v: [[Point3f; 4]; 4]) -> Self {
        RegularCatmullClarkPatch { v }
    }
    /// Grid spanning `[x0, x1] x [y0, y1]` at height *z*, evenly spaced.
    pub fn flat(x0: Float, x1: Float, y0: Float, y1: Float, z: Float) -> Self {
        let mut v: [[Point3f; 4]; 4] = [[Point3f::default(); 4]; 4];
        for (i, row) in v.iter_mut().enumerate() {
            for (j, p) in row.iter_mut().enumerate() {
                let fx: Float = j as Float / 3.0 as Float;
                let fy: Float = i as Float / 3.0 as Float;
                *p = Point3f {
                    x: x0 + fx * (x1 - x0),
                    y: y0 + fy * (y1 - y0),
                    z,
                };
            }
        }
        RegularCatmullClarkPatch { v }
    }
    pub fn eval(&self, u: Float, v: Float) -> Point3f {
        let bu: [Float; 4] = bspline_basis(u);
        let bv: [Float; 4] = bspline_basis(v);
        let mut p: Point3f = Point3f::default();
        for i in 0..4 {
            let mut row: Point3f = Point3f::default();
            for j in 0..4 {
                row += self.v[i][j] * bu[j];
            }
            p += row * bv[i];
        }
        p
    }
    /// One step of Catmull-Clark refinement.
    ///
    /// The refined 5x5 grid `r` interleaves new face points (even row,
    /// even column), edge points (one odd index) and vertex points (odd
    /// row, odd column). Each child takes the 4x4 window of `r` around
    /// its quadrant.
    pub fn subdivide(&self) -> [RegularCatmullClarkPatch; 4] {
        let v = &self.v;
        let mut r: [[Point3f; 5]; 5] = [[Point3f::default(); 5]; 5];
        // face points
        for a in (0..5).step_by(2) {
            for b in (0..5).step_by(2) {
                let (i, j) = (a / 2, b / 2);
                r[a][b] = average4(&v[i][j], &v[i][j + 1], &v[i + 1][j], &v[i + 1][j + 1]);
            }
        }
        // edge points
        for a in 0..5 {
            for b in 0..5 {
                if a % 2 == 1 && b % 2 == 0 {
                    // edge along u between v[i][j] and v[i][j + 1]
                    let (i, j) = ((a + 1) / 2, b / 2);
                    r[a][b] = average4(&v[i][j], &v[i][j + 1], &r[a - 1][b], &r[a + 1][b]);
                } else if a % 2 == 0 && b % 2 == 1 {
                    // edge along v between v[i][j] and v[i + 1][j]
                    let (i, j) = (a / 2, (b + 1) / 2);
                    r[a][b] = average4(&v[i][j], &v[i + 1][j], &r[a][b - 1], &r[a][b + 1]);
                }
            }
        }
        // vertex points, valence four: (Q + 2R + S) / 4
        for a in (1..5).step_by(2) {
            for b in (1..5).step_by(2) {
                let (i, j) = ((a + 1) / 2, (b + 1) / 2);
                let s: Point3f = v[i][j];
                let q: Point3f =
                    average4(&r[a - 1][b - 1], &r[a - 1][b + 1], &r[a + 1][b + 1], &r[a + 1][b - 1]);
                let e: Point3f = average4(&v[i - 1][j], &v[i][j + 1], &v[i + 1][j], &v[i][j - 1]);
                // R = (S + E) / 2, so 2R = S + E
                r[a][b] = (q + s + e + s) * 0.25 as Float;
            }
        }
        let window = |row0: usize, col0: usize| -> RegularCatmullClarkPatch {
            let mut c: [[Point3f; 4]; 4] = [[Point3f::default(); 4]; 4];
            for (i, row) in c.iter_mut().enumerate() {
                for (j, p) in row.iter_mut().enumerate() {
                    *p = r[row0 + i][col0 + j];
                }
            }
            RegularCatmullClarkPatch { v: c }
        };
        [window(0, 0), window(0, 1), window(1, 1), window(1, 0)]
    }
    pub fn bounds(&self) -> Bounds3f {
        let mut b: Bounds3f = Bounds3f::default();
        for row in self.v.iter() {
            b = row
                .iter()
                .fold(b, |acc, p| crate::core::geometry::bnd3_union_pnt3f(&acc, p));
        }
        b
    }
    /// Face corners as control points (not on the limit surface).
    pub fn corners(&self) -> [Point3f; 4] {
        [self.v[1][1], self.v[1][2], self.v[2][2], self.v[2][1]]
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
