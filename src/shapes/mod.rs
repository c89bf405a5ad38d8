//! Subdivision patches and the quad primitive they are tessellated
//! into.
//!
//! - Regular Catmull-Clark patches (bicubic B-spline, 4x4 control grid)
//! - Irregular Catmull-Clark patches (four one-rings around the face)
//! - Gregory patches (Bézier grid with split interior face points)
//!
//! Each representation can be evaluated, subdivided into four children
//! and bounded. **Patch** is the closed sum over all of them.

pub mod catmullclark;
pub mod gregory;
pub mod irregular;
pub mod patch;
pub mod quad;
