//! # subdiv
//!
//! [Rust][rust] crate to intersect rays with subdivision surfaces.
//! A scene primitive is a parametric patch (regular or irregular
//! Catmull-Clark, or Gregory) defined by a few control points. The
//! limit surface has no closed-form ray intersection, so each patch is
//! tessellated adaptively into flat bilinear quads, a small 4-wide BVH
//! is built over the quads, and rays are tested against it.
//!
//! The entry point is the [SubdivIntersector][intersector]; it walks
//! either a cached [mini-BVH][cache] or subdivides the patch on the
//! fly, and writes hits back into a lane of a [RayPacket][packet].
//!
//! [rust]: https://www.rust-lang.org
//! [intersector]: accelerators/subdiv/struct.SubdivIntersector.html
//! [cache]: accelerators/subdivcache/struct.SubdivCache.html
//! [packet]: core/raypacket/struct.RayPacket.html

#[macro_use]
extern crate impl_ops;
#[macro_use]
extern crate log;

pub mod accelerators;
pub mod blockqueue;
pub mod core;
pub mod shapes;
