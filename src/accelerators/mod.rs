//! Acceleration structures for ray intersection with a single
//! subdivision patch.
//!
//! The mini-BVH of a tessellated patch is a complete four-wide tree
//! (**BVH4Node**). Trees are built on demand and kept in a
//! set-associative **SubdivCache**. **SubdivIntersector** either walks
//! a cached tree or subdivides the patch recursively while it
//! traverses.

pub mod bvh4;
pub mod subdiv;
pub mod subdivcache;
