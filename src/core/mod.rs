//! Shared foundation of the crate: the floating-point type and numeric
//! helpers, geometric primitives, four-wide lane vectors, ray packets,
//! parameter bundles and the error type.

pub mod common;
pub mod error;
pub mod geometry;
pub mod paramset;
pub mod raypacket;
pub mod simd;
