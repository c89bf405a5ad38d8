//! A packet of up to sixteen rays stored as a structure of arrays.
//!
//! One call of the patch intersector processes exactly one lane of a
//! packet. The lane's `t_near`/`t_far` bound the valid segment; on a
//! hit `t_far` is tightened to the hit distance and the hit fields
//! (`u`, `v`, `ng`, `geom_id`, `prim_id`) are written. Occlusion
//! queries only set `terminated`.

// subdiv
use crate::core::common::Float;
use crate::core::geometry::{Normal3f, Point3f, Ray, Vector3f};

pub const RAY_PACKET_SIZE: usize = 16;

/// Marks `geom_id`/`prim_id` of a lane that has not hit anything yet.
pub const INVALID_ID: u32 = std::u32::MAX;

#[derive(Debug, Clone, PartialEq)]
pub struct RayPacket {
    pub org: [Point3f; RAY_PACKET_SIZE],
    pub dir: [Vector3f; RAY_PACKET_SIZE],
    pub t_near: [Float; RAY_PACKET_SIZE],
    pub t_far: [Float; RAY_PACKET_SIZE],
    pub u: [Float; RAY_PACKET_SIZE],
    pub v: [Float; RAY_PACKET_SIZE],
    pub ng: [Normal3f; RAY_PACKET_SIZE],
    pub geom_id: [u32; RAY_PACKET_SIZE],
    pub prim_id: [u32; RAY_PACKET_SIZE],
    pub terminated: [bool; RAY_PACKET_SIZE],
}

impl Default for RayPacket {
    fn default() -> Self {
        RayPacket {
            org: [Point3f::default(); RAY_PACKET_SIZE],
            dir: [Vector3f::default(); RAY_PACKET_SIZE],
            t_near: [0.0 as Float; RAY_PACKET_SIZE],
            t_far: [std::f32::INFINITY; RAY_PACKET_SIZE],
            u: [0.0 as Float; RAY_PACKET_SIZE],
            v: [0.0 as Float; RAY_PACKET_SIZE],
            ng: [Normal3f::default(); RAY_PACKET_SIZE],
            geom_id: [INVALID_ID; RAY_PACKET_SIZE],
            prim_id: [INVALID_ID; RAY_PACKET_SIZE],
            terminated: [false; RAY_PACKET_SIZE],
        }
    }
}

/// Hit record of a single lane.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Hit {
    pub t: Float,
    pub u: Float,
    pub v: Float,
    pub ng: Normal3f,
    pub geom_id: u32,
    pub prim_id: u32,
}

impl RayPacket {
    pub fn new() -> Self {
        RayPacket::default()
    }
    /// Packet with the same ray in every lane.
    pub fn splat(ray: &Ray) -> Self {
        let mut packet: RayPacket = RayPacket::default();
        for lane in 0..RAY_PACKET_SIZE {
            packet.set_ray(lane, ray);
        }
        packet
    }
    /// Loads a ray into a lane and resets the lane's hit state.
    pub fn set_ray(&mut self, lane: usize, ray: &Ray) {
        self.org[lane] = ray.o;
        self.dir[lane] = ray.d;
        self.t_near[lane] = ray.t_min;
        self.t_far[lane] = ray.t_max;
        self.u[lane] = 0.0 as Float;
        self.v[lane] = 0.0 as Float;
        self.ng[lane] = Normal3f::default();
        self.geom_id[lane] = INVALID_ID;
        self.prim_id[lane] = INVALID_ID;
        self.terminated[lane] = false;
    }
    pub fn ray(&self, lane: usize) -> Ray {
        Ray {
            o: self.org[lane],
            d: self.dir[lane],
            t_min: self.t_near[lane],
            t_max: self.t_far[lane],
        }
    }
    /// A lane takes part in traversal while its segment is non-empty
    /// and it has not been terminated by an occlusion query.
    pub fn is_active(&self, lane: usize) -> bool {
        !self.terminated[lane] && self.t_near[lane] <= self.t_far[lane]
    }
    pub fn hit(&self, lane: usize) -> Option<Hit> {
        if self.geom_id[lane] == INVALID_ID {
            return None;
        }
        Some(Hit {
            t: self.t_far[lane],
            u: self.u[lane],
            v: self.v[lane],
            ng: self.ng[lane],
            geom_id: self.geom_id[lane],
            prim_id: self.prim_id[lane],
        })
    }
    /// Writes a hit record into a lane, tightening its far bound.
    pub fn record_hit(&mut self, lane: usize, hit: &Hit) {
        self.t_far[lane] = hit.t;
        self.u[lane] = hit.u;
        self.v[lane] = hit.v;
        self.ng[lane] = hit.ng;
        self.geom_id[lane] = hit.geom_id;
        self.prim_id[lane] = hit.prim_id;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn set_ray_resets_lane() {
        let mut packet: RayPacket = RayPacket::new();
        packet.terminated[3] = true;
        packet.geom_id[3] = 7;
        let ray: Ray = Ray::new(Point3f::new(0.0, 0.0, 5.0), Vector3f::new(0.0, 0.0, -1.0));
        packet.set_ray(3, &ray);
        assert_eq!(packet.ray(3), ray);
        assert!(packet.is_active(3));
        assert!(packet.hit(3).is_none());
    }

    #[test]
    fn record_hit_tightens_far_bound() {
        let mut packet: RayPacket = RayPacket::splat(&Ray::default());
        let hit: Hit = Hit {
            t: 2.5,
            u: 0.25,
            v: 0.75,
            ng: Normal3f {
                x: 0.0,
                y: 0.0,
                z: 1.0,
            },
            geom_id: 1,
            prim_id: 2,
        };
        packet.record_hit(0, &hit);
        assert_eq!(packet.hit(0), Some(hit));
        assert_eq!(packet.t_far[0], 2.5);
        assert!(packet.hit(1).is_none());
    }
}
