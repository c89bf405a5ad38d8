//! Ray intersection with a single subdivision patch.
//!
//! Two traversal strategies produce the same closest hit:
//!
//! - **Cached**: the patch is tessellated once per (geometry, primitive,
//!   level) into a mini-BVH kept in a **SubdivCache**; the tree is
//!   walked with an explicit stack and the leaves evaluate the patch at
//!   the corners of their parameter rectangle.
//! - **Direct**: nothing is stored; the patch is subdivided while the
//!   ray descends, only into the children whose control hull it hits.
//!
//! Cached traversal pays off for patches that are hit by many rays and
//! whose evaluation is cheap (regular and Gregory patches). Irregular
//! patches evaluate by repeated refinement, so by default they use the
//! direct strategy.

// std
use std::fmt;
use std::str::FromStr;
// others
use smallvec::SmallVec;
// subdiv
use crate::accelerators::bvh4::{BVH4Node, BoxQuery, NodeRef};
use crate::accelerators::subdivcache::{CacheEntry, SubdivCache, MAX_CACHED_SUBDIV_LEVEL};
use crate::core::error::{Result, SubdivError};
use crate::core::geometry::Point3f;
use crate::core::paramset::ParamSet;
use crate::core::raypacket::{RayPacket, RAY_PACKET_SIZE};
use crate::shapes::patch::{ParamInterval, Patch};
use crate::shapes::quad::{intersect1_quad, occluded1_quad};

/// Deepest tessellation the intersector accepts.
pub const MAX_SUBDIV_LEVEL: u32 = 12;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TraversalStrategy {
    /// cached for regular and Gregory patches, direct for irregular ones
    Auto,
    Cached,
    Direct,
}

impl Default for TraversalStrategy {
    fn default() -> Self {
        TraversalStrategy::Auto
    }
}

impl TraversalStrategy {
    /// The strategy actually used for *patch* at *level*.
    pub fn resolve(self, patch: &Patch, level: u32) -> TraversalStrategy {
        let strategy: TraversalStrategy = match self {
            TraversalStrategy::Auto => {
                if patch.is_irregular() {
                    TraversalStrategy::Direct
                } else {
                    TraversalStrategy::Cached
                }
            }
            other => other,
        };
        if strategy == TraversalStrategy::Cached && level > MAX_CACHED_SUBDIV_LEVEL {
            debug!(
                "level {} is not cached (max {}), traversing directly",
                level, MAX_CACHED_SUBDIV_LEVEL
            );
            return TraversalStrategy::Direct;
        }
        strategy
    }
}

impl FromStr for TraversalStrategy {
    type Err = SubdivError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(TraversalStrategy::Auto),
            "cached" => Ok(TraversalStrategy::Cached),
            "direct" => Ok(TraversalStrategy::Direct),
            _ => Err(SubdivError::UnknownStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for TraversalStrategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name: &str = match self {
            TraversalStrategy::Auto => "auto",
            TraversalStrategy::Cached => "cached",
            TraversalStrategy::Direct => "direct",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SubdivOptions {
    pub subdiv_level: u32,
    pub strategy: TraversalStrategy,
    pub backface_culling: bool,
    pub cache_sets: usize,
    pub cache_ways: usize,
}

impl Default for SubdivOptions {
    fn default() -> Self {
        SubdivOptions {
            subdiv_level: 3,
            strategy: TraversalStrategy::Auto,
            backface_culling: false,
            cache_sets: 64,
            cache_ways: 4,
        }
    }
}

impl SubdivOptions {
    pub fn create(ps: &ParamSet) -> Result<Self> {
        let defaults: SubdivOptions = SubdivOptions::default();
        let subdiv_level: i32 = ps.find_one_int("subdivlevel", defaults.subdiv_level as i32);
        let strategy_name: String = ps.find_one_string("strategy", defaults.strategy.to_string());
        let backface_culling: bool = ps.find_one_bool("backfaceculling", defaults.backface_culling);
        let cache_sets: i32 = ps.find_one_int("cachesets", defaults.cache_sets as i32);
        let cache_ways: i32 = ps.find_one_int("cacheways", defaults.cache_ways as i32);
        ps.report_unused();
        if subdiv_level < 0 {
            return Err(SubdivError::Parameter(format!("subdivlevel={}", subdiv_level)));
        }
        if cache_sets < 0 || cache_ways < 0 {
            return Err(SubdivError::EmptyCache {
                sets: cache_sets.max(0) as usize,
                ways: cache_ways.max(0) as usize,
            });
        }
        let options: SubdivOptions = SubdivOptions {
            subdiv_level: subdiv_level as u32,
            strategy: strategy_name.parse()?,
            backface_culling,
            cache_sets: cache_sets as usize,
            cache_ways: cache_ways as usize,
        };
        options.validate()?;
        Ok(options)
    }
    pub fn validate(&self) -> Result<()> {
        if self.subdiv_level > MAX_SUBDIV_LEVEL {
            return Err(SubdivError::SubdivLevelTooLarge {
                level: self.subdiv_level,
                max: MAX_SUBDIV_LEVEL,
            });
        }
        if self.cache_sets == 0 || self.cache_ways == 0 {
            return Err(SubdivError::EmptyCache {
                sets: self.cache_sets,
                ways: self.cache_ways,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum HitMode {
    Closest,
    Any,
}

/// Intersects rays with subdivision patches; owns one cache and is
/// meant to be used by one thread at a time.
pub struct SubdivIntersector {
    pub options: SubdivOptions,
    cache: SubdivCache,
}

impl SubdivIntersector {
    pub fn new(options: SubdivOptions) -> Result<Self> {
        options.validate()?;
        let cache: SubdivCache = SubdivCache::new(options.cache_sets, options.cache_ways)?;
        Ok(SubdivIntersector { options, cache })
    }
    pub fn create(ps: &ParamSet) -> Result<Self> {
        SubdivIntersector::new(SubdivOptions::create(ps)?)
    }
    pub fn cache(&self) -> &SubdivCache {
        &self.cache
    }
    pub fn cache_mut(&mut self) -> &mut SubdivCache {
        &mut self.cache
    }
    /// Closest hit of one packet lane with *patch* tessellated
    /// *subdiv_level* times, using the configured strategy. Returns
    /// `true` if the lane was updated.
    pub fn intersect(
        &mut self,
        packet: &mut RayPacket,
        lane: usize,
        patch: &Patch,
        geom_id: u32,
        prim_id: u32,
        subdiv_level: u32,
    ) -> bool {
        let strategy: TraversalStrategy = self.options.strategy;
        self.intersect_with(strategy, packet, lane, patch, geom_id, prim_id, subdiv_level)
    }
    /// Any hit of one packet lane; sets only `terminated`.
    pub fn occluded(
        &mut self,
        packet: &mut RayPacket,
        lane: usize,
        patch: &Patch,
        geom_id: u32,
        prim_id: u32,
        subdiv_level: u32,
    ) -> bool {
        let strategy: TraversalStrategy = self.options.strategy;
        self.occluded_with(strategy, packet, lane, patch, geom_id, prim_id, subdiv_level)
    }
    pub fn intersect_with(
        &mut self,
        strategy: TraversalStrategy,
        packet: &mut RayPacket,
        lane: usize,
        patch: &Patch,
        geom_id: u32,
        prim_id: u32,
        subdiv_level: u32,
    ) -> bool {
        self.traverse(
            HitMode::Closest,
            strategy,
            packet,
            lane,
            patch,
            geom_id,
            prim_id,
            subdiv_level,
        )
    }
    pub fn occluded_with(
        &mut self,
        strategy: TraversalStrategy,
        packet: &mut RayPacket,
        lane: usize,
        patch: &Patch,
        geom_id: u32,
        prim_id: u32,
        subdiv_level: u32,
    ) -> bool {
        self.traverse(
            HitMode::Any,
            strategy,
            packet,
            lane,
            patch,
            geom_id,
            prim_id,
            subdiv_level,
        )
    }
    /// Closest hits of all active lanes at the configured level.
    /// Returns the number of lanes that were updated.
    pub fn intersect_packet(
        &mut self,
        packet: &mut RayPacket,
        patch: &Patch,
        geom_id: u32,
        prim_id: u32,
    ) -> usize {
        let level: u32 = self.options.subdiv_level;
        (0..RAY_PACKET_SIZE)
            .filter(|&lane| self.intersect(packet, lane, patch, geom_id, prim_id, level))
            .count()
    }
    fn traverse(
        &mut self,
        mode: HitMode,
        strategy: TraversalStrategy,
        packet: &mut RayPacket,
        lane: usize,
        patch: &Patch,
        geom_id: u32,
        prim_id: u32,
        subdiv_level: u32,
    ) -> bool {
        if !packet.is_active(lane) {
            return false;
        }
        let level: u32 = if subdiv_level > MAX_SUBDIV_LEVEL {
            debug!(
                "clamping subdivision level {} to {}",
                subdiv_level, MAX_SUBDIV_LEVEL
            );
            MAX_SUBDIV_LEVEL
        } else {
            subdiv_level
        };
        let culling: bool = self.options.backface_culling;
        match strategy.resolve(patch, level) {
            TraversalStrategy::Direct => {
                if patch.bounds().intersect_b(&packet.ray(lane)).is_none() {
                    return false;
                }
                traverse_direct(
                    mode,
                    packet,
                    lane,
                    patch,
                    &ParamInterval::default(),
                    level,
                    geom_id,
                    prim_id,
                    culling,
                )
            }
            _ => {
                let entry: &CacheEntry = self.cache.get_or_build(patch, geom_id, prim_id, level);
                traverse_cached(mode, entry, packet, lane, patch, geom_id, prim_id, culling)
            }
        }
    }
}

fn leaf_test(
    mode: HitMode,
    packet: &mut RayPacket,
    lane: usize,
    quad: &[Point3f; 4],
    interval: &ParamInterval,
    geom_id: u32,
    prim_id: u32,
    culling: bool,
) -> bool {
    match mode {
        HitMode::Closest => intersect1_quad(packet, lane, quad, interval, geom_id, prim_id, culling),
        HitMode::Any => occluded1_quad(packet, lane, quad, culling),
    }
}

/// Walks a cached mini-BVH. The stack starts with an empty sentinel
/// below the root; children are pushed far to near so the nearest one
/// is visited first, and every box test uses the current `t_far`.
fn traverse_cached(
    mode: HitMode,
    entry: &CacheEntry,
    packet: &mut RayPacket,
    lane: usize,
    patch: &Patch,
    geom_id: u32,
    prim_id: u32,
    culling: bool,
) -> bool {
    let mut stack: SmallVec<[NodeRef; 32]> = SmallVec::new();
    stack.push(NodeRef::Empty);
    stack.push(entry.root);
    let mut hit: bool = false;
    while let Some(node_ref) = stack.pop() {
        match node_ref {
            NodeRef::Empty => break,
            NodeRef::Leaf(l) => {
                let interval: &ParamInterval = &entry.uv_interval[l as usize];
                let quad: [Point3f; 4] = patch.eval_corners(interval);
                if leaf_test(mode, packet, lane, &quad, interval, geom_id, prim_id, culling) {
                    if mode == HitMode::Any {
                        return true;
                    }
                    hit = true;
                }
            }
            NodeRef::Node(n) => {
                let node: &BVH4Node = &entry.nodes[n as usize];
                let query: BoxQuery = BoxQuery::from_packet(packet, lane);
                for &(i, _t) in node.hit_children(&query).iter().rev() {
                    stack.push(node.children[i]);
                }
            }
        }
    }
    hit
}

/// Subdivides *patch* while descending. At level zero the quad through
/// the limit corners of the (sub)patch is tested; above it the control
/// hulls of the four children are tested as one node and only the
/// children the ray enters before its current `t_far` are refined.
fn traverse_direct(
    mode: HitMode,
    packet: &mut RayPacket,
    lane: usize,
    patch: &Patch,
    interval: &ParamInterval,
    level: u32,
    geom_id: u32,
    prim_id: u32,
    culling: bool,
) -> bool {
    if level == 0 {
        let quad: [Point3f; 4] = patch.limit_corners();
        return leaf_test(mode, packet, lane, &quad, interval, geom_id, prim_id, culling);
    }
    let children: [Patch; 4] = patch.subdivide();
    let quadrants: [ParamInterval; 4] = interval.quadrants();
    let mut node: BVH4Node = BVH4Node::default();
    for (i, child) in children.iter().enumerate() {
        node.set_bounds(i, &child.bounds());
        node.children[i] = NodeRef::Leaf(i as u32);
    }
    let mut hit: bool = false;
    for &(i, t_enter) in node.hit_children(&BoxQuery::from_packet(packet, lane)).iter() {
        if t_enter > packet.t_far[lane] {
            continue;
        }
        if traverse_direct(
            mode,
            packet,
            lane,
            &children[i],
            &quadrants[i],
            level - 1,
            geom_id,
            prim_id,
            culling,
        ) {
            if mode == HitMode::Any {
                return true;
            }
            hit = true;
        }
    }
    hit
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::common::Float;
    use crate::core::geometry::{Ray, Vector3f};
    use crate::shapes::catmullclark::RegularCatmullClarkPatch;
    use crate::shapes::gregory::GregoryPatch;

    fn flat_patch() -> Patch {
        Patch::Regular(RegularCatmullClarkPatch::flat(-1.5, 1.5, -1.5, 1.5, 0.0))
    }

    fn bumpy_patch() -> Patch {
        let mut grid: RegularCatmullClarkPatch = RegularCatmullClarkPatch::flat(-1.5, 1.5, -1.5, 1.5, 0.0);
        grid.v[1][2].z = 0.4;
        grid.v[2][1].z = -0.3;
        grid.v[2][2].z = 0.2;
        Patch::Regular(grid)
    }

    fn down(x: Float, y: Float) -> RayPacket {
        RayPacket::splat(&Ray::new(Point3f::new(x, y, 5.0), Vector3f::new(0.0, 0.0, -1.0)))
    }

    #[test]
    fn strategy_names_round_trip() {
        for s in [
            TraversalStrategy::Auto,
            TraversalStrategy::Cached,
            TraversalStrategy::Direct,
        ]
        .iter()
        {
            assert_eq!(s.to_string().parse::<TraversalStrategy>(), Ok(*s));
        }
        assert_eq!(
            "bfs".parse::<TraversalStrategy>(),
            Err(SubdivError::UnknownStrategy("bfs".to_string()))
        );
    }

    #[test]
    fn auto_strategy_depends_on_patch_kind_and_level() {
        let regular: Patch = flat_patch();
        assert_eq!(
            TraversalStrategy::Auto.resolve(&regular, 3),
            TraversalStrategy::Cached
        );
        assert_eq!(
            TraversalStrategy::Cached.resolve(&regular, MAX_CACHED_SUBDIV_LEVEL + 1),
            TraversalStrategy::Direct
        );
        if let Patch::Regular(grid) = regular {
            let gregory: Patch = Patch::Gregory(GregoryPatch::from_bspline(&grid));
            assert_eq!(
                TraversalStrategy::Auto.resolve(&gregory, 2),
                TraversalStrategy::Cached
            );
        }
    }

    #[test]
    fn options_are_read_from_parameters() {
        let mut ps: ParamSet = ParamSet::default();
        ps.add_int(String::from("subdivlevel"), 4);
        ps.add_string(String::from("strategy"), String::from("direct"));
        ps.add_bool(String::from("backfaceculling"), true);
        ps.add_int(String::from("cacheways"), 2);
        let options: SubdivOptions = SubdivOptions::create(&ps).unwrap();
        assert_eq!(options.subdiv_level, 4);
        assert_eq!(options.strategy, TraversalStrategy::Direct);
        assert!(options.backface_culling);
        assert_eq!((options.cache_sets, options.cache_ways), (64, 2));
        assert!(ps.unused().is_empty());
    }

    #[test]
    fn bad_options_are_rejected() {
        let mut ps: ParamSet = ParamSet::default();
        ps.add_int(String::from("subdivlevel"), 13);
        assert_eq!(
            SubdivOptions::create(&ps).err(),
            Some(SubdivError::SubdivLevelTooLarge { level: 13, max: 12 })
        );
        let mut ps: ParamSet = ParamSet::default();
        ps.add_string(String::from("strategy"), String::from("fast"));
        assert_eq!(
            SubdivOptions::create(&ps).err(),
            Some(SubdivError::UnknownStrategy(String::from("fast")))
        );
        let options: SubdivOptions = SubdivOptions {
            cache_ways: 0,
            ..Default::default()
        };
        assert!(SubdivIntersector::new(options).is_err());
    }

    #[test]
    fn flat_grid_center_hit_by_both_strategies() {
        let patch: Patch = flat_patch();
        for &strategy in [TraversalStrategy::Cached, TraversalStrategy::Direct].iter() {
            for level in 0..2 {
                let mut isect: SubdivIntersector = SubdivIntersector::new(SubdivOptions::default()).unwrap();
                let mut packet: RayPacket = down(0.0, 0.0);
                assert!(isect.intersect_with(strategy, &mut packet, 0, &patch, 1, 2, level));
                let hit = packet.hit(0).unwrap();
                assert!((hit.t - 5.0).abs() < 1e-4);
                assert!((hit.u - 0.5).abs() < 1e-4 && (hit.v - 0.5).abs() < 1e-4);
                assert!(hit.ng.z > 0.0);
            }
        }
    }

    #[test]
    fn cached_and_direct_agree() {
        let patch: Patch = bumpy_patch();
        let mut isect: SubdivIntersector = SubdivIntersector::new(SubdivOptions::default()).unwrap();
        for &(x, y) in [(0.13, -0.21), (-0.37, 0.29), (0.41, 0.07)].iter() {
            let mut cached: RayPacket = down(x, y);
            let mut direct: RayPacket = down(x, y);
            assert!(isect.intersect_with(TraversalStrategy::Cached, &mut cached, 0, &patch, 0, 0, 3));
            assert!(isect.intersect_with(TraversalStrategy::Direct, &mut direct, 0, &patch, 0, 0, 3));
            assert!((cached.t_far[0] - direct.t_far[0]).abs() < 1e-4);
            assert!((cached.u[0] - direct.u[0]).abs() < 1e-3);
            assert!((cached.v[0] - direct.v[0]).abs() < 1e-3);
        }
        assert!(isect.cache().contains(0, 0, 3));
    }

    #[test]
    fn misses_and_inactive_lanes_leave_the_packet_alone() {
        let patch: Patch = flat_patch();
        let mut isect: SubdivIntersector = SubdivIntersector::new(SubdivOptions::default()).unwrap();
        let mut packet: RayPacket = down(3.0, 0.0);
        packet.terminated[4] = true;
        packet.set_ray(
            5,
            &Ray::new(Point3f::new(0.0, 0.0, 5.0), Vector3f::new(0.0, 0.0, -1.0)),
        );
        packet.t_far[5] = 1.0;
        let before: RayPacket = packet.clone();
        assert!(!isect.intersect(&mut packet, 0, &patch, 0, 0, 2));
        assert!(!isect.occluded(&mut packet, 0, &patch, 0, 0, 2));
        // terminated lane
        packet.org[4] = Point3f::new(0.0, 0.0, 5.0);
        let before_4: RayPacket = packet.clone();
        assert!(!isect.intersect(&mut packet, 4, &patch, 0, 0, 2));
        assert_eq!(packet, before_4);
        packet.org[4] = before.org[4];
        // segment ends before the surface
        assert!(!isect.intersect(&mut packet, 5, &patch, 0, 0, 2));
        assert_eq!(packet, before);
    }

    #[test]
    fn occlusion_sets_only_terminated() {
        let patch: Patch = bumpy_patch();
        let mut isect: SubdivIntersector = SubdivIntersector::new(SubdivOptions::default()).unwrap();
        for &strategy in [TraversalStrategy::Cached, TraversalStrategy::Direct].iter() {
            let mut packet: RayPacket = down(0.1, 0.06);
            let before: RayPacket = packet.clone();
            assert!(isect.occluded_with(strategy, &mut packet, 7, &patch, 0, 0, 3));
            assert!(packet.terminated[7]);
            packet.terminated[7] = false;
            assert_eq!(packet, before);
        }
    }

    #[test]
    fn whole_packet_is_intersected() {
        let patch: Patch = flat_patch();
        let mut isect: SubdivIntersector = SubdivIntersector::new(SubdivOptions::default()).unwrap();
        let mut packet: RayPacket = RayPacket::new();
        for lane in 0..RAY_PACKET_SIZE {
            let x: Float = -0.45 + 0.06 * lane as Float;
            packet.set_ray(
                lane,
                &Ray::new(Point3f::new(x, 0.07, 5.0), Vector3f::new(0.0, 0.0, -1.0)),
            );
        }
        let hits: usize = isect.intersect_packet(&mut packet, &patch, 0, 0);
        assert_eq!(hits, 16);
        for lane in 0..RAY_PACKET_SIZE {
            assert!((packet.t_far[lane] - 5.0).abs() < 1e-4);
        }
    }
}
