//! Mini-BVHs over tessellated patches and the cache that keeps them.
//!
//! A **CacheEntry** holds the four-wide BVH over the `4^level` quads of
//! one patch tessellated `level` times, together with the parameter
//! rectangle of every leaf. Leaves do not store geometry: the traversal
//! evaluates the patch at the rectangle's corners when it reaches one.
//!
//! The **SubdivCache** maps (geometry id, primitive id, level) to an
//! entry. Keys are hashed to one set of a set-associative table; within
//! a set the first empty way is used, and once all ways are taken they
//! are overwritten round-robin. A different key in a slot is just a
//! miss, never an error.

// std
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
// subdiv
use crate::accelerators::bvh4::{BVH4Node, NodeRef};
use crate::core::error::{Result, SubdivError};
use crate::core::geometry::Bounds3f;
use crate::shapes::patch::{ParamInterval, Patch};

/// Deepest tessellation kept in the cache; deeper requests are
/// intersected without it.
pub const MAX_CACHED_SUBDIV_LEVEL: u32 = 5;

/// Number of inner nodes of a complete four-wide tree with `4^level`
/// leaves.
pub fn nodes_for_level(level: u32) -> usize {
    ((1_usize << (2 * level)) - 1) / 3
}

pub fn leaves_for_level(level: u32) -> usize {
    1_usize << (2 * level)
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub root: NodeRef,
    pub bounds: Bounds3f,
    pub nodes: Vec<BVH4Node>,
    pub uv_interval: Vec<ParamInterval>,
}

impl Default for CacheEntry {
    fn default() -> Self {
        CacheEntry {
            root: NodeRef::Empty,
            bounds: Bounds3f::default(),
            nodes: Vec::new(),
            uv_interval: Vec::new(),
        }
    }
}

impl CacheEntry {
    /// Empty entry with room for a tree of the given level.
    pub fn with_capacity(level: u32) -> Self {
        CacheEntry {
            nodes: Vec::with_capacity(nodes_for_level(level)),
            uv_interval: Vec::with_capacity(leaves_for_level(level)),
            ..Default::default()
        }
    }
    /// Fresh entry for (*patch*, *interval*, *level*).
    pub fn build(patch: &Patch, interval: &ParamInterval, level: u32) -> Self {
        let mut entry: CacheEntry = CacheEntry::with_capacity(level);
        entry.fill(patch, interval, level);
        entry
    }
    /// Rebuilds the entry in place.
    ///
    /// Inner nodes and leaves are numbered breadth first: a worklist
    /// of (node, interval, remaining levels) is processed in order,
    /// every quadrant either becoming a new inner node appended to the
    /// worklist or a leaf whose box is the box of its four evaluated
    /// corners. A final reverse pass writes the union of every inner
    /// node's children into its slot in the parent.
    pub fn fill(&mut self, patch: &Patch, interval: &ParamInterval, level: u32) {
        self.nodes.clear();
        self.uv_interval.clear();
        if level == 0 {
            self.uv_interval.push(*interval);
            self.root = NodeRef::Leaf(0);
            self.bounds = Bounds3f::from_points(&patch.eval_corners(interval));
            return;
        }
        let n_nodes: usize = nodes_for_level(level);
        self.nodes.reserve(n_nodes);
        self.uv_interval.reserve(leaves_for_level(level));
        let mut work: Vec<(u32, ParamInterval, u32)> = Vec::with_capacity(n_nodes);
        self.nodes.push(BVH4Node::default());
        work.push((0_u32, *interval, level));
        let mut head: usize = 0;
        while head < work.len() {
            let (node, iv, remaining) = work[head];
            head += 1;
            for (i, quadrant) in iv.quadrants().iter().enumerate() {
                if remaining == 1 {
                    let leaf: u32 = self.uv_interval.len() as u32;
                    self.uv_interval.push(*quadrant);
                    let b: Bounds3f = Bounds3f::from_points(&patch.eval_corners(quadrant));
                    let n: &mut BVH4Node = &mut self.nodes[node as usize];
                    n.set_bounds(i, &b);
                    n.children[i] = NodeRef::Leaf(leaf);
                } else {
                    let child: u32 = self.nodes.len() as u32;
                    self.nodes.push(BVH4Node::default());
                    self.nodes[node as usize].children[i] = NodeRef::Node(child);
                    work.push((child, *quadrant, remaining - 1));
                }
            }
        }
        // children always come after their parent
        for n in (0..self.nodes.len()).rev() {
            for i in 0..4 {
                if let NodeRef::Node(c) = self.nodes[n].children[i] {
                    let b: Bounds3f = self.nodes[c as usize].union_bounds();
                    self.nodes[n].set_bounds(i, &b);
                }
            }
        }
        self.root = NodeRef::Node(0);
        self.bounds = self.nodes[0].union_bounds();
    }
    pub fn leaf_count(&self) -> usize {
        self.uv_interval.len()
    }
}

/// Key of a cached mini-BVH.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CacheTag {
    pub geom_id: u32,
    pub prim_id: u32,
    pub subdiv_level: u32,
}

/// Result of a lookup: the slot a key maps to, resident or not.
pub struct CacheSlot<'a> {
    pub hit: bool,
    key: CacheTag,
    tag: &'a mut Option<CacheTag>,
    entry: &'a mut CacheEntry,
}

impl<'a> CacheSlot<'a> {
    pub fn key(&self) -> CacheTag {
        self.key
    }
    /// The entry currently stored in the slot (stale on a miss).
    pub fn entry(&self) -> &CacheEntry {
        &*self.entry
    }
    /// Builds the entry for the looked-up key over *interval* of
    /// *patch* and marks the key as resident.
    pub fn fill(self, patch: &Patch, interval: &ParamInterval) -> &'a CacheEntry {
        *self.tag = None;
        self.entry.fill(patch, interval, self.key.subdiv_level);
        *self.tag = Some(self.key);
        self.entry
    }
    pub fn into_entry(self) -> &'a CacheEntry {
        self.entry
    }
}

pub struct SubdivCache {
    sets: usize,
    ways: usize,
    tags: Vec<Option<CacheTag>>,
    entries: Vec<CacheEntry>,
    /// next way to overwrite, per set
    victim: Vec<usize>,
}

impl SubdivCache {
    pub fn new(sets: usize, ways: usize) -> Result<Self> {
        if sets == 0 || ways == 0 {
            return Err(SubdivError::EmptyCache { sets, ways });
        }
        let n: usize = sets * ways;
        let mut entries: Vec<CacheEntry> = Vec::with_capacity(n);
        entries.resize_with(n, CacheEntry::default);
        Ok(SubdivCache {
            sets,
            ways,
            tags: vec![None; n],
            entries,
            victim: vec![0_usize; sets],
        })
    }
    pub fn sets(&self) -> usize {
        self.sets
    }
    pub fn ways(&self) -> usize {
        self.ways
    }
    fn set_index(&self, key: &CacheTag) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.sets as u64) as usize
    }
    /// Maps a key to its slot. On a hit the slot holds the key; on a
    /// miss the slot is the one the key will occupy once filled.
    pub fn lookup(&mut self, geom_id: u32, prim_id: u32, subdiv_level: u32) -> CacheSlot {
        let key: CacheTag = CacheTag {
            geom_id,
            prim_id,
            subdiv_level,
        };
        let set: usize = self.set_index(&key);
        let first: usize = set * self.ways;
        let resident: Option<usize> = self.tags[first..first + self.ways]
            .iter()
            .position(|t| *t == Some(key));
        let (hit, index) = match resident {
            Some(way) => (true, first + way),
            None => {
                let free: Option<usize> = self.tags[first..first + self.ways]
                    .iter()
                    .position(|t| t.is_none());
                let way: usize = match free {
                    Some(way) => way,
                    None => {
                        let way: usize = self.victim[set];
                        self.victim[set] = (way + 1) % self.ways;
                        trace!(
                            "evicting {:?} from set {} for {:?}",
                            self.tags[first + way],
                            set,
                            key
                        );
                        way
                    }
                };
                (false, first + way)
            }
        };
        CacheSlot {
            hit,
            key,
            tag: &mut self.tags[index],
            entry: &mut self.entries[index],
        }
    }
    /// The entry for a key over the whole patch, built on a miss.
    pub fn get_or_build(
        &mut self,
        patch: &Patch,
        geom_id: u32,
        prim_id: u32,
        subdiv_level: u32,
    ) -> &CacheEntry {
        let slot: CacheSlot = self.lookup(geom_id, prim_id, subdiv_level);
        if slot.hit {
            slot.into_entry()
        } else {
            trace!("building mini-BVH for {:?}", slot.key());
            slot.fill(patch, &ParamInterval::default())
        }
    }
    pub fn contains(&self, geom_id: u32, prim_id: u32, subdiv_level: u32) -> bool {
        let key: CacheTag = CacheTag {
            geom_id,
            prim_id,
            subdiv_level,
        };
        let first: usize = self.set_index(&key) * self.ways;
        self.tags[first..first + self.ways].contains(&Some(key))
    }
    /// Forgets every resident key; entry storage is kept for reuse.
    pub fn clear(&mut self) {
        for tag in self.tags.iter_mut() {
            *tag = None;
        }
        for v in self.victim.iter_mut() {
            *v = 0;
        }
    }
}
