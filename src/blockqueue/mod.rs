//! Hands out image tiles to worker threads. Every tile is the 4x4
//! block of pixels whose primary rays fill one **RayPacket**. The
//! order of the tiles is fixed on creation (Morton order, so that
//! neighbouring packets hit the same patches and share cached
//! mini-BVHs); workers pull the next tile through an atomic counter.

// std
use std::sync::atomic::{AtomicUsize, Ordering};
// subdiv
use crate::core::error::{Result, SubdivError};
use crate::core::raypacket::RAY_PACKET_SIZE;

/// Edge length of a tile in pixels.
pub const TILE_SIZE: u32 = 4;

pub struct BlockQueue {
    /// tile coordinates, in the order they are handed out
    blocks: Vec<(u32, u32)>,
    next: AtomicUsize,
}

impl BlockQueue {
    /// Queue of the tiles covering a `res.0 x res.1` image; both sides
    /// must be multiples of [`TILE_SIZE`].
    pub fn new(res: (u32, u32)) -> Result<BlockQueue> {
        if res.0 == 0 || res.1 == 0 || res.0 % TILE_SIZE != 0 || res.1 % TILE_SIZE != 0 {
            return Err(SubdivError::Parameter(format!(
                "resolution={}x{} (sides must be positive multiples of {})",
                res.0, res.1, TILE_SIZE
            )));
        }
        let n_blocks: (u32, u32) = (res.0 / TILE_SIZE, res.1 / TILE_SIZE);
        let mut blocks: Vec<(u32, u32)> = (0..n_blocks.0 * n_blocks.1)
            .map(|i| (i % n_blocks.0, i / n_blocks.0))
            .collect();
        blocks.sort_by_key(|b| morton2(*b));
        Ok(BlockQueue {
            blocks,
            next: AtomicUsize::new(0),
        })
    }
    /// Next tile or None once the queue is drained.
    pub fn next(&self) -> Option<(u32, u32)> {
        let i = self.next.fetch_add(1, Ordering::AcqRel);
        self.blocks.get(i).cloned()
    }
    pub fn len(&self) -> usize {
        self.blocks.len()
    }
    pub fn is_empty(&self) -> bool {
        self.next.load(Ordering::Acquire) >= self.blocks.len()
    }
}

/// Pixel of lane *lane* within tile *block*.
pub fn block_pixel(block: (u32, u32), lane: usize) -> (u32, u32) {
    debug_assert!(lane < RAY_PACKET_SIZE);
    let l: u32 = lane as u32;
    (
        block.0 * TILE_SIZE + l % TILE_SIZE,
        block.1 * TILE_SIZE + l / TILE_SIZE,
    )
}

/// Spreads the low 16 bits of *x* to the even bit positions.
fn part1_by1(mut x: u32) -> u32 {
    x &= 0x0000_ffff;
    x = (x ^ (x << 8)) & 0x00ff_00ff;
    x = (x ^ (x << 4)) & 0x0f0f_0f0f;
    x = (x ^ (x << 2)) & 0x3333_3333;
    (x ^ (x << 1)) & 0x5555_5555
}

fn morton2(p: (u32, u32)) -> u32 {
    (part1_by1(p.1) << 1) + part1_by1(p.0)
}
