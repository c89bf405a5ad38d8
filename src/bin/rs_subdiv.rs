//! Casts orthographic ray packets at a regular, an irregular and a
//! Gregory patch and reports how many rays hit which patch.

// std
use std::process;
// others
use clap::Parser;
use log::warn;
use rayon::prelude::*;
// subdiv
use rs_subdiv::accelerators::subdiv::{SubdivIntersector, SubdivOptions, TraversalStrategy};
use rs_subdiv::blockqueue::{block_pixel, BlockQueue, TILE_SIZE};
use rs_subdiv::core::common::Float;
use rs_subdiv::core::error::Result;
use rs_subdiv::core::geometry::{Point3f, Ray, Vector3f};
use rs_subdiv::core::paramset::ParamSet;
use rs_subdiv::core::raypacket::{RayPacket, RAY_PACKET_SIZE};
use rs_subdiv::shapes::catmullclark::RegularCatmullClarkPatch;
use rs_subdiv::shapes::gregory::GregoryPatch;
use rs_subdiv::shapes::irregular::{CatmullClark1Ring, IrregularCatmullClarkPatch};
use rs_subdiv::shapes::patch::Patch;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// half width of the square viewed by the orthographic camera
const WINDOW: Float = 4.0;

/// Intersect ray packets with subdivision patches.
#[derive(Parser, Debug)]
#[command(version = VERSION, about, long_about = None)]
struct Cli {
    /// use specified number of threads (0 uses all cores)
    #[arg(short = 't', long = "nthreads", default_value_t = 0)]
    nthreads: u8,
    /// tessellation depth of every patch
    #[arg(short = 'l', long = "subdiv-level")]
    subdiv_level: Option<u32>,
    /// image resolution, a multiple of the packet tile size
    #[arg(short = 'r', long = "resolution", default_value_t = 128)]
    resolution: u32,
    /// traversal strategy: auto, cached or direct
    #[arg(short = 's', long = "strategy")]
    strategy: Option<String>,
    /// ignore hits on back faces
    #[arg(long = "culling")]
    culling: bool,
    #[arg(long = "cache-sets")]
    cache_sets: Option<u32>,
    #[arg(long = "cache-ways")]
    cache_ways: Option<u32>,
    /// compare cached and direct traversal for every ray
    #[arg(long = "verify")]
    verify: bool,
    /// additional intersector parameter given as key=value
    #[arg(short = 'p', long = "param")]
    params: Vec<String>,
}

#[derive(Debug, Default, Clone)]
struct TileStats {
    rays: usize,
    hits_per_patch: Vec<usize>,
    depth_sum: f64,
}

impl TileStats {
    fn new(n_patches: usize) -> Self {
        TileStats {
            hits_per_patch: vec![0; n_patches],
            ..Default::default()
        }
    }
    fn add(&mut self, other: &TileStats) {
        self.rays += other.rays;
        for (a, b) in self.hits_per_patch.iter_mut().zip(other.hits_per_patch.iter()) {
            *a += *b;
        }
        self.depth_sum += other.depth_sum;
    }
    fn hits(&self) -> usize {
        self.hits_per_patch.iter().sum()
    }
}

fn make_param_set(args: &Cli) -> Result<ParamSet> {
    let mut ps: ParamSet = ParamSet::default();
    if let Some(level) = args.subdiv_level {
        ps.add_int(String::from("subdivlevel"), level as i32);
    }
    if let Some(strategy) = &args.strategy {
        ps.add_string(String::from("strategy"), strategy.clone());
    }
    if args.culling {
        ps.add_bool(String::from("backfaceculling"), true);
    }
    if let Some(sets) = args.cache_sets {
        ps.add_int(String::from("cachesets"), sets as i32);
    }
    if let Some(ways) = args.cache_ways {
        ps.add_int(String::from("cacheways"), ways as i32);
    }
    for pair in args.params.iter() {
        ps.add_parsed(pair)?;
    }
    Ok(ps)
}

/// Control grid of a bumpy B-spline patch centred at (*x*, 0) whose
/// limit surface spans two units in x and y.
fn bumpy_grid(x: Float) -> RegularCatmullClarkPatch {
    let mut grid: RegularCatmullClarkPatch = RegularCatmullClarkPatch::flat(x - 3.0, x + 3.0, -3.0, 3.0, 0.0);
    for i in 0..4 {
        for j in 0..4 {
            grid.v[i][j].z = ((i + 2 * j) % 3) as Float * 0.6 - 0.6;
        }
    }
    grid
}

fn demo_patches() -> Result<Vec<Patch>> {
    let regular: RegularCatmullClarkPatch = bumpy_grid(-2.5);
    // a fifth face wedged in at the first corner
    let mut irregular: IrregularCatmullClarkPatch = IrregularCatmullClarkPatch::from_regular(&bumpy_grid(0.0));
    let vtx: Point3f = irregular.ring[0].vtx;
    let mut ring: Vec<Point3f> = irregular.ring[0].ring.iter().cloned().collect();
    ring.insert(6, vtx + Vector3f::new(-0.5, -2.9, 0.9));
    ring.insert(6, vtx + Vector3f::new(-0.65, -1.4, 0.3));
    irregular.ring[0] = CatmullClark1Ring::new(vtx, &ring)?;
    let mut gregory: GregoryPatch = GregoryPatch::from_bspline(&bumpy_grid(2.5));
    gregory.f[0][0].z += 0.5;
    gregory.f[1][1].z -= 0.5;
    Ok(vec![
        Patch::Regular(regular),
        Patch::Irregular(irregular),
        Patch::Gregory(gregory),
    ])
}

/// Primary rays of one tile, looking down the z axis.
fn primary_packet(block: (u32, u32), resolution: u32) -> RayPacket {
    let mut packet: RayPacket = RayPacket::new();
    let scale: Float = 2.0 as Float * WINDOW / resolution as Float;
    for lane in 0..RAY_PACKET_SIZE {
        let (px, py) = block_pixel(block, lane);
        let x: Float = -WINDOW + (px as Float + 0.5) * scale;
        let y: Float = WINDOW - (py as Float + 0.5) * scale;
        packet.set_ray(
            lane,
            &Ray::new(Point3f::new(x, y, 10.0), Vector3f::new(0.0, 0.0, -1.0)),
        );
    }
    packet
}

fn trace_tile(isect: &mut SubdivIntersector, patches: &[Patch], block: (u32, u32), resolution: u32) -> TileStats {
    let mut packet: RayPacket = primary_packet(block, resolution);
    for (geom_id, patch) in patches.iter().enumerate() {
        isect.intersect_packet(&mut packet, patch, geom_id as u32, 0);
    }
    let mut stats: TileStats = TileStats::new(patches.len());
    stats.rays = RAY_PACKET_SIZE;
    for lane in 0..RAY_PACKET_SIZE {
        if let Some(hit) = packet.hit(lane) {
            stats.hits_per_patch[hit.geom_id as usize] += 1;
            stats.depth_sum += hit.t as f64;
        }
    }
    stats
}

/// Number of rays for which cached and direct traversal disagree.
fn verify_tile(isect: &mut SubdivIntersector, patches: &[Patch], block: (u32, u32), resolution: u32) -> usize {
    let level: u32 = isect.options.subdiv_level;
    let mut cached: RayPacket = primary_packet(block, resolution);
    let mut direct: RayPacket = cached.clone();
    for (geom_id, patch) in patches.iter().enumerate() {
        for lane in 0..RAY_PACKET_SIZE {
            isect.intersect_with(TraversalStrategy::Cached, &mut cached, lane, patch, geom_id as u32, 0, level);
            isect.intersect_with(TraversalStrategy::Direct, &mut direct, lane, patch, geom_id as u32, 0, level);
        }
    }
    (0..RAY_PACKET_SIZE)
        .filter(|&lane| match (cached.hit(lane), direct.hit(lane)) {
            (None, None) => false,
            (Some(a), Some(b)) => a.geom_id != b.geom_id || (a.t - b.t).abs() > 1e-3 * a.t.max(1.0),
            _ => true,
        })
        .count()
}

fn run(args: Cli) -> Result<()> {
    let ps: ParamSet = make_param_set(&args)?;
    let options: SubdivOptions = SubdivOptions::create(&ps)?;
    let patches: Vec<Patch> = demo_patches()?;
    let queue: BlockQueue = BlockQueue::new((args.resolution, args.resolution))?;
    let num_cores: usize = if args.nthreads == 0_u8 {
        num_cpus::get()
    } else {
        args.nthreads as usize
    };
    // one intersector, and so one cache, per worker
    let mut workers: Vec<SubdivIntersector> = Vec::with_capacity(num_cores);
    for _ in 0..num_cores {
        workers.push(SubdivIntersector::new(options)?);
    }
    println!(
        "Tracing {}x{} rays ({} packets of {}x{}) at level {} with {} thread(s) ...",
        args.resolution,
        args.resolution,
        queue.len(),
        TILE_SIZE,
        TILE_SIZE,
        options.subdiv_level,
        num_cores
    );
    let mut totals: TileStats = TileStats::new(patches.len());
    {
        let scene: &[Patch] = &patches;
        let bq = &queue;
        let resolution: u32 = args.resolution;
        let totals = &mut totals;
        crossbeam::scope(|scope| {
            let (stats_tx, stats_rx) = crossbeam_channel::bounded(num_cores);
            for mut isect in workers.drain(..) {
                let stats_tx = stats_tx.clone();
                scope.spawn(move |_| {
                    while let Some(block) = bq.next() {
                        let stats: TileStats = trace_tile(&mut isect, scene, block, resolution);
                        stats_tx
                            .send(stats)
                            .expect("Failed to send tile statistics");
                    }
                });
            }
            for _ in pbr::PbIter::new(0..bq.len()) {
                let stats: TileStats = stats_rx.recv().unwrap();
                totals.add(&stats);
            }
        })
        .unwrap();
    }
    println!("rays:  {}", totals.rays);
    println!(
        "hits:  {} ({:.1}%)",
        totals.hits(),
        100.0 * totals.hits() as f64 / totals.rays.max(1) as f64
    );
    let names: [&str; 3] = ["regular", "irregular", "gregory"];
    for (name, hits) in names.iter().zip(totals.hits_per_patch.iter()) {
        println!("  {:<10} {}", name, hits);
    }
    if totals.hits() > 0 {
        println!("mean depth: {:.4}", totals.depth_sum / totals.hits() as f64);
    }
    if args.verify {
        let n: u32 = args.resolution / TILE_SIZE;
        let resolution: u32 = args.resolution;
        let scene: &[Patch] = &patches;
        let disagreements: usize = (0..n * n)
            .into_par_iter()
            .map(|i| (i % n, i / n))
            .map_init(
                || SubdivIntersector::new(options).expect("options were validated above"),
                |isect, block| verify_tile(isect, scene, block, resolution),
            )
            .sum();
        if disagreements > 0 {
            warn!(
                "cached and direct traversal disagree for {} of {} rays",
                disagreements, totals.rays
            );
        }
        println!("verify: {} disagreement(s)", disagreements);
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Cli::parse();
    let num_cores = num_cpus::get();
    println!("rs_subdiv version {} [Detected {} cores]", VERSION, num_cores);
    if let Err(e) = run(args) {
        eprintln!("ERROR: {}", e);
        process::exit(1);
    }
}
