use rs_subdiv::accelerators::subdiv::{SubdivIntersector, SubdivOptions, TraversalStrategy};
use rs_subdiv::accelerators::subdivcache::{CacheEntry, SubdivCache};
use rs_subdiv::core::common::Float;
use rs_subdiv::core::geometry::{
    bnd3_expand, pnt3_distancef, pnt3_inside_bnd3, Bounds3f, Point3f, Ray, Vector3f,
};
use rs_subdiv::core::raypacket::RayPacket;
use rs_subdiv::shapes::catmullclark::RegularCatmullClarkPatch;
use rs_subdiv::shapes::gregory::GregoryPatch;
use rs_subdiv::shapes::irregular::{CatmullClark1Ring, IrregularCatmullClarkPatch};
use rs_subdiv::shapes::patch::{ParamInterval, Patch};
use rs_subdiv::shapes::quad::intersect1_quad;

const SAMPLES: [(Float, Float); 6] = [
    (0.0, 0.0),
    (1.0, 0.0),
    (0.3, 0.7),
    (0.5, 0.5),
    (0.9, 0.15),
    (0.0, 1.0),
];

fn flat_grid() -> RegularCatmullClarkPatch {
    RegularCatmullClarkPatch::flat(-1.5, 1.5, -1.5, 1.5, 0.0)
}

fn wavy_grid(amplitude: Float) -> RegularCatmullClarkPatch {
    let mut grid: RegularCatmullClarkPatch = flat_grid();
    for i in 0..4 {
        for j in 0..4 {
            grid.v[i][j].z = ((i + 2 * j) % 3) as Float * amplitude - amplitude;
        }
    }
    grid
}

fn valence5_patch() -> IrregularCatmullClarkPatch {
    let mut patch: IrregularCatmullClarkPatch = IrregularCatmullClarkPatch::from_regular(&wavy_grid(0.3));
    let vtx: Point3f = patch.ring[0].vtx;
    let mut ring: Vec<Point3f> = patch.ring[0].ring.iter().cloned().collect();
    ring.insert(6, vtx + Vector3f::new(-0.25, -1.45, 0.2));
    ring.insert(6, vtx + Vector3f::new(-0.33, -0.7, 0.1));
    patch.ring[0] = CatmullClark1Ring::new(vtx, &ring).unwrap();
    patch
}

fn gregory_patch() -> GregoryPatch {
    let mut patch: GregoryPatch = GregoryPatch::from_bspline(&wavy_grid(0.4));
    patch.f[0][1].z += 0.3;
    patch.f[1][0].z -= 0.2;
    patch
}

fn all_patches() -> Vec<Patch> {
    vec![
        Patch::Regular(wavy_grid(0.5)),
        Patch::Irregular(valence5_patch()),
        Patch::Gregory(gregory_patch()),
    ]
}

fn affine(p: &Point3f) -> Point3f {
    Point3f::new(
        2.0 * p.x + 0.5 * p.y + 1.0,
        -p.y + 0.25 * p.z + 3.0,
        0.5 * p.z - 2.0,
    )
}

fn transform_patch(patch: &Patch) -> Patch {
    match patch {
        Patch::Regular(grid) => {
            let mut out: RegularCatmullClarkPatch = *grid;
            for row in out.v.iter_mut() {
                for p in row.iter_mut() {
                    *p = affine(p);
                }
            }
            Patch::Regular(out)
        }
        Patch::Irregular(irregular) => {
            let mut out: IrregularCatmullClarkPatch = irregular.clone();
            for ring in out.ring.iter_mut() {
                ring.vtx = affine(&ring.vtx);
                for p in ring.ring.iter_mut() {
                    *p = affine(p);
                }
            }
            Patch::Irregular(out)
        }
        Patch::Gregory(gregory) => {
            let mut out: GregoryPatch = *gregory;
            for row in out.v.iter_mut() {
                for p in row.iter_mut() {
                    *p = affine(p);
                }
            }
            for row in out.f.iter_mut() {
                for p in row.iter_mut() {
                    *p = affine(p);
                }
            }
            Patch::Gregory(out)
        }
    }
}

fn down(x: Float, y: Float) -> RayPacket {
    RayPacket::splat(&Ray::new(Point3f::new(x, y, 5.0), Vector3f::new(0.0, 0.0, -1.0)))
}

fn intersector() -> SubdivIntersector {
    SubdivIntersector::new(SubdivOptions::default()).unwrap()
}

#[test]
fn subdivision_commutes_with_affine_maps() {
    for patch in all_patches().iter() {
        let moved: Patch = transform_patch(patch);
        let children: [Patch; 4] = patch.subdivide();
        let moved_children: [Patch; 4] = moved.subdivide();
        for (c, mc) in children.iter().zip(moved_children.iter()) {
            for &(u, v) in SAMPLES.iter() {
                let expected: Point3f = affine(&c.eval(u, v));
                assert!(pnt3_distancef(&mc.eval(u, v), &expected) < 1e-4);
            }
        }
    }
}

#[test]
fn bounds_contain_surface_and_children() {
    for patch in all_patches().iter() {
        let b: Bounds3f = bnd3_expand(&patch.bounds(), 1e-5);
        for &(u, v) in SAMPLES.iter() {
            assert!(pnt3_inside_bnd3(&patch.eval(u, v), &b));
        }
        for child in patch.subdivide().iter() {
            let cb: Bounds3f = bnd3_expand(&child.bounds(), 1e-5);
            for &(u, v) in SAMPLES.iter() {
                let p: Point3f = child.eval(u, v);
                assert!(pnt3_inside_bnd3(&p, &cb));
                assert!(pnt3_inside_bnd3(&p, &b));
            }
        }
    }
}

#[test]
fn cache_entries_are_deterministic() {
    let patch: Patch = Patch::Gregory(gregory_patch());
    let mut a: SubdivCache = SubdivCache::new(16, 2).unwrap();
    let mut b: SubdivCache = SubdivCache::new(4, 1).unwrap();
    let first: CacheEntry = a.get_or_build(&patch, 3, 11, 2).clone();
    let second: CacheEntry = b.get_or_build(&patch, 3, 11, 2).clone();
    assert_eq!(first, second);
    // a hit returns the stored entry unchanged
    assert_eq!(*a.get_or_build(&patch, 3, 11, 2), first);
    // refilling the same slot gives the same tree
    let slot = a.lookup(3, 11, 2);
    assert!(slot.hit);
    assert_eq!(*slot.fill(&patch, &ParamInterval::default()), first);
}

#[test]
fn traversal_finds_the_closest_of_all_leaves() {
    let patch: Patch = Patch::Regular(wavy_grid(1.0));
    let entry: CacheEntry = CacheEntry::build(&patch, &ParamInterval::default(), 3);
    let mut isect: SubdivIntersector = intersector();
    let rays: [Ray; 4] = [
        Ray::new(Point3f::new(-0.9, -0.4, 3.0), Vector3f::new(0.6, 0.17, -1.0)),
        Ray::new(Point3f::new(0.8, 0.7, 2.0), Vector3f::new(-0.7, -0.45, -0.6)),
        Ray::new(Point3f::new(0.11, -0.93, -2.0), Vector3f::new(0.05, 0.6, 1.0)),
        Ray::new(Point3f::new(-0.2, 0.9, 1.5), Vector3f::new(0.12, -0.8, -0.9)),
    ];
    for ray in rays.iter() {
        let mut traversed: RayPacket = RayPacket::splat(ray);
        let hit: bool = isect.intersect_with(TraversalStrategy::Cached, &mut traversed, 0, &patch, 0, 0, 3);
        let mut exhaustive: RayPacket = RayPacket::splat(ray);
        for interval in entry.uv_interval.iter() {
            let quad: [Point3f; 4] = patch.eval_corners(interval);
            intersect1_quad(&mut exhaustive, 0, &quad, interval, 0, 0, false);
        }
        assert_eq!(hit, exhaustive.hit(0).is_some());
        assert_eq!(traversed.t_far[0], exhaustive.t_far[0]);
        if hit {
            assert!((traversed.u[0] - exhaustive.u[0]).abs() < 1e-4);
            assert!((traversed.v[0] - exhaustive.v[0]).abs() < 1e-4);
        }
    }
}

#[test]
fn flat_grid_converges_to_the_center() {
    let patch: Patch = Patch::Regular(flat_grid());
    for &level in [0_u32, 3].iter() {
        let mut isect: SubdivIntersector = intersector();
        let mut packet: RayPacket = down(0.0, 0.0);
        assert!(isect.intersect(&mut packet, 0, &patch, 0, 0, level));
        let hit = packet.hit(0).unwrap();
        assert!((hit.t - 5.0).abs() < 1e-4);
        assert!((hit.u - 0.5).abs() < 1e-4);
        assert!((hit.v - 0.5).abs() < 1e-4);
    }
}

#[test]
fn unit_square_grid_is_hit_at_its_center() {
    let patch: Patch = Patch::Regular(RegularCatmullClarkPatch::flat(-1.0, 1.0, -1.0, 1.0, 0.0));
    for &strategy in [TraversalStrategy::Cached, TraversalStrategy::Direct].iter() {
        for &level in [0_u32, 3].iter() {
            let mut isect: SubdivIntersector = intersector();
            let mut packet: RayPacket = down(0.0, 0.0);
            assert!(isect.intersect_with(strategy, &mut packet, 0, &patch, 0, 0, level));
            let hit = packet.hit(0).unwrap();
            assert!((hit.t - 5.0).abs() < 1e-4);
            assert!((hit.u - 0.5).abs() < 1e-4);
            assert!((hit.v - 0.5).abs() < 1e-4);
            // the opposite direction never reaches the plane
            let up: Ray = Ray::new(Point3f::new(0.0, 0.0, 5.0), Vector3f::new(0.0, 0.0, 1.0));
            let mut away: RayPacket = RayPacket::splat(&up);
            let before: RayPacket = away.clone();
            assert!(!isect.intersect_with(strategy, &mut away, 0, &patch, 0, 0, level));
            assert_eq!(away, before);
        }
    }
}

#[test]
fn occlusion_only_terminates() {
    let mut isect: SubdivIntersector = intersector();
    for (prim_id, patch) in all_patches().iter().enumerate() {
        let mut packet: RayPacket = down(0.13, -0.21);
        let before: RayPacket = packet.clone();
        assert!(isect.occluded(&mut packet, 9, patch, 0, prim_id as u32, 2));
        assert!(packet.terminated[9]);
        packet.terminated[9] = false;
        assert_eq!(packet, before);
    }
}

#[test]
fn misses_leave_the_lane_unmodified() {
    let mut isect: SubdivIntersector = intersector();
    for (prim_id, patch) in all_patches().iter().enumerate() {
        // beside the patch, and pointing away from it
        for ray in [
            Ray::new(Point3f::new(4.0, 0.0, 5.0), Vector3f::new(0.0, 0.0, -1.0)),
            Ray::new(Point3f::new(0.0, 0.0, 5.0), Vector3f::new(0.0, 0.0, 1.0)),
        ]
        .iter()
        {
            let mut packet: RayPacket = RayPacket::splat(ray);
            let before: RayPacket = packet.clone();
            assert!(!isect.intersect(&mut packet, 0, patch, 0, prim_id as u32, 3));
            assert!(!isect.occluded(&mut packet, 0, patch, 0, prim_id as u32, 3));
            assert_eq!(packet, before);
        }
    }
}

#[test]
fn cached_and_direct_strategies_agree() {
    let mut isect: SubdivIntersector = intersector();
    for (prim_id, patch) in all_patches().iter().enumerate() {
        for &(x, y) in [(0.13, -0.21), (-0.37, 0.29), (0.41, 0.07), (-0.06, 0.38)].iter() {
            let mut cached: RayPacket = down(x, y);
            let mut direct: RayPacket = down(x, y);
            assert!(isect.intersect_with(TraversalStrategy::Cached, &mut cached, 0, patch, 0, prim_id as u32, 3));
            assert!(isect.intersect_with(TraversalStrategy::Direct, &mut direct, 0, patch, 0, prim_id as u32, 3));
            assert!((cached.t_far[0] - direct.t_far[0]).abs() < 1e-3);
            assert!((cached.u[0] - direct.u[0]).abs() < 1e-3);
            assert!((cached.v[0] - direct.v[0]).abs() < 1e-3);
        }
        assert!(isect.cache().contains(0, prim_id as u32, 3));
    }
}

#[test]
fn irregular_form_of_a_regular_patch_subdivides_like_it() {
    let grid: RegularCatmullClarkPatch = wavy_grid(0.5);
    let irregular: IrregularCatmullClarkPatch = IrregularCatmullClarkPatch::from_regular(&grid);
    let expected: [RegularCatmullClarkPatch; 4] = grid.subdivide();
    for (child, e) in irregular.subdivide().iter().zip(expected.iter()) {
        match child {
            Patch::Regular(c) => {
                for i in 0..4 {
                    for j in 0..4 {
                        assert!(pnt3_distancef(&c.v[i][j], &e.v[i][j]) < 1e-5);
                    }
                }
            }
            _ => panic!("children of a valence-4 face are regular"),
        }
    }
}

#[test]
fn gregory_form_of_a_bspline_patch_is_hit_identically() {
    let grid: RegularCatmullClarkPatch = wavy_grid(0.5);
    let regular: Patch = Patch::Regular(grid);
    let gregory: Patch = Patch::Gregory(GregoryPatch::from_bspline(&grid));
    let mut isect: SubdivIntersector = intersector();
    for &(x, y) in [(0.13, -0.21), (-0.37, 0.29), (0.41, 0.07)].iter() {
        let mut a: RayPacket = down(x, y);
        let mut b: RayPacket = down(x, y);
        assert!(isect.intersect(&mut a, 0, &regular, 0, 0, 3));
        assert!(isect.intersect(&mut b, 0, &gregory, 0, 1, 3));
        assert!((a.t_far[0] - b.t_far[0]).abs() < 1e-4);
        assert!((a.u[0] - b.u[0]).abs() < 1e-4 && (a.v[0] - b.v[0]).abs() < 1e-4);
    }
}
