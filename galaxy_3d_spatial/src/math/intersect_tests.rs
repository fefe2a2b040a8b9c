use glam::{Quat, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use wide::f32x8;
use crate::math::lanes::ScalarLanes;
use super::*;

fn tri_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (b - a).cross(c - a)
}

/// Triangle in the x = 0 plane, spanning y,z in [-1, 1].
fn wall() -> [Vec3; 3] {
    [
        Vec3::new(0.0, -1.0, -1.0),
        Vec3::new(0.0, 1.0, -1.0),
        Vec3::new(0.0, 0.0, 1.0),
    ]
}

// ============================================================================
// intersect_box_aabb
// ============================================================================

#[test]
fn test_aabb_hit_distance_is_entry() {
    let t = intersect_box_aabb(
        Vec3::new(-10.0, 0.0, 0.0), Vec3::X,
        Vec3::splat(-0.5), Vec3::splat(0.5), 100.0,
    );
    assert!((t.unwrap() - 9.5).abs() < 1e-5);
}

#[test]
fn test_aabb_origin_inside_is_zero() {
    let t = intersect_box_aabb(Vec3::ZERO, Vec3::Y, Vec3::splat(-1.0), Vec3::splat(1.0), 10.0);
    assert_eq!(t, Some(0.0));
}

#[test]
fn test_aabb_behind_origin_misses() {
    let t = intersect_box_aabb(
        Vec3::new(10.0, 0.0, 0.0), Vec3::X,
        Vec3::splat(-0.5), Vec3::splat(0.5), 100.0,
    );
    assert!(t.is_none());
}

#[test]
fn test_aabb_beyond_max_length_misses() {
    let t = intersect_box_aabb(
        Vec3::new(-10.0, 0.0, 0.0), Vec3::X,
        Vec3::splat(-0.5), Vec3::splat(0.5), 5.0,
    );
    assert!(t.is_none());
}

#[test]
fn test_aabb_zero_direction_component_outside_slab_misses() {
    // Ray along X but offset in Y outside the box: the Y axis must not be ignored.
    let t = intersect_box_aabb(
        Vec3::new(-10.0, 2.0, 0.0), Vec3::X,
        Vec3::splat(-0.5), Vec3::splat(0.5), 100.0,
    );
    assert!(t.is_none());
}

#[test]
fn test_aabb_zero_direction_on_slab_boundary_hits() {
    let t = intersect_box_aabb(
        Vec3::new(-10.0, 0.5, 0.0), Vec3::X,
        Vec3::splat(-0.5), Vec3::splat(0.5), 100.0,
    );
    assert!((t.unwrap() - 9.5).abs() < 1e-5);
}

#[test]
fn test_aabb_negative_direction() {
    let t = intersect_box_aabb(
        Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z,
        Vec3::splat(-1.0), Vec3::splat(1.0), 100.0,
    );
    assert!((t.unwrap() - 9.0).abs() < 1e-5);
}

#[test]
fn test_aabb_zero_direction_never_hits_from_outside() {
    let t = intersect_box_aabb(
        Vec3::new(5.0, 0.0, 0.0), Vec3::ZERO,
        Vec3::splat(-1.0), Vec3::splat(1.0), 100.0,
    );
    assert!(t.is_none());
}

// ============================================================================
// intersect_box_obb
// ============================================================================

#[test]
fn test_obb_identity_matches_aabb() {
    let t = intersect_box_obb(
        Vec3::new(-10.0, 0.0, 0.0), Vec3::X,
        Vec3::splat(-0.5), Vec3::splat(0.5),
        Vec3::ZERO, Quat::IDENTITY, Vec3::ONE, 100.0,
    );
    assert!((t.unwrap() - 9.5).abs() < 1e-5);
}

#[test]
fn test_obb_rotated_45_degrees() {
    // Unit cube rotated 45° around Y: its corner points at -X, at distance sqrt(2)/2.
    let t = intersect_box_obb(
        Vec3::new(-10.0, 0.0, 0.0), Vec3::X,
        Vec3::splat(-0.5), Vec3::splat(0.5),
        Vec3::ZERO, Quat::from_rotation_y(std::f32::consts::FRAC_PI_4), Vec3::ONE, 100.0,
    );
    let expected = 10.0 - 0.5 * std::f32::consts::SQRT_2;
    assert!((t.unwrap() - expected).abs() < 1e-4);
}

#[test]
fn test_obb_scale_and_translation() {
    let t = intersect_box_obb(
        Vec3::new(-10.0, 0.0, 0.0), Vec3::X,
        Vec3::splat(-0.5), Vec3::splat(0.5),
        Vec3::new(5.0, 0.0, 0.0), Quat::IDENTITY, Vec3::splat(4.0), 100.0,
    );
    // Box spans x in [3, 7]
    assert!((t.unwrap() - 13.0).abs() < 1e-4);
}

#[test]
fn test_obb_parallel_outside_misses() {
    let t = intersect_box_obb(
        Vec3::new(-10.0, 3.0, 0.0), Vec3::X,
        Vec3::splat(-0.5), Vec3::splat(0.5),
        Vec3::ZERO, Quat::IDENTITY, Vec3::ONE, 100.0,
    );
    assert!(t.is_none());
}

// ============================================================================
// intersect_triangle
// ============================================================================

#[test]
fn test_triangle_hit() {
    let [a, b, c] = wall();
    let hit = intersect_triangle(
        Vec3::new(-5.0, 0.0, 0.0), Vec3::X, a, b, c, tri_normal(a, b, c), 100.0,
    ).unwrap();
    assert!((hit.distance - 5.0).abs() < 1e-5);
    assert!(hit.point.abs_diff_eq(Vec3::ZERO, 1e-5));
}

#[test]
fn test_triangle_hit_with_flipped_normal() {
    let [a, b, c] = wall();
    let hit = intersect_triangle(
        Vec3::new(5.0, 0.0, 0.0), Vec3::NEG_X, a, b, c, -tri_normal(a, b, c), 100.0,
    );
    assert!(hit.is_some());
}

#[test]
fn test_triangle_behind_origin_rejected() {
    let [a, b, c] = wall();
    let hit = intersect_triangle(
        Vec3::new(5.0, 0.0, 0.0), Vec3::X, a, b, c, tri_normal(a, b, c), 100.0,
    );
    assert!(hit.is_none());
}

#[test]
fn test_triangle_beyond_max_length_rejected() {
    let [a, b, c] = wall();
    let hit = intersect_triangle(
        Vec3::new(-5.0, 0.0, 0.0), Vec3::X, a, b, c, tri_normal(a, b, c), 4.0,
    );
    assert!(hit.is_none());
}

#[test]
fn test_triangle_parallel_rejected() {
    let [a, b, c] = wall();
    let hit = intersect_triangle(
        Vec3::new(0.0, -5.0, 0.0), Vec3::Y, a, b, c, tri_normal(a, b, c), 100.0,
    );
    assert!(hit.is_none());
}

#[test]
fn test_triangle_outside_edges_rejected() {
    let [a, b, c] = wall();
    let hit = intersect_triangle(
        Vec3::new(-5.0, 0.9, 0.9), Vec3::X, a, b, c, tri_normal(a, b, c), 100.0,
    );
    assert!(hit.is_none());
}

#[test]
fn test_triangle_degenerate_normal_rejected() {
    let a = Vec3::ZERO;
    let hit = intersect_triangle(Vec3::new(-1.0, 0.0, 0.0), Vec3::X, a, a, a, Vec3::ZERO, 10.0);
    assert!(hit.is_none());
}

// ============================================================================
// barycentric
// ============================================================================

#[test]
fn test_barycentric_vertices_and_centroid() {
    let [a, b, c] = wall();
    assert!(barycentric(a, a, b, c).abs_diff_eq(Vec3::X, 1e-5));
    assert!(barycentric(b, a, b, c).abs_diff_eq(Vec3::Y, 1e-5));
    assert!(barycentric(c, a, b, c).abs_diff_eq(Vec3::Z, 1e-5));
    let centroid = (a + b + c) / 3.0;
    assert!(barycentric(centroid, a, b, c).abs_diff_eq(Vec3::splat(1.0 / 3.0), 1e-5));
}

#[test]
fn test_barycentric_degenerate_triangle() {
    let p = Vec3::ONE;
    assert_eq!(barycentric(Vec3::ZERO, p, p, p), Vec3::X);
}

// ============================================================================
// intersect_triangles_x8
// ============================================================================

#[test]
fn test_packet_padding_lanes_report_infinity() {
    let packet = TrianglePacket::<f32x8>::from_triangles(&[wall()]);
    assert_eq!(packet.len, 1);
    let d = intersect_triangles_x8(Vec3::new(-5.0, 0.0, 0.0), Vec3::X, &packet);
    assert!((d[0] - 5.0).abs() < 1e-5);
    for lane in 1..8 {
        assert_eq!(d[lane], f32::INFINITY, "padding lane {} must not hit", lane);
    }
}

#[test]
fn test_packet_padding_through_origin_still_misses() {
    // The padding triangle sits at the origin; a ray through it must still miss.
    let packet = TrianglePacket::<f32x8>::from_triangles(&[]);
    let d = intersect_triangles_x8(Vec3::new(-1.0, 0.0, 0.0), Vec3::X, &packet);
    assert!(d.iter().all(|t| *t == f32::INFINITY));
}

#[test]
fn test_packet_degenerate_and_behind_lanes() {
    let [a, b, c] = wall();
    let shifted = [a + Vec3::X * 2.0, b + Vec3::X * 2.0, c + Vec3::X * 2.0];
    let behind = [a - Vec3::X * 20.0, b - Vec3::X * 20.0, c - Vec3::X * 20.0];
    let collinear = [Vec3::ZERO, Vec3::Y, Vec3::Y * 2.0];
    let packet = TrianglePacket::<f32x8>::from_triangles(&[wall(), shifted, behind, collinear]);

    let d = intersect_triangles_x8(Vec3::new(-5.0, 0.0, 0.0), Vec3::X, &packet);
    assert!((d[0] - 5.0).abs() < 1e-5);
    assert!((d[1] - 7.0).abs() < 1e-5);
    assert_eq!(d[2], f32::INFINITY);
    assert_eq!(d[3], f32::INFINITY);
    assert!(d.iter().all(|t| !t.is_nan() && *t >= 0.0));
}

#[test]
fn test_packet_parallel_ray_reports_infinity() {
    let packet = TrianglePacket::<f32x8>::from_triangles(&[wall()]);
    let d = intersect_triangles_x8(Vec3::new(0.0, -5.0, 0.0), Vec3::Y, &packet);
    assert_eq!(d[0], f32::INFINITY);
}

#[test]
fn test_packet_extra_triangles_ignored() {
    let tris = vec![wall(); 11];
    let packet = TrianglePacket::<ScalarLanes>::from_triangles(&tris);
    assert_eq!(packet.len, 8);
}

#[test]
fn test_wide_and_scalar_lanes_agree() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..100 {
        let tris: Vec<[Vec3; 3]> = (0..8).map(|_| random_triangle(&mut rng)).collect();
        let origin = random_vec(&mut rng, 3.0);
        let dir = (random_vec(&mut rng, 1.0) - origin).normalize();

        let wide = intersect_triangles_x8(origin, dir, &TrianglePacket::<f32x8>::from_triangles(&tris));
        let scalar = intersect_triangles_x8(origin, dir, &TrianglePacket::<ScalarLanes>::from_triangles(&tris));
        for lane in 0..8 {
            if wide[lane].is_finite() || scalar[lane].is_finite() {
                assert!((wide[lane] - scalar[lane]).abs() < 1e-3,
                    "lane {}: wide {} scalar {}", lane, wide[lane], scalar[lane]);
            }
        }
    }
}

// ============================================================================
// SIMD batch vs scalar plane test, 1000 random pairs
// ============================================================================

fn random_vec(rng: &mut StdRng, r: f32) -> Vec3 {
    Vec3::new(rng.gen_range(-r..r), rng.gen_range(-r..r), rng.gen_range(-r..r))
}

fn random_triangle(rng: &mut StdRng) -> [Vec3; 3] {
    loop {
        let tri = [random_vec(rng, 1.0), random_vec(rng, 1.0), random_vec(rng, 1.0)];
        if tri_normal(tri[0], tri[1], tri[2]).length() > 0.1 {
            return tri;
        }
    }
}

/// True when the pair sits on a numerical knife edge (grazing, edge-touching,
/// or origin on the plane) where two correct algorithms may disagree.
fn is_ambiguous(origin: Vec3, dir: Vec3, [a, b, c]: [Vec3; 3]) -> bool {
    let n = tri_normal(a, b, c).normalize();
    let denom = n.dot(dir);
    if denom.abs() < 1e-3 {
        return true;
    }
    let t = n.dot(a - origin) / denom;
    if t.abs() < 1e-3 {
        return true;
    }
    let w = barycentric(origin + dir * t, a, b, c);
    w.min_element().abs() < 1e-3
}

#[test]
fn test_simd_batch_matches_scalar_triangle_test() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut compared = 0;
    let mut hits = 0;

    for _ in 0..1000 {
        let tri = random_triangle(&mut rng);
        let origin = random_vec(&mut rng, 3.0);
        let target = if rng.gen_bool(0.5) {
            // Aim at an interior point
            let (u, v): (f32, f32) = (rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0));
            let (u, v) = if u + v > 1.0 { (1.0 - u, 1.0 - v) } else { (u, v) };
            tri[0] + (tri[1] - tri[0]) * u + (tri[2] - tri[0]) * v
        } else {
            random_vec(&mut rng, 1.5)
        };
        let dir = (target - origin).normalize_or_zero();
        if dir == Vec3::ZERO || is_ambiguous(origin, dir, tri) {
            continue;
        }

        let [a, b, c] = tri;
        let scalar = intersect_triangle(origin, dir, a, b, c, tri_normal(a, b, c), f32::MAX);
        let packet = TrianglePacket::<f32x8>::from_triangles(&[tri]);
        let simd = intersect_triangles_x8(origin, dir, &packet)[0];

        match scalar {
            Some(hit) => {
                assert!(simd.is_finite(), "scalar hit at {} but SIMD missed", hit.distance);
                assert!((simd - hit.distance).abs() <= 1e-3 * hit.distance.max(1.0),
                    "distance mismatch: scalar {} simd {}", hit.distance, simd);
                hits += 1;
            }
            None => assert_eq!(simd, f32::INFINITY, "scalar missed but SIMD hit at {}", simd),
        }
        compared += 1;
    }

    assert!(compared > 800, "too many ambiguous samples: {}", compared);
    assert!(hits > 200, "too few hits exercised: {}", hits);
}
