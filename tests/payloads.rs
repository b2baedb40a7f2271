//! Payload passthrough and the combine callback.

mod common;

use approx::assert_relative_eq;
use polytess::{ContourOrientation, ContourPoint, Options, Tessellator, Vec3};

fn labeled_square() -> Vec<ContourPoint<f32>> {
    [(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]
        .iter()
        .enumerate()
        .map(|(i, &(x, y))| ContourPoint::new(Vec3::new(x, y, 0.0), i as f32 * 10.0))
        .collect()
}

#[test]
fn payloads_pass_through_unchanged() {
    let mut tess: Tessellator<f32> = Tessellator::new();
    let square = labeled_square();
    tess.add_contour(ContourOrientation::Original, &square).unwrap();
    let out = tess.tessellate(&Options::default(), None).unwrap();

    assert_eq!(out.positions.len(), 4);
    for (pos, payload) in out.positions.iter().zip(&out.payloads) {
        let original = square
            .iter()
            .find(|p| p.pos.distance(*pos) < 1e-6)
            .unwrap();
        assert_relative_eq!(*payload, original.payload);
    }
}

// Bowtie contour whose two long edges cross at (1, 1).
const BOWTIE: [(f32, f32); 4] = [(0.0, 0.0), (2.0, 2.0), (2.0, 0.0), (0.0, 2.0)];

#[test]
fn self_intersection_synthesizes_a_combined_vertex() {
    let mut tess: Tessellator<f32> = Tessellator::new();
    let pts: Vec<ContourPoint<f32>> = BOWTIE
        .iter()
        .map(|&(x, y)| ContourPoint::new(Vec3::new(x, y, 0.0), 7.0))
        .collect();
    tess.add_contour(ContourOrientation::Original, &pts).unwrap();

    fn combine(pos: Vec3, payloads: [Option<&f32>; 4], weights: [f32; 4]) -> f32 {
        // The synthesized vertex sits at the crossing with four sources.
        assert_relative_eq!(pos.x, 1.0, epsilon = 1e-4);
        assert_relative_eq!(pos.y, 1.0, epsilon = 1e-4);
        assert!(payloads.iter().all(|p| p.is_some()));
        payloads
            .iter()
            .zip(&weights)
            .filter_map(|(p, w)| p.map(|v| v * w))
            .sum()
    }
    let out = tess
        .tessellate(&Options::default(), Some(&combine))
        .unwrap();

    let crossing = out
        .positions
        .iter()
        .position(|p| p.distance(Vec3::new(1.0, 1.0, 0.0)) < 1e-4)
        .expect("crossing vertex in output");
    // All sources carry 7 and the weights sum to one.
    assert_relative_eq!(out.payloads[crossing], 7.0, epsilon = 1e-4);

    // Two mirrored triangles of unit area.
    let area: f32 = out
        .triangles()
        .map(|t| {
            let a = out.positions[t[0] as usize];
            let b = out.positions[t[1] as usize];
            let c = out.positions[t[2] as usize];
            ((b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)).abs() * 0.5
        })
        .sum();
    assert_relative_eq!(area, 2.0, epsilon = 1e-3);
}

#[test]
fn coincident_vertices_merge_through_the_callback() {
    let mut tess: Tessellator<f32> = Tessellator::new();
    // Two squares sharing the corner (2, 2) exactly.
    let a = [(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)];
    let b = [(2.0, 2.0), (4.0, 2.0), (4.0, 4.0), (2.0, 4.0)];
    for (contour, tag) in [(a, 1.0f32), (b, 3.0)] {
        let pts: Vec<ContourPoint<f32>> = contour
            .iter()
            .map(|&(x, y)| ContourPoint::new(Vec3::new(x, y, 0.0), tag))
            .collect();
        tess.add_contour(ContourOrientation::Original, &pts).unwrap();
    }

    fn combine(_pos: Vec3, payloads: [Option<&f32>; 4], weights: [f32; 4]) -> f32 {
        // A merge blends exactly two sources, half and half.
        assert!(payloads[0].is_some() && payloads[1].is_some());
        assert!(payloads[2].is_none() && payloads[3].is_none());
        assert_eq!(weights, [0.5, 0.5, 0.0, 0.0]);
        payloads
            .iter()
            .zip(&weights)
            .filter_map(|(p, w)| p.map(|v| v * w))
            .sum()
    }
    let out = tess
        .tessellate(&Options::default(), Some(&combine))
        .unwrap();

    let merged = out
        .positions
        .iter()
        .position(|p| p.distance(Vec3::new(2.0, 2.0, 0.0)) < 1e-6)
        .expect("shared corner in output");
    assert_relative_eq!(out.payloads[merged], 2.0, epsilon = 1e-6);
}

#[test]
fn synthesized_vertex_defaults_without_callback() {
    let mut tess: Tessellator<f32> = Tessellator::new();
    let pts: Vec<ContourPoint<f32>> = BOWTIE
        .iter()
        .map(|&(x, y)| ContourPoint::new(Vec3::new(x, y, 0.0), 7.0))
        .collect();
    tess.add_contour(ContourOrientation::Original, &pts).unwrap();
    let out = tess.tessellate(&Options::default(), None).unwrap();

    let crossing = out
        .positions
        .iter()
        .position(|p| p.distance(Vec3::new(1.0, 1.0, 0.0)) < 1e-4)
        .expect("crossing vertex in output");
    assert_relative_eq!(out.payloads[crossing], 0.0);
}
