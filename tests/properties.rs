//! Randomized properties of the predicates and the tessellator.

mod common;

use common::{tessellate, total_area};
use polytess::geom::{edge_intersect, vert_leq, Pt};
use polytess::{ContourOrientation, ContourPoint, ElementType, Options, Tessellator};
use proptest::prelude::*;

fn pt() -> impl Strategy<Value = Pt> {
    (-100.0f32..100.0, -100.0f32..100.0).prop_map(|(s, t)| Pt::new(s, t))
}

proptest! {
    #[test]
    fn sweep_order_is_total(a in pt(), b in pt()) {
        prop_assert!(vert_leq(a, b) || vert_leq(b, a));
        if vert_leq(a, b) && vert_leq(b, a) {
            prop_assert_eq!(a, b);
        }
    }

    #[test]
    fn sweep_order_is_transitive(a in pt(), b in pt(), c in pt()) {
        let mut v = [a, b, c];
        v.sort_by(|&x, &y| {
            if vert_leq(x, y) { std::cmp::Ordering::Less } else { std::cmp::Ordering::Greater }
        });
        prop_assert!(vert_leq(v[0], v[1]) && vert_leq(v[1], v[2]) && vert_leq(v[0], v[2]));
    }

    #[test]
    fn intersection_stays_inside_both_boxes(o1 in pt(), d1 in pt(), o2 in pt(), d2 in pt()) {
        // Only properly crossing segments; for disjoint ones the result
        // is a point between them, not inside either box.
        fn cross(a: Pt, b: Pt, c: Pt) -> f32 {
            (b.s - a.s) * (c.t - a.t) - (b.t - a.t) * (c.s - a.s)
        }
        prop_assume!(cross(o1, d1, o2) * cross(o1, d1, d2) < 0.0);
        prop_assume!(cross(o2, d2, o1) * cross(o2, d2, d1) < 0.0);

        let i = edge_intersect(o1, d1, o2, d2);
        prop_assert!(i.s >= o1.s.min(d1.s) - 1e-3 && i.s <= o1.s.max(d1.s) + 1e-3);
        prop_assert!(i.s >= o2.s.min(d2.s) - 1e-3 && i.s <= o2.s.max(d2.s) + 1e-3);
        prop_assert!(i.t >= o1.t.min(d1.t) - 1e-3 && i.t <= o1.t.max(d1.t) + 1e-3);
        prop_assert!(i.t >= o2.t.min(d2.t) - 1e-3 && i.t <= o2.t.max(d2.t) + 1e-3);
    }

    #[test]
    fn convex_ngon_yields_n_minus_two_triangles(
        n in 3usize..12,
        radius in 0.5f32..100.0,
        cx in -50.0f32..50.0,
        cy in -50.0f32..50.0,
    ) {
        let pts: Vec<(f32, f32)> = (0..n)
            .map(|i| {
                let a = i as f32 / n as f32 * std::f32::consts::TAU;
                (cx + radius * a.cos(), cy + radius * a.sin())
            })
            .collect();
        let out = tessellate(&[&pts], &Options::default());
        prop_assert_eq!(out.element_count, n - 2);
        prop_assert_eq!(out.positions.len(), n);

        // Same input, same result.
        let again = tessellate(&[&pts], &Options::default());
        prop_assert_eq!(again.element_count, out.element_count);
        prop_assert_eq!(again.positions.len(), out.positions.len());

        // Triangulation covers the polygon exactly.
        let mut shoelace = 0.0;
        for i in 0..n {
            let (x0, y0) = pts[i];
            let (x1, y1) = pts[(i + 1) % n];
            shoelace += x0 * y1 - x1 * y0;
        }
        let expected = shoelace.abs() * 0.5;
        prop_assert!((total_area(&out) - expected).abs() <= expected * 1e-3 + 1e-3);
    }

    #[test]
    fn boundary_output_retessellates_to_the_same_area(
        x0 in -40.0f32..0.0, y0 in -40.0f32..0.0,
        w0 in 1.0f32..40.0, h0 in 1.0f32..40.0,
        x1 in -40.0f32..0.0, y1 in -40.0f32..0.0,
        w1 in 1.0f32..40.0, h1 in 1.0f32..40.0,
    ) {
        let r0 = [(x0, y0), (x0 + w0, y0), (x0 + w0, y0 + h0), (x0, y0 + h0)];
        let r1 = [(x1, y1), (x1 + w1, y1), (x1 + w1, y1 + h1), (x1, y1 + h1)];
        let triangles = Options::default();
        let area = total_area(&tessellate(&[&r0, &r1], &triangles));

        let boundary = Options {
            element_type: ElementType::BoundaryContours,
            ..Options::default()
        };
        let contours = tessellate(&[&r0, &r1], &boundary);

        // Feeding the boundary back in covers the same region.
        let mut tess: Tessellator<()> = Tessellator::new();
        for (start, count) in contours.contour_ranges() {
            let pts: Vec<ContourPoint<()>> = contours.positions[start..start + count]
                .iter()
                .map(|p| ContourPoint::from_xy(p.x, p.y))
                .collect();
            tess.add_contour(ContourOrientation::Original, &pts).unwrap();
        }
        let again = tess.tessellate(&triangles, None).unwrap();
        prop_assert!((total_area(&again) - area).abs() <= area * 1e-2 + 1e-2);
    }
}
