//! Face classification under each winding rule.

mod common;

use approx::assert_relative_eq;
use common::{points, tessellate, total_area};
use polytess::{ContourOrientation, Options, Tessellator, Vec3, WindingRule};

const SQUARE: [(f32, f32); 4] = [(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)];
const OFFSET_SQUARE: [(f32, f32); 4] = [(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0)];

fn options(rule: WindingRule) -> Options {
    Options {
        winding_rule: rule,
        ..Options::default()
    }
}

#[test]
fn even_odd_excludes_double_cover() {
    // Two unit-offset 2x2 squares overlap in a 1x1 region, which even-odd
    // carves out: 4 + 4 - 2*1.
    let out = tessellate(&[&SQUARE, &OFFSET_SQUARE], &options(WindingRule::EvenOdd));
    assert_relative_eq!(total_area(&out), 6.0, epsilon = 1e-3);
}

#[test]
fn non_zero_keeps_double_cover() {
    let out = tessellate(&[&SQUARE, &OFFSET_SQUARE], &options(WindingRule::NonZero));
    assert_relative_eq!(total_area(&out), 7.0, epsilon = 1e-3);
}

#[test]
fn abs_geq_two_keeps_only_the_overlap() {
    let out = tessellate(&[&SQUARE, &OFFSET_SQUARE], &options(WindingRule::AbsGeqTwo));
    assert_relative_eq!(total_area(&out), 1.0, epsilon = 1e-3);
}

#[test]
fn even_odd_hole_from_same_orientation() {
    let outer = [(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)];
    let inner = [(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0)];
    let out = tessellate(&[&outer, &inner], &options(WindingRule::EvenOdd));
    assert_relative_eq!(total_area(&out), 12.0, epsilon = 1e-3);
}

#[test]
fn non_zero_hole_needs_reversed_inner() {
    let outer = [(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)];
    // Inner contour wound clockwise cancels the outer winding.
    let inner = [(1.0, 1.0), (1.0, 3.0), (3.0, 3.0), (3.0, 1.0)];
    let out = tessellate(&[&outer, &inner], &options(WindingRule::NonZero));
    assert_relative_eq!(total_area(&out), 12.0, epsilon = 1e-3);
}

#[test]
fn positive_rule_respects_contour_direction() {
    // An explicit normal pins the sweep basis; the automatic one would
    // re-orient the projection so total signed area comes out positive.
    let pinned = |rule| Options {
        normal: Some(Vec3::Z),
        ..options(rule)
    };

    // Clockwise input has winding -1 everywhere.
    let cw = [(0.0, 0.0), (0.0, 2.0), (2.0, 2.0), (2.0, 0.0)];
    let out = tessellate(&[&cw], &pinned(WindingRule::Positive));
    assert_eq!(out.element_count, 0);

    let out = tessellate(&[&cw], &pinned(WindingRule::Negative));
    assert_relative_eq!(total_area(&out), 4.0, epsilon = 1e-3);
}

#[test]
fn forced_orientation_overrides_input_direction() {
    let cw = [(0.0, 0.0), (0.0, 2.0), (2.0, 2.0), (2.0, 0.0)];
    let mut tess: Tessellator<()> = Tessellator::new();
    tess.add_contour(ContourOrientation::CounterClockwise, &points(&cw))
        .unwrap();
    let opts = Options {
        normal: Some(Vec3::Z),
        ..options(WindingRule::Positive)
    };
    let out = tess.tessellate(&opts, None).unwrap();
    assert_relative_eq!(total_area(&out), 4.0, epsilon = 1e-3);
}
