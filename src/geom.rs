//! Geometric predicates on sweep-plane coordinates.
//!
//! Every vertex is projected onto a 2D sweep plane before the sweep runs;
//! these functions only ever see the projected `(s, t)` pair. The sweep
//! direction is `s`, with `t` breaking ties, and the `trans_*` variants are
//! the same predicates with the two axes swapped.

/// Coordinate scalar used throughout the crate. Single precision, matching
/// the precision the intersection clamping in [`edge_intersect`] assumes.
pub type Real = f32;

/// A point in sweep-plane coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct Pt {
    pub s: Real,
    pub t: Real,
}

impl Pt {
    #[inline]
    pub fn new(s: Real, t: Real) -> Self {
        Pt { s, t }
    }
}

/// Lexicographic order along the sweep: `s` first, then `t`.
/// This is the total order that drives event processing; the only ties are
/// exact `(s, t)` equality.
#[inline]
pub fn vert_leq(u: Pt, v: Pt) -> bool {
    u.s < v.s || (u.s == v.s && u.t <= v.t)
}

/// Exact coordinate equality.
#[inline]
pub fn vert_eq(u: Pt, v: Pt) -> bool {
    u.s == v.s && u.t == v.t
}

/// [`vert_leq`] with the axes transposed.
#[inline]
pub fn trans_leq(u: Pt, v: Pt) -> bool {
    u.t < v.t || (u.t == v.t && u.s <= v.s)
}

/// Given `vert_leq(u, v)` and `vert_leq(v, w)`, evaluates the signed
/// t-distance from `v` to the line `uw` at `v.s`. Returns zero when `uw`
/// is vertical. The two-sided gap formulation keeps the result stable even
/// when `v.s` sits very close to one endpoint.
pub fn edge_eval(u: Pt, v: Pt, w: Pt) -> Real {
    debug_assert!(vert_leq(u, v) && vert_leq(v, w));
    let gap_l = v.s - u.s;
    let gap_r = w.s - v.s;
    if gap_l + gap_r > 0.0 {
        if gap_l < gap_r {
            (v.t - u.t) + (u.t - w.t) * (gap_l / (gap_l + gap_r))
        } else {
            (v.t - w.t) + (w.t - u.t) * (gap_r / (gap_l + gap_r))
        }
    } else {
        0.0
    }
}

/// Sign of [`edge_eval`]. Routed through the full evaluation rather than
/// the cheaper cross product, which loses accuracy for edges with
/// nearly-equal s-coordinates.
#[inline]
pub fn edge_sign(u: Pt, v: Pt, w: Pt) -> Real {
    edge_eval(u, v, w)
}

/// [`edge_eval`] with the axes transposed.
pub fn trans_eval(u: Pt, v: Pt, w: Pt) -> Real {
    debug_assert!(trans_leq(u, v) && trans_leq(v, w));
    let gap_l = v.t - u.t;
    let gap_r = w.t - v.t;
    if gap_l + gap_r > 0.0 {
        if gap_l < gap_r {
            (v.s - u.s) + (u.s - w.s) * (gap_l / (gap_l + gap_r))
        } else {
            (v.s - w.s) + (w.s - u.s) * (gap_r / (gap_l + gap_r))
        }
    } else {
        0.0
    }
}

/// Sign of [`trans_eval`], computed without the division.
pub fn trans_sign(u: Pt, v: Pt, w: Pt) -> Real {
    debug_assert!(trans_leq(u, v) && trans_leq(v, w));
    let gap_l = v.t - u.t;
    let gap_r = w.t - v.t;
    if gap_l + gap_r > 0.0 {
        (v.s - w.s) * gap_l + (v.s - u.s) * gap_r
    } else {
        0.0
    }
}

/// True when `u`, `v`, `w` wind counter-clockwise (colinear counts as CCW).
#[inline]
pub fn vert_ccw(u: Pt, v: Pt, w: Pt) -> bool {
    u.s * (v.t - w.t) + v.s * (w.t - u.t) + w.s * (u.t - v.t) >= 0.0
}

/// L1 distance between two sweep points.
#[inline]
pub fn l1_dist(u: Pt, v: Pt) -> Real {
    (u.s - v.s).abs() + (u.t - v.t).abs()
}

/// Weighted interpolation `(b*x + a*y) / (a + b)` with negative weights
/// clamped to zero and the `a == b == 0` case defined as the midpoint.
/// The result always lies in `[min(x, y), max(x, y)]`, even under round-off,
/// which is what keeps computed intersections inside their segments.
#[inline]
pub fn interpolate(mut a: Real, x: Real, mut b: Real, y: Real) -> Real {
    a = a.max(0.0);
    b = b.max(0.0);
    if a <= b {
        if b == 0.0 {
            x / 2.0 + y / 2.0
        } else {
            x + (y - x) * (a / (a + b))
        }
    } else {
        y + (x - y) * (b / (a + b))
    }
}

/// Intersection of segments `o1-d1` and `o2-d2`.
///
/// Each output coordinate is interpolated separately, using whichever pair
/// of "middle" endpoints brackets the true intersection under the order for
/// that axis ([`vert_leq`] for `s`, [`trans_leq`] for `t`). This dual-axis
/// scheme is what makes the result provably fall inside the bounding
/// rectangle of both segments, which a naive determinant solve does not
/// guarantee under floating round-off.
pub fn edge_intersect(o1: Pt, d1: Pt, o2: Pt, d2: Pt) -> Pt {
    use core::mem::swap;

    // s-coordinate, ordered by vert_leq.
    let (mut a, mut b, mut c, mut d) = (o1, d1, o2, d2);
    if !vert_leq(a, b) {
        swap(&mut a, &mut b);
    }
    if !vert_leq(c, d) {
        swap(&mut c, &mut d);
    }
    if !vert_leq(a, c) {
        swap(&mut a, &mut c);
        swap(&mut b, &mut d);
    }
    let s = if !vert_leq(c, b) {
        // Disjoint along s; meet halfway between the inner endpoints.
        c.s / 2.0 + b.s / 2.0
    } else if vert_leq(b, d) {
        let mut z1 = edge_eval(a, c, b);
        let mut z2 = edge_eval(c, b, d);
        if z1 + z2 < 0.0 {
            z1 = -z1;
            z2 = -z2;
        }
        interpolate(z1, c.s, z2, b.s)
    } else {
        let mut z1 = edge_sign(a, c, b);
        let mut z2 = -edge_sign(a, d, b);
        if z1 + z2 < 0.0 {
            z1 = -z1;
            z2 = -z2;
        }
        interpolate(z1, c.s, z2, d.s)
    };

    // t-coordinate, same construction under the transposed order.
    let (mut a, mut b, mut c, mut d) = (o1, d1, o2, d2);
    if !trans_leq(a, b) {
        swap(&mut a, &mut b);
    }
    if !trans_leq(c, d) {
        swap(&mut c, &mut d);
    }
    if !trans_leq(a, c) {
        swap(&mut a, &mut c);
        swap(&mut b, &mut d);
    }
    let t = if !trans_leq(c, b) {
        c.t / 2.0 + b.t / 2.0
    } else if trans_leq(b, d) {
        let mut z1 = trans_eval(a, c, b);
        let mut z2 = trans_eval(c, b, d);
        if z1 + z2 < 0.0 {
            z1 = -z1;
            z2 = -z2;
        }
        interpolate(z1, c.t, z2, b.t)
    } else {
        let mut z1 = trans_sign(a, c, b);
        let mut z2 = -trans_sign(a, d, b);
        if z1 + z2 < 0.0 {
            z1 = -z1;
            z2 = -z2;
        }
        interpolate(z1, c.t, z2, d.t)
    };

    Pt::new(s, t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(s: Real, t: Real) -> Pt {
        Pt::new(s, t)
    }

    #[test]
    fn vert_order() {
        assert!(vert_leq(p(0.0, 0.0), p(1.0, 0.0)));
        assert!(vert_leq(p(0.0, 0.0), p(0.0, 1.0)));
        assert!(vert_leq(p(0.0, 0.0), p(0.0, 0.0)));
        assert!(!vert_leq(p(1.0, 0.0), p(0.0, 0.0)));
    }

    #[test]
    fn trans_order_swaps_axes() {
        assert!(trans_leq(p(0.0, 0.0), p(0.0, 1.0)));
        assert!(trans_leq(p(1.0, 0.0), p(0.0, 1.0)));
        assert!(!trans_leq(p(0.0, 1.0), p(0.0, 0.0)));
    }

    #[test]
    fn edge_eval_measures_distance_to_chord() {
        // Chord from (0,0) to (1,0); the point (0.5,1) sits one unit above.
        let r = edge_eval(p(0.0, 0.0), p(0.5, 1.0), p(1.0, 0.0));
        assert_relative_eq!(r, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn edge_eval_vertical_chord_is_zero() {
        assert_eq!(edge_eval(p(0.0, 0.0), p(0.0, 0.5), p(0.0, 1.0)), 0.0);
    }

    #[test]
    fn ccw_orientation() {
        assert!(vert_ccw(p(0.0, 0.0), p(1.0, 0.0), p(0.5, 1.0)));
        assert!(!vert_ccw(p(0.0, 0.0), p(0.5, 1.0), p(1.0, 0.0)));
    }

    #[test]
    fn interpolate_midpoint_and_weights() {
        assert_relative_eq!(interpolate(0.0, 0.0, 0.0, 1.0), 0.5);
        assert_relative_eq!(interpolate(1.0, 0.0, 1.0, 2.0), 1.0);
        // Negative weights clamp instead of extrapolating.
        let r = interpolate(-1.0, 3.0, 1.0, 5.0);
        assert!((3.0..=5.0).contains(&r));
    }

    #[test]
    fn crossing_diagonals_meet_in_the_middle() {
        let i = edge_intersect(p(0.0, 0.0), p(1.0, 1.0), p(0.0, 1.0), p(1.0, 0.0));
        assert_relative_eq!(i.s, 0.5, epsilon = 1e-5);
        assert_relative_eq!(i.t, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn intersection_stays_in_both_boxes() {
        let o1 = p(-3.0, 0.25);
        let d1 = p(4.0, -1.5);
        let o2 = p(-1.0, -4.0);
        let d2 = p(0.5, 6.0);
        let i = edge_intersect(o1, d1, o2, d2);
        assert!(i.s >= o1.s.min(d1.s) && i.s <= o1.s.max(d1.s));
        assert!(i.s >= o2.s.min(d2.s) && i.s <= o2.s.max(d2.s));
        assert!(i.t >= o1.t.min(d1.t) && i.t <= o1.t.max(d1.t));
        assert!(i.t >= o2.t.min(d2.t) && i.t <= o2.t.max(d2.t));
    }
}
