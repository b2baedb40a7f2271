//! Public tessellation API.
//!
//! A [`Tessellator`] accumulates contours, projects them onto a 2D sweep
//! plane, runs the sweep to resolve self-intersections and classify
//! interior faces under a [`WindingRule`], and emits triangles, convex
//! polygons, or boundary contours as a [`Tessellation`].

use glam::Vec3;
use tracing::debug;

use crate::geom::{Pt, Real};
use crate::mesh::{sym, Mesh, E_HEAD, NIL, V_HEAD};
use crate::output::{self, Tessellation};
use crate::sweep::SweepState;

/// Largest coordinate magnitude accepted by [`Tessellator::add_contour`].
/// Beyond 2^24 consecutive `f32` values are more than one unit apart and
/// the intersection arithmetic degrades; halving that leaves headroom for
/// the intermediate sums.
pub const MAX_COORD: Real = 8_388_608.0;

/// Classifies a face from the signed number of contour crossings on any
/// path from the face to infinity.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WindingRule {
    EvenOdd,
    NonZero,
    Positive,
    Negative,
    AbsGeqTwo,
}

impl WindingRule {
    #[inline]
    pub fn is_inside(self, winding: i32) -> bool {
        match self {
            WindingRule::EvenOdd => winding & 1 != 0,
            WindingRule::NonZero => winding != 0,
            WindingRule::Positive => winding > 0,
            WindingRule::Negative => winding < 0,
            WindingRule::AbsGeqTwo => winding >= 2 || winding <= -2,
        }
    }
}

/// Shape of the element list in the output.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ElementType {
    /// Fixed-size index tuples, padded with [`crate::UNDEF`].
    Polygons,
    /// Like [`Self::Polygons`], with a second tuple per element holding
    /// the neighboring element across each edge.
    ConnectedPolygons,
    /// `(start, count)` vertex ranges, one per boundary loop.
    BoundaryContours,
}

/// How to treat the vertex order of an incoming contour.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum ContourOrientation {
    /// Take the contour as given.
    #[default]
    Original,
    /// Force a counter-clockwise winding contribution.
    CounterClockwise,
    /// Force a clockwise winding contribution.
    Clockwise,
}

/// One input vertex: a position and the payload carried through the
/// tessellation. Payloads survive unchanged on original vertices; merged
/// and synthesized vertices go through the combine callback.
#[derive(Clone, Debug)]
pub struct ContourPoint<A> {
    pub pos: Vec3,
    pub payload: A,
}

impl<A> ContourPoint<A> {
    #[inline]
    pub fn new(pos: Vec3, payload: A) -> Self {
        ContourPoint { pos, payload }
    }
}

impl<A: Default> ContourPoint<A> {
    /// Planar point with a default payload.
    #[inline]
    pub fn from_xy(x: Real, y: Real) -> Self {
        ContourPoint {
            pos: Vec3::new(x, y, 0.0),
            payload: A::default(),
        }
    }
}

/// Merges payloads when vertices coincide or edges intersect. Receives
/// the interpolated position, up to four source payloads, and their
/// weights (summing to one over the `Some` entries).
pub type CombineFn<A> = dyn Fn(Vec3, [Option<&A>; 4], [Real; 4]) -> A;

#[derive(Clone, Debug)]
pub struct Options {
    pub winding_rule: WindingRule,
    pub element_type: ElementType,
    /// Maximum vertices per output polygon; 3 emits triangles.
    pub poly_size: usize,
    /// Plane normal for the sweep projection. `None` fits a plane to the
    /// input and orients it so total contour area is non-negative.
    pub normal: Option<Vec3>,
    /// Drop zero-area faces from polygon output.
    pub no_empty_polygons: bool,
    /// Place the sweep sentinels at `±coord` instead of deriving them
    /// from the input bounding box.
    pub sentinel_coord: Option<Real>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            winding_rule: WindingRule::EvenOdd,
            element_type: ElementType::Polygons,
            poly_size: 3,
            normal: None,
            no_empty_polygons: false,
            sentinel_coord: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("contour point {index} has coordinate {value} outside the representable range")]
    InvalidCoordinate { index: usize, value: Real },
    #[error("output polygon size {0} is below the minimum of 3")]
    InvalidPolySize(usize),
}

/// The tessellator. Contours accumulate until [`Self::tessellate`], which
/// consumes them and resets the instance for the next batch.
pub struct Tessellator<A> {
    mesh: Mesh<A>,
}

impl<A: Clone + Default> Tessellator<A> {
    pub fn new() -> Self {
        Tessellator { mesh: Mesh::new() }
    }

    /// Add one closed contour. Consecutive duplicate points and contours
    /// of fewer than three points are tolerated; they drop out during the
    /// sweep.
    pub fn add_contour(
        &mut self,
        orientation: ContourOrientation,
        points: &[ContourPoint<A>],
    ) -> Result<(), Error> {
        for (index, p) in points.iter().enumerate() {
            for value in p.pos.to_array() {
                if !value.is_finite() || value.abs() > MAX_COORD {
                    return Err(Error::InvalidCoordinate { index, value });
                }
            }
        }

        // A reversed contour contributes negated winding rather than
        // being re-ordered.
        let winding = if contour_is_reversed(orientation, points) {
            -1
        } else {
            1
        };

        let mut e = NIL;
        for p in points {
            if e == NIL {
                e = self.mesh.make_edge();
                self.mesh.splice(e, sym(e));
            } else {
                self.mesh.split_edge(e);
                e = self.mesh.lnext(e);
            }
            let org = self.mesh.org(e);
            self.mesh.verts[org as usize].pos = p.pos;
            self.mesh.verts[org as usize].payload = p.payload.clone();
            self.mesh.edges[e as usize].winding = winding;
            self.mesh.edges[sym(e) as usize].winding = -winding;
        }
        Ok(())
    }

    /// Tessellate every contour added since the last call.
    pub fn tessellate(
        &mut self,
        options: &Options,
        combine: Option<&CombineFn<A>>,
    ) -> Result<Tessellation<A>, Error> {
        if options.poly_size < 3 {
            return Err(Error::InvalidPolySize(options.poly_size));
        }

        let mut mesh = std::mem::take(&mut self.mesh);
        if mesh.edges[E_HEAD as usize].next == E_HEAD {
            return Ok(Tessellation::empty(options.element_type, options.poly_size));
        }

        let (bmin, bmax) = project_polygon(&mut mesh, options.normal);
        debug!(
            smin = bmin.s,
            tmin = bmin.t,
            smax = bmax.s,
            tmax = bmax.t,
            "projected input onto sweep plane"
        );

        SweepState::new(
            &mut mesh,
            options.winding_rule,
            combine,
            bmin,
            bmax,
            options.sentinel_coord,
        )
        .compute_interior();

        let out = match options.element_type {
            ElementType::BoundaryContours => {
                mesh.set_winding_number(1, true);
                output::contours(&mut mesh)
            }
            _ => {
                mesh.tessellate_interior();
                #[cfg(debug_assertions)]
                mesh.check();
                mesh.discard_exterior();
                if options.poly_size > 3 {
                    mesh.merge_convex_faces(options.poly_size);
                }
                output::polymesh(
                    &mut mesh,
                    options.element_type,
                    options.poly_size,
                    options.no_empty_polygons,
                )
            }
        };
        Ok(out)
    }
}

impl<A: Clone + Default> Default for Tessellator<A> {
    fn default() -> Self {
        Self::new()
    }
}

fn contour_is_reversed<A>(orientation: ContourOrientation, points: &[ContourPoint<A>]) -> bool {
    if points.len() < 3 {
        return false;
    }
    // Signed area over the first two components; good enough to fix the
    // winding direction for the planar case the option exists for.
    let mut area = 0.0;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()].pos;
        area += p.pos.x * q.y - q.x * p.pos.y;
    }
    match orientation {
        ContourOrientation::Original => false,
        ContourOrientation::CounterClockwise => area < 0.0,
        ContourOrientation::Clockwise => area > 0.0,
    }
}

fn long_axis(v: [Real; 3]) -> usize {
    let mut i = 0;
    if v[1].abs() > v[0].abs() {
        i = 1;
    }
    if v[2].abs() > v[i].abs() {
        i = 2;
    }
    i
}

fn short_axis(v: [Real; 3]) -> usize {
    let mut i = 0;
    if v[1].abs() < v[0].abs() {
        i = 1;
    }
    if v[2].abs() < v[i].abs() {
        i = 2;
    }
    i
}

/// Fit a normal to the input: the cross product of the longest-spread
/// diagonal with whichever vertex maximizes it.
fn compute_normal<A: Clone + Default>(mesh: &Mesh<A>) -> Vec3 {
    let first = mesh.verts[V_HEAD as usize].next;
    if first == V_HEAD {
        return Vec3::Z;
    }

    let mut min_val = mesh.verts[first as usize].pos.to_array();
    let mut max_val = min_val;
    let mut min_vert = [first; 3];
    let mut max_vert = [first; 3];

    let mut v = first;
    while v != V_HEAD {
        let c = mesh.verts[v as usize].pos.to_array();
        for i in 0..3 {
            if c[i] < min_val[i] {
                min_val[i] = c[i];
                min_vert[i] = v;
            }
            if c[i] > max_val[i] {
                max_val[i] = c[i];
                max_vert[i] = v;
            }
        }
        v = mesh.verts[v as usize].next;
    }

    let spread = [
        max_val[0] - min_val[0],
        max_val[1] - min_val[1],
        max_val[2] - min_val[2],
    ];
    let i = long_axis(spread);
    if spread[i] <= 0.0 {
        // All vertices coincide.
        return Vec3::Z;
    }

    let v2 = mesh.verts[max_vert[i] as usize].pos;
    let d1 = mesh.verts[min_vert[i] as usize].pos - v2;
    let mut max_len2 = 0.0;
    let mut norm = Vec3::ZERO;
    let mut v = first;
    while v != V_HEAD {
        let d2 = mesh.verts[v as usize].pos - v2;
        let t = d1.cross(d2);
        let len2 = t.length_squared();
        if len2 > max_len2 {
            max_len2 = len2;
            norm = t;
        }
        v = mesh.verts[v as usize].next;
    }

    if max_len2 <= 0.0 {
        // Degenerate (colinear) input; any perpendicular will do.
        let mut n = [0.0; 3];
        n[short_axis(d1.to_array())] = 1.0;
        return Vec3::from_array(n);
    }
    norm
}

/// When the normal was fitted automatically, flip the plane if the total
/// signed area of the positive-winding contours came out negative, so
/// that input orientation is preserved.
fn check_orientation<A: Clone + Default>(mesh: &mut Mesh<A>) {
    let mut area = 0.0;
    let mut f = mesh.faces[crate::mesh::F_HEAD as usize].next;
    while f != crate::mesh::F_HEAD {
        let e_start = mesh.faces[f as usize].an_edge;
        if mesh.edges[e_start as usize].winding > 0 {
            let mut e = e_start;
            loop {
                let o = mesh.org_pt(e);
                let d = mesh.dst_pt(e);
                area += (o.s - d.s) * (o.t + d.t);
                e = mesh.lnext(e);
                if e == e_start {
                    break;
                }
            }
        }
        f = mesh.faces[f as usize].next;
    }

    if area < 0.0 {
        let mut v = mesh.verts[V_HEAD as usize].next;
        while v != V_HEAD {
            mesh.verts[v as usize].pt.t = -mesh.verts[v as usize].pt.t;
            v = mesh.verts[v as usize].next;
        }
    }
}

/// Project every vertex onto the sweep plane and return the bounding box
/// of the projected coordinates.
fn project_polygon<A: Clone + Default>(mesh: &mut Mesh<A>, normal: Option<Vec3>) -> (Pt, Pt) {
    let computed = normal.is_none();
    let norm = match normal {
        Some(n) => n,
        None => compute_normal(mesh),
    };
    let n = norm.to_array();
    let i = long_axis(n);

    // Project onto the plane perpendicular to the long axis of the
    // normal; an axis-aligned basis avoids any renormalization error.
    let mut s_unit = [0.0; 3];
    let mut t_unit = [0.0; 3];
    s_unit[(i + 1) % 3] = 1.0;
    t_unit[(i + 2) % 3] = if n[i] > 0.0 { 1.0 } else { -1.0 };
    let s_unit = Vec3::from_array(s_unit);
    let t_unit = Vec3::from_array(t_unit);

    let mut v = mesh.verts[V_HEAD as usize].next;
    while v != V_HEAD {
        let pos = mesh.verts[v as usize].pos;
        mesh.verts[v as usize].pt = Pt::new(pos.dot(s_unit), pos.dot(t_unit));
        v = mesh.verts[v as usize].next;
    }
    if computed {
        check_orientation(mesh);
    }

    let mut bmin = Pt::new(Real::MAX, Real::MAX);
    let mut bmax = Pt::new(Real::MIN, Real::MIN);
    let mut v = mesh.verts[V_HEAD as usize].next;
    while v != V_HEAD {
        let p = mesh.pt(v);
        bmin.s = bmin.s.min(p.s);
        bmin.t = bmin.t.min(p.t);
        bmax.s = bmax.s.max(p.s);
        bmax.t = bmax.t.max(p.t);
        v = mesh.verts[v as usize].next;
    }
    (bmin, bmax)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn winding_rules() {
        use WindingRule::*;
        for n in -3..=3 {
            assert_eq!(EvenOdd.is_inside(n), n % 2 != 0);
            assert_eq!(NonZero.is_inside(n), n != 0);
            assert_eq!(Positive.is_inside(n), n > 0);
            assert_eq!(Negative.is_inside(n), n < 0);
            assert_eq!(AbsGeqTwo.is_inside(n), n.abs() >= 2);
        }
    }

    #[test]
    fn rejects_non_finite_coordinates() {
        let mut t: Tessellator<()> = Tessellator::new();
        let pts = [
            ContourPoint::from_xy(0.0, 0.0),
            ContourPoint::from_xy(f32::NAN, 0.0),
            ContourPoint::from_xy(1.0, 1.0),
        ];
        let err = t.add_contour(ContourOrientation::Original, &pts);
        assert!(matches!(err, Err(Error::InvalidCoordinate { index: 1, .. })));
    }

    #[test]
    fn rejects_oversized_coordinates() {
        let mut t: Tessellator<()> = Tessellator::new();
        let pts = [ContourPoint::from_xy(MAX_COORD * 2.0, 0.0)];
        assert!(t
            .add_contour(ContourOrientation::Original, &pts)
            .is_err());
    }

    #[test]
    fn rejects_tiny_poly_size() {
        let mut t: Tessellator<()> = Tessellator::new();
        let options = Options {
            poly_size: 2,
            ..Options::default()
        };
        assert!(matches!(
            t.tessellate(&options, None),
            Err(Error::InvalidPolySize(2))
        ));
    }

    #[test]
    fn empty_input_gives_empty_output() {
        let mut t: Tessellator<()> = Tessellator::new();
        let out = t.tessellate(&Options::default(), None).unwrap();
        assert_eq!(out.element_count, 0);
        assert!(out.positions.is_empty());
    }

    #[test]
    fn reversal_flips_winding_contribution() {
        let ccw = [
            ContourPoint::<()>::from_xy(0.0, 0.0),
            ContourPoint::from_xy(1.0, 0.0),
            ContourPoint::from_xy(1.0, 1.0),
        ];
        assert!(!contour_is_reversed(ContourOrientation::CounterClockwise, &ccw));
        assert!(contour_is_reversed(ContourOrientation::Clockwise, &ccw));
        assert!(!contour_is_reversed(ContourOrientation::Original, &ccw));
    }
}
