//! A 2D polygon tessellator.
//!
//! Takes any set of closed contours (convex, concave, self-intersecting,
//! nested, in any orientation), classifies the plane under a configurable
//! winding rule, and emits triangles, bounded-size convex polygons, or the
//! boundary contours of the covered region.
//!
//! The algorithm is the classic sweep-line tessellation: contours are
//! loaded into a half-edge mesh, projected onto a best-fit plane, and
//! swept left to right while self-intersections are resolved and each
//! face's winding number is accumulated. Robustness comes from tolerating
//! floating-point error rather than avoiding it; whenever round-off
//! produces an inconsistent edge ordering the mesh is locally respliced
//! until the invariants hold again.
//!
//! ```
//! use polytess::{ContourOrientation, ContourPoint, Options, Tessellator};
//!
//! let mut tess: Tessellator<()> = Tessellator::new();
//! let square: Vec<ContourPoint<()>> = [(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]
//!     .iter()
//!     .map(|&(x, y)| ContourPoint::from_xy(x, y))
//!     .collect();
//! tess.add_contour(ContourOrientation::Original, &square)?;
//!
//! let out = tess.tessellate(&Options::default(), None)?;
//! assert_eq!(out.element_count, 2);
//! # Ok::<(), polytess::Error>(())
//! ```

pub mod geom;
pub mod mesh;

mod dict;
mod output;
mod queue;
mod sweep;
mod tess;

pub use geom::Real;
pub use output::{Tessellation, UNDEF};
pub use tess::{
    CombineFn, ContourOrientation, ContourPoint, ElementType, Error, Options, Tessellator,
    WindingRule, MAX_COORD,
};

pub use glam::Vec3;
