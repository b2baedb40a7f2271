//! Builders that flatten the classified mesh into index buffers.

use glam::Vec3;
use tracing::debug;

use crate::geom::Real;
use crate::mesh::{Mesh, VertId, F_HEAD, NIL};
use crate::tess::ElementType;

/// Missing index: padding in short polygons and absent neighbors.
pub const UNDEF: u32 = u32::MAX;

/// Faces under this sweep-plane area count as empty when
/// `no_empty_polygons` is set.
const EMPTY_FACE_AREA: Real = 1e-5;

/// Result of one tessellation batch.
///
/// `positions` and `payloads` run in parallel; `elements` is laid out
/// according to `element_type`. For polygon output every element is
/// `poly_size` indices padded with [`UNDEF`] (twice that for connected
/// polygons, the second half holding neighbor element ids). For boundary
/// contours every element is a `(start, count)` range into the vertex
/// arrays.
pub struct Tessellation<A> {
    pub positions: Vec<Vec3>,
    pub payloads: Vec<A>,
    pub elements: Vec<u32>,
    pub element_count: usize,
    pub element_type: ElementType,
    pub poly_size: usize,
}

impl<A> Tessellation<A> {
    pub(crate) fn empty(element_type: ElementType, poly_size: usize) -> Self {
        Tessellation {
            positions: Vec::new(),
            payloads: Vec::new(),
            elements: Vec::new(),
            element_count: 0,
            element_type,
            poly_size,
        }
    }

    /// Indices per element in `elements`.
    pub fn stride(&self) -> usize {
        match self.element_type {
            ElementType::Polygons => self.poly_size,
            ElementType::ConnectedPolygons => self.poly_size * 2,
            ElementType::BoundaryContours => 2,
        }
    }

    /// Triangle view of the element list; meaningful for polygon output
    /// produced with `poly_size == 3`.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.elements.chunks_exact(self.stride().max(1)).filter_map(|c| {
            if c.len() >= 3 && c[0] != UNDEF && c[1] != UNDEF && c[2] != UNDEF {
                Some([c[0], c[1], c[2]])
            } else {
                None
            }
        })
    }

    /// `(start, count)` vertex ranges for boundary-contour output.
    pub fn contour_ranges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        debug_assert_eq!(self.element_type, ElementType::BoundaryContours);
        self.elements
            .chunks_exact(2)
            .map(|c| (c[0] as usize, c[1] as usize))
    }
}

/// Flatten the interior faces into fixed-size polygons.
pub(crate) fn polymesh<A: Clone + Default>(
    mesh: &mut Mesh<A>,
    element_type: ElementType,
    poly_size: usize,
    no_empty_polygons: bool,
) -> Tessellation<A> {
    // First pass: assign dense ids to the emitted faces and their
    // vertices, in mesh order.
    let mut vert_order: Vec<VertId> = Vec::new();
    let mut face_count: u32 = 0;

    let mut f = mesh.faces[F_HEAD as usize].next;
    while f != F_HEAD {
        let f_next = mesh.faces[f as usize].next;
        if !mesh.faces[f as usize].inside
            || (no_empty_polygons && mesh.face_area(f).abs() < EMPTY_FACE_AREA)
        {
            f = f_next;
            continue;
        }

        let e_start = mesh.faces[f as usize].an_edge;
        let mut e = e_start;
        let mut face_verts = 0;
        loop {
            let v = mesh.org(e);
            if mesh.verts[v as usize].out_id == NIL {
                mesh.verts[v as usize].out_id = vert_order.len() as u32;
                vert_order.push(v);
            }
            face_verts += 1;
            e = mesh.lnext(e);
            if e == e_start {
                break;
            }
        }
        debug_assert!(face_verts <= poly_size);

        mesh.faces[f as usize].out_id = face_count;
        face_count += 1;
        f = f_next;
    }

    let positions = vert_order
        .iter()
        .map(|&v| mesh.verts[v as usize].pos)
        .collect();
    let payloads = vert_order
        .iter()
        .map(|&v| mesh.verts[v as usize].payload.clone())
        .collect();

    // Second pass: emit the index tuples.
    let connected = element_type == ElementType::ConnectedPolygons;
    let stride = if connected { poly_size * 2 } else { poly_size };
    let mut elements = Vec::with_capacity(face_count as usize * stride);

    let mut f = mesh.faces[F_HEAD as usize].next;
    while f != F_HEAD {
        if mesh.faces[f as usize].out_id != NIL {
            let e_start = mesh.faces[f as usize].an_edge;

            let mut n = 0;
            let mut e = e_start;
            loop {
                let v = mesh.org(e);
                elements.push(mesh.verts[v as usize].out_id);
                n += 1;
                e = mesh.lnext(e);
                if e == e_start {
                    break;
                }
            }
            elements.resize(elements.len() + poly_size - n, UNDEF);

            if connected {
                let mut e = e_start;
                loop {
                    elements.push(neighbor_face_id(mesh, e));
                    e = mesh.lnext(e);
                    if e == e_start {
                        break;
                    }
                }
                elements.resize(elements.len() + poly_size - n, UNDEF);
            }
        }
        f = mesh.faces[f as usize].next;
    }

    debug!(
        vertices = vert_order.len(),
        elements = face_count,
        "built polygon output"
    );
    Tessellation {
        positions,
        payloads,
        elements,
        element_count: face_count as usize,
        element_type,
        poly_size,
    }
}

/// Emit the boundary loops of the interior as vertex ranges. Expects the
/// mesh to have been reduced to boundary edges beforehand.
pub(crate) fn contours<A: Clone + Default>(mesh: &mut Mesh<A>) -> Tessellation<A> {
    let mut positions: Vec<Vec3> = Vec::new();
    let mut payloads: Vec<A> = Vec::new();
    let mut elements: Vec<u32> = Vec::new();
    let mut element_count = 0;

    let mut f = mesh.faces[F_HEAD as usize].next;
    while f != F_HEAD {
        if mesh.faces[f as usize].inside {
            let start = positions.len() as u32;
            let e_start = mesh.faces[f as usize].an_edge;
            let mut e = e_start;
            loop {
                let v = mesh.org(e) as usize;
                positions.push(mesh.verts[v].pos);
                payloads.push(mesh.verts[v].payload.clone());
                e = mesh.lnext(e);
                if e == e_start {
                    break;
                }
            }
            elements.push(start);
            elements.push(positions.len() as u32 - start);
            element_count += 1;
        }
        f = mesh.faces[f as usize].next;
    }

    debug!(contours = element_count, "built boundary output");
    Tessellation {
        positions,
        payloads,
        elements,
        element_count,
        element_type: ElementType::BoundaryContours,
        poly_size: 0,
    }
}

/// Dense id of the emitted face across `e`, or [`UNDEF`] when the
/// neighbor is exterior or was dropped as empty.
fn neighbor_face_id<A: Clone + Default>(mesh: &Mesh<A>, e: crate::mesh::EdgeId) -> u32 {
    let rf = mesh.rface(e);
    if rf == NIL || !mesh.faces[rf as usize].inside {
        return UNDEF;
    }
    let id = mesh.faces[rf as usize].out_id;
    if id == NIL {
        UNDEF
    } else {
        id
    }
}
