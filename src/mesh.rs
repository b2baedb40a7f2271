//! Half-edge mesh over `Vec` arenas.
//!
//! The mesh is a planar subdivision in the Guibas/Stolfi style: every
//! edge is a pair of directed half-edges, and all connectivity surgery
//! reduces to the single `splice` primitive. Pointers are `u32` ids into
//! the arenas, with [`NIL`] as the null id. Half-edges are allocated in
//! pairs at even/odd indices so that `sym(e) == e ^ 1`.
//!
//! Index 0 of each arena is a list-head sentinel; live vertices and
//! faces hang off circular doubly-linked bookkeeping lists so that
//! deletion never compacts the arenas. Deleted elements simply drop out
//! of the lists (their slots are not reused; a mesh lives for one
//! tessellation batch).
//!
//! Structural invariants (`sym` involution, `lnext`/`onext` duality,
//! ring consistency) are programming contracts, checked by [`Mesh::check`]
//! in debug builds rather than surfaced as runtime errors.

use glam::Vec3;

use crate::geom::{edge_sign, vert_ccw, vert_leq, Pt, Real};

/// Null id for every arena.
pub const NIL: u32 = u32::MAX;

pub type VertId = u32;
pub type FaceId = u32;
pub type EdgeId = u32;

/// The other half of an edge pair.
#[inline(always)]
pub fn sym(e: EdgeId) -> EdgeId {
    e ^ 1
}

pub const V_HEAD: VertId = 0;
pub const F_HEAD: FaceId = 0;
pub const E_HEAD: EdgeId = 0;

#[derive(Clone, Debug)]
pub struct Vertex<A> {
    pub next: VertId,
    pub prev: VertId,
    /// One half-edge with this origin; [`NIL`] on the sentinel.
    pub an_edge: EdgeId,
    /// Position in the input coordinate space.
    pub pos: Vec3,
    /// Projection onto the sweep plane.
    pub pt: Pt,
    /// Caller-supplied data carried through splits and merges.
    pub payload: A,
    /// Event-queue handle while the sweep is running.
    pub pq_handle: i32,
    /// Dense output id, assigned by the output builder.
    pub out_id: u32,
}

impl<A: Default> Default for Vertex<A> {
    fn default() -> Self {
        Vertex {
            next: NIL,
            prev: NIL,
            an_edge: NIL,
            pos: Vec3::ZERO,
            pt: Pt::default(),
            payload: A::default(),
            pq_handle: 0,
            out_id: NIL,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Face {
    pub next: FaceId,
    pub prev: FaceId,
    pub an_edge: EdgeId,
    /// Classified interior under the active winding rule.
    pub inside: bool,
    pub marked: bool,
    /// Dense output id, assigned by the output builder.
    pub out_id: u32,
}

impl Default for Face {
    fn default() -> Self {
        Face {
            next: NIL,
            prev: NIL,
            an_edge: NIL,
            inside: false,
            marked: false,
            out_id: NIL,
        }
    }
}

#[derive(Clone, Debug)]
pub struct HalfEdge {
    /// Global edge list link. Even halves chain forward through even ids;
    /// the odd half of each pair stores the backward link.
    pub next: EdgeId,
    /// Next edge CCW around the origin.
    pub onext: EdgeId,
    /// Next edge CCW around the left face.
    pub lnext: EdgeId,
    pub org: VertId,
    pub lface: FaceId,
    /// Change in winding number crossing from the right face to the left.
    pub winding: i32,
    /// Active region claiming this edge as its upper edge, if any.
    pub region: u32,
}

impl Default for HalfEdge {
    fn default() -> Self {
        HalfEdge {
            next: NIL,
            onext: NIL,
            lnext: NIL,
            org: NIL,
            lface: NIL,
            winding: 0,
            region: NIL,
        }
    }
}

pub struct Mesh<A> {
    pub verts: Vec<Vertex<A>>,
    pub faces: Vec<Face>,
    pub edges: Vec<HalfEdge>,
}

impl<A: Clone + Default> Mesh<A> {
    pub fn new() -> Self {
        let mut m = Mesh {
            verts: Vec::new(),
            faces: Vec::new(),
            edges: Vec::new(),
        };

        m.verts.push(Vertex {
            next: V_HEAD,
            prev: V_HEAD,
            ..Vertex::default()
        });
        m.faces.push(Face {
            next: F_HEAD,
            prev: F_HEAD,
            ..Face::default()
        });
        // Head edge pair: both halves point at themselves in the global list.
        m.edges.push(HalfEdge {
            next: E_HEAD,
            ..HalfEdge::default()
        });
        m.edges.push(HalfEdge {
            next: sym(E_HEAD),
            ..HalfEdge::default()
        });

        m
    }

    // Navigation. These mirror the classic quad-edge accessors; only
    // `onext` and `lnext` are stored, the rest derive through `sym`.

    #[inline]
    pub fn org(&self, e: EdgeId) -> VertId {
        self.edges[e as usize].org
    }

    #[inline]
    pub fn dst(&self, e: EdgeId) -> VertId {
        self.edges[sym(e) as usize].org
    }

    #[inline]
    pub fn lface(&self, e: EdgeId) -> FaceId {
        self.edges[e as usize].lface
    }

    #[inline]
    pub fn rface(&self, e: EdgeId) -> FaceId {
        self.edges[sym(e) as usize].lface
    }

    #[inline]
    pub fn onext(&self, e: EdgeId) -> EdgeId {
        self.edges[e as usize].onext
    }

    #[inline]
    pub fn lnext(&self, e: EdgeId) -> EdgeId {
        self.edges[e as usize].lnext
    }

    /// Previous edge CCW around the origin: `sym . lnext . sym`.
    #[inline]
    pub fn oprev(&self, e: EdgeId) -> EdgeId {
        self.edges[sym(e) as usize].lnext
    }

    /// Previous edge CCW around the left face.
    #[inline]
    pub fn lprev(&self, e: EdgeId) -> EdgeId {
        sym(self.edges[e as usize].onext)
    }

    /// Previous edge CCW around the destination.
    #[inline]
    pub fn dprev(&self, e: EdgeId) -> EdgeId {
        sym(self.edges[e as usize].lnext)
    }

    /// Next edge CW around the destination.
    #[inline]
    pub fn dnext(&self, e: EdgeId) -> EdgeId {
        sym(self.edges[sym(e) as usize].onext)
    }

    /// Previous edge CW around the right face.
    #[inline]
    pub fn rprev(&self, e: EdgeId) -> EdgeId {
        self.edges[sym(e) as usize].onext
    }

    #[inline]
    pub fn pt(&self, v: VertId) -> Pt {
        self.verts[v as usize].pt
    }

    #[inline]
    pub fn org_pt(&self, e: EdgeId) -> Pt {
        self.pt(self.org(e))
    }

    #[inline]
    pub fn dst_pt(&self, e: EdgeId) -> Pt {
        self.pt(self.dst(e))
    }

    #[inline]
    pub fn edge_goes_left(&self, e: EdgeId) -> bool {
        vert_leq(self.dst_pt(e), self.org_pt(e))
    }

    #[inline]
    pub fn edge_goes_right(&self, e: EdgeId) -> bool {
        vert_leq(self.org_pt(e), self.dst_pt(e))
    }

    /// True when the face to the right of `e` is interior.
    #[inline]
    pub fn edge_is_internal(&self, e: EdgeId) -> bool {
        let rf = self.rface(e);
        rf != NIL && self.faces[rf as usize].inside
    }

    /// `winding(dst) += winding(src)` on both halves, used when merging
    /// coincident edges.
    pub fn add_winding(&mut self, e_dst: EdgeId, e_src: EdgeId) {
        self.edges[e_dst as usize].winding += self.edges[e_src as usize].winding;
        self.edges[sym(e_dst) as usize].winding += self.edges[sym(e_src) as usize].winding;
    }

    // Allocation. Each helper wires a new element into its bookkeeping
    // list and repoints the affected ring.

    /// Allocate a fresh half-edge pair before `e_next` in the global list.
    /// Returns the even half.
    fn make_edge_pair(&mut self, e_next: EdgeId) -> EdgeId {
        let e_next = e_next & !1;
        let e_prev = self.edges[sym(e_next) as usize].next;

        let e_new = self.edges.len() as EdgeId;
        let e_sym = sym(e_new);

        self.edges.push(HalfEdge {
            next: e_next,
            onext: e_new,
            lnext: e_sym,
            ..HalfEdge::default()
        });
        self.edges.push(HalfEdge {
            next: e_prev,
            onext: e_sym,
            lnext: e_new,
            ..HalfEdge::default()
        });

        self.edges[sym(e_prev) as usize].next = e_new;
        self.edges[sym(e_next) as usize].next = e_sym;

        e_new
    }

    /// Allocate a vertex before `v_next` in the vertex list and claim the
    /// whole origin ring of `e_orig` for it.
    fn make_vertex(&mut self, e_orig: EdgeId, v_next: VertId) -> VertId {
        let v_new = self.verts.len() as VertId;
        let v_prev = self.verts[v_next as usize].prev;

        self.verts.push(Vertex {
            prev: v_prev,
            next: v_next,
            an_edge: e_orig,
            ..Vertex::default()
        });
        self.verts[v_prev as usize].next = v_new;
        self.verts[v_next as usize].prev = v_new;

        let mut e = e_orig;
        loop {
            self.edges[e as usize].org = v_new;
            e = self.onext(e);
            if e == e_orig {
                break;
            }
        }
        v_new
    }

    /// Allocate a face before `f_next` in the face list and claim the
    /// whole left ring of `e_orig` for it. The new face inherits the
    /// `inside` flag so a split face stays consistently classified.
    fn make_face(&mut self, e_orig: EdgeId, f_next: FaceId) -> FaceId {
        let f_new = self.faces.len() as FaceId;
        let f_prev = self.faces[f_next as usize].prev;

        self.faces.push(Face {
            prev: f_prev,
            next: f_next,
            an_edge: e_orig,
            inside: self.faces[f_next as usize].inside,
            ..Face::default()
        });
        self.faces[f_prev as usize].next = f_new;
        self.faces[f_next as usize].prev = f_new;

        let mut e = e_orig;
        loop {
            self.edges[e as usize].lface = f_new;
            e = self.lnext(e);
            if e == e_orig {
                break;
            }
        }
        f_new
    }

    /// Unlink a vertex; its origin ring is handed over to `new_org`
    /// (which may be [`NIL`] when the ring dies with it).
    fn kill_vertex(&mut self, v_del: VertId, new_org: VertId) {
        let e_start = self.verts[v_del as usize].an_edge;
        if e_start != NIL {
            let mut e = e_start;
            loop {
                self.edges[e as usize].org = new_org;
                e = self.onext(e);
                if e == e_start {
                    break;
                }
            }
        }

        let v_prev = self.verts[v_del as usize].prev;
        let v_next = self.verts[v_del as usize].next;
        self.verts[v_prev as usize].next = v_next;
        self.verts[v_next as usize].prev = v_prev;
        self.verts[v_del as usize].next = NIL;
        self.verts[v_del as usize].prev = NIL;
        self.verts[v_del as usize].an_edge = NIL;
    }

    /// Unlink a face; its left ring is handed over to `new_lface`.
    fn kill_face(&mut self, f_del: FaceId, new_lface: FaceId) {
        let e_start = self.faces[f_del as usize].an_edge;
        if e_start != NIL {
            let mut e = e_start;
            loop {
                self.edges[e as usize].lface = new_lface;
                e = self.lnext(e);
                if e == e_start {
                    break;
                }
            }
        }

        let f_prev = self.faces[f_del as usize].prev;
        let f_next = self.faces[f_del as usize].next;
        self.faces[f_prev as usize].next = f_next;
        self.faces[f_next as usize].prev = f_prev;
        self.faces[f_del as usize].next = NIL;
        self.faces[f_del as usize].prev = NIL;
        self.faces[f_del as usize].an_edge = NIL;
    }

    /// Unlink an edge pair from the global list.
    fn kill_edge(&mut self, e_del: EdgeId) {
        let e_del = e_del & !1;
        let e_next = self.edges[e_del as usize].next;
        let e_prev = self.edges[sym(e_del) as usize].next;
        self.edges[sym(e_next) as usize].next = e_prev;
        self.edges[sym(e_prev) as usize].next = e_next;
        self.edges[e_del as usize].next = NIL;
        self.edges[sym(e_del) as usize].next = NIL;
    }

    /// The raw Guibas/Stolfi splice: exchange `a.onext` and `b.onext`,
    /// keeping the `lnext` duals consistent. When `a` and `b` share an
    /// origin ring this splits it in two; otherwise it merges two rings.
    /// Same for the face rings, independently.
    fn swap_onext(edges: &mut [HalfEdge], a: EdgeId, b: EdgeId) {
        let a_onext = edges[a as usize].onext;
        let b_onext = edges[b as usize].onext;
        edges[sym(a_onext) as usize].lnext = b;
        edges[sym(b_onext) as usize].lnext = a;
        edges[a as usize].onext = b_onext;
        edges[b as usize].onext = a_onext;
    }

    // Topology operations.

    /// Create one edge with two fresh vertices and a single face (a loop
    /// of two half-edges).
    pub fn make_edge(&mut self) -> EdgeId {
        let e = self.make_edge_pair(E_HEAD);
        let v1 = self.make_vertex(e, V_HEAD);
        let v2 = self.make_vertex(sym(e), V_HEAD);
        self.make_face(e, F_HEAD);
        self.edges[e as usize].org = v1;
        self.edges[sym(e) as usize].org = v2;
        e
    }

    /// The single connectivity-changing primitive. Exchanges the onext
    /// rings of `e_org` and `e_dst`, covering all four cases: merging or
    /// splitting a vertex, and merging or splitting a face, on each side
    /// independently.
    pub fn splice(&mut self, e_org: EdgeId, e_dst: EdgeId) {
        if e_org == e_dst {
            return;
        }

        let org_org = self.org(e_org);
        let dst_org = self.org(e_dst);
        let org_lface = self.lface(e_org);
        let dst_lface = self.lface(e_dst);

        let joining_vertices = dst_org != org_org;
        let joining_loops = dst_lface != org_lface;

        if joining_vertices {
            self.kill_vertex(dst_org, org_org);
        }
        if joining_loops {
            self.kill_face(dst_lface, org_lface);
        }

        Self::swap_onext(&mut self.edges, e_dst, e_org);

        if !joining_vertices {
            // The ring split in two; give the half starting at e_dst a
            // fresh vertex.
            self.make_vertex(e_dst, org_org);
            self.verts[org_org as usize].an_edge = e_org;
        }
        if !joining_loops {
            self.make_face(e_dst, org_lface);
            self.faces[org_lface as usize].an_edge = e_org;
        }
    }

    /// Remove `e_del`, joining its two faces. Isolated endpoints die with
    /// the edge.
    pub fn delete_edge(&mut self, e_del: EdgeId) {
        let e_del_sym = sym(e_del);
        let joining_loops = self.lface(e_del) != self.rface(e_del);

        if joining_loops {
            self.kill_face(self.lface(e_del), self.rface(e_del));
        }

        if self.onext(e_del) == e_del {
            self.kill_vertex(self.org(e_del), NIL);
        } else {
            let oprev = self.oprev(e_del);
            let rf = self.rface(e_del);
            self.faces[rf as usize].an_edge = oprev;
            let org = self.org(e_del);
            self.verts[org as usize].an_edge = self.onext(e_del);
            Self::swap_onext(&mut self.edges, e_del, oprev);
            if !joining_loops {
                // The deletion splits a face in two.
                self.make_face(e_del, self.lface(e_del));
            }
        }

        if self.onext(e_del_sym) == e_del_sym {
            self.kill_vertex(self.org(e_del_sym), NIL);
            self.kill_face(self.lface(e_del_sym), NIL);
        } else {
            let oprev = self.oprev(e_del_sym);
            let lf = self.lface(e_del);
            self.faces[lf as usize].an_edge = oprev;
            let org = self.org(e_del_sym);
            self.verts[org as usize].an_edge = self.onext(e_del_sym);
            Self::swap_onext(&mut self.edges, e_del_sym, oprev);
        }

        self.kill_edge(e_del);
    }

    /// Append a new edge after `e_org` in its left ring; the new edge's
    /// destination is a fresh vertex.
    pub fn add_edge_vertex(&mut self, e_org: EdgeId) -> EdgeId {
        let e_new = self.make_edge_pair(e_org);
        let e_new_sym = sym(e_new);

        let lnext = self.lnext(e_org);
        Self::swap_onext(&mut self.edges, e_new, lnext);

        let org_dst = self.dst(e_org);
        self.edges[e_new as usize].org = org_dst;
        self.make_vertex(e_new_sym, org_dst);

        let lf = self.lface(e_org);
        self.edges[e_new as usize].lface = lf;
        self.edges[e_new_sym as usize].lface = lf;

        e_new
    }

    /// Split `e_org` in two at a fresh vertex; the new half `e_new`
    /// follows `e_org` (`e_new == lnext(e_org)`) and inherits its winding.
    pub fn split_edge(&mut self, e_org: EdgeId) -> EdgeId {
        let e_new = sym(self.add_edge_vertex(e_org));
        let e_org_sym = sym(e_org);

        // Move e_org's destination end over to the new vertex.
        let oprev = self.oprev(e_org_sym);
        Self::swap_onext(&mut self.edges, e_org_sym, oprev);
        Self::swap_onext(&mut self.edges, e_org_sym, e_new);

        let e_new_org = self.org(e_new);
        self.edges[e_org_sym as usize].org = e_new_org;
        let e_new_dst = self.dst(e_new);
        self.verts[e_new_dst as usize].an_edge = sym(e_new);
        self.edges[sym(e_new) as usize].lface = self.rface(e_org);
        self.edges[e_new as usize].winding = self.edges[e_org as usize].winding;
        self.edges[sym(e_new) as usize].winding = self.edges[e_org_sym as usize].winding;

        e_new
    }

    /// Connect `dst(e_org)` to `org(e_dst)` with a new edge. If the two
    /// lay on the same face it is split in two; otherwise the faces merge.
    pub fn connect(&mut self, e_org: EdgeId, e_dst: EdgeId) -> EdgeId {
        let e_new = self.make_edge_pair(e_org);
        let e_new_sym = sym(e_new);

        let joining_loops = self.lface(e_dst) != self.lface(e_org);
        if joining_loops {
            self.kill_face(self.lface(e_dst), self.lface(e_org));
        }

        let lnext = self.lnext(e_org);
        Self::swap_onext(&mut self.edges, e_new, lnext);
        Self::swap_onext(&mut self.edges, e_new_sym, e_dst);

        self.edges[e_new as usize].org = self.dst(e_org);
        self.edges[e_new_sym as usize].org = self.org(e_dst);
        let lf = self.lface(e_org);
        self.edges[e_new as usize].lface = lf;
        self.edges[e_new_sym as usize].lface = lf;
        self.faces[lf as usize].an_edge = e_new_sym;

        if !joining_loops {
            self.make_face(e_new, lf);
        }
        e_new
    }

    /// Destroy a face outright. Its edges lose their left face; edges
    /// left with no face on either side are deleted entirely.
    pub fn zap_face(&mut self, f_zap: FaceId) {
        let e_start = self.faces[f_zap as usize].an_edge;
        let mut e_next = self.lnext(e_start);

        loop {
            let e = e_next;
            e_next = self.lnext(e);

            self.edges[e as usize].lface = NIL;
            if self.rface(e) == NIL {
                if self.onext(e) == e {
                    let org = self.org(e);
                    if org != NIL {
                        self.kill_vertex(org, NIL);
                    }
                } else {
                    let org = self.org(e);
                    if org != NIL {
                        self.verts[org as usize].an_edge = self.onext(e);
                    }
                    let oprev = self.oprev(e);
                    Self::swap_onext(&mut self.edges, e, oprev);
                }
                let e_sym = sym(e);
                if self.onext(e_sym) == e_sym {
                    let org = self.org(e_sym);
                    if org != NIL {
                        self.kill_vertex(org, NIL);
                    }
                } else {
                    let org = self.org(e_sym);
                    if org != NIL {
                        self.verts[org as usize].an_edge = self.onext(e_sym);
                    }
                    let oprev = self.oprev(e_sym);
                    Self::swap_onext(&mut self.edges, e_sym, oprev);
                }
                self.kill_edge(e);
            }

            if e == e_start {
                break;
            }
        }

        let f_prev = self.faces[f_zap as usize].prev;
        let f_next = self.faces[f_zap as usize].next;
        self.faces[f_prev as usize].next = f_next;
        self.faces[f_next as usize].prev = f_prev;
        self.faces[f_zap as usize].next = NIL;
        self.faces[f_zap as usize].prev = NIL;
        self.faces[f_zap as usize].an_edge = NIL;
    }

    pub fn count_face_verts(&self, f: FaceId) -> usize {
        let e_start = self.faces[f as usize].an_edge;
        let mut e = e_start;
        let mut n = 0;
        loop {
            n += 1;
            e = self.lnext(e);
            if e == e_start {
                break;
            }
        }
        n
    }

    /// Signed sweep-plane area of a face loop.
    pub fn face_area(&self, f: FaceId) -> Real {
        let e_start = self.faces[f as usize].an_edge;
        let mut e = e_start;
        let mut area = 0.0;
        loop {
            let o = self.org_pt(e);
            let d = self.dst_pt(e);
            area += o.s * d.t - o.t * d.s;
            e = self.lnext(e);
            if e == e_start {
                break;
            }
        }
        area * 0.5
    }

    /// Merge adjacent interior faces wherever the union stays convex and
    /// within `max_verts_per_face` vertices.
    pub fn merge_convex_faces(&mut self, max_verts_per_face: usize) {
        let mut e = self.edges[E_HEAD as usize].next;
        while e != E_HEAD {
            let mut e_next = self.edges[e as usize].next;

            let lf = self.lface(e);
            let rf = self.lface(sym(e));
            if lf == NIL || !self.faces[lf as usize].inside {
                e = e_next;
                continue;
            }
            if rf == NIL || !self.faces[rf as usize].inside {
                e = e_next;
                continue;
            }

            let left_nv = self.count_face_verts(lf);
            let right_nv = self.count_face_verts(rf);
            if left_nv + right_nv - 2 > max_verts_per_face {
                e = e_next;
                continue;
            }

            // The merged loop is convex iff both corners at the removed
            // edge stay convex:
            //      vf--ve--vd
            //          ^|
            //   left  e||  right
            //          |v
            //      va--vb--vc
            let va = self.org_pt(self.lprev(e));
            let vb = self.org_pt(e);
            let vc = self.dst_pt(self.lnext(sym(e)));
            let vd = self.org_pt(self.lprev(sym(e)));
            let ve = self.org_pt(sym(e));
            let vf = self.dst_pt(self.lnext(e));

            if vert_ccw(va, vb, vc) && vert_ccw(vd, ve, vf) {
                if e == e_next || e == sym(e_next) {
                    e_next = self.edges[e_next as usize].next;
                }
                self.delete_edge(e);
            }
            e = e_next;
        }
    }

    /// Rewrite edge windings after face classification. Boundary edges
    /// (interior on exactly one side) get `±value`; others get zero, or
    /// are deleted when `keep_only_boundary` is set.
    pub fn set_winding_number(&mut self, value: i32, keep_only_boundary: bool) {
        let mut e = self.edges[E_HEAD as usize].next;
        while e != E_HEAD {
            let e_next = self.edges[e as usize].next;

            let lf = self.lface(e);
            let rf = self.rface(e);
            let lf_inside = lf != NIL && self.faces[lf as usize].inside;
            let rf_inside = rf != NIL && self.faces[rf as usize].inside;

            if rf_inside != lf_inside {
                self.edges[e as usize].winding = if lf_inside { value } else { -value };
            } else if !keep_only_boundary {
                self.edges[e as usize].winding = 0;
            } else {
                self.delete_edge(e);
            }

            e = e_next;
        }
    }

    /// Zap every face not classified interior.
    pub fn discard_exterior(&mut self) {
        let mut f = self.faces[F_HEAD as usize].next;
        while f != F_HEAD {
            let next = self.faces[f as usize].next;
            if !self.faces[f as usize].inside {
                self.zap_face(f);
            }
            f = next;
        }
    }

    /// Delete faces degenerated to two edges, folding their winding onto
    /// the surviving edge.
    pub fn remove_degenerate_faces(&mut self) {
        let mut f = self.faces[F_HEAD as usize].next;
        while f != F_HEAD {
            let f_next = self.faces[f as usize].next;
            let e = self.faces[f as usize].an_edge;
            debug_assert!(self.lnext(e) != e);
            if self.lnext(self.lnext(e)) == e {
                let onext = self.onext(e);
                self.add_winding(onext, e);
                self.delete_edge(e);
            }
            f = f_next;
        }
    }

    /// Triangulate one monotone interior face. The loop must be a simple
    /// polygon, monotone with respect to the sweep direction, oriented CCW.
    pub fn tessellate_mono_region(&mut self, face: FaceId) {
        // `up` and `lo` chase each other along the upper and lower chains,
        // emitting fans of triangles toward whichever chain lags behind.
        let mut up = self.faces[face as usize].an_edge;
        debug_assert!(self.lnext(up) != up && self.lnext(self.lnext(up)) != up);

        // Start at the rightmost vertex of the loop.
        while self.edge_goes_left(up) {
            up = self.lprev(up);
        }
        while self.edge_goes_right(up) {
            up = self.lnext(up);
        }
        let mut lo = self.lprev(up);

        while self.lnext(up) != lo {
            if vert_leq(self.dst_pt(up), self.org_pt(lo)) {
                // up.dst is on the left; the lower chain leads. Connect
                // from lo's origin while that keeps the output CCW.
                while self.lnext(lo) != up {
                    let lo_lnext = self.lnext(lo);
                    let keeps_ccw = self.edge_goes_left(lo_lnext)
                        || edge_sign(self.org_pt(lo), self.dst_pt(lo), self.dst_pt(lo_lnext))
                            <= 0.0;
                    if !keeps_ccw {
                        break;
                    }
                    lo = sym(self.connect(lo_lnext, lo));
                }
                lo = self.lprev(lo);
            } else {
                // Symmetric case along the upper chain.
                while self.lnext(lo) != up {
                    let up_lprev = self.lprev(up);
                    let keeps_ccw = self.edge_goes_right(up_lprev)
                        || edge_sign(self.dst_pt(up), self.org_pt(up), self.org_pt(up_lprev))
                            >= 0.0;
                    if !keeps_ccw {
                        break;
                    }
                    up = sym(self.connect(up, up_lprev));
                }
                up = self.lnext(up);
            }
        }

        // Fan out whatever remains from the leftmost vertex.
        debug_assert!(self.lnext(lo) != up);
        while self.lnext(self.lnext(lo)) != up {
            let lo_lnext = self.lnext(lo);
            lo = sym(self.connect(lo_lnext, lo));
        }
    }

    /// Triangulate every interior face.
    pub fn tessellate_interior(&mut self) {
        let mut f = self.faces[F_HEAD as usize].next;
        while f != F_HEAD {
            let next = self.faces[f as usize].next;
            if self.faces[f as usize].inside {
                self.tessellate_mono_region(f);
            }
            f = next;
        }
    }

    /// Walk the whole mesh asserting the half-edge identities. Debug
    /// builds only; a violation is a bug in the surgery above, never an
    /// input condition.
    pub fn check(&self) {
        // Faces: every ring edge agrees on its left face.
        let mut f_prev = F_HEAD;
        loop {
            let f = self.faces[f_prev as usize].next;
            if f == F_HEAD {
                break;
            }
            assert_eq!(self.faces[f as usize].prev, f_prev);
            let e_start = self.faces[f as usize].an_edge;
            let mut e = e_start;
            loop {
                assert_ne!(sym(e), e);
                assert_eq!(self.lface(e), f);
                e = self.lnext(e);
                if e == e_start {
                    break;
                }
            }
            f_prev = f;
        }

        // Vertices: every ring edge agrees on its origin.
        let mut v_prev = V_HEAD;
        loop {
            let v = self.verts[v_prev as usize].next;
            if v == V_HEAD {
                break;
            }
            assert_eq!(self.verts[v as usize].prev, v_prev);
            let e_start = self.verts[v as usize].an_edge;
            let mut e = e_start;
            loop {
                assert_eq!(self.org(e), v);
                e = self.onext(e);
                if e == e_start {
                    break;
                }
            }
            v_prev = v;
        }

        // Edges: the onext/lnext duality holds on both halves.
        let mut e = self.edges[E_HEAD as usize].next;
        while e != E_HEAD {
            for h in [e, sym(e)] {
                assert_ne!(self.org(h), NIL);
                assert_ne!(self.dst(h), NIL);
                assert_eq!(self.lnext(sym(self.onext(h))), h);
                assert_eq!(sym(self.onext(self.lnext(h))), h);
            }
            e = self.edges[e as usize].next;
        }
    }
}

impl<A: Clone + Default> Default for Mesh<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(mesh: &mut Mesh<()>, pts: [(Real, Real); 4]) -> EdgeId {
        // Builds one CCW face the way contours are loaded: a self-loop
        // followed by repeated edge splits.
        let mut e = mesh.make_edge();
        mesh.splice(e, sym(e));
        for (i, &(s, t)) in pts.iter().enumerate() {
            if i > 0 {
                mesh.split_edge(e);
                e = mesh.lnext(e);
            }
            let org = mesh.org(e);
            mesh.verts[org as usize].pt = Pt::new(s, t);
            mesh.edges[e as usize].winding = 1;
            mesh.edges[sym(e) as usize].winding = -1;
        }
        e
    }

    #[test]
    fn make_edge_allocates_loop() {
        let mut mesh: Mesh<()> = Mesh::new();
        let e = mesh.make_edge();
        assert_eq!(mesh.verts.len(), 3);
        assert_eq!(mesh.faces.len(), 2);
        assert_eq!(mesh.edges.len(), 4);
        assert_ne!(mesh.org(e), mesh.dst(e));
        assert_eq!(mesh.lface(e), mesh.rface(e));
        mesh.check();
    }

    #[test]
    fn sym_is_an_involution() {
        for e in 0u32..16 {
            assert_eq!(sym(sym(e)), e);
        }
    }

    #[test]
    fn splice_self_loop_merges_endpoints() {
        let mut mesh: Mesh<()> = Mesh::new();
        let e = mesh.make_edge();
        mesh.splice(e, sym(e));
        // Now a loop with a single vertex and two faces.
        assert_eq!(mesh.org(e), mesh.dst(e));
        assert_ne!(mesh.lface(e), mesh.rface(e));
        mesh.check();
    }

    #[test]
    fn contour_loading_produces_one_ring() {
        let mut mesh: Mesh<()> = Mesh::new();
        let e = square(
            &mut mesh,
            [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)],
        );
        assert_eq!(mesh.count_face_verts(mesh.lface(e)), 4);
        assert_eq!(mesh.count_face_verts(mesh.rface(e)), 4);
        mesh.check();
    }

    #[test]
    fn connect_splits_a_face() {
        let mut mesh: Mesh<()> = Mesh::new();
        let e = square(
            &mut mesh,
            [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)],
        );
        let faces_before = live_face_count(&mesh);
        // Diagonal across the quad.
        let diag = mesh.connect(mesh.lnext(e), e);
        assert_eq!(live_face_count(&mesh), faces_before + 1);
        assert_eq!(mesh.count_face_verts(mesh.lface(diag)), 3);
        mesh.check();

        // Deleting it joins the faces back.
        mesh.delete_edge(diag);
        assert_eq!(live_face_count(&mesh), faces_before);
        mesh.check();
    }

    #[test]
    fn split_edge_keeps_winding() {
        let mut mesh: Mesh<()> = Mesh::new();
        let e = mesh.make_edge();
        mesh.edges[e as usize].winding = 1;
        mesh.edges[sym(e) as usize].winding = -1;
        let e_new = mesh.split_edge(e);
        assert_eq!(mesh.lnext(e), e_new);
        assert_eq!(mesh.edges[e_new as usize].winding, 1);
        assert_eq!(mesh.edges[sym(e_new) as usize].winding, -1);
        assert_eq!(mesh.dst(e), mesh.org(e_new));
        mesh.check();
    }

    #[test]
    fn mono_region_triangulation_counts() {
        // n-gon -> n-2 triangles.
        for n in 3..8 {
            let mut mesh: Mesh<()> = Mesh::new();
            let mut e = mesh.make_edge();
            mesh.splice(e, sym(e));
            for i in 0..n {
                if i > 0 {
                    mesh.split_edge(e);
                    e = mesh.lnext(e);
                }
                let a = (i as Real) / (n as Real) * std::f32::consts::TAU;
                let org = mesh.org(e);
                mesh.verts[org as usize].pt = Pt::new(a.cos(), a.sin());
            }
            let f = mesh.lface(e);
            let inner = if mesh.face_area(f) > 0.0 { f } else { mesh.rface(e) };
            mesh.faces[inner as usize].inside = true;
            mesh.tessellate_interior();
            mesh.check();

            let mut triangles = 0;
            let mut f = mesh.faces[F_HEAD as usize].next;
            while f != F_HEAD {
                if mesh.faces[f as usize].inside {
                    assert_eq!(mesh.count_face_verts(f), 3);
                    triangles += 1;
                }
                f = mesh.faces[f as usize].next;
            }
            assert_eq!(triangles, n - 2);
        }
    }

    fn live_face_count(mesh: &Mesh<()>) -> usize {
        let mut n = 0;
        let mut f = mesh.faces[F_HEAD as usize].next;
        while f != F_HEAD {
            n += 1;
            f = mesh.faces[f as usize].next;
        }
        n
    }
}
