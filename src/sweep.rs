//! The sweep engine: converts the raw contour mesh into a planar
//! subdivision whose faces carry winding-consistent `inside` flags.
//!
//! A sweep line moves left to right over the projected vertices. The
//! edges currently crossing it live in the [`Dict`], grouped into
//! *active regions* (one region per gap between adjacent edges). Each
//! region tracks the winding number of the gap; when an edge's left face
//! is complete the winding classification is transferred onto it.
//!
//! Numerical errors are tolerated, not prevented: whenever an edge is
//! split or two edges swap order, the affected regions are flagged dirty
//! and [`SweepState::walk_dirty_regions`] re-establishes the ordering
//! invariants combinatorially, splicing or splitting as needed.

use glam::Vec3;
use tracing::trace;

use crate::dict::{Dict, NodeId};
use crate::geom::{edge_eval, edge_sign, l1_dist, vert_eq, vert_leq, Pt, Real};
use crate::mesh::{sym, EdgeId, Mesh, VertId, E_HEAD, NIL, V_HEAD};
use crate::queue::{EventKey, EventQueue};
use crate::tess::{CombineFn, WindingRule};

pub(crate) type RegionId = u32;

/// One gap between two adjacent active edges, keyed into the dictionary
/// by its upper edge. Upper edges are directed right to left, so `org`
/// is the unswept endpoint and `dst` the swept one.
#[derive(Clone, Debug)]
struct ActiveRegion {
    /// Upper delimiting edge.
    e_up: EdgeId,
    /// Dictionary node holding this region.
    node_up: NodeId,
    /// Winding number just below `e_up`.
    winding: i32,
    inside: bool,
    /// One of the two synthetic bounding regions.
    sentinel: bool,
    /// Ordering invariants need re-checking against the region below.
    dirty: bool,
    /// `e_up` is a temporary connecting edge that a later event must
    /// replace (it would otherwise leave a coincident pair behind).
    fix_upper_edge: bool,
}

enum Flow {
    Done,
    /// The event vertex was spliced into new topology; run it again.
    Reprocess,
}

/// Dictionary comparator, valid only at the sweep position `event`:
/// true when `e1` is at or below `e2` on the sweep line. Edges ending
/// exactly at the event are compared by slope so that near-coincident
/// edges sort consistently.
fn edge_leq<A: Clone + Default>(mesh: &Mesh<A>, event: VertId, e1: EdgeId, e2: EdgeId) -> bool {
    let ev = mesh.pt(event);

    if mesh.dst(e1) == event {
        if mesh.dst(e2) == event {
            // Both edges reach the event; sort by slope, measured from
            // whichever origin is leftmost.
            if vert_leq(mesh.org_pt(e1), mesh.org_pt(e2)) {
                return edge_sign(mesh.dst_pt(e2), mesh.org_pt(e1), mesh.org_pt(e2)) <= 0.0;
            }
            return edge_sign(mesh.dst_pt(e1), mesh.org_pt(e2), mesh.org_pt(e1)) >= 0.0;
        }
        return edge_sign(mesh.dst_pt(e2), ev, mesh.org_pt(e2)) <= 0.0;
    }
    if mesh.dst(e2) == event {
        return edge_sign(mesh.dst_pt(e1), ev, mesh.org_pt(e1)) >= 0.0;
    }

    // General case: compare heights at the event.
    let t1 = edge_eval(mesh.dst_pt(e1), ev, mesh.org_pt(e1));
    let t2 = edge_eval(mesh.dst_pt(e2), ev, mesh.org_pt(e2));
    t1 >= t2
}

pub(crate) struct SweepState<'a, A> {
    mesh: &'a mut Mesh<A>,
    queue: EventQueue,
    dict: Dict,
    regions: Vec<ActiveRegion>,
    free_regions: Vec<RegionId>,
    /// Current sweep event vertex.
    event: VertId,
    rule: WindingRule,
    combine: Option<&'a CombineFn<A>>,
    /// Sweep-plane bounding box of the input, for sentinel placement.
    bmin: Pt,
    bmax: Pt,
    sentinel_coord: Option<Real>,
}

impl<'a, A: Clone + Default> SweepState<'a, A> {
    pub(crate) fn new(
        mesh: &'a mut Mesh<A>,
        rule: WindingRule,
        combine: Option<&'a CombineFn<A>>,
        bmin: Pt,
        bmax: Pt,
        sentinel_coord: Option<Real>,
    ) -> Self {
        SweepState {
            mesh,
            queue: EventQueue::with_capacity(0),
            dict: Dict::new(),
            regions: Vec::new(),
            free_regions: Vec::new(),
            event: NIL,
            rule,
            combine,
            bmin,
            bmax,
            sentinel_coord,
        }
    }

    /// Run the full sweep. Afterwards every face of the mesh carries a
    /// correct `inside` flag and no two edges cross.
    pub(crate) fn compute_interior(&mut self) {
        self.remove_degenerate_edges();
        self.init_event_queue();
        self.init_edge_dict();

        while let Some(key) = self.queue.extract_min() {
            let v = key.vert;
            // Merge every later event at the same sweep point, so each
            // position is processed exactly once.
            loop {
                let next = match self.queue.min() {
                    Some(k) => k,
                    None => break,
                };
                if !vert_eq(next.pt, self.mesh.pt(v)) {
                    break;
                }
                let next = match self.queue.extract_min() {
                    Some(k) => k,
                    None => break,
                };
                trace!(v, merged = next.vert, "merging coincident event vertices");
                let e1 = self.mesh.verts[v as usize].an_edge;
                let e2 = self.mesh.verts[next.vert as usize].an_edge;
                self.splice_merge_vertices(e1, e2);
            }
            self.sweep_event(v);
        }

        self.done_edge_dict();
        self.mesh.remove_degenerate_faces();
        #[cfg(debug_assertions)]
        self.mesh.check();
    }

    // Region slab.

    #[inline]
    fn reg(&self, r: RegionId) -> &ActiveRegion {
        &self.regions[r as usize]
    }

    #[inline]
    fn reg_mut(&mut self, r: RegionId) -> &mut ActiveRegion {
        &mut self.regions[r as usize]
    }

    fn alloc_region(&mut self, e_up: EdgeId) -> RegionId {
        let region = ActiveRegion {
            e_up,
            node_up: NIL,
            winding: 0,
            inside: false,
            sentinel: false,
            dirty: false,
            fix_upper_edge: false,
        };
        match self.free_regions.pop() {
            Some(r) => {
                self.regions[r as usize] = region;
                r
            }
            None => {
                self.regions.push(region);
                (self.regions.len() - 1) as RegionId
            }
        }
    }

    /// Region below `r` in the dictionary, [`NIL`] below the bottom
    /// sentinel.
    #[inline]
    fn region_below(&self, r: RegionId) -> RegionId {
        self.dict.key(self.dict.pred(self.reg(r).node_up))
    }

    /// Region above `r`, [`NIL`] above the top sentinel.
    #[inline]
    fn region_above(&self, r: RegionId) -> RegionId {
        self.dict.key(self.dict.succ(self.reg(r).node_up))
    }

    fn delete_region(&mut self, r: RegionId) {
        let e_up = self.reg(r).e_up;
        // A temporary edge may only be deleted once it carries nothing.
        debug_assert!(
            !self.reg(r).fix_upper_edge || self.mesh.edges[e_up as usize].winding == 0
        );
        self.mesh.edges[e_up as usize].region = NIL;
        self.dict.remove(self.reg(r).node_up);
        self.free_regions.push(r);
    }

    /// Replace the temporary upper edge of `r` with a real one.
    fn fix_upper_edge(&mut self, r: RegionId, new_edge: EdgeId) {
        debug_assert!(self.reg(r).fix_upper_edge);
        let old = self.reg(r).e_up;
        self.mesh.delete_edge(old);
        self.reg_mut(r).fix_upper_edge = false;
        self.reg_mut(r).e_up = new_edge;
        self.mesh.edges[new_edge as usize].region = r;
    }

    // Dictionary access with the event-relative comparator.

    fn dict_insert_before(&mut self, hint: NodeId, r: RegionId) -> NodeId {
        let Self {
            ref mut dict,
            ref mesh,
            ref regions,
            event,
            ..
        } = *self;
        let mesh: &Mesh<A> = &**mesh;
        dict.insert_before(hint, r, |ra, rb| {
            edge_leq(mesh, event, regions[ra as usize].e_up, regions[rb as usize].e_up)
        })
    }

    fn dict_search_edge(&self, probe: EdgeId) -> NodeId {
        let mesh: &Mesh<A> = &*self.mesh;
        let regions = &self.regions;
        let event = self.event;
        self.dict
            .search_by(|key| edge_leq(mesh, event, probe, regions[key as usize].e_up))
    }

    /// Uppermost region sharing `r`'s upper-edge origin, fixing any
    /// temporary edge found on the way up. Returns the region above them.
    fn top_left_region(&mut self, mut r: RegionId) -> RegionId {
        let org = self.mesh.org(self.reg(r).e_up);
        loop {
            r = self.region_above(r);
            if self.mesh.org(self.reg(r).e_up) != org {
                break;
            }
        }
        if self.reg(r).fix_upper_edge {
            let below = self.region_below(r);
            let below_e = self.reg(below).e_up;
            let lnext = self.mesh.lnext(self.reg(r).e_up);
            let e = self.mesh.connect(sym(below_e), lnext);
            self.fix_upper_edge(r, e);
            r = self.region_above(r);
        }
        r
    }

    /// Region above the uppermost region sharing `r`'s upper-edge
    /// destination.
    fn top_right_region(&self, mut r: RegionId) -> RegionId {
        let dst = self.mesh.dst(self.reg(r).e_up);
        loop {
            r = self.region_above(r);
            if self.mesh.dst(self.reg(r).e_up) != dst {
                break;
            }
        }
        r
    }

    /// Add a region with upper edge `e_new_up` just below `reg_above`.
    /// Winding is left for the caller to fill in.
    fn add_region_below(&mut self, reg_above: RegionId, e_new_up: EdgeId) -> RegionId {
        let r = self.alloc_region(e_new_up);
        let hint = self.reg(reg_above).node_up;
        let node = self.dict_insert_before(hint, r);
        self.reg_mut(r).node_up = node;
        self.mesh.edges[e_new_up as usize].region = r;
        r
    }

    fn compute_winding(&mut self, r: RegionId) {
        let above = self.region_above(r);
        let w = self.reg(above).winding + self.mesh.edges[self.reg(r).e_up as usize].winding;
        self.reg_mut(r).winding = w;
        self.reg_mut(r).inside = self.rule.is_inside(w);
    }

    /// The upper edge's left face is now complete; record its
    /// classification and retire the region.
    fn finish_region(&mut self, r: RegionId) {
        let e = self.reg(r).e_up;
        let f = self.mesh.lface(e);
        self.mesh.faces[f as usize].inside = self.reg(r).inside;
        self.mesh.faces[f as usize].an_edge = e;
        self.delete_region(r);
    }

    /// Finish all regions from `reg_first` down to (not including)
    /// `reg_last` ([`NIL`] to run until the chain of left-ending edges
    /// breaks). Ensures the finished edges form a single `onext` chain
    /// at the event; returns the bottommost finished edge.
    fn finish_left_regions(&mut self, reg_first: RegionId, reg_last: RegionId) -> EdgeId {
        let mut reg_prev = reg_first;
        let mut e_prev = self.reg(reg_first).e_up;

        while reg_prev != reg_last {
            // A temporary edge whose left end we reached is real now.
            self.reg_mut(reg_prev).fix_upper_edge = false;
            let reg = self.region_below(reg_prev);
            let mut e = self.reg(reg).e_up;
            if self.mesh.org(e) != self.mesh.org(e_prev) {
                if !self.reg(reg).fix_upper_edge {
                    self.finish_region(reg_prev);
                    break;
                }
                // The region below has a temporary edge; replace it with
                // one ending where this chain ends.
                let lprev = self.mesh.lprev(e_prev);
                let new_e = self.mesh.connect(lprev, sym(e));
                self.fix_upper_edge(reg, new_e);
                e = new_e;
            }
            // Relink the onext ring if the edges are not adjacent yet.
            if self.mesh.onext(e_prev) != e {
                let oprev = self.mesh.oprev(e);
                self.mesh.splice(oprev, e);
                self.mesh.splice(e_prev, e);
            }
            self.finish_region(reg_prev);
            e_prev = self.reg(reg).e_up;
            reg_prev = reg;
        }
        e_prev
    }

    /// Insert the right-going edges `e_first..e_last` (an `onext` ring
    /// slice around the event) into the dictionary below `reg_up`, set
    /// their windings incrementally, and merge coincident ones.
    fn add_right_edges(
        &mut self,
        reg_up: RegionId,
        e_first: EdgeId,
        e_last: EdgeId,
        e_top_left: EdgeId,
        clean_up: bool,
    ) {
        let mut e = e_first;
        loop {
            debug_assert!(vert_leq(self.mesh.org_pt(e), self.mesh.dst_pt(e)));
            self.add_region_below(reg_up, sym(e));
            e = self.mesh.onext(e);
            if e == e_last {
                break;
            }
        }

        let mut e_top_left = e_top_left;
        if e_top_left == NIL {
            let below = self.region_below(reg_up);
            e_top_left = self.mesh.rprev(self.reg(below).e_up);
        }

        let mut reg_prev = reg_up;
        let mut e_prev = e_top_left;
        let mut first_time = true;
        let (last_reg, last_e);
        loop {
            let reg = self.region_below(reg_prev);
            let e = sym(self.reg(reg).e_up);
            if self.mesh.org(e) != self.mesh.org(e_prev) {
                last_reg = reg;
                last_e = e;
                break;
            }

            if self.mesh.onext(e) != e_prev {
                // Unlink e and relink it below e_prev.
                let oprev = self.mesh.oprev(e);
                self.mesh.splice(oprev, e);
                let prev_oprev = self.mesh.oprev(e_prev);
                self.mesh.splice(prev_oprev, e);
            }
            let w = self.reg(reg_prev).winding - self.mesh.edges[e as usize].winding;
            self.reg_mut(reg).winding = w;
            self.reg_mut(reg).inside = self.rule.is_inside(w);

            // Check for two coincident edges; merge them into one.
            self.reg_mut(reg_prev).dirty = true;
            if !first_time && self.check_for_right_splice(reg_prev) {
                self.mesh.add_winding(e, e_prev);
                self.delete_region(reg_prev);
                self.mesh.delete_edge(e_prev);
            }
            first_time = false;
            reg_prev = reg;
            e_prev = e;
        }
        self.reg_mut(reg_prev).dirty = true;
        debug_assert_eq!(
            self.reg(reg_prev).winding - self.mesh.edges[last_e as usize].winding,
            self.reg(last_reg).winding
        );

        if clean_up {
            self.walk_dirty_regions(reg_prev);
        }
    }

    // Vertex merging and the combine hook.

    /// Run the combine callback for vertex `v` built from up to four
    /// source vertices. Without a callback, a merged vertex keeps its
    /// payload and a synthesized one gets the default.
    fn call_combine(&mut self, v: VertId, src: [VertId; 4], weights: [Real; 4], synthesized: bool) {
        let cb = match self.combine {
            Some(cb) => cb,
            None => {
                if synthesized {
                    self.mesh.verts[v as usize].payload = A::default();
                }
                return;
            }
        };
        let pos = self.mesh.verts[v as usize].pos;
        let payloads = [
            payload_ref(self.mesh, src[0]),
            payload_ref(self.mesh, src[1]),
            payload_ref(self.mesh, src[2]),
            payload_ref(self.mesh, src[3]),
        ];
        let merged = cb(pos, payloads, weights);
        self.mesh.verts[v as usize].payload = merged;
    }

    /// Merge two coincident vertices; `org(e1)` survives.
    fn splice_merge_vertices(&mut self, e1: EdgeId, e2: EdgeId) {
        let v1 = self.mesh.org(e1);
        let v2 = self.mesh.org(e2);
        self.call_combine(v1, [v1, v2, NIL, NIL], [0.5, 0.5, 0.0, 0.0], false);
        self.mesh.splice(e1, e2);
    }

    /// Accumulate `isect`'s position from one edge's endpoints, weighted
    /// by proximity along the sweep plane. Returns the two weights.
    fn vertex_weights(&mut self, isect: VertId, org: VertId, dst: VertId) -> (Real, Real) {
        let ip = self.mesh.pt(isect);
        let t1 = l1_dist(self.mesh.pt(org), ip);
        let t2 = l1_dist(self.mesh.pt(dst), ip);
        let w0 = 0.5 * t2 / (t1 + t2);
        let w1 = 0.5 * t1 / (t1 + t2);
        let blended =
            self.mesh.verts[org as usize].pos * w0 + self.mesh.verts[dst as usize].pos * w1;
        self.mesh.verts[isect as usize].pos += blended;
        (w0, w1)
    }

    /// Fill in position and payload for a synthesized intersection
    /// vertex from the four surrounding endpoints.
    fn get_intersect_data(
        &mut self,
        isect: VertId,
        org_up: VertId,
        dst_up: VertId,
        org_lo: VertId,
        dst_lo: VertId,
    ) {
        self.mesh.verts[isect as usize].pos = Vec3::ZERO;
        let (w0, w1) = self.vertex_weights(isect, org_up, dst_up);
        let (w2, w3) = self.vertex_weights(isect, org_lo, dst_lo);
        self.call_combine(isect, [org_up, dst_up, org_lo, dst_lo], [w0, w1, w2, w3], true);
    }

    // Invariant restoration.

    /// Make sure the upper and lower edges of `reg_up` leave the sweep
    /// line in a consistent order near their right (unswept) endpoints,
    /// splicing the leftmost origin into the other edge when an earlier
    /// split pushed them out of order. Returns true when topology changed.
    fn check_for_right_splice(&mut self, reg_up: RegionId) -> bool {
        let reg_lo = self.region_below(reg_up);
        let e_up = self.reg(reg_up).e_up;
        let e_lo = self.reg(reg_lo).e_up;
        let org_up = self.mesh.org(e_up);
        let org_lo = self.mesh.org(e_lo);

        if vert_leq(self.mesh.pt(org_up), self.mesh.pt(org_lo)) {
            if edge_sign(self.mesh.dst_pt(e_lo), self.mesh.pt(org_up), self.mesh.pt(org_lo)) > 0.0
            {
                return false;
            }
            if !vert_eq(self.mesh.pt(org_up), self.mesh.pt(org_lo)) {
                // Splice org(e_up) into e_lo.
                self.mesh.split_edge(sym(e_lo));
                let oprev = self.mesh.oprev(e_lo);
                self.mesh.splice(e_up, oprev);
                self.reg_mut(reg_up).dirty = true;
                self.reg_mut(reg_lo).dirty = true;
            } else if org_up != org_lo {
                // Distinct vertices at the same position: merge them,
                // dropping org(e_up)'s pending event.
                let h = self.mesh.verts[org_up as usize].pq_handle;
                self.queue.remove(h);
                let oprev = self.mesh.oprev(e_lo);
                self.splice_merge_vertices(oprev, e_up);
            }
        } else {
            if edge_sign(self.mesh.dst_pt(e_up), self.mesh.pt(org_lo), self.mesh.pt(org_up)) < 0.0
            {
                return false;
            }
            // Splice org(e_lo) into e_up.
            let above = self.region_above(reg_up);
            self.reg_mut(above).dirty = true;
            self.reg_mut(reg_up).dirty = true;
            self.mesh.split_edge(sym(e_up));
            let oprev = self.mesh.oprev(e_lo);
            self.mesh.splice(oprev, e_up);
        }
        true
    }

    /// Counterpart of [`Self::check_for_right_splice`] near the left
    /// (already swept) endpoints. Newly created faces inherit the
    /// region's classification.
    fn check_for_left_splice(&mut self, reg_up: RegionId) -> bool {
        let reg_lo = self.region_below(reg_up);
        let e_up = self.reg(reg_up).e_up;
        let e_lo = self.reg(reg_lo).e_up;
        debug_assert!(!vert_eq(self.mesh.dst_pt(e_up), self.mesh.dst_pt(e_lo)));

        if vert_leq(self.mesh.dst_pt(e_up), self.mesh.dst_pt(e_lo)) {
            if edge_sign(self.mesh.dst_pt(e_up), self.mesh.dst_pt(e_lo), self.mesh.org_pt(e_up))
                < 0.0
            {
                return false;
            }
            // dst(e_lo) sits above e_up; splice it into e_up.
            let above = self.region_above(reg_up);
            self.reg_mut(above).dirty = true;
            self.reg_mut(reg_up).dirty = true;
            let e_new = self.mesh.split_edge(e_up);
            self.mesh.splice(sym(e_lo), e_new);
            let f = self.mesh.lface(e_new);
            self.mesh.faces[f as usize].inside = self.reg(reg_up).inside;
        } else {
            if edge_sign(self.mesh.dst_pt(e_lo), self.mesh.dst_pt(e_up), self.mesh.org_pt(e_lo))
                > 0.0
            {
                return false;
            }
            // dst(e_up) sits below e_lo; splice it into e_lo.
            self.reg_mut(reg_up).dirty = true;
            self.reg_mut(reg_lo).dirty = true;
            let e_new = self.mesh.split_edge(e_lo);
            let lnext = self.mesh.lnext(e_up);
            self.mesh.splice(lnext, sym(e_lo));
            let f = self.mesh.rface(e_new);
            self.mesh.faces[f as usize].inside = self.reg(reg_up).inside;
        }
        true
    }

    /// Test the delimiting edges of `reg_up` for a crossing to the right
    /// of the sweep line. A true crossing splits both edges at a new
    /// event vertex; borderline results are clamped onto existing
    /// vertices and handled as splices. Returns true when the current
    /// event finished processing inside the call.
    fn check_for_intersect(&mut self, mut reg_up: RegionId) -> bool {
        let mut reg_lo = self.region_below(reg_up);
        let e_up = self.reg(reg_up).e_up;
        let e_lo = self.reg(reg_lo).e_up;
        let org_up = self.mesh.org(e_up);
        let org_lo = self.mesh.org(e_lo);
        let dst_up = self.mesh.dst(e_up);
        let dst_lo = self.mesh.dst(e_lo);
        let ev = self.mesh.pt(self.event);

        debug_assert!(!vert_eq(self.mesh.pt(dst_lo), self.mesh.pt(dst_up)));
        debug_assert!(edge_sign(self.mesh.pt(dst_up), ev, self.mesh.pt(org_up)) <= 0.0);
        debug_assert!(edge_sign(self.mesh.pt(dst_lo), ev, self.mesh.pt(org_lo)) >= 0.0);
        debug_assert!(org_up != self.event && org_lo != self.event);
        debug_assert!(!self.reg(reg_up).fix_upper_edge && !self.reg(reg_lo).fix_upper_edge);

        if org_up == org_lo {
            // Right endpoints coincide; nothing to do.
            return false;
        }

        let t_min_up = self.mesh.pt(org_up).t.min(self.mesh.pt(dst_up).t);
        let t_max_lo = self.mesh.pt(org_lo).t.max(self.mesh.pt(dst_lo).t);
        if t_min_up > t_max_lo {
            // t ranges are disjoint; no crossing possible.
            return false;
        }

        if vert_leq(self.mesh.pt(org_up), self.mesh.pt(org_lo)) {
            if edge_sign(self.mesh.pt(dst_lo), self.mesh.pt(org_up), self.mesh.pt(org_lo)) > 0.0 {
                return false;
            }
        } else if edge_sign(self.mesh.pt(dst_up), self.mesh.pt(org_lo), self.mesh.pt(org_up)) < 0.0
        {
            return false;
        }

        // The edges cross, at least marginally.
        let mut isect = crate::geom::edge_intersect(
            self.mesh.pt(dst_up),
            self.mesh.pt(org_up),
            self.mesh.pt(dst_lo),
            self.mesh.pt(org_lo),
        );
        debug_assert!(self.mesh.pt(org_up).t.min(self.mesh.pt(dst_up).t) <= isect.t);
        debug_assert!(isect.t <= self.mesh.pt(org_lo).t.max(self.mesh.pt(dst_lo).t));
        debug_assert!(self.mesh.pt(dst_lo).s.min(self.mesh.pt(dst_up).s) <= isect.s);
        debug_assert!(isect.s <= self.mesh.pt(org_lo).s.max(self.mesh.pt(org_up).s));

        if vert_leq(isect, ev) {
            // Round-off pushed the crossing behind the sweep line; clamp
            // it onto the event so it is processed now.
            isect = ev;
        }
        // Clamping to the nearer right endpoint avoids pathological
        // re-splitting on degenerate inputs.
        let org_min = if vert_leq(self.mesh.pt(org_up), self.mesh.pt(org_lo)) {
            org_up
        } else {
            org_lo
        };
        if vert_leq(self.mesh.pt(org_min), isect) {
            isect = self.mesh.pt(org_min);
        }

        if vert_eq(isect, self.mesh.pt(org_up)) || vert_eq(isect, self.mesh.pt(org_lo)) {
            // Crossing at one of the right endpoints: a splice suffices.
            self.check_for_right_splice(reg_up);
            return false;
        }

        let dst_up_off_event = !vert_eq(self.mesh.pt(dst_up), ev);
        let dst_lo_off_event = !vert_eq(self.mesh.pt(dst_lo), ev);
        if (dst_up_off_event && edge_sign(self.mesh.pt(dst_up), ev, isect) >= 0.0)
            || (dst_lo_off_event && edge_sign(self.mesh.pt(dst_lo), ev, isect) <= 0.0)
        {
            // The new edge through the crossing would pass on the wrong
            // side of the event; resolve by splicing at the event itself.
            if dst_lo == self.event {
                // Splice dst(e_lo) into e_up and reprocess the regions.
                self.mesh.split_edge(sym(e_up));
                self.mesh.splice(sym(e_lo), e_up);
                reg_up = self.top_left_region(reg_up);
                let below = self.region_below(reg_up);
                let e_up = self.reg(below).e_up;
                self.finish_left_regions(below, reg_lo);
                let oprev = self.mesh.oprev(e_up);
                self.add_right_edges(reg_up, oprev, e_up, e_up, true);
                return true;
            }
            if dst_up == self.event {
                // Splice dst(e_up) into e_lo and reprocess the regions.
                self.mesh.split_edge(sym(e_lo));
                let up_lnext = self.mesh.lnext(e_up);
                let lo_oprev = self.mesh.oprev(e_lo);
                self.mesh.splice(up_lnext, lo_oprev);
                reg_lo = reg_up;
                reg_up = self.top_right_region(reg_up);
                let below = self.region_below(reg_up);
                let e = self.mesh.rprev(self.reg(below).e_up);
                let lo_oprev = self.mesh.oprev(e_lo);
                self.reg_mut(reg_lo).e_up = lo_oprev;
                let e_lo_new = self.finish_left_regions(reg_lo, NIL);
                let onext = self.mesh.onext(e_lo_new);
                let rprev = self.mesh.rprev(e_up);
                self.add_right_edges(reg_up, onext, rprev, e, true);
                return true;
            }
            // Called from connect_right_vertex: split whichever edge
            // passes on the wrong side and let the caller splice.
            if edge_sign(self.mesh.pt(dst_up), ev, isect) >= 0.0 {
                let above = self.region_above(reg_up);
                self.reg_mut(above).dirty = true;
                self.reg_mut(reg_up).dirty = true;
                self.mesh.split_edge(sym(e_up));
                let v = self.mesh.org(e_up);
                self.mesh.verts[v as usize].pt = ev;
                self.mesh.verts[v as usize].pos = self.mesh.verts[self.event as usize].pos;
            }
            if edge_sign(self.mesh.pt(dst_lo), ev, isect) <= 0.0 {
                self.reg_mut(reg_up).dirty = true;
                self.reg_mut(reg_lo).dirty = true;
                self.mesh.split_edge(sym(e_lo));
                let v = self.mesh.org(e_lo);
                self.mesh.verts[v as usize].pt = ev;
                self.mesh.verts[v as usize].pos = self.mesh.verts[self.event as usize].pos;
            }
            return false;
        }

        // General case: split both edges and splice them together at a
        // new event vertex.
        trace!(s = isect.s, t = isect.t, "edge crossing, synthesizing vertex");
        self.mesh.split_edge(sym(e_up));
        self.mesh.split_edge(sym(e_lo));
        let oprev = self.mesh.oprev(e_lo);
        self.mesh.splice(oprev, e_up);
        let v = self.mesh.org(e_up);
        self.mesh.verts[v as usize].pt = isect;
        let handle = self.queue.insert(EventKey { pt: isect, vert: v });
        self.mesh.verts[v as usize].pq_handle = handle;
        self.get_intersect_data(v, org_up, dst_up, org_lo, dst_lo);
        let above = self.region_above(reg_up);
        self.reg_mut(above).dirty = true;
        self.reg_mut(reg_up).dirty = true;
        self.reg_mut(reg_lo).dirty = true;
        false
    }

    /// Re-check every dirty pair of adjacent regions until the ordering
    /// invariants hold again, merging coincident edges along the way.
    fn walk_dirty_regions(&mut self, mut reg_up: RegionId) {
        let mut reg_lo = self.region_below(reg_up);

        loop {
            // Find the lowest dirty region; pairs get fixed bottom-up.
            while self.reg(reg_lo).dirty {
                reg_up = reg_lo;
                reg_lo = self.region_below(reg_lo);
            }
            if !self.reg(reg_up).dirty {
                reg_lo = reg_up;
                reg_up = self.region_above(reg_up);
                if reg_up == NIL || !self.reg(reg_up).dirty {
                    return;
                }
            }
            self.reg_mut(reg_up).dirty = false;
            let mut e_up = self.reg(reg_up).e_up;
            let mut e_lo = self.reg(reg_lo).e_up;

            if self.mesh.dst(e_up) != self.mesh.dst(e_lo)
                && self.check_for_left_splice(reg_up)
            {
                // The splice may have made one side's temporary edge
                // coincident with the other; drop it.
                if self.reg(reg_lo).fix_upper_edge {
                    self.delete_region(reg_lo);
                    self.mesh.delete_edge(e_lo);
                    reg_lo = self.region_below(reg_up);
                    e_lo = self.reg(reg_lo).e_up;
                } else if self.reg(reg_up).fix_upper_edge {
                    self.delete_region(reg_up);
                    self.mesh.delete_edge(e_up);
                    reg_up = self.region_above(reg_lo);
                    e_up = self.reg(reg_up).e_up;
                }
            }

            if self.mesh.org(e_up) != self.mesh.org(e_lo) {
                if self.mesh.dst(e_up) != self.mesh.dst(e_lo)
                    && !self.reg(reg_up).fix_upper_edge
                    && !self.reg(reg_lo).fix_upper_edge
                    && (self.mesh.dst(e_up) == self.event || self.mesh.dst(e_lo) == self.event)
                {
                    if self.check_for_intersect(reg_up) {
                        // The event was reprocessed wholesale.
                        return;
                    }
                } else {
                    self.check_for_right_splice(reg_up);
                }
            }

            if self.mesh.org(e_up) == self.mesh.org(e_lo)
                && self.mesh.dst(e_up) == self.mesh.dst(e_lo)
            {
                // Fully coincident pair: fold windings and delete one.
                self.mesh.add_winding(e_lo, e_up);
                self.delete_region(reg_up);
                self.mesh.delete_edge(e_up);
                reg_up = self.region_above(reg_lo);
            }
        }
    }

    /// The event has only right-going edges but the region is interior
    /// (or capped by a temporary edge), so it must connect leftward. A
    /// definitive connection target may not exist yet; in that case a
    /// temporary edge is added and flagged for later fixing.
    fn connect_right_vertex(&mut self, mut reg_up: RegionId, mut e_bottom_left: EdgeId) {
        let mut e_top_left = self.mesh.onext(e_bottom_left);
        let reg_lo = self.region_below(reg_up);
        let e_up = self.reg(reg_up).e_up;
        let e_lo = self.reg(reg_lo).e_up;
        let mut degenerate = false;

        if self.mesh.dst(e_up) != self.mesh.dst(e_lo) {
            self.check_for_intersect(reg_up);
        }

        // The event may lie exactly on e_up or e_lo's right endpoint.
        let ev = self.mesh.pt(self.event);
        if vert_eq(self.mesh.org_pt(e_up), ev) {
            let oprev = self.mesh.oprev(e_top_left);
            self.mesh.splice(oprev, e_up);
            reg_up = self.top_left_region(reg_up);
            let below = self.region_below(reg_up);
            e_top_left = self.reg(below).e_up;
            self.finish_left_regions(below, reg_lo);
            degenerate = true;
        }
        if vert_eq(self.mesh.org_pt(e_lo), ev) {
            let oprev = self.mesh.oprev(e_lo);
            self.mesh.splice(e_bottom_left, oprev);
            e_bottom_left = self.finish_left_regions(reg_lo, NIL);
            degenerate = true;
        }
        if degenerate {
            let onext = self.mesh.onext(e_bottom_left);
            self.add_right_edges(reg_up, onext, e_top_left, e_top_left, true);
            return;
        }

        // Connect to the nearer of the two right endpoints.
        let e_new = if vert_leq(self.mesh.org_pt(e_lo), self.mesh.org_pt(e_up)) {
            self.mesh.oprev(e_lo)
        } else {
            e_up
        };
        let lprev = self.mesh.lprev(e_bottom_left);
        let e_new = self.mesh.connect(lprev, e_new);

        // The connection is provisional; a later event will replace it.
        let onext = self.mesh.onext(e_new);
        self.add_right_edges(reg_up, e_new, onext, onext, false);
        let r = self.mesh.edges[sym(e_new) as usize].region;
        self.reg_mut(r).fix_upper_edge = true;
        self.walk_dirty_regions(reg_up);
    }

    /// The event lies exactly on an edge already in the dictionary.
    fn connect_left_degenerate(&mut self, reg_up: RegionId, v_event: VertId) -> Flow {
        let e = self.reg(reg_up).e_up;
        let ev = self.mesh.pt(v_event);

        if vert_eq(self.mesh.org_pt(e), ev) {
            // org(e) is an unprocessed vertex at the same position. The
            // event loop merges coincident queue entries, so this only
            // arises through clamping; combine and let org(e)'s event
            // do the work.
            let an_edge = self.mesh.verts[v_event as usize].an_edge;
            self.splice_merge_vertices(e, an_edge);
            return Flow::Done;
        }

        if !vert_eq(self.mesh.dst_pt(e), ev) {
            // Interior of e: split it and splice the event in.
            self.mesh.split_edge(sym(e));
            if self.reg(reg_up).fix_upper_edge {
                // The temporary edge got split; discard the stub.
                let onext = self.mesh.onext(e);
                self.mesh.delete_edge(onext);
                self.reg_mut(reg_up).fix_upper_edge = false;
            }
            let an_edge = self.mesh.verts[v_event as usize].an_edge;
            self.mesh.splice(an_edge, e);
            return Flow::Reprocess;
        }

        // The event coincides with dst(e) (possible after clamping).
        let reg_up = self.top_right_region(reg_up);
        let reg = self.region_below(reg_up);
        let mut e_top_right = sym(self.reg(reg).e_up);
        let e_top_left = self.mesh.onext(e_top_right);
        let e_last = e_top_left;
        if self.reg(reg).fix_upper_edge {
            debug_assert!(e_top_left != e_top_right);
            self.delete_region(reg);
            self.mesh.delete_edge(e_top_right);
            e_top_right = self.mesh.oprev(e_top_left);
        }
        let an_edge = self.mesh.verts[v_event as usize].an_edge;
        self.mesh.splice(an_edge, e_top_right);
        let e_top_left = if self.mesh.edge_goes_left(e_top_left) {
            e_top_left
        } else {
            NIL
        };
        let onext = self.mesh.onext(e_top_right);
        self.add_right_edges(reg_up, onext, e_last, e_top_left, true);
        Flow::Done
    }

    /// The event vertex has only right-going edges: locate its region in
    /// the dictionary and either connect it leftward (interior) or just
    /// install its edges (exterior).
    fn connect_left_vertex(&mut self, v_event: VertId) -> Flow {
        let an_edge = self.mesh.verts[v_event as usize].an_edge;
        let node = self.dict_search_edge(sym(an_edge));
        let reg_up = self.dict.key(node);
        let reg_lo = self.region_below(reg_up);
        if reg_lo == NIL {
            // Degenerate input swept down to nothing.
            return Flow::Done;
        }
        let e_up = self.reg(reg_up).e_up;
        let e_lo = self.reg(reg_lo).e_up;

        if edge_sign(self.mesh.dst_pt(e_up), self.mesh.pt(v_event), self.mesh.org_pt(e_up)) == 0.0
        {
            return self.connect_left_degenerate(reg_up, v_event);
        }

        // Connect to the edge whose destination comes later in the sweep.
        let reg = if vert_leq(self.mesh.dst_pt(e_lo), self.mesh.dst_pt(e_up)) {
            reg_up
        } else {
            reg_lo
        };

        if self.reg(reg_up).inside || self.reg(reg).fix_upper_edge {
            let e_new = if reg == reg_up {
                let lnext = self.mesh.lnext(e_up);
                self.mesh.connect(sym(an_edge), lnext)
            } else {
                let dnext = self.mesh.dnext(e_lo);
                sym(self.mesh.connect(dnext, an_edge))
            };
            if self.reg(reg).fix_upper_edge {
                self.fix_upper_edge(reg, e_new);
            } else {
                let r = self.add_region_below(reg_up, e_new);
                self.compute_winding(r);
            }
            Flow::Reprocess
        } else {
            // Exterior vertex: just install its right-going edges.
            self.add_right_edges(reg_up, an_edge, an_edge, NIL, true);
            Flow::Done
        }
    }

    /// Process one sweep event. Splicing may change the topology under
    /// the event, in which case it is reprocessed until it settles.
    fn sweep_event(&mut self, v_event: VertId) {
        self.event = v_event;
        trace!(
            v = v_event,
            s = self.mesh.pt(v_event).s,
            t = self.mesh.pt(v_event).t,
            "sweep event"
        );

        loop {
            // Is this vertex the right endpoint of an active edge?
            let an_edge = self.mesh.verts[v_event as usize].an_edge;
            let mut e = an_edge;
            let mut active = false;
            loop {
                if self.mesh.edges[e as usize].region != NIL {
                    active = true;
                    break;
                }
                e = self.mesh.onext(e);
                if e == an_edge {
                    break;
                }
            }

            if !active {
                // All edges go right; the dictionary tells us where.
                match self.connect_left_vertex(v_event) {
                    Flow::Done => return,
                    Flow::Reprocess => continue,
                }
            }

            // Finish the regions whose upper edges end here, then hand
            // the right-going edges over to their successors.
            let r = self.mesh.edges[e as usize].region;
            let reg_up = self.top_left_region(r);
            let reg = self.region_below(reg_up);
            let e_top_left = self.reg(reg).e_up;
            let e_bottom_left = self.finish_left_regions(reg, NIL);

            if self.mesh.onext(e_bottom_left) == e_top_left {
                // No right-going edges; connect to the mesh on the right.
                self.connect_right_vertex(reg_up, e_bottom_left);
            } else {
                let onext = self.mesh.onext(e_bottom_left);
                self.add_right_edges(reg_up, onext, e_top_left, e_top_left, true);
            }
            return;
        }
    }

    // Setup and teardown.

    /// Delete zero-length edges and contours of fewer than three edges.
    fn remove_degenerate_edges(&mut self) {
        let mut e = self.mesh.edges[E_HEAD as usize].next;
        while e != E_HEAD {
            let mut e_next = self.mesh.edges[e as usize].next;
            let mut e_lnext = self.mesh.lnext(e);

            if vert_eq(self.mesh.org_pt(e), self.mesh.dst_pt(e)) && self.mesh.lnext(e_lnext) != e
            {
                // Zero-length edge in a contour of three or more.
                self.splice_merge_vertices(e_lnext, e);
                self.mesh.delete_edge(e);
                e = e_lnext;
                e_lnext = self.mesh.lnext(e);
            }
            if self.mesh.lnext(e_lnext) == e {
                // Contour degenerated to one or two edges.
                if e_lnext != e {
                    if e_lnext == e_next || e_lnext == sym(e_next) {
                        e_next = self.mesh.edges[e_next as usize].next;
                    }
                    self.mesh.delete_edge(e_lnext);
                }
                if e == e_next || e == sym(e_next) {
                    e_next = self.mesh.edges[e_next as usize].next;
                }
                self.mesh.delete_edge(e);
            }
            e = e_next;
        }
    }

    fn init_event_queue(&mut self) {
        let mut n = 0;
        let mut v = self.mesh.verts[V_HEAD as usize].next;
        while v != V_HEAD {
            n += 1;
            v = self.mesh.verts[v as usize].next;
        }
        trace!(vertices = n, "seeding event queue");

        self.queue = EventQueue::with_capacity(n);
        let mut v = self.mesh.verts[V_HEAD as usize].next;
        while v != V_HEAD {
            let handle = self.queue.insert(EventKey {
                pt: self.mesh.pt(v),
                vert: v,
            });
            self.mesh.verts[v as usize].pq_handle = handle;
            v = self.mesh.verts[v as usize].next;
        }
        self.queue.init();
    }

    /// Two horizontal sentinel edges above and below everything keep
    /// every real vertex inside some region, so the sweep never has to
    /// special-case the boundary.
    fn add_sentinel(&mut self, smin: Real, smax: Real, t: Real) {
        let e = self.mesh.make_edge();
        let org = self.mesh.org(e);
        let dst = self.mesh.dst(e);
        self.mesh.verts[org as usize].pt = Pt::new(smax, t);
        self.mesh.verts[dst as usize].pt = Pt::new(smin, t);
        self.event = dst;

        let r = self.alloc_region(e);
        self.reg_mut(r).sentinel = true;
        self.mesh.edges[e as usize].region = r;
        let node = self.dict_insert_before(crate::dict::HEAD, r);
        self.reg_mut(r).node_up = node;
    }

    fn init_edge_dict(&mut self) {
        self.dict = Dict::new();
        let (smin, smax, tmin, tmax) = match self.sentinel_coord {
            Some(c) => (-c, c, -c, c),
            None => {
                // A margin proportional to the bounding box keeps the
                // sentinels clear of every intersection the sweep can
                // produce.
                let w = (self.bmax.s - self.bmin.s) + 0.01;
                let h = (self.bmax.t - self.bmin.t) + 0.01;
                (
                    self.bmin.s - w,
                    self.bmax.s + w,
                    self.bmin.t - h,
                    self.bmax.t + h,
                )
            }
        };
        self.add_sentinel(smin, smax, tmin);
        self.add_sentinel(smin, smax, tmax);
    }

    fn done_edge_dict(&mut self) {
        let mut fixed_edges = 0;
        loop {
            let node = self.dict.min();
            let r = self.dict.key(node);
            if r == NIL {
                break;
            }
            if !self.reg(r).sentinel {
                // Only a temporary edge whose fixing event never came
                // may outlive the sweep, and only one of them.
                debug_assert!(self.reg(r).fix_upper_edge);
                fixed_edges += 1;
                debug_assert!(fixed_edges == 1);
            }
            debug_assert_eq!(self.reg(r).winding, 0);
            self.delete_region(r);
        }
        let _ = fixed_edges;
    }
}

fn payload_ref<A: Clone + Default>(mesh: &Mesh<A>, v: VertId) -> Option<&A> {
    if v == NIL {
        None
    } else {
        Some(&mesh.verts[v as usize].payload)
    }
}
