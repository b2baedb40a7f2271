//! Two-phase priority queue for sweep events.
//!
//! Events known up front are appended to an array and sorted once by
//! `init`; events discovered mid-sweep (intersection vertices) go into a
//! binary min-heap. `min`/`extract_min` compare the heads of both stores.
//! Handles allow removal from either store: negative handles index the
//! sorted array, non-negative handles index the heap.

use crate::geom::{vert_leq, Pt};
use crate::mesh::VertId;

/// Queue key: the projected sweep point plus the vertex it belongs to.
/// Carrying the coordinates in the key means the queue never has to look
/// back into the mesh, so a key is a stale snapshot if the vertex moves;
/// callers remove and re-insert when they change a queued vertex.
#[derive(Copy, Clone, Debug)]
pub struct EventKey {
    pub pt: Pt,
    pub vert: VertId,
}

#[inline]
fn key_leq(a: EventKey, b: EventKey) -> bool {
    vert_leq(a.pt, b.pt)
}

/// Handle returned by [`EventQueue::insert`].
pub type Handle = i32;

/// Min-heap with handle indirection, used for post-init inserts.
///
/// `nodes[1..=size]` hold handles; `handles[h]` holds the key and the
/// node slot it currently occupies. Freed handles are chained through the
/// node field.
struct Heap {
    nodes: Vec<i32>,
    keys: Vec<Option<EventKey>>,
    pos: Vec<i32>,
    size: usize,
    free_list: i32,
}

impl Heap {
    fn new() -> Self {
        // Slot 0 of `nodes` is unused; handle 0 is never allocated.
        Heap {
            nodes: vec![0, 0],
            keys: vec![None, None],
            pos: vec![0, 0],
            size: 0,
            free_list: 0,
        }
    }

    #[inline]
    fn key_at(&self, node: usize) -> EventKey {
        self.keys[self.nodes[node] as usize].unwrap()
    }

    fn float_down(&mut self, mut curr: usize) {
        let h_curr = self.nodes[curr];
        loop {
            let mut child = curr << 1;
            if child < self.size && key_leq(self.key_at(child + 1), self.key_at(child)) {
                child += 1;
            }
            if child > self.size
                || key_leq(
                    self.keys[h_curr as usize].unwrap(),
                    self.key_at(child),
                )
            {
                self.nodes[curr] = h_curr;
                self.pos[h_curr as usize] = curr as i32;
                return;
            }
            let h_child = self.nodes[child];
            self.nodes[curr] = h_child;
            self.pos[h_child as usize] = curr as i32;
            curr = child;
        }
    }

    fn float_up(&mut self, mut curr: usize) {
        let h_curr = self.nodes[curr];
        loop {
            let parent = curr >> 1;
            if parent == 0
                || key_leq(self.key_at(parent), self.keys[h_curr as usize].unwrap())
            {
                self.nodes[curr] = h_curr;
                self.pos[h_curr as usize] = curr as i32;
                return;
            }
            let h_parent = self.nodes[parent];
            self.nodes[curr] = h_parent;
            self.pos[h_parent as usize] = curr as i32;
            curr = parent;
        }
    }

    fn insert(&mut self, key: EventKey) -> Handle {
        self.size += 1;
        let curr = self.size;
        if curr + 1 >= self.nodes.len() {
            self.nodes.resize(curr + 2, 0);
        }

        let handle = if self.free_list == 0 {
            let h = self.keys.len() as i32;
            self.keys.push(None);
            self.pos.push(0);
            h
        } else {
            let h = self.free_list;
            self.free_list = self.pos[h as usize];
            h
        };

        self.nodes[curr] = handle;
        self.keys[handle as usize] = Some(key);
        self.pos[handle as usize] = curr as i32;
        self.float_up(curr);
        handle
    }

    fn min(&self) -> Option<EventKey> {
        if self.size == 0 {
            None
        } else {
            self.keys[self.nodes[1] as usize]
        }
    }

    fn extract_min(&mut self) -> Option<EventKey> {
        if self.size == 0 {
            return None;
        }
        let h_min = self.nodes[1];
        let key = self.keys[h_min as usize].take();

        self.nodes[1] = self.nodes[self.size];
        self.pos[self.nodes[1] as usize] = 1;
        self.pos[h_min as usize] = self.free_list;
        self.free_list = h_min;

        self.size -= 1;
        if self.size > 0 {
            self.float_down(1);
        }
        key
    }

    fn remove(&mut self, handle: Handle) {
        debug_assert!(self.keys[handle as usize].is_some());
        let curr = self.pos[handle as usize] as usize;

        self.nodes[curr] = self.nodes[self.size];
        self.pos[self.nodes[curr] as usize] = curr as i32;

        self.size -= 1;
        if curr <= self.size {
            if curr <= 1 || key_leq(self.key_at(curr >> 1), self.key_at(curr)) {
                self.float_down(curr);
            } else {
                self.float_up(curr);
            }
        }

        self.keys[handle as usize] = None;
        self.pos[handle as usize] = self.free_list;
        self.free_list = handle;
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.size == 0
    }
}

/// The combined sort-array + heap event queue.
pub struct EventQueue {
    heap: Heap,
    keys: Vec<Option<EventKey>>,
    /// Indices into `keys`, sorted descending so the minimum pops off the end.
    order: Vec<usize>,
    size: usize,
    initialized: bool,
}

impl EventQueue {
    pub fn with_capacity(n: usize) -> Self {
        EventQueue {
            heap: Heap::new(),
            keys: Vec::with_capacity(n),
            order: Vec::new(),
            size: 0,
            initialized: false,
        }
    }

    /// Sorts the pre-init array. Must run after the bulk inserts and before
    /// the first `min`/`extract_min`/`remove`.
    pub fn init(&mut self) {
        debug_assert!(!self.initialized);
        self.order = (0..self.size).collect();
        let keys = &self.keys;
        // Descending, so the minimum pops off the end. Must be a total
        // order (equal keys do occur; contours share vertices), hence
        // `total_cmp` rather than a boolean `vert_leq` bridge.
        self.order.sort_unstable_by(|&a, &b| {
            let (ka, kb) = (keys[a].unwrap(), keys[b].unwrap());
            kb.pt.s.total_cmp(&ka.pt.s).then(kb.pt.t.total_cmp(&ka.pt.t))
        });
        self.initialized = true;
    }

    pub fn insert(&mut self, key: EventKey) -> Handle {
        if self.initialized {
            return self.heap.insert(key);
        }
        let slot = self.size;
        self.size += 1;
        self.keys.push(Some(key));
        // Negative handles index the sort array.
        -(slot as i32 + 1)
    }

    pub fn min(&self) -> Option<EventKey> {
        if self.size == 0 {
            return self.heap.min();
        }
        let sort_min = self.keys[self.order[self.size - 1]].unwrap();
        if let Some(heap_min) = self.heap.min() {
            if key_leq(heap_min, sort_min) {
                return Some(heap_min);
            }
        }
        Some(sort_min)
    }

    pub fn extract_min(&mut self) -> Option<EventKey> {
        if self.size == 0 {
            return self.heap.extract_min();
        }
        let sort_min = self.keys[self.order[self.size - 1]].unwrap();
        if let Some(heap_min) = self.heap.min() {
            if key_leq(heap_min, sort_min) {
                return self.heap.extract_min();
            }
        }
        // Pop from the sort array, skipping removed entries.
        loop {
            self.size -= 1;
            if self.size == 0 || self.keys[self.order[self.size - 1]].is_some() {
                break;
            }
        }
        Some(sort_min)
    }

    pub fn remove(&mut self, handle: Handle) {
        if handle >= 0 {
            self.heap.remove(handle);
            return;
        }
        let slot = (-(handle + 1)) as usize;
        debug_assert!(self.keys[slot].is_some());
        self.keys[slot] = None;
        while self.size > 0 && self.keys[self.order[self.size - 1]].is_none() {
            self.size -= 1;
        }
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.size == 0 && self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: f32, t: f32, vert: VertId) -> EventKey {
        EventKey {
            pt: Pt::new(s, t),
            vert,
        }
    }

    #[test]
    fn bulk_insert_then_ascending_extraction() {
        let mut q = EventQueue::with_capacity(4);
        q.insert(key(5.0, 0.0, 1));
        q.insert(key(2.0, 0.0, 2));
        q.insert(key(8.0, 0.0, 3));
        q.insert(key(2.0, -1.0, 4));
        q.init();

        assert_eq!(q.extract_min().unwrap().vert, 4);
        assert_eq!(q.extract_min().unwrap().vert, 2);
        assert_eq!(q.extract_min().unwrap().vert, 1);
        assert_eq!(q.extract_min().unwrap().vert, 3);
        assert!(q.is_empty());
        assert!(q.extract_min().is_none());
    }

    #[test]
    fn post_init_insert_goes_to_heap() {
        let mut q = EventQueue::with_capacity(2);
        q.insert(key(3.0, 0.0, 1));
        q.init();
        q.insert(key(1.0, 0.0, 2));
        assert_eq!(q.min().unwrap().vert, 2);
        assert_eq!(q.extract_min().unwrap().vert, 2);
        assert_eq!(q.extract_min().unwrap().vert, 1);
        assert!(q.is_empty());
    }

    #[test]
    fn remove_from_either_store() {
        let mut q = EventQueue::with_capacity(4);
        let h_sorted = q.insert(key(1.0, 0.0, 1));
        q.insert(key(2.0, 0.0, 2));
        q.init();
        let h_heap = q.insert(key(0.5, 0.0, 3));
        assert!(h_sorted < 0);
        assert!(h_heap >= 0);

        q.remove(h_heap);
        q.remove(h_sorted);
        assert_eq!(q.extract_min().unwrap().vert, 2);
        assert!(q.is_empty());
    }

    #[test]
    fn duplicate_keys_sort_and_extract_in_order() {
        // Shared contour vertices produce exactly-equal keys; the bulk
        // sort must tolerate ties.
        let mut q = EventQueue::with_capacity(16);
        for i in 0..4 {
            q.insert(key(1.0, 2.0, i));
            q.insert(key(0.0, 0.0, 10 + i));
        }
        q.init();
        let mut count = 0;
        let mut last: Option<Pt> = None;
        while let Some(k) = q.extract_min() {
            if let Some(prev) = last {
                assert!(vert_leq(prev, k.pt));
            }
            last = Some(k.pt);
            count += 1;
        }
        assert_eq!(count, 8);
    }

    #[test]
    fn min_matches_extract_order_under_interleaving() {
        let mut q = EventQueue::with_capacity(8);
        for i in 0..8 {
            q.insert(key((7 - i) as f32, 0.0, i as VertId));
        }
        q.init();
        q.insert(key(3.5, 0.0, 100));
        let mut last: Option<Pt> = None;
        while let Some(k) = q.min() {
            let e = q.extract_min().unwrap();
            assert_eq!(e.vert, k.vert);
            if let Some(prev) = last {
                assert!(vert_leq(prev, e.pt));
            }
            last = Some(e.pt);
        }
    }
}
