//! Sweep-status dictionary: the active edges crossing the sweep line,
//! kept in a sorted doubly-linked list.
//!
//! A list rather than a balanced tree, because insertions almost always
//! come with a good position hint and the comparator is only valid
//! relative to the current event. The comparator is therefore passed into
//! each call instead of being stored.
//!
//! Keys are active-region ids; the head sentinel at node 0 carries
//! [`NIL`]. Deleted nodes go on a free list chained through `next`.

use crate::mesh::NIL;

pub type NodeId = u32;

/// Index of the head sentinel node.
pub const HEAD: NodeId = 0;

#[derive(Clone, Debug)]
struct Node {
    key: u32,
    next: NodeId,
    prev: NodeId,
}

pub struct Dict {
    nodes: Vec<Node>,
    free_list: NodeId,
}

impl Dict {
    pub fn new() -> Self {
        Dict {
            nodes: vec![Node {
                key: NIL,
                next: HEAD,
                prev: HEAD,
            }],
            free_list: NIL,
        }
    }

    fn alloc(&mut self, key: u32, prev: NodeId, next: NodeId) -> NodeId {
        if self.free_list != NIL {
            let id = self.free_list;
            self.free_list = self.nodes[id as usize].next;
            self.nodes[id as usize] = Node { key, next, prev };
            id
        } else {
            self.nodes.push(Node { key, next, prev });
            (self.nodes.len() - 1) as NodeId
        }
    }

    /// Insert `key` at the back of the list (before the head sentinel),
    /// walking backward to the sorted position.
    #[cfg(test)]
    pub fn insert<F>(&mut self, key: u32, leq: F) -> NodeId
    where
        F: Fn(u32, u32) -> bool,
    {
        self.insert_before(HEAD, key, leq)
    }

    /// Insert `key` before `node`, walking backward from the hint until a
    /// node with `leq(node.key, key)` (or the sentinel) is found.
    pub fn insert_before<F>(&mut self, mut node: NodeId, key: u32, leq: F) -> NodeId
    where
        F: Fn(u32, u32) -> bool,
    {
        loop {
            node = self.nodes[node as usize].prev;
            let node_key = self.nodes[node as usize].key;
            if node_key == NIL || leq(node_key, key) {
                break;
            }
        }

        let next = self.nodes[node as usize].next;
        let new_node = self.alloc(key, node, next);
        self.nodes[node as usize].next = new_node;
        self.nodes[next as usize].prev = new_node;
        new_node
    }

    pub fn remove(&mut self, node: NodeId) {
        debug_assert!(node != HEAD);
        let next = self.nodes[node as usize].next;
        let prev = self.nodes[node as usize].prev;
        self.nodes[next as usize].prev = prev;
        self.nodes[prev as usize].next = next;
        self.nodes[node as usize].key = NIL;
        self.nodes[node as usize].next = self.free_list;
        self.free_list = node;
    }

    /// First node whose key satisfies `leq(key, node.key)`; the head
    /// sentinel when no such node exists.
    #[cfg(test)]
    pub fn search<F>(&self, key: u32, leq: F) -> NodeId
    where
        F: Fn(u32, u32) -> bool,
    {
        self.search_by(|node_key| leq(key, node_key))
    }

    /// First node whose key satisfies `found`, walking forward; the head
    /// sentinel when no such node exists. Used when the probe is not
    /// itself a stored key.
    pub fn search_by<F>(&self, found: F) -> NodeId
    where
        F: Fn(u32) -> bool,
    {
        let mut node = HEAD;
        loop {
            node = self.nodes[node as usize].next;
            let node_key = self.nodes[node as usize].key;
            if node_key == NIL || found(node_key) {
                return node;
            }
        }
    }

    #[inline]
    pub fn key(&self, node: NodeId) -> u32 {
        self.nodes[node as usize].key
    }

    #[inline]
    pub fn min(&self) -> NodeId {
        self.nodes[HEAD as usize].next
    }

    #[cfg(test)]
    pub fn max(&self) -> NodeId {
        self.nodes[HEAD as usize].prev
    }

    #[inline]
    pub fn succ(&self, node: NodeId) -> NodeId {
        self.nodes[node as usize].next
    }

    #[inline]
    pub fn pred(&self, node: NodeId) -> NodeId {
        self.nodes[node as usize].prev
    }
}

impl Default for Dict {
    fn default() -> Self {
        Self::new()
    }
}
