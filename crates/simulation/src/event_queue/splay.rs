//! Splay-tree backend.
//!
//! Arena-backed top-down splay tree (Sleator & Tarjan). Nodes live in a
//! `Vec` and link by index; freed slots are recycled. Every key is a
//! unique [`EventKey`], so equal fire times are ordered strictly by
//! sequence number and never by tree shape.

use super::PendingEventSet;
use std::cmp::Ordering;
use tempo_core::{Event, EventKey};

const NIL: usize = usize::MAX;

struct Node<P> {
    key: EventKey,
    event: Option<Event<P>>,
    left: usize,
    right: usize,
}

/// Self-adjusting binary search tree of events.
pub struct SplayQueue<P> {
    nodes: Vec<Node<P>>,
    free: Vec<usize>,
    root: usize,
    len: usize,
}

impl<P> SplayQueue<P> {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: NIL,
            len: 0,
        }
    }

    fn alloc(&mut self, event: Event<P>) -> usize {
        let node = Node {
            key: event.key(),
            event: Some(event),
            left: NIL,
            right: NIL,
        };
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    /// Top-down splay of the subtree rooted at `t`.
    ///
    /// `locate(key)` reports where the sought position lies relative to a
    /// node's key. The node reached last becomes the new root.
    fn splay(&mut self, mut t: usize, locate: impl Fn(&EventKey) -> Ordering) -> usize {
        if t == NIL {
            return NIL;
        }
        // Roots of the assembled left and right trees, and their
        // attachment points (NIL while still empty).
        let (mut left_root, mut right_root) = (NIL, NIL);
        let (mut l, mut r) = (NIL, NIL);

        loop {
            match locate(&self.nodes[t].key) {
                Ordering::Less => {
                    let mut child = self.nodes[t].left;
                    if child == NIL {
                        break;
                    }
                    if locate(&self.nodes[child].key) == Ordering::Less {
                        // rotate right
                        self.nodes[t].left = self.nodes[child].right;
                        self.nodes[child].right = t;
                        t = child;
                        child = self.nodes[t].left;
                        if child == NIL {
                            break;
                        }
                    }
                    // link right
                    if r == NIL {
                        right_root = t;
                    } else {
                        self.nodes[r].left = t;
                    }
                    r = t;
                    t = child;
                }
                Ordering::Greater => {
                    let mut child = self.nodes[t].right;
                    if child == NIL {
                        break;
                    }
                    if locate(&self.nodes[child].key) == Ordering::Greater {
                        // rotate left
                        self.nodes[t].right = self.nodes[child].left;
                        self.nodes[child].left = t;
                        t = child;
                        child = self.nodes[t].right;
                        if child == NIL {
                            break;
                        }
                    }
                    // link left
                    if l == NIL {
                        left_root = t;
                    } else {
                        self.nodes[l].right = t;
                    }
                    l = t;
                    t = child;
                }
                Ordering::Equal => break,
            }
        }

        // assemble
        let (t_left, t_right) = (self.nodes[t].left, self.nodes[t].right);
        if l == NIL {
            left_root = t_left;
        } else {
            self.nodes[l].right = t_left;
        }
        if r == NIL {
            right_root = t_right;
        } else {
            self.nodes[r].left = t_right;
        }
        self.nodes[t].left = left_root;
        self.nodes[t].right = right_root;
        t
    }
}

impl<P> Default for SplayQueue<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> PendingEventSet<P> for SplayQueue<P> {
    fn insert(&mut self, event: Event<P>) {
        let key = event.key();
        let idx = self.alloc(event);
        self.len += 1;

        if self.root == NIL {
            self.root = idx;
            return;
        }

        let root = self.splay(self.root, |k| key.cmp(k));
        if key < self.nodes[root].key {
            self.nodes[idx].left = self.nodes[root].left;
            self.nodes[idx].right = root;
            self.nodes[root].left = NIL;
        } else {
            debug_assert!(key != self.nodes[root].key, "duplicate event key");
            self.nodes[idx].right = self.nodes[root].right;
            self.nodes[idx].left = root;
            self.nodes[root].right = NIL;
        }
        self.root = idx;
    }

    fn peek_first(&self) -> Option<&Event<P>> {
        if self.root == NIL {
            return None;
        }
        let mut t = self.root;
        while self.nodes[t].left != NIL {
            t = self.nodes[t].left;
        }
        self.nodes[t].event.as_ref()
    }

    fn remove_first(&mut self) -> Option<Event<P>> {
        if self.root == NIL {
            return None;
        }
        // Splaying towards "smaller than everything" brings the minimum
        // to the root with an empty left subtree.
        let min = self.splay(self.root, |_| Ordering::Less);
        debug_assert_eq!(self.nodes[min].left, NIL);
        self.root = self.nodes[min].right;
        self.nodes[min].right = NIL;
        self.free.push(min);
        self.len -= 1;
        self.nodes[min].event.take()
    }

    fn len(&self) -> usize {
        self.len
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.root = NIL;
        self.len = 0;
    }
}
