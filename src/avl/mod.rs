//! Height-balanced binary search tree used as the CFS ready index.
//!
//! Nodes live in a [`SlotMap`] arena and refer to each other by [`NodeId`],
//! so dropping the tree never recurses and freed slots are reused.
//!
//! Insertion picks its rotation by comparing the inserted key against the
//! unbalanced node's child. Removal picks its rotation from the child's own
//! balance factor. Both keep `|height(left) - height(right)| <= 1` at every
//! node.

use std::cmp::Ordering;

use slotmap::{SlotMap, new_key_type};
use thiserror::Error;

new_key_type! {
    pub struct NodeId;
}

#[derive(Debug, Clone)]
struct Node<K, V> {
    key: K,
    value: V,
    left: Option<NodeId>,
    right: Option<NodeId>,
    height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AvlViolation {
    #[error("in-order traversal is not strictly increasing")]
    Unordered,
    #[error("node balance factor {0} outside [-1, 1]")]
    Unbalanced(i64),
    #[error("cached height {cached} but subtree height is {actual}")]
    StaleHeight { cached: u32, actual: u32 },
    #[error("{reachable} nodes reachable from the root but arena holds {stored}")]
    Leaked { reachable: usize, stored: usize },
}

#[derive(Debug, Clone)]
pub struct AvlTree<K, V> {
    nodes: SlotMap<NodeId, Node<K, V>>,
    root: Option<NodeId>,
}

impl<K, V> Default for AvlTree<K, V> {
    fn default() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root: None,
        }
    }
}

impl<K: Ord + Copy, V: Copy> AvlTree<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn height(&self) -> u32 {
        self.height_of(self.root)
    }

    /// Smallest entry, left in place. The caller removes it with
    /// [`AvlTree::remove`] once it decides to take it.
    pub fn first(&self) -> Option<(K, V)> {
        let id = self.min_node(self.root?);
        let node = &self.nodes[id];
        Some((node.key, node.value))
    }

    pub fn contains(&self, key: &K) -> bool {
        let mut cursor = self.root;
        while let Some(id) = cursor {
            let node = &self.nodes[id];
            cursor = match key.cmp(&node.key) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return true,
            };
        }
        false
    }

    /// Insert `value` under `key`. An existing entry with an equal key has
    /// its value replaced and returned.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let mut replaced = None;
        let root = self.insert_at(self.root, key, value, &mut replaced);
        self.root = Some(root);
        replaced
    }

    /// Remove the entry with `key`. Absent keys leave the tree untouched.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let mut removed = None;
        self.root = self.remove_at(self.root, key, &mut removed);
        removed
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        let mut iter = Iter {
            tree: self,
            stack: Vec::new(),
        };
        iter.push_left(self.root);
        iter
    }

    /// Walk the whole tree and check ordering, balance and cached heights.
    pub fn validate(&self) -> Result<(), AvlViolation> {
        let mut prev: Option<K> = None;
        for (key, _) in self.iter() {
            if prev.is_some_and(|prev| prev >= key) {
                return Err(AvlViolation::Unordered);
            }
            prev = Some(key);
        }

        let mut reachable = 0;
        self.check_subtree(self.root, &mut reachable)?;
        if reachable != self.nodes.len() {
            return Err(AvlViolation::Leaked {
                reachable,
                stored: self.nodes.len(),
            });
        }
        Ok(())
    }

    fn check_subtree(&self, node: Option<NodeId>, count: &mut usize) -> Result<u32, AvlViolation> {
        let Some(id) = node else {
            return Ok(0);
        };
        *count += 1;
        let node = &self.nodes[id];
        let left = self.check_subtree(node.left, count)?;
        let right = self.check_subtree(node.right, count)?;

        let balance = left as i64 - right as i64;
        if balance.abs() > 1 {
            return Err(AvlViolation::Unbalanced(balance));
        }
        let actual = 1 + left.max(right);
        if node.height != actual {
            return Err(AvlViolation::StaleHeight {
                cached: node.height,
                actual,
            });
        }
        Ok(actual)
    }

    fn insert_at(
        &mut self,
        node: Option<NodeId>,
        key: K,
        value: V,
        replaced: &mut Option<V>,
    ) -> NodeId {
        let Some(id) = node else {
            return self.nodes.insert(Node {
                key,
                value,
                left: None,
                right: None,
                height: 1,
            });
        };

        match key.cmp(&self.nodes[id].key) {
            Ordering::Less => {
                let left = self.insert_at(self.nodes[id].left, key, value, replaced);
                self.nodes[id].left = Some(left);
            }
            Ordering::Greater => {
                let right = self.insert_at(self.nodes[id].right, key, value, replaced);
                self.nodes[id].right = Some(right);
            }
            Ordering::Equal => {
                *replaced = Some(std::mem::replace(&mut self.nodes[id].value, value));
                return id;
            }
        }

        self.update_height(id);
        let balance = self.balance_of(Some(id));

        if balance > 1 {
            if let Some(left) = self.nodes[id].left {
                if key < self.nodes[left].key {
                    return self.rotate_right(id);
                }
                let left = self.rotate_left(left);
                self.nodes[id].left = Some(left);
                return self.rotate_right(id);
            }
        }

        if balance < -1 {
            if let Some(right) = self.nodes[id].right {
                if key > self.nodes[right].key {
                    return self.rotate_left(id);
                }
                let right = self.rotate_right(right);
                self.nodes[id].right = Some(right);
                return self.rotate_left(id);
            }
        }

        id
    }

    fn remove_at(
        &mut self,
        node: Option<NodeId>,
        key: &K,
        removed: &mut Option<V>,
    ) -> Option<NodeId> {
        let id = node?;

        match key.cmp(&self.nodes[id].key) {
            Ordering::Less => {
                let left = self.remove_at(self.nodes[id].left, key, removed);
                self.nodes[id].left = left;
            }
            Ordering::Greater => {
                let right = self.remove_at(self.nodes[id].right, key, removed);
                self.nodes[id].right = right;
            }
            Ordering::Equal => match (self.nodes[id].left, self.nodes[id].right) {
                (Some(_), Some(right)) => {
                    // Take over the in-order successor's entry, then drop the
                    // successor from the right subtree.
                    let succ = self.min_node(right);
                    let (succ_key, succ_value) = (self.nodes[succ].key, self.nodes[succ].value);
                    let mut discarded = None;
                    let right = self.remove_at(Some(right), &succ_key, &mut discarded);

                    let node = &mut self.nodes[id];
                    *removed = Some(node.value);
                    node.key = succ_key;
                    node.value = succ_value;
                    node.right = right;
                }
                (child, None) | (None, child) => {
                    *removed = self.nodes.remove(id).map(|node| node.value);
                    return child;
                }
            },
        }

        self.update_height(id);
        let balance = self.balance_of(Some(id));

        if balance > 1 {
            if let Some(left) = self.nodes[id].left {
                if self.balance_of(Some(left)) < 0 {
                    let left = self.rotate_left(left);
                    self.nodes[id].left = Some(left);
                }
                return Some(self.rotate_right(id));
            }
        }

        if balance < -1 {
            if let Some(right) = self.nodes[id].right {
                if self.balance_of(Some(right)) > 0 {
                    let right = self.rotate_right(right);
                    self.nodes[id].right = Some(right);
                }
                return Some(self.rotate_left(id));
            }
        }

        Some(id)
    }

    fn min_node(&self, mut id: NodeId) -> NodeId {
        while let Some(left) = self.nodes[id].left {
            id = left;
        }
        id
    }

    fn height_of(&self, node: Option<NodeId>) -> u32 {
        node.map_or(0, |id| self.nodes[id].height)
    }

    fn balance_of(&self, node: Option<NodeId>) -> i64 {
        node.map_or(0, |id| {
            let node = &self.nodes[id];
            self.height_of(node.left) as i64 - self.height_of(node.right) as i64
        })
    }

    fn update_height(&mut self, id: NodeId) {
        let node = &self.nodes[id];
        let height = 1 + self.height_of(node.left).max(self.height_of(node.right));
        self.nodes[id].height = height;
    }

    //     y          x
    //    / \        / \
    //   x   c  ->  a   y
    //  / \            / \
    // a   b          b   c
    fn rotate_right(&mut self, y: NodeId) -> NodeId {
        let Some(x) = self.nodes[y].left else {
            return y;
        };
        let b = self.nodes[x].right;
        self.nodes[x].right = Some(y);
        self.nodes[y].left = b;
        self.update_height(y);
        self.update_height(x);
        x
    }

    fn rotate_left(&mut self, x: NodeId) -> NodeId {
        let Some(y) = self.nodes[x].right else {
            return x;
        };
        let b = self.nodes[y].left;
        self.nodes[y].left = Some(x);
        self.nodes[x].right = b;
        self.update_height(x);
        self.update_height(y);
        y
    }
}

/// In-order iterator over `(key, value)` pairs.
pub struct Iter<'a, K, V> {
    tree: &'a AvlTree<K, V>,
    stack: Vec<NodeId>,
}

impl<K, V> Iter<'_, K, V> {
    fn push_left(&mut self, mut node: Option<NodeId>) {
        while let Some(id) = node {
            self.stack.push(id);
            node = self.tree.nodes[id].left;
        }
    }
}

impl<K: Copy, V: Copy> Iterator for Iter<'_, K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = &self.tree.nodes[id];
        let item = (node.key, node.value);
        let right = node.right;
        self.push_left(right);
        Some(item)
    }
}
