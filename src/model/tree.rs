use super::{compare_values, EntityKind, ModelError, Receiver};
use crate::ast::Value;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    pub value: Value,
    pub left: Option<u64>,
    pub right: Option<u64>,
}

/// Binary search tree over numbers or strings
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Tree {
    pub nodes: BTreeMap<u64, TreeNode>,
    pub root: Option<u64>,
    next_node: u64,
}

/// Saved contents of selected tree nodes plus the tree header
#[derive(Debug, Clone, PartialEq)]
pub struct TreePatch {
    root: Option<u64>,
    next_node: u64,
    nodes: Vec<(u64, Option<TreeNode>)>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, value: &Value) -> Result<bool, ModelError> {
        Ok(self.find(value)?.is_some())
    }

    /// Returns `(node, parent)` for `value`
    fn find_with_parent(&self, value: &Value) -> Result<Option<(u64, Option<u64>)>, ModelError> {
        let mut parent = None;
        let mut cur = self.root;
        while let Some(id) = cur {
            let node = &self.nodes[&id];
            match compare_values(value, &node.value)? {
                Ordering::Equal => return Ok(Some((id, parent))),
                Ordering::Less => cur = node.left,
                Ordering::Greater => cur = node.right,
            }
            parent = Some(id);
        }
        Ok(None)
    }

    fn find(&self, value: &Value) -> Result<Option<u64>, ModelError> {
        Ok(self.find_with_parent(value)?.map(|(id, _)| id))
    }

    /// Insert `value`; returns false when it is already present
    pub fn insert(&mut self, value: Value) -> Result<bool, ModelError> {
        let mut parent: Option<(u64, Ordering)> = None;
        let mut cur = self.root;
        while let Some(id) = cur {
            let node = &self.nodes[&id];
            let ord = compare_values(&value, &node.value)?;
            match ord {
                Ordering::Equal => return Ok(false),
                Ordering::Less => cur = node.left,
                Ordering::Greater => cur = node.right,
            }
            parent = Some((id, ord));
        }

        let id = self.next_node;
        self.next_node += 1;
        self.nodes.insert(id, TreeNode { value, left: None, right: None });
        match parent {
            None => self.root = Some(id),
            Some((p, Ordering::Less)) => {
                if let Some(node) = self.nodes.get_mut(&p) {
                    node.left = Some(id);
                }
            }
            Some((p, _)) => {
                if let Some(node) = self.nodes.get_mut(&p) {
                    node.right = Some(id);
                }
            }
        }
        Ok(true)
    }

    fn replace_child(&mut self, parent: Option<u64>, old: u64, new: Option<u64>) {
        match parent {
            None => self.root = new,
            Some(p) => {
                if let Some(node) = self.nodes.get_mut(&p) {
                    if node.left == Some(old) {
                        node.left = new;
                    } else {
                        node.right = new;
                    }
                }
            }
        }
    }

    pub fn remove(&mut self, value: &Value) -> Result<(), ModelError> {
        let (id, parent) = self
            .find_with_parent(value)?
            .ok_or_else(|| ModelError::NotFound(value.to_string()))?;
        let (left, right) = {
            let node = &self.nodes[&id];
            (node.left, node.right)
        };

        match (left, right) {
            (None, child) | (child, None) => {
                self.replace_child(parent, id, child);
                self.nodes.remove(&id);
            }
            (Some(_), Some(r)) => {
                // Splice out the in-order successor and move its value up
                let mut succ_parent = id;
                let mut succ = r;
                while let Some(l) = self.nodes[&succ].left {
                    succ_parent = succ;
                    succ = l;
                }
                let succ_right = self.nodes[&succ].right;
                self.replace_child(Some(succ_parent), succ, succ_right);
                if let Some(moved) = self.nodes.remove(&succ) {
                    if let Some(node) = self.nodes.get_mut(&id) {
                        node.value = moved.value;
                    }
                }
            }
        }
        Ok(())
    }

    /// Nodes an insert or remove of `value` can rewrite: the search path, the
    /// successor chain of a two-child match, and the id a new node would take
    pub fn affected_nodes(&self, value: &Value) -> Vec<u64> {
        let mut out = Vec::new();
        let mut cur = self.root;
        while let Some(id) = cur {
            out.push(id);
            let node = &self.nodes[&id];
            match compare_values(value, &node.value) {
                Ok(Ordering::Less) => cur = node.left,
                Ok(Ordering::Greater) => cur = node.right,
                Ok(Ordering::Equal) => {
                    if node.left.is_some() {
                        let mut succ = node.right;
                        while let Some(s) = succ {
                            out.push(s);
                            succ = self.nodes[&s].left;
                        }
                    }
                    break;
                }
                Err(_) => break,
            }
        }
        out.push(self.next_node);
        out
    }

    /// Capture the header and the given node slots
    pub fn patch(&self, nodes: &[u64]) -> TreePatch {
        TreePatch {
            root: self.root,
            next_node: self.next_node,
            nodes: nodes.iter().map(|id| (*id, self.nodes.get(id).cloned())).collect(),
        }
    }

    /// Put captured nodes back; nodes absent at capture time are removed
    pub fn apply_patch(&mut self, patch: &TreePatch) {
        self.root = patch.root;
        self.next_node = patch.next_node;
        for (id, node) in &patch.nodes {
            match node {
                Some(n) => {
                    self.nodes.insert(*id, n.clone());
                }
                None => {
                    self.nodes.remove(id);
                }
            }
        }
    }

    /// In-order values
    pub fn values(&self) -> Vec<Value> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = Vec::new();
        let mut cur = self.root;
        while cur.is_some() || !stack.is_empty() {
            while let Some(id) = cur {
                stack.push(id);
                cur = self.nodes[&id].left;
            }
            if let Some(id) = stack.pop() {
                out.push(self.nodes[&id].value.clone());
                cur = self.nodes[&id].right;
            }
        }
        out
    }

    pub fn height(&self) -> usize {
        fn depth(tree: &Tree, node: Option<u64>) -> usize {
            match node {
                None => 0,
                Some(id) => {
                    let n = &tree.nodes[&id];
                    1 + depth(tree, n.left).max(depth(tree, n.right))
                }
            }
        }
        depth(self, self.root)
    }
}

impl Receiver for Tree {
    fn kind(&self) -> EntityKind {
        EntityKind::Tree
    }

    fn summary(&self) -> String {
        format!("tree {} (height {})", Value::List(self.values()), self.height())
    }

    fn position_of(&self, needle: &Value) -> Option<usize> {
        self.values().iter().position(|v| v == needle)
    }
}
