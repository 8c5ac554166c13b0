use super::{EntityKind, ModelError, Receiver};
use crate::ast::Value;
use serde::Serialize;
use std::collections::BTreeMap;

/// Singly linked list stored as node and edge maps
///
/// `nodes` maps node id to value, `edges` maps a node id to its successor.
/// Positions are computed by walking from `head`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LinkedList {
    pub nodes: BTreeMap<u64, Value>,
    pub edges: BTreeMap<u64, u64>,
    pub head: Option<u64>,
    next_node: u64,
}

/// Saved contents of selected list slots plus the list header
#[derive(Debug, Clone, PartialEq)]
pub struct ListPatch {
    head: Option<u64>,
    next_node: u64,
    nodes: Vec<(u64, Option<Value>)>,
    edges: Vec<(u64, Option<u64>)>,
}

impl LinkedList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Self {
        let mut list = Self::new();
        for v in values {
            list.append(v);
        }
        list
    }

    /// Node ids in list order
    pub fn order(&self) -> Vec<u64> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut cur = self.head;
        while let Some(id) = cur {
            out.push(id);
            cur = self.edges.get(&id).copied();
        }
        out
    }

    pub fn values(&self) -> Vec<Value> {
        self.order()
            .into_iter()
            .filter_map(|id| self.nodes.get(&id).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Id the next created node will receive
    pub fn next_node_id(&self) -> u64 {
        self.next_node
    }

    /// Id of the node at `index`
    pub fn node_at(&self, index: usize) -> Result<u64, ModelError> {
        self.order()
            .get(index)
            .copied()
            .ok_or(ModelError::IndexOutOfRange { index, len: self.len() })
    }

    fn fresh_node(&mut self, value: Value) -> u64 {
        let id = self.next_node;
        self.next_node += 1;
        self.nodes.insert(id, value);
        id
    }

    /// Capture the header and the given node and edge slots
    pub fn patch(&self, nodes: &[u64], edges: &[u64]) -> ListPatch {
        ListPatch {
            head: self.head,
            next_node: self.next_node,
            nodes: nodes.iter().map(|id| (*id, self.nodes.get(id).cloned())).collect(),
            edges: edges.iter().map(|id| (*id, self.edges.get(id).copied())).collect(),
        }
    }

    /// Put captured slots back; slots absent at capture time are removed
    pub fn apply_patch(&mut self, patch: &ListPatch) {
        self.head = patch.head;
        self.next_node = patch.next_node;
        for (id, value) in &patch.nodes {
            match value {
                Some(v) => {
                    self.nodes.insert(*id, v.clone());
                }
                None => {
                    self.nodes.remove(id);
                }
            }
        }
        for (id, next) in &patch.edges {
            match next {
                Some(n) => {
                    self.edges.insert(*id, *n);
                }
                None => {
                    self.edges.remove(id);
                }
            }
        }
    }

    pub fn get(&self, index: usize) -> Result<Value, ModelError> {
        let id = self.node_at(index)?;
        Ok(self.nodes[&id].clone())
    }

    pub fn set(&mut self, index: usize, value: Value) -> Result<(), ModelError> {
        let id = self.node_at(index)?;
        self.nodes.insert(id, value);
        Ok(())
    }

    pub fn append(&mut self, value: Value) {
        let tail = self.order().last().copied();
        let id = self.fresh_node(value);
        match tail {
            Some(t) => {
                self.edges.insert(t, id);
            }
            None => self.head = Some(id),
        }
    }

    pub fn prepend(&mut self, value: Value) {
        let old_head = self.head;
        let id = self.fresh_node(value);
        if let Some(h) = old_head {
            self.edges.insert(id, h);
        }
        self.head = Some(id);
    }

    /// Attach a new node directly after the node at `index`
    pub fn insert_after(&mut self, index: usize, value: Value) -> Result<(), ModelError> {
        let prev = self.node_at(index)?;
        let id = self.fresh_node(value);
        if let Some(next) = self.edges.insert(prev, id) {
            self.edges.insert(id, next);
        }
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<Value, ModelError> {
        let order = self.order();
        let id = *order
            .get(index)
            .ok_or(ModelError::IndexOutOfRange { index, len: order.len() })?;
        let next = self.edges.remove(&id);
        if index == 0 {
            self.head = next;
        } else {
            let prev = order[index - 1];
            match next {
                Some(n) => {
                    self.edges.insert(prev, n);
                }
                None => {
                    self.edges.remove(&prev);
                }
            }
        }
        self.nodes
            .remove(&id)
            .ok_or(ModelError::IndexOutOfRange { index, len: order.len() })
    }
}

impl Receiver for LinkedList {
    fn kind(&self) -> EntityKind {
        EntityKind::List
    }

    fn summary(&self) -> String {
        let parts: Vec<String> = self.values().iter().map(|v| v.to_string()).collect();
        if parts.is_empty() {
            "list (empty)".to_string()
        } else {
            format!("list {}", parts.join(" -> "))
        }
    }

    fn position_of(&self, needle: &Value) -> Option<usize> {
        self.values().iter().position(|v| v == needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nums(values: &[f64]) -> Vec<Value> {
        values.iter().map(|n| Value::Number(*n)).collect()
    }

    #[test]
    fn test_append_and_order() {
        let list = LinkedList::from_values(nums(&[1.0, 2.0, 3.0]));
        assert_eq!(list.values(), nums(&[1.0, 2.0, 3.0]));
        assert_eq!(list.edges.len(), 2);
    }

    #[test]
    fn test_insert_after_middle() {
        let mut list = LinkedList::from_values(nums(&[1.0, 3.0]));
        list.insert_after(0, Value::Number(2.0)).unwrap();
        assert_eq!(list.values(), nums(&[1.0, 2.0, 3.0]));
    }

    #[test]
    fn test_insert_after_tail() {
        let mut list = LinkedList::from_values(nums(&[1.0]));
        list.insert_after(0, Value::Number(5.0)).unwrap();
        assert_eq!(list.values(), nums(&[1.0, 5.0]));
    }

    #[test]
    fn test_insert_after_out_of_range() {
        let mut list = LinkedList::new();
        assert_eq!(
            list.insert_after(0, Value::Nil),
            Err(ModelError::IndexOutOfRange { index: 0, len: 0 })
        );
        assert!(list.nodes.is_empty());
    }

    #[test]
    fn test_remove_head_middle_tail() {
        let mut list = LinkedList::from_values(nums(&[1.0, 2.0, 3.0, 4.0]));
        assert_eq!(list.remove(0).unwrap(), Value::Number(1.0));
        assert_eq!(list.remove(1).unwrap(), Value::Number(3.0));
        assert_eq!(list.remove(1).unwrap(), Value::Number(4.0));
        assert_eq!(list.values(), nums(&[2.0]));
        assert!(list.edges.is_empty());
    }

    #[test]
    fn test_patch_round_trips_remove() {
        let mut list = LinkedList::from_values(nums(&[1.0, 2.0, 3.0]));
        let original = list.clone();
        let (prev, id) = (list.node_at(0).unwrap(), list.node_at(1).unwrap());
        let before = list.patch(&[id], &[id, prev]);
        list.remove(1).unwrap();
        let after = list.patch(&[id], &[id, prev]);
        list.apply_patch(&before);
        assert_eq!(list, original);
        list.apply_patch(&after);
        assert_eq!(list.values(), nums(&[1.0, 3.0]));
    }

    #[test]
    fn test_prepend() {
        let mut list = LinkedList::from_values(nums(&[2.0]));
        list.prepend(Value::Number(1.0));
        assert_eq!(list.values(), nums(&[1.0, 2.0]));
    }
}
