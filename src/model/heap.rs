use super::{compare_values, EntityKind, ModelError, Receiver};
use crate::ast::Value;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Prior contents of heap slots overwritten by one push or pop
pub type SlotLog = BTreeMap<usize, Value>;

/// Binary min-heap laid out in an array
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Heap {
    pub items: Vec<Value>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn peek(&self) -> Option<&Value> {
        self.items.first()
    }

    fn less(&self, a: usize, b: usize) -> Result<bool, ModelError> {
        Ok(compare_values(&self.items[a], &self.items[b])? == Ordering::Less)
    }

    pub fn push(&mut self, value: Value) -> Result<(), ModelError> {
        self.push_logged(value, &mut SlotLog::new())
    }

    pub fn pop(&mut self) -> Result<Value, ModelError> {
        self.pop_logged(&mut SlotLog::new())
    }

    /// Swap two slots, remembering the first value each slot held
    fn swap_logged(&mut self, a: usize, b: usize, log: &mut SlotLog) {
        for i in [a, b] {
            log.entry(i).or_insert_with(|| self.items[i].clone());
        }
        self.items.swap(a, b);
    }

    /// Push and sift up; `log` gains the prior value of every slot moved
    pub fn push_logged(&mut self, value: Value, log: &mut SlotLog) -> Result<(), ModelError> {
        if let Some(top) = self.items.first() {
            compare_values(&value, top)?;
        }
        self.items.push(value);
        let mut i = self.items.len() - 1;
        while i > 0 {
            let parent = (i - 1) / 2;
            if !self.less(i, parent)? {
                break;
            }
            self.swap_logged(i, parent, log);
            i = parent;
        }
        Ok(())
    }

    /// Pop the minimum and sift down; `log` gains the prior value of every
    /// slot moved, including the vacated last slot
    pub fn pop_logged(&mut self, log: &mut SlotLog) -> Result<Value, ModelError> {
        if self.items.is_empty() {
            return Err(ModelError::Empty("heap"));
        }
        let last = self.items.len() - 1;
        self.swap_logged(0, last, log);
        let top = self.items.pop().ok_or(ModelError::Empty("heap"))?;

        let len = self.items.len();
        let mut i = 0;
        loop {
            let left = 2 * i + 1;
            let right = left + 1;
            let mut smallest = i;
            if left < len && self.less(left, smallest)? {
                smallest = left;
            }
            if right < len && self.less(right, smallest)? {
                smallest = right;
            }
            if smallest == i {
                break;
            }
            self.swap_logged(i, smallest, log);
            i = smallest;
        }
        Ok(top)
    }
}

impl Receiver for Heap {
    fn kind(&self) -> EntityKind {
        EntityKind::Heap
    }

    fn summary(&self) -> String {
        format!("heap {}", Value::List(self.items.clone()))
    }

    fn position_of(&self, needle: &Value) -> Option<usize> {
        self.items.iter().position(|v| v == needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_in_order() {
        let mut h = Heap::new();
        for n in [5.0, 1.0, 4.0, 2.0, 3.0] {
            h.push(Value::Number(n)).unwrap();
        }
        let mut out = Vec::new();
        while !h.is_empty() {
            out.push(h.pop().unwrap());
        }
        let expected: Vec<Value> = [1.0, 2.0, 3.0, 4.0, 5.0].iter().map(|n| Value::Number(*n)).collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_pop_empty() {
        let mut h = Heap::new();
        assert_eq!(h.pop(), Err(ModelError::Empty("heap")));
    }

    #[test]
    fn test_pop_logs_moved_slots() {
        let mut h = Heap::new();
        for n in [1.0, 2.0, 3.0, 4.0] {
            h.push(Value::Number(n)).unwrap();
        }
        let mut log = SlotLog::new();
        assert_eq!(h.pop_logged(&mut log).unwrap(), Value::Number(1.0));
        // 4 moved to the root then sank below 2
        assert_eq!(h.items, vec![Value::Number(2.0), Value::Number(4.0), Value::Number(3.0)]);
        let logged: Vec<usize> = log.keys().copied().collect();
        assert_eq!(logged, vec![0, 1, 3]);
        assert_eq!(log[&0], Value::Number(1.0));
        assert_eq!(log[&1], Value::Number(2.0));
        assert_eq!(log[&3], Value::Number(4.0));
    }

    #[test]
    fn test_peek() {
        let mut h = Heap::new();
        h.push(Value::Str("b".into())).unwrap();
        h.push(Value::Str("a".into())).unwrap();
        assert_eq!(h.peek(), Some(&Value::Str("a".into())));
    }
}
