use crate::core::components::Component;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// What a component does when its event comes due
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Read inputs and fire
    Wake,
    /// Publish outputs
    Emit,
}

#[derive(Debug, Clone)]
pub struct ScheduledAction {
    pub time: f64,
    pub sequence_num: u64,
    pub component: Component,
    pub action: Action,
}

impl PartialEq for ScheduledAction {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScheduledAction {}

impl PartialOrd for ScheduledAction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledAction {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default)
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.sequence_num.cmp(&self.sequence_num))
    }
}

/// Time-ordered queue of component actions; ties pop in scheduling order
#[derive(Debug, Default)]
pub struct ActionQueue {
    heap: BinaryHeap<ScheduledAction>,
    sequence_counter: u64,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `action` for `component` at absolute virtual time `time`
    pub fn schedule(&mut self, time: f64, component: Component, action: Action) {
        self.heap.push(ScheduledAction {
            time,
            sequence_num: self.sequence_counter,
            component,
            action,
        });
        self.sequence_counter += 1;
    }

    /// Put back an action popped earlier, no sooner than `not_before`.
    ///
    /// It keeps its sequence number, so it still precedes actions scheduled
    /// after it for the same time.
    pub fn requeue(&mut self, mut scheduled: ScheduledAction, not_before: f64) {
        scheduled.time = scheduled.time.max(not_before);
        self.heap.push(scheduled);
    }

    /// Time of the earliest pending action
    pub fn peek_time(&self) -> Option<f64> {
        self.heap.peek().map(|scheduled| scheduled.time)
    }

    /// Pop the earliest action if it is due exactly at `time`
    pub fn pop_at(&mut self, time: f64) -> Option<ScheduledAction> {
        if self.peek_time()? == time {
            self.heap.pop()
        } else {
            None
        }
    }

    pub fn has_events(&self) -> bool {
        !self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pops_in_time_then_sequence_order() {
        let (a, b, c) = (Component::default(), Component::default(), Component::default());
        let mut queue = ActionQueue::new();
        queue.schedule(2.0, a.clone(), Action::Emit);
        queue.schedule(1.0, b.clone(), Action::Wake);
        queue.schedule(1.0, c.clone(), Action::Wake);

        assert_eq!(queue.peek_time(), Some(1.0));
        assert!(queue.pop_at(1.0).unwrap().component.ptr_eq(&b));
        assert!(queue.pop_at(1.0).unwrap().component.ptr_eq(&c));
        assert!(queue.pop_at(1.0).is_none());
        let last = queue.pop_at(2.0).unwrap();
        assert_eq!(last.action, Action::Emit);
        assert!(last.component.ptr_eq(&a));
        assert!(!queue.has_events());
    }

    #[test]
    fn test_requeue_keeps_position() {
        let (a, b) = (Component::default(), Component::default());
        let mut queue = ActionQueue::new();
        queue.schedule(1.0, a.clone(), Action::Wake);
        queue.schedule(1.0, b, Action::Wake);
        let first = queue.pop_at(1.0).unwrap();
        queue.requeue(first, 0.5);
        assert!(queue.pop_at(1.0).unwrap().component.ptr_eq(&a));
        assert_eq!(queue.len(), 1);
        queue.clear();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_requeue_never_moves_earlier_than_floor() {
        let mut queue = ActionQueue::new();
        queue.schedule(0.0, Component::default(), Action::Wake);
        queue.schedule(3.0, Component::default(), Action::Emit);
        let stale = queue.pop_at(0.0).unwrap();
        queue.requeue(stale, 2.5);
        assert_eq!(queue.peek_time(), Some(2.5));
        assert_eq!(queue.pop_at(2.5).unwrap().action, Action::Wake);
    }
}
