//! Layer-change notifications
//!
//! The registry forwards one event per structural mutation to an attached
//! sink, synchronously, before the mutating call returns. The default
//! `EventQueue` sink just collects events for the caller to drain.

use crate::layer::LayerId;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// What happened to a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerChange {
    /// The layer was inserted into a role bucket
    Added,

    /// The layer was detached from its role bucket
    Removed,

    /// The layer's payload was swapped in place
    Replaced,

    /// The layer moved within its role bucket
    Reordered,
}

/// Notification sent when the registry's structure changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerEvent {
    /// The affected layer
    pub layer: LayerId,

    /// The kind of change
    pub change: LayerChange,
}

/// Receiver of layer-change notifications
pub trait LayerEventSink {
    fn layer_changed(&mut self, event: LayerEvent);
}

/// A queue-backed sink that collects events until drained
#[derive(Debug, Default)]
pub struct EventQueue {
    pending: VecDeque<LayerEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all pending events in arrival order
    pub fn drain(&mut self) -> Vec<LayerEvent> {
        self.pending.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl LayerEventSink for EventQueue {
    fn layer_changed(&mut self, event: LayerEvent) {
        self.pending.push_back(event);
    }
}

// Lets callers keep a handle on a sink that is also attached to the store;
// the registry is single-threaded by contract.
impl<S: LayerEventSink> LayerEventSink for Rc<RefCell<S>> {
    fn layer_changed(&mut self, event: LayerEvent) {
        self.borrow_mut().layer_changed(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_collects_in_order() {
        let mut q = EventQueue::new();
        let a = LayerId::new();
        let b = LayerId::new();
        q.layer_changed(LayerEvent { layer: a, change: LayerChange::Added });
        q.layer_changed(LayerEvent { layer: b, change: LayerChange::Removed });
        assert_eq!(q.len(), 2);

        let events = q.drain();
        assert_eq!(events[0].layer, a);
        assert_eq!(events[0].change, LayerChange::Added);
        assert_eq!(events[1].change, LayerChange::Removed);
        assert!(q.is_empty());
    }

    #[test]
    fn test_shared_sink() {
        let q = Rc::new(RefCell::new(EventQueue::new()));
        let mut sink = q.clone();
        sink.layer_changed(LayerEvent {
            layer: LayerId::new(),
            change: LayerChange::Replaced,
        });
        assert_eq!(q.borrow().len(), 1);
    }
}
