//! Synchronous change notification.
//!
//! Observers run on the publisher's stack in registration order. There is no
//! queue: `publish` returns only after every observer has returned.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::model::{AppointmentId, AppointmentStatus};

/// Published after every successful status transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    pub appointment_id: AppointmentId,
    pub from: AppointmentStatus,
    pub to: AppointmentStatus,
    pub at: NaiveDateTime,
}

/// Handle returned by [`ChangeBus::subscribe`]; pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

type Observer = Box<dyn FnMut(&ChangeEvent)>;

#[derive(Default)]
pub struct ChangeBus {
    observers: Vec<(Subscription, Observer)>,
    next_id: u64,
}

impl ChangeBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&ChangeEvent) + 'static) -> Subscription {
        let handle = Subscription(self.next_id);
        self.next_id += 1;
        self.observers.push((handle, Box::new(observer)));
        handle
    }

    /// Remove an observer. Returns `false` if the handle was already removed.
    pub fn unsubscribe(&mut self, handle: Subscription) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(h, _)| *h != handle);
        self.observers.len() != before
    }

    pub fn publish(&mut self, event: &ChangeEvent) {
        for (_, observer) in self.observers.iter_mut() {
            observer(event);
        }
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl std::fmt::Debug for ChangeBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeBus")
            .field("observers", &self.observers.len())
            .finish()
    }
}
