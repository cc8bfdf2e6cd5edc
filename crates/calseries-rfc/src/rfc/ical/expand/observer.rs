//! Change notification for series.

use std::fmt;

/// What changed on a series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeriesChange {
    RulesChanged,
    InclusionsChanged,
    ExclusionsChanged,
    /// Keyed by the recurrence-id's Unix time.
    ExceptionRelated(i64),
    ExceptionRemoved(i64),
    StartChanged,
}

pub type Observer<E> = Box<dyn Fn(&E) + Send + Sync>;

/// Handle returned by [`Observable::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(usize);

/// Types that report their own changes to subscribers.
pub trait Observable {
    type Event;

    fn subscribe(&mut self, observer: Observer<Self::Event>) -> SubscriptionId;

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;
}

/// Subscriber list held next to the data it reports on.
pub struct Observers<E> {
    next_id: usize,
    observers: Vec<(SubscriptionId, Observer<E>)>,
}

impl<E> Observers<E> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next_id: 0,
            observers: Vec::new(),
        }
    }

    pub fn add(&mut self, observer: Observer<E>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, observer));
        id
    }

    pub fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }

    pub fn notify(&self, event: &E) {
        for (_, observer) in &self.observers {
            observer(event);
        }
    }
}

impl<E> Default for Observers<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Observers<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("count", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn notifies_until_removed() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut observers = Observers::new();
        let counter = Arc::clone(&hits);
        let id = observers.add(Box::new(move |_: &SeriesChange| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        observers.notify(&SeriesChange::RulesChanged);
        assert!(observers.remove(id));
        observers.notify(&SeriesChange::StartChanged);
        assert!(!observers.remove(id));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
