use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

/// Callback invoked with the payload of a publisher message
pub type Subscriber = Arc<dyn Fn(&Value) + Send + Sync>;

struct Entry {
    id: u64,
    callback: Subscriber,
}

/// Event name -> subscribers, in registration order. Duplicates are kept.
#[derive(Default)]
pub(crate) struct SubscriberTable {
    events: HashMap<String, Vec<Entry>>,
    next_id: u64,
}

fn same_callback(a: &Subscriber, b: &Subscriber) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

impl SubscriberTable {
    pub(crate) fn insert(&mut self, event_name: &str, callback: Subscriber) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.events
            .entry(event_name.to_string())
            .or_default()
            .push(Entry { id, callback });
        id
    }

    /// Remove the single entry created by one `insert` call
    pub(crate) fn remove_entry(&mut self, event_name: &str, id: u64) -> bool {
        let Some(entries) = self.events.get_mut(event_name) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            self.events.remove(event_name);
        }
        removed
    }

    /// Remove every entry holding this exact callback. Returns how many went.
    pub(crate) fn remove_callback(&mut self, event_name: &str, callback: &Subscriber) -> usize {
        let Some(entries) = self.events.get_mut(event_name) else {
            return 0;
        };
        let before = entries.len();
        entries.retain(|entry| !same_callback(&entry.callback, callback));
        let removed = before - entries.len();
        if entries.is_empty() {
            self.events.remove(event_name);
        }
        removed
    }

    /// Clone out the current subscribers so they can run without the lock held
    pub(crate) fn snapshot(&self, event_name: &str) -> Vec<Subscriber> {
        self.events
            .get(event_name)
            .map(|entries| entries.iter().map(|e| e.callback.clone()).collect())
            .unwrap_or_default()
    }

    pub(crate) fn count(&self, event_name: &str) -> usize {
        self.events.get(event_name).map_or(0, Vec::len)
    }
}

/// Handle returned by `Bridge::subscribe`
///
/// Dropping the handle keeps the subscription alive; call
/// [`Subscription::unsubscribe`] to remove it.
#[must_use = "dropping a Subscription does not unsubscribe; keep it to unsubscribe later"]
pub struct Subscription {
    event_name: String,
    id: u64,
    callback: Subscriber,
    table: Weak<Mutex<SubscriberTable>>,
}

impl Subscription {
    pub(crate) fn new(
        event_name: String,
        id: u64,
        callback: Subscriber,
        table: Weak<Mutex<SubscriberTable>>,
    ) -> Self {
        Self {
            event_name,
            id,
            callback,
            table,
        }
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    /// The registered callback, usable with `Bridge::unsubscribe`
    pub fn callback(&self) -> &Subscriber {
        &self.callback
    }

    /// Remove exactly the entry this handle created. Other subscriptions,
    /// including ones sharing the same callback, are untouched.
    pub fn unsubscribe(self) -> bool {
        match self.table.upgrade() {
            Some(table) => table.lock().remove_entry(&self.event_name, self.id),
            None => false,
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("event_name", &self.event_name)
            .field("id", &self.id)
            .finish()
    }
}
