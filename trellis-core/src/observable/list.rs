//! Observable list implementation.
//!
//! An [`ObservableList`] is an ordered sequence of values plus a set of
//! named properties attached to the list itself, both observable:
//! every state-changing operation triggers exactly one notification
//! cycle against the list's [`SubscriptionRegistry`].
//!
//! # Sharing
//!
//! The list is a thin handle over `Arc`-shared interior state. `Clone`
//! shares the same sequence, properties, and subscribers, so a list
//! can be captured by callbacks and moved across threads freely.
//!
//! # Re-entrancy
//!
//! A handler that mutates the list it is observing starts a nested
//! notification cycle mid-pass. Nothing guards against this; callers
//! are expected not to subscribe, unsubscribe, or mutate from inside a
//! handler.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::Error;
use crate::observable::registry::{SubscriptionRegistry, Subscription};

/// The serialize/restore contract between a list and a durable store.
///
/// The default implementation on [`ObservableList`] snapshots the
/// element sequence as a JSON array and restores by replacing the
/// sequence wholesale. A type carrying auxiliary state implements this
/// trait itself to persist that state too.
pub trait Persist {
    /// Produce the data to persist.
    fn serialize(&self) -> Result<Value, Error>;

    /// Repopulate state from previously serialized data.
    fn restore(&self, data: Value) -> Result<(), Error>;
}

struct ListState<T>
where
    T: Clone + Send + Sync + 'static,
{
    elements: RwLock<Vec<T>>,
    properties: RwLock<IndexMap<String, Value>>,
    registry: SubscriptionRegistry<ObservableList<T>>,
}

/// A reactive, ordered, mutable sequence of values.
///
/// # Example
///
/// ```rust,ignore
/// let todos = ObservableList::from_iter(["milk", "eggs"]);
///
/// let subscription = todos.subscribe(|list| {
///     println!("{} items", list.len());
/// });
/// // prints "2 items" immediately
///
/// todos.replace_all(["milk"]);
/// // prints "1 items"
///
/// subscription.unsubscribe();
/// ```
pub struct ObservableList<T>
where
    T: Clone + Send + Sync + 'static,
{
    state: Arc<ListState<T>>,
}

impl<T> ObservableList<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create an empty list.
    pub fn new() -> Self {
        Self::from_iter(std::iter::empty())
    }

    /// Create a list holding the items of `items`, in order.
    pub fn from_iter<I: IntoIterator<Item = T>>(items: I) -> Self {
        Self {
            state: Arc::new(ListState {
                elements: RwLock::new(items.into_iter().collect()),
                properties: RwLock::new(IndexMap::new()),
                registry: SubscriptionRegistry::new(),
            }),
        }
    }

    /// Get the number of elements.
    pub fn len(&self) -> usize {
        self.state.elements.read().len()
    }

    /// Check whether the list holds no elements.
    pub fn is_empty(&self) -> bool {
        self.state.elements.read().is_empty()
    }

    /// Get a copy of the element at `index`.
    pub fn get(&self, index: usize) -> Option<T> {
        self.state.elements.read().get(index).cloned()
    }

    /// Get a copy of the first element.
    pub fn first(&self) -> Option<T> {
        self.state.elements.read().first().cloned()
    }

    /// Get a copy of the last element.
    pub fn last(&self) -> Option<T> {
        self.state.elements.read().last().cloned()
    }

    /// Check whether the list contains `item`.
    pub fn contains(&self, item: &T) -> bool
    where
        T: PartialEq,
    {
        self.state.elements.read().contains(item)
    }

    /// Get an owned snapshot of the element sequence.
    pub fn elements(&self) -> Vec<T> {
        self.state.elements.read().clone()
    }

    /// Register a subscriber with a no-op invalidate callback.
    ///
    /// The handler is invoked once, synchronously, with the current
    /// list before this method returns, and again after every change.
    /// The returned [`Subscription`] removes the subscriber; calling
    /// it more than once is a no-op.
    pub fn subscribe<H>(&self, handler: H) -> Subscription
    where
        H: Fn(&Self) + Send + Sync + 'static,
    {
        self.subscribe_with(handler, || {})
    }

    /// Register a subscriber with both callbacks.
    ///
    /// `invalidate` runs before `handler` on every subsequent change
    /// (it does not run for the initial synchronous invocation).
    pub fn subscribe_with<H, I>(&self, handler: H, invalidate: I) -> Subscription
    where
        H: Fn(&Self) + Send + Sync + 'static,
        I: Fn() + Send + Sync + 'static,
    {
        let (subscriber, subscription) = self
            .state
            .registry
            .add(Box::new(handler), Box::new(invalidate));

        subscriber.handle(self);
        subscription
    }

    /// Replace the entire element sequence with the contents of `items`.
    ///
    /// The sequence is fully cleared before the new items are inserted,
    /// so replacing with an empty collection empties the list. Triggers
    /// exactly one notification cycle after the replacement completes.
    pub fn replace_all<I: IntoIterator<Item = T>>(&self, items: I) {
        {
            let mut elements = self.state.elements.write();
            elements.clear();
            elements.extend(items);
        }
        self.notify();
    }

    /// Derive the next sequence from the current list.
    ///
    /// Invokes `f` with the current list and applies the returned
    /// sequence via [`replace_all`](Self::replace_all), so the whole
    /// update triggers exactly one notification cycle.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&Self) -> Vec<T>,
    {
        let next = f(self);
        self.replace_all(next);
    }

    /// Append one element. Triggers one notification cycle.
    pub fn push(&self, item: T) {
        {
            self.state.elements.write().push(item);
        }
        self.notify();
    }

    /// Remove all elements. Triggers one notification cycle.
    pub fn clear(&self) {
        {
            self.state.elements.write().clear();
        }
        self.notify();
    }

    /// Set the named property to `value`, then trigger one
    /// notification cycle.
    ///
    /// This is the single validated mutation entry point: every
    /// external property write, including writes routed through
    /// [`Intercepted::set`](crate::observable::Intercepted::set),
    /// funnels through here.
    pub fn mutate(&self, property: impl Into<String>, value: impl Into<Value>) {
        {
            self.state
                .properties
                .write()
                .insert(property.into(), value.into());
        }
        self.notify();
    }

    /// Get a copy of the named property's value.
    pub fn property(&self, name: &str) -> Option<Value> {
        self.state.properties.read().get(name).cloned()
    }

    /// Get an owned snapshot of all properties, in insertion order.
    pub fn properties(&self) -> IndexMap<String, Value> {
        self.state.properties.read().clone()
    }

    /// Run one two-pass notification cycle.
    ///
    /// Every active subscriber's `invalidate` callback runs first, in
    /// subscription order; then every `handler` runs with the list in
    /// its current state.
    pub fn notify(&self) {
        self.state.registry.notify(self);
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.state.registry.len()
    }
}

impl<T> Persist for ObservableList<T>
where
    T: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    fn serialize(&self) -> Result<Value, Error> {
        let elements = self.state.elements.read();
        serde_json::to_value(&*elements).map_err(Error::Encode)
    }

    fn restore(&self, data: Value) -> Result<(), Error> {
        let items = match data {
            Value::Array(items) => items,
            other => {
                return Err(Error::InvalidSnapshot(format!(
                    "expected a sequence, got {}",
                    json_kind(&other)
                )))
            }
        };

        let mut decoded = Vec::with_capacity(items.len());
        for item in items {
            decoded.push(
                serde_json::from_value(item)
                    .map_err(|err| Error::InvalidSnapshot(err.to_string()))?,
            );
        }

        self.replace_all(decoded);
        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "an object",
    }
}

impl<T> Default for ObservableList<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for ObservableList<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

/// The canonical text form: the serialized snapshot rendered as JSON.
impl<T> fmt::Display for ObservableList<T>
where
    T: Clone + Send + Sync + Serialize + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let elements = self.state.elements.read();
        match serde_json::to_value(&*elements) {
            Ok(value) => write!(f, "{value}"),
            Err(_) => f.write_str("<unserializable list>"),
        }
    }
}

impl<T> fmt::Debug for ObservableList<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableList")
            .field("len", &self.len())
            .field("properties", &self.state.properties.read().len())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[test]
    fn subscribe_invokes_handler_immediately() {
        let list: ObservableList<i32> = ObservableList::new();
        let calls = Arc::new(AtomicI32::new(0));
        let calls_clone = calls.clone();

        list.subscribe(move |list| {
            assert_eq!(list.len(), 0);
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn replace_all_yields_exact_sequence() {
        let list = ObservableList::from_iter([1, 2, 3]);

        list.replace_all([10, 20]);
        assert_eq!(list.elements(), vec![10, 20]);

        list.replace_all([]);
        assert_eq!(list.len(), 0);
        assert!(list.is_empty());
    }

    #[test]
    fn replace_all_triggers_one_cycle() {
        let list: ObservableList<i32> = ObservableList::new();
        let cycles = Arc::new(AtomicI32::new(0));
        let cycles_clone = cycles.clone();

        // The invalidate callback only runs on change cycles, never on
        // the initial subscribe invocation, so it counts cycles exactly.
        list.subscribe_with(
            |_| {},
            move || {
                cycles_clone.fetch_add(1, Ordering::SeqCst);
            },
        );

        list.replace_all(0..1000);
        assert_eq!(cycles.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn update_derives_from_current_state() {
        let list = ObservableList::from_iter([1, 2, 3, 4]);
        let cycles = Arc::new(AtomicI32::new(0));
        let cycles_clone = cycles.clone();

        list.subscribe_with(
            |_| {},
            move || {
                cycles_clone.fetch_add(1, Ordering::SeqCst);
            },
        );

        list.update(|current| current.elements().into_iter().filter(|n| n % 2 == 0).collect());

        assert_eq!(list.elements(), vec![2, 4]);
        assert_eq!(cycles.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn push_and_clear_notify_once_each() {
        let list: ObservableList<i32> = ObservableList::new();
        let cycles = Arc::new(AtomicI32::new(0));
        let cycles_clone = cycles.clone();

        list.subscribe_with(
            |_| {},
            move || {
                cycles_clone.fetch_add(1, Ordering::SeqCst);
            },
        );

        list.push(7);
        assert_eq!(list.elements(), vec![7]);
        assert_eq!(cycles.load(Ordering::SeqCst), 1);

        list.clear();
        assert!(list.is_empty());
        assert_eq!(cycles.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn mutate_adds_property_and_notifies() {
        let list: ObservableList<i32> = ObservableList::new();
        let cycles = Arc::new(AtomicI32::new(0));
        let cycles_clone = cycles.clone();

        list.subscribe_with(
            |_| {},
            move || {
                cycles_clone.fetch_add(1, Ordering::SeqCst);
            },
        );

        assert_eq!(list.property("label"), None);
        list.mutate("label", "x");

        assert_eq!(list.property("label"), Some(Value::from("x")));
        assert_eq!(cycles.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn serialize_restore_round_trip() {
        let list = ObservableList::from_iter([1, 2, 3]);
        let snapshot = list.serialize().unwrap();

        let restored: ObservableList<i32> = ObservableList::new();
        restored.restore(snapshot).unwrap();

        assert_eq!(restored.elements(), list.elements());
    }

    #[test]
    fn restore_rejects_non_sequence_data() {
        let list: ObservableList<i32> = ObservableList::from_iter([1]);

        let err = list.restore(Value::from("nope")).unwrap_err();
        assert!(matches!(err, Error::InvalidSnapshot(_)));

        // Prior state is preserved on failure.
        assert_eq!(list.elements(), vec![1]);
    }

    #[test]
    fn restore_rejects_undecodable_elements() {
        let list: ObservableList<i32> = ObservableList::new();
        let err = list
            .restore(serde_json::json!([1, "two", 3]))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSnapshot(_)));
    }

    #[test]
    fn display_is_serialized_json() {
        let list = ObservableList::from_iter([1, 2, 3]);
        assert_eq!(list.to_string(), "[1,2,3]");

        let empty: ObservableList<i32> = ObservableList::new();
        assert_eq!(empty.to_string(), "[]");
    }

    #[test]
    fn clone_shares_state() {
        let list1 = ObservableList::from_iter([1]);
        let list2 = list1.clone();

        list1.replace_all([1, 2, 3]);
        assert_eq!(list2.len(), 3);

        let cycles = Arc::new(AtomicI32::new(0));
        let cycles_clone = cycles.clone();
        list2.subscribe_with(
            |_| {},
            move || {
                cycles_clone.fetch_add(1, Ordering::SeqCst);
            },
        );

        list1.push(4);
        assert_eq!(cycles.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribed_handler_stops_receiving() {
        let list: ObservableList<i32> = ObservableList::new();
        let calls = Arc::new(AtomicI32::new(0));
        let calls_clone = calls.clone();

        let subscription = list.subscribe(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        subscription.unsubscribe();
        list.replace_all([1]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
