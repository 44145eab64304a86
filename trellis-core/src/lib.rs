//! Trellis Core
//!
//! This crate provides the core runtime for the Trellis observable
//! collection framework. It implements:
//!
//! - An observable, ordered, mutable list with named properties
//! - A two-pass subscription/notification protocol
//! - A mutation interceptor funneling every write through one
//!   validated entry point
//! - A serialize/restore contract and a persistence adapter for
//!   external durable key-value stores
//!
//! # Architecture
//!
//! The crate is organized into two modules:
//!
//! - `observable`: the list, its subscription registry, and the
//!   mutation interceptor
//! - `persist`: the durable store boundary and the persistence adapter
//!
//! # Example
//!
//! ```rust,ignore
//! use trellis_core::{list, persist, MemoryStore};
//!
//! let todos = list(["milk", "eggs"]);
//!
//! let subscription = todos.subscribe(|current| {
//!     println!("{} items", current.len());
//! });
//! // prints "2 items" immediately
//!
//! todos.replace_all(["milk"]);
//! // prints "1 items"
//!
//! todos.set("filter", "urgent");
//! // property write, prints "1 items" again
//!
//! subscription.unsubscribe();
//!
//! // Wire the list to a durable store under a key:
//! let store = std::sync::Arc::new(MemoryStore::new());
//! let todos = persist(todos, store, "todos").unwrap();
//! ```

pub mod error;
pub mod observable;
pub mod persist;

pub use error::Error;
pub use observable::{
    list, observe, Intercepted, MutationSink, ObservableList, Persist, SubscriberId,
    Subscription, SubscriptionRegistry,
};
pub use persist::{persist, KeyValueStore, MemoryStore};
