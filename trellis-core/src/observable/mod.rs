//! Observable Primitives
//!
//! This module implements the reactive container core: the observable
//! list, its subscription registry, and the mutation interceptor.
//!
//! # Concepts
//!
//! ## Observable list
//!
//! An [`ObservableList`] is an ordered sequence of values plus named
//! properties attached to the list itself. Every state change, whether
//! a bulk replace, a functional update, or a single property write,
//! triggers exactly one notification cycle.
//!
//! ## Notification cycle
//!
//! A cycle is two passes over the subscribers registered at cycle
//! start: first every `invalidate` callback, then every `handler`
//! callback with the list in its new state. All invalidations finish
//! before any handler runs.
//!
//! ## Interception
//!
//! [`Intercepted`] wraps a list so that arbitrary property assignment
//! ([`set`](Intercepted::set)) behaves identically to calling the
//! list's [`mutate`](ObservableList::mutate) entry point. Reads pass
//! through untouched.

mod intercept;
mod list;
mod registry;

pub use intercept::{observe, Intercepted, MutationSink};
pub use list::{ObservableList, Persist};
pub use registry::{SubscriberId, Subscription, SubscriptionRegistry};

/// Create an interceptor-wrapped observable list from an initial
/// iterable of elements.
///
/// This is the usual entry point:
///
/// ```rust,ignore
/// let todos = trellis_core::list(["milk", "eggs"]);
/// todos.subscribe(|list| println!("{list}"));
/// todos.set("filter", "urgent");
/// ```
pub fn list<T, I>(items: I) -> Intercepted<ObservableList<T>>
where
    T: Clone + Send + Sync + 'static,
    I: IntoIterator<Item = T>,
{
    observe(ObservableList::from_iter(items))
}
