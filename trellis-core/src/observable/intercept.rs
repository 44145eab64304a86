//! Mutation interception.
//!
//! Rust has no way to intercept arbitrary property assignment, so the
//! interception contract is expressed as a trait seam instead: a type
//! exposes its single validated mutation entry point by implementing
//! [`MutationSink`], and [`Intercepted`] routes every external write
//! through it via [`set`](Intercepted::set). Reads and method calls
//! pass through untouched via `Deref`. Wrapping a type without a
//! mutation entry point is a compile error rather than a runtime one.

use std::fmt;
use std::ops::Deref;

use serde_json::Value;

use crate::observable::list::ObservableList;

/// The single validated mutation entry point for property writes.
///
/// Implementors must trigger one notification cycle per call; writes
/// must not reach observable state by any other path without also
/// notifying.
pub trait MutationSink {
    /// Set the named property to `value`, then notify.
    fn mutate(&self, property: &str, value: Value);
}

impl<T> MutationSink for ObservableList<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn mutate(&self, property: &str, value: Value) {
        ObservableList::mutate(self, property, value);
    }
}

/// A transparent wrapper that funnels property writes through the
/// wrapped value's [`MutationSink`].
///
/// Stateless: it holds nothing but the wrapped value. Everything
/// except [`set`](Intercepted::set), including reads and method
/// calls, reaches the inner value unmodified through `Deref`.
pub struct Intercepted<S> {
    inner: S,
}

impl<S> Intercepted<S> {
    /// Wrap `inner`.
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// Unwrap, returning the inner value.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: MutationSink> Intercepted<S> {
    /// Assign `value` to the named property.
    ///
    /// Behaves identically to calling `mutate` on the wrapped value:
    /// the write lands through the single mutation entry point and
    /// triggers one notification cycle.
    pub fn set(&self, property: &str, value: impl Into<Value>) {
        self.inner.mutate(property, value.into());
    }
}

impl<S> Deref for Intercepted<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.inner
    }
}

impl<S: Clone> Clone for Intercepted<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for Intercepted<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Intercepted").field(&self.inner).finish()
    }
}

impl<S: fmt::Display> fmt::Display for Intercepted<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

/// Wrap `target` so that property writes route through its mutation
/// entry point.
pub fn observe<S: MutationSink>(target: S) -> Intercepted<S> {
    Intercepted::new(target)
}
