//! Reactive Context
//!
//! The reactive context tracks which atoms are currently being realized or
//! re-derived on this thread. It serves two purposes:
//!
//! - **Dependency capture.** While a computed atom's derivation runs inside
//!   a capturing entry, every atom it queries is recorded so that update
//!   routines can be wired to those sources afterwards.
//!
//! - **Cycle detection.** Querying an atom that is already on the stack for
//!   the same registry means the atom depends on itself.
//!
//! # Implementation
//!
//! We use a thread-local stack, one entry per in-progress realization.
//! Entering pushes an entry and the returned guard pops it again, even if
//! the derivation panics. Only the innermost entry records dependencies, so
//! a nested realization never leaks its sources into the outer one: the
//! outer derivation records the nested atom itself once it resolves.

use std::cell::RefCell;
use std::sync::Arc;

use indexmap::IndexMap;

use super::subscriber::Subscription;

/// A value that can report changes, as seen by dependency capture.
pub trait Source: Send + Sync {
    /// Identity of the underlying reactive cell.
    fn source_id(&self) -> u64;

    /// Call `notify` after every committed change.
    fn on_change(&self, notify: Arc<dyn Fn() + Send + Sync>) -> Subscription;
}

impl<T> Source for super::Signal<T>
where
    T: Clone + super::Same + Send + Sync + 'static,
{
    fn source_id(&self) -> u64 {
        self.id()
    }

    fn on_change(&self, notify: Arc<dyn Fn() + Send + Sync>) -> Subscription {
        self.listen(move |_| notify())
    }
}

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<ContextEntry>> = const { RefCell::new(Vec::new()) };
}

/// An entry in the reactive context stack.
struct ContextEntry {
    /// The registry doing the work.
    scope: u64,
    /// The atom being realized or re-derived.
    key: u64,
    /// Human-readable name, for cycle reports.
    label: String,
    /// Whether queries made under this entry are recorded.
    capture: bool,
    /// First realization, as opposed to a recompute during propagation.
    realizing: bool,
    /// Sources read so far, deduplicated, in first-read order.
    dependencies: IndexMap<u64, Arc<dyn Source>>,
}

/// Guard that pops the context when dropped.
pub struct ReactiveContext {
    scope: u64,
    key: u64,
}

impl ReactiveContext {
    /// Push a realization entry for atom `key` of registry `scope`.
    ///
    /// With `capture` set, sources queried until the guard is dropped are
    /// recorded on this entry.
    pub fn enter(scope: u64, key: u64, label: impl Into<String>, capture: bool) -> Self {
        Self::push(scope, key, label.into(), capture, true)
    }

    /// Push an entry for re-deriving an already realized atom.
    ///
    /// Recompute entries take part in cycle detection and capture but do
    /// not count towards [`depth`](Self::depth).
    pub fn recompute(scope: u64, key: u64, label: impl Into<String>, capture: bool) -> Self {
        Self::push(scope, key, label.into(), capture, false)
    }

    fn push(scope: u64, key: u64, label: String, capture: bool, realizing: bool) -> Self {
        CONTEXT_STACK.with(|stack| {
            stack.borrow_mut().push(ContextEntry {
                scope,
                key,
                label,
                capture,
                realizing,
                dependencies: IndexMap::new(),
            });
        });

        Self { scope, key }
    }

    /// Number of realizations of `scope` in progress on this thread.
    pub fn depth(scope: u64) -> usize {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .iter()
                .filter(|e| e.scope == scope && e.realizing)
                .count()
        })
    }

    /// If `key` is already being worked on in `scope`, return the stack
    /// path from that entry to the top, followed by `label` again.
    pub fn find_cycle(scope: u64, key: u64, label: &str) -> Option<Vec<String>> {
        CONTEXT_STACK.with(|stack| {
            let stack = stack.borrow();
            let start = stack.iter().position(|e| e.scope == scope && e.key == key)?;
            let mut path: Vec<String> = stack[start..]
                .iter()
                .filter(|e| e.scope == scope)
                .map(|e| e.label.clone())
                .collect();
            path.push(label.to_string());
            Some(path)
        })
    }

    /// Record a read of `source` on the innermost entry, if it captures.
    pub fn track(source: Arc<dyn Source>) {
        CONTEXT_STACK.with(|stack| {
            if let Some(entry) = stack.borrow_mut().last_mut() {
                if entry.capture {
                    entry.dependencies.entry(source.source_id()).or_insert(source);
                }
            }
        });
    }

    /// Take the sources recorded on this guard's entry.
    pub fn take_dependencies(&self) -> Vec<Arc<dyn Source>> {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow_mut()
                .last_mut()
                .map(|entry| std::mem::take(&mut entry.dependencies).into_values().collect())
                .unwrap_or_default()
        })
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        CONTEXT_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            if let Some(entry) = popped {
                debug_assert!(
                    entry.scope == self.scope && entry.key == self.key,
                    "ReactiveContext mismatch: expected {}/{}, got {}/{}",
                    self.scope,
                    self.key,
                    entry.scope,
                    entry.key
                );
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Signal;

    fn source(signal: &Signal<i32>) -> Arc<dyn Source> {
        Arc::new(signal.clone())
    }

    #[test]
    fn context_is_scoped_to_guard() {
        assert_eq!(ReactiveContext::depth(1), 0);
        {
            let _ctx = ReactiveContext::enter(1, 10, "a", true);
            assert_eq!(ReactiveContext::depth(1), 1);
            assert_eq!(ReactiveContext::depth(2), 0);
        }
        assert_eq!(ReactiveContext::depth(1), 0);
    }

    #[test]
    fn recompute_entries_do_not_count_towards_depth() {
        let _outer = ReactiveContext::recompute(3, 1, "a", false);
        let _inner = ReactiveContext::recompute(3, 2, "b", false);
        assert_eq!(ReactiveContext::depth(3), 0);

        let _realizing = ReactiveContext::enter(3, 3, "c", true);
        assert_eq!(ReactiveContext::depth(3), 1);
        assert_eq!(
            ReactiveContext::find_cycle(3, 1, "a"),
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string(), "a".to_string()])
        );
    }

    #[test]
    fn capture_dedups_in_read_order() {
        let a = Signal::new(1);
        let b = Signal::new(2);

        let ctx = ReactiveContext::enter(1, 10, "c", true);
        ReactiveContext::track(source(&b));
        ReactiveContext::track(source(&a));
        ReactiveContext::track(source(&b));

        let ids: Vec<u64> = ctx.take_dependencies().iter().map(|s| s.source_id()).collect();
        assert_eq!(ids, vec![b.id(), a.id()]);
    }

    #[test]
    fn non_capturing_entry_records_nothing() {
        let a = Signal::new(1);

        let outer = ReactiveContext::enter(1, 10, "outer", true);
        {
            let inner = ReactiveContext::enter(1, 11, "inner", false);
            ReactiveContext::track(source(&a));
            assert!(inner.take_dependencies().is_empty());
        }
        assert!(outer.take_dependencies().is_empty());
    }

    #[test]
    fn cycle_reports_path() {
        let _a = ReactiveContext::enter(7, 1, "a", true);
        let _b = ReactiveContext::enter(7, 2, "b", false);

        assert_eq!(
            ReactiveContext::find_cycle(7, 1, "a"),
            Some(vec!["a".to_string(), "b".to_string(), "a".to_string()])
        );
        assert_eq!(ReactiveContext::find_cycle(7, 3, "c"), None);
        assert_eq!(ReactiveContext::find_cycle(8, 1, "a"), None);
    }
}
