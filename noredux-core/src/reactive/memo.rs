//! Memo Implementation
//!
//! A Memo is a single-slot cache around a pure function. It remembers the
//! last argument tuple and the result built from it, and rebuilds only when
//! a new call's arguments differ positionally under [`Same`].
//!
//! Results are handed out as `Arc<R>`, so a cache hit returns the *same*
//! allocation and compares identical downstream. The cache holds exactly
//! one entry.

use std::sync::Arc;

use parking_lot::Mutex;

use super::equality::{is_diff_array, Same};

/// A single-slot memoizing wrapper around `Fn(&K) -> R`.
pub struct Memo<K, R> {
    func: Box<dyn Fn(&K) -> R + Send + Sync>,
    slot: Mutex<Option<(K, Arc<R>)>>,
}

impl<K, R> Memo<K, R>
where
    K: Same + Clone,
{
    /// Wrap `func`. Nothing is computed until the first call.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&K) -> R + Send + Sync + 'static,
    {
        Self {
            func: Box::new(func),
            slot: Mutex::new(None),
        }
    }

    /// Return the cached result for `args`, computing it on a miss.
    ///
    /// `func` runs without the slot locked, so it may call other memos.
    pub fn call(&self, args: K) -> Arc<R> {
        {
            let slot = self.slot.lock();
            let cached = slot.as_ref().map(|(k, _)| std::slice::from_ref(k));
            if !is_diff_array(cached, Some(std::slice::from_ref(&args))) {
                if let Some((_, result)) = slot.as_ref() {
                    return Arc::clone(result);
                }
            }
        }

        let result = Arc::new((self.func)(&args));
        *self.slot.lock() = Some((args, Arc::clone(&result)));
        result
    }
}

/// Wrap `func` in a [`Memo`].
pub fn memo<K, R, F>(func: F) -> Memo<K, R>
where
    K: Same + Clone,
    F: Fn(&K) -> R + Send + Sync + 'static,
{
    Memo::new(func)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[derive(Debug, PartialEq)]
    struct Pair {
        a: i32,
        b: i32,
    }

    #[test]
    fn memo_is_lazy() {
        let call_count = Arc::new(AtomicI32::new(0));
        let counter = call_count.clone();
        let maker = memo(move |&(a, b): &(i32, i32)| {
            counter.fetch_add(1, Ordering::SeqCst);
            Pair { a, b }
        });
        assert_eq!(call_count.load(Ordering::SeqCst), 0);

        maker.call((1, 2));
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn identical_args_return_same_result() {
        let maker = memo(|&(a, b): &(i32, i32)| Pair { a, b });

        let origin = maker.call((1, 2));
        assert_eq!(*origin, Pair { a: 1, b: 2 });
        assert!(Arc::ptr_eq(&origin, &maker.call((1, 2))));
        assert!(!Arc::ptr_eq(&origin, &maker.call((1, 3))));

        let third = maker.call((3, 4));
        assert!(Arc::ptr_eq(&third, &maker.call((3, 4))));
    }

    #[test]
    fn only_last_args_are_cached() {
        let call_count = Arc::new(AtomicI32::new(0));
        let counter = call_count.clone();
        let maker = memo(move |&(a,): &(i32,)| {
            counter.fetch_add(1, Ordering::SeqCst);
            a * 2
        });

        maker.call((1,));
        maker.call((2,));
        maker.call((1,));
        assert_eq!(call_count.load(Ordering::SeqCst), 3);

        maker.call((1,));
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn arc_args_compare_by_identity() {
        let call_count = Arc::new(AtomicI32::new(0));
        let counter = call_count.clone();
        let maker = memo(move |(list,): &(Arc<Vec<i32>>,)| {
            counter.fetch_add(1, Ordering::SeqCst);
            list.len()
        });

        let place = Arc::new(vec![1]);
        maker.call((place.clone(),));
        maker.call((place.clone(),));
        assert_eq!(call_count.load(Ordering::SeqCst), 1);

        maker.call((Arc::new(vec![1]),));
        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }
}
