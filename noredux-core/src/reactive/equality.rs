//! Identity Comparison
//!
//! Change detection throughout the crate is an identity check, not a deep
//! comparison. [`Same`] defines what "identical" means per type:
//!
//! - Scalars and strings compare by value.
//! - `Arc<T>` compares by pointer. Two structurally equal objects in
//!   different allocations are *different*.
//! - Containers (`Option`, `Vec`, slices, tuples) compare element-wise
//!   with `Same`, one level at a time.
//!
//! Shared object-like state should therefore live behind an `Arc`: an
//! update that produces a new allocation is a change, and an update that
//! hands back the same `Arc` is a no-op.

use std::sync::Arc;

/// Identity comparison used for change detection.
pub trait Same {
    /// Returns true when `self` and `other` are the same value.
    fn same(&self, other: &Self) -> bool;
}

macro_rules! same_by_value {
    ($($t:ty),* $(,)?) => {
        $(
            impl Same for $t {
                #[inline]
                fn same(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

same_by_value!(
    i8, i16, i32, i64, i128, isize,
    u8, u16, u32, u64, u128, usize,
    f32, f64, bool, char, (),
    String, &'static str,
);

impl<T: ?Sized> Same for Arc<T> {
    #[inline]
    fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

impl<T: Same> Same for Option<T> {
    fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.same(b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T: Same> Same for [T] {
    fn same(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.same(b))
    }
}

impl<T: Same> Same for Vec<T> {
    fn same(&self, other: &Self) -> bool {
        self.as_slice().same(other.as_slice())
    }
}

macro_rules! same_tuple {
    ($(($($name:ident $idx:tt),+)),* $(,)?) => {
        $(
            impl<$($name: Same),+> Same for ($($name,)+) {
                fn same(&self, other: &Self) -> bool {
                    $(self.$idx.same(&other.$idx))&&+
                }
            }
        )*
    };
}

same_tuple!(
    (A 0),
    (A 0, B 1),
    (A 0, B 1, C 2),
    (A 0, B 1, C 2, D 3),
    (A 0, B 1, C 2, D 3, E 4),
    (A 0, B 1, C 2, D 3, E 4, F 5),
);

/// Positional shallow diff of two argument lists.
///
/// Returns true if either side is absent, the lengths differ, or any
/// element differs under [`Same`]. Two absent lists are considered
/// different, so a cache that has never been filled always misses.
pub fn is_diff_array<T: Same>(a: Option<&[T]>, b: Option<&[T]>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => !a.same(b),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_inputs_always_differ() {
        assert!(is_diff_array::<i32>(None, None));
        assert!(is_diff_array::<i32>(Some(&[][..]), None));
        assert!(is_diff_array::<i32>(None, Some(&[][..])));
        assert!(!is_diff_array::<i32>(Some(&[][..]), Some(&[][..])));
    }

    #[test]
    fn positional_comparison() {
        assert!(is_diff_array(Some(&[1][..]), Some(&[1, 2][..])));
        assert!(!is_diff_array(Some(&[1, 2][..]), Some(&[1, 2][..])));
        assert!(is_diff_array(Some(&[2, 1][..]), Some(&[1, 2][..])));
    }

    #[test]
    fn arcs_compare_by_identity() {
        let place = Arc::new(vec![1]);
        let copy = Arc::new(vec![1]);

        assert!(place.same(&place.clone()));
        assert!(!place.same(&copy));

        let a = [place.clone(), place.clone()];
        let b = [place.clone(), copy];
        assert!(is_diff_array(Some(&a[..]), Some(&b[..])));
        assert!(!is_diff_array(Some(&a[..]), Some(&a[..])));
    }

    #[test]
    fn trait_objects_compare_by_identity() {
        let a: Arc<dyn Fn() -> i32 + Send + Sync> = Arc::new(|| 1);
        let b: Arc<dyn Fn() -> i32 + Send + Sync> = Arc::new(|| 1);
        assert!(a.same(&a.clone()));
        assert!(!a.same(&b));
    }

    #[test]
    fn tuples_and_options() {
        assert!((1i32, "a", Some(2u8)).same(&(1i32, "a", Some(2u8))));
        assert!(!(1i32, "a", None::<u8>).same(&(1i32, "a", Some(2u8))));
        assert!(!f64::NAN.same(&f64::NAN));
    }
}
