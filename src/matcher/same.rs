use std::{
    any,
    fmt::{self, Formatter},
    sync::Arc,
};

use super::ArgMatcher;

/// Identity matcher for shared values.
///
/// Matches only the very same allocation, not merely an equal one.
pub struct Same<T: ?Sized>(Arc<T>);

impl<T: ?Sized> ArgMatcher<Arc<T>> for Same<T> {
    fn matches(&self, actual: &Arc<T>) -> bool {
        Arc::as_ptr(&self.0) as *const () == Arc::as_ptr(actual) as *const ()
    }
}

impl<T: ?Sized> fmt::Display for Same<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "same as <{}@{:p}>",
            any::type_name::<T>(),
            Arc::as_ptr(&self.0) as *const ()
        )
    }
}

/// Creates a [`Same`] matcher.
pub fn same<T: ?Sized>(expected: &Arc<T>) -> Same<T> {
    Same(expected.clone())
}
