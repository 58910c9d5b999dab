use std::fmt::{self, Formatter};

use super::ArgMatcher;

/// Matches any argument.
pub struct Any;

impl<T: ?Sized> ArgMatcher<T> for Any {
    fn matches(&self, _: &T) -> bool {
        true
    }
}

impl fmt::Display for Any {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "_")
    }
}

/// Returns an [`ArgMatcher`] that always succeeds.
pub fn any() -> Any {
    Any
}
