use std::{
    fmt::{self, Formatter},
    marker::PhantomData,
};

use super::ArgMatcher;

/// A matcher made from a predicate and the source text it was
/// written as.
///
/// Built by [`from_fn!`](crate::from_fn) and
/// [`pattern!`](crate::pattern); the source text is what a failure
/// report shows.
pub struct Predicate<T, F> {
    source: &'static str,
    predicate: F,
    _arg: PhantomData<fn(&T)>,
}

impl<T, F: Fn(&T) -> bool> ArgMatcher<T> for Predicate<T, F> {
    fn matches(&self, argument: &T) -> bool {
        (self.predicate)(argument)
    }
}

impl<T, F> fmt::Display for Predicate<T, F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.source)
    }
}

#[doc(hidden)]
pub fn from_fn<T, F>(predicate: F, source: &'static str) -> Predicate<T, F>
where
    F: Fn(&T) -> bool + Send + Sync + 'static,
{
    Predicate {
        source,
        predicate,
        _arg: PhantomData,
    }
}

/// Turns a closure over `&T` into an [`ArgMatcher<T>`].
///
/// Reports show the closure's source, so keep it short.
///
/// ```
/// use mockery::{from_fn, matcher::ArgMatcher};
///
/// let shouting = from_fn!(|text: &String| text.ends_with('!'));
/// assert!(shouting.matches(&"go!".to_string()));
/// assert!(!shouting.matches(&"go".to_string()));
/// println!("{}", shouting); // |text: &String| text.ends_with('!')
/// ```
#[macro_export]
macro_rules! from_fn {
    ($predicate:expr $(,)?) => {
        $crate::matcher::from_fn($predicate, stringify!($predicate))
    };
}

/// Matches an argument of type `T` against a pattern, with an optional
/// guard: `pattern!(T => pattern)` or `pattern!(T => pattern if guard)`.
///
/// ```
/// use mockery::{pattern, matcher::ArgMatcher};
///
/// let compass = pattern!(i32 => 0 | 90 | 180 | 270);
/// assert!(compass.matches(&90));
/// assert!(!compass.matches(&45));
///
/// let far = pattern!(Option<i32> => Some(d) if *d > 100);
/// assert!(far.matches(&Some(101)));
/// assert!(!far.matches(&None));
/// println!("{}", far); // Some(d) if *d > 100
/// ```
#[macro_export]
macro_rules! pattern {
    ($ty:ty => $( $alternative:pat_param )|+ $( if $guard:expr )? $(,)?) => {
        $crate::matcher::from_fn(
            move |argument: &$ty| matches!(argument, $( $alternative )|+ $( if $guard )?),
            stringify!($( $alternative )|+ $( if $guard )?),
        )
    };
}
