//! Tools to check if an argument is what you expect it to be.
//!
//! Matchers are passed to
//! [`Expectations::with`](crate::Expectations::with) in place of an
//! argument.

mod all_parameters;
mod any;
mod eq;
mod from_fn;
mod same;

use std::{fmt, marker::PhantomData};

pub(crate) use self::all_parameters::{AllParameters, Literal, ParametersMatcher};
pub use self::{
    any::{any, Any},
    eq::{eq, Eq},
    from_fn::{from_fn, Predicate},
    same::{same, Same},
};

use crate::value::{Arg, Value};

/// Matcher for single argument of a method.
///
/// Implementors provide an expectation to match an argument against.
///
/// This crate provides some simple matchers: [`any()`], [`eq()`], and
/// [`same()`]. Additionally, it provides two macros [`pattern!`] and
/// [`from_fn!`] to create matchers from patterns and closures.
///
/// # Examples
///
/// ```
/// use std::fmt::{self, Formatter};
/// use mockery::matcher::ArgMatcher;
///
/// struct HasLength(usize);
///
/// // ArgMatcher requires the Display trait
/// impl fmt::Display for HasLength {
///     fn fmt(&self, f: &mut Formatter) -> fmt::Result {
///         write!(f, "_.len() == {}", self.0)
///     }
/// }
///
/// impl ArgMatcher<String> for HasLength {
///     fn matches(&self, arg: &String) -> bool {
///         arg.len() == self.0
///     }
/// }
///
/// let has_length = HasLength(5);
/// assert!(has_length.matches(&"hello".to_string()));
/// assert!(!has_length.matches(&"hi".to_string()));
/// ```
///
/// [`pattern!`]: crate::pattern
/// [`from_fn!`]: crate::from_fn
pub trait ArgMatcher<T: ?Sized>: fmt::Display {
    /// Checks if the argument matches the determined expectation.
    fn matches(&self, argument: &T) -> bool;
}

/// An [`ArgMatcher`] over erased [`Value`]s.
///
/// This is what expectations store; build one with [`param`].
pub trait ParameterMatcher: fmt::Display + Send + Sync {
    fn matches(&self, value: &Value) -> bool;
}

struct Typed<T, M> {
    matcher: M,
    _arg: PhantomData<fn(&T)>,
}

impl<T: Arg, M: ArgMatcher<T> + Send + Sync> ParameterMatcher for Typed<T, M> {
    fn matches(&self, value: &Value) -> bool {
        T::from_value(value).map_or(false, |argument| self.matcher.matches(&argument))
    }
}

impl<T, M: fmt::Display> fmt::Display for Typed<T, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.matcher.fmt(f)
    }
}

/// Erases a typed matcher so it can be stored next to matchers of
/// other types.
///
/// ```
/// use mockery::matcher::{self, ParameterMatcher};
///
/// let five = matcher::param::<i32>(matcher::eq(5));
/// assert!(five.matches(&mockery::Arg::into_value(5)));
/// assert!(!five.matches(&mockery::Arg::into_value(5_i64)));
/// ```
pub fn param<T: Arg>(
    matcher: impl ArgMatcher<T> + Send + Sync + 'static,
) -> Box<dyn ParameterMatcher> {
    Box::new(Typed {
        matcher,
        _arg: PhantomData,
    })
}
