use std::{fmt, time::Duration};

use thiserror::Error;

/// Everything that can go wrong while specifying, dispatching or
/// verifying expectations.
#[derive(Debug, Error)]
pub enum Error {
    /// The specification could not be turned into expectations.
    #[error("could not build expectations: {message}")]
    Build { message: String },

    /// The specification closure returned an error of its own.
    #[error("specification failed: {source}")]
    Specification {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// `with(..)` clauses cannot be told apart from each other or from
    /// the literal arguments of the same call.
    #[error("ambiguous specification: {reason}")]
    AmbiguousSpecification { reason: String },

    /// A call on a mock matched no eligible expectation.
    #[error("unexpected invocation: {invocation}\n{report}")]
    UnexpectedInvocation { invocation: String, report: String },

    /// Some expectations have not been invoked often enough.
    #[error("not all expectations were satisfied\n{}", Shortfalls(.shortfalls))]
    Unsatisfied { shortfalls: Vec<Shortfall> },

    /// `wait_for_satisfaction` ran out of time.
    #[error(
        "expectations were not satisfied within {timeout:?}\n{}",
        Shortfalls(.shortfalls)
    )]
    Timeout {
        timeout: Duration,
        shortfalls: Vec<Shortfall>,
    },

    /// The imposteriser cannot create an object of this type.
    #[error("cannot imposterise {ty}: {reason}")]
    Imposteriser { ty: &'static str, reason: String },

    /// Mock names are unique within a mockery.
    #[error("a mock named {name:?} already exists")]
    DuplicateMockName { name: String },

    /// An action answered with a value of the wrong type.
    #[error("expected a return value of type {expected}, got {found}")]
    ReturnType { expected: &'static str, found: String },

    /// An action failed on purpose.
    #[error("{message}")]
    Action { message: String },

    /// The mockery owning this mock has been dropped.
    #[error("the mockery that created {target} no longer exists")]
    Detached { target: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub(crate) fn build(message: impl Into<String>) -> Self {
        Error::Build {
            message: message.into(),
        }
    }

    pub(crate) fn ambiguous(reason: impl Into<String>) -> Self {
        Error::AmbiguousSpecification {
            reason: reason.into(),
        }
    }
}

/// An expectation that has not been invoked often enough.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortfall {
    /// The description of the expectation.
    pub expectation: String,
    /// How many more invocations it needs.
    pub remaining: usize,
}

impl fmt::Display for Shortfall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} more)", self.expectation, self.remaining)
    }
}

struct Shortfalls<'a>(&'a [Shortfall]);

impl fmt::Display for Shortfalls<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut shortfalls = self.0.iter();
        if let Some(first) = shortfalls.next() {
            write!(f, "  ✗ {}", first)?;
        }
        shortfalls.try_for_each(|shortfall| write!(f, "\n  ✗ {}", shortfall))
    }
}
