use std::sync::Arc;

use regex::Regex;

use super::{Expectations, Interrupt};
use crate::{
    cardinality::Cardinality,
    error::Error,
    expectation::{MethodMatcher, TargetMatcher},
    invocation::MockRef,
    matcher::{AllParameters, ParameterMatcher, ParametersMatcher},
    value::Arg,
};

/// An expectation with a cardinality but no receiver yet.
#[must_use = "an expectation needs a receiver: call of(..), of_any() or of_matching(..)"]
pub struct ReceiverClause<'e, 'm> {
    expectations: &'e Expectations<'m>,
    cardinality: Cardinality,
}

impl<'e, 'm> ReceiverClause<'e, 'm> {
    pub(super) fn new(expectations: &'e Expectations<'m>, cardinality: Cardinality) -> Self {
        ReceiverClause {
            expectations,
            cardinality,
        }
    }

    /// Aims the expectation at `mock` and returns a stand-in; call the
    /// expected method on it.
    pub fn of<T: Arg>(self, mock: &T) -> Result<T, Interrupt> {
        self.expectations.receiver(self.cardinality, mock)
    }

    /// Aims the expectation at every mock of the mockery.
    pub fn of_any(self) -> MethodClause<'e, 'm> {
        self.targeting(TargetMatcher::Any)
    }

    /// Aims the expectation at every mock `predicate` accepts.
    pub fn of_matching(
        self,
        predicate: impl Fn(&MockRef) -> bool + Send + Sync + 'static,
    ) -> MethodClause<'e, 'm> {
        self.targeting(TargetMatcher::Matching(Arc::new(predicate)))
    }

    fn targeting(self, target: TargetMatcher) -> MethodClause<'e, 'm> {
        MethodClause {
            expectations: self.expectations,
            // a failed start is already recorded; the remaining clauses
            // then do nothing
            ordinal: self.expectations.start(self.cardinality, target).ok(),
        }
    }
}

/// An expectation aimed at mocks chosen without a stand-in. Matches
/// every method unless narrowed with [`method`](MethodClause::method).
pub struct MethodClause<'e, 'm> {
    expectations: &'e Expectations<'m>,
    ordinal: Option<usize>,
}

impl<'e, 'm> MethodClause<'e, 'm> {
    /// Narrows the expectation to methods whose whole name matches the
    /// regular expression `pattern`.
    pub fn method(self, pattern: &str) -> ParametersClause<'e, 'm> {
        match Regex::new(&format!("^(?:{})$", pattern)) {
            Ok(regex) => self.expectations.amend_at(self.ordinal, "method()", |pending| {
                pending.captured = true;
                pending.method = MethodMatcher::Name(regex);
            }),
            Err(e) => {
                self.expectations.fail(Error::build(format!(
                    "invalid method pattern {:?}: {}",
                    pattern, e
                )));
            }
        }

        ParametersClause {
            expectations: self.expectations,
            ordinal: self.ordinal,
        }
    }
}

/// An expectation on methods chosen by name. Matches any arguments
/// unless narrowed.
pub struct ParametersClause<'e, 'm> {
    expectations: &'e Expectations<'m>,
    ordinal: Option<usize>,
}

impl ParametersClause<'_, '_> {
    /// Expects one argument per matcher, each satisfying its matcher.
    ///
    /// Build the matchers with [`matcher::param`](crate::matcher::param).
    pub fn with_args(self, matchers: impl IntoIterator<Item = Box<dyn ParameterMatcher>>) {
        let parameters = AllParameters::new(matchers.into_iter().collect());
        self.expectations
            .amend_at(self.ordinal, "with_args()", |pending| {
                pending.parameters = ParametersMatcher::All(parameters)
            });
    }

    /// Expects calls without arguments.
    pub fn with_no_arguments(self) {
        self.with_args(Vec::new());
    }
}
