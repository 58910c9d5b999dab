use std::fmt::{self, Formatter};

use super::ParameterMatcher;
use crate::value::Value;

/// Which arguments an expectation accepts.
pub(crate) enum ParametersMatcher {
    Any,
    All(AllParameters),
}

impl ParametersMatcher {
    pub fn matches(&self, arguments: &[Value]) -> Result<(), Mismatch> {
        match self {
            ParametersMatcher::Any => Ok(()),
            ParametersMatcher::All(all) => all.matches(arguments),
        }
    }
}

impl fmt::Display for ParametersMatcher {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ParametersMatcher::Any => f.write_str("(..)"),
            ParametersMatcher::All(all) => all.fmt(f),
        }
    }
}

/// One matcher per parameter, in parameter order.
pub(crate) struct AllParameters {
    matchers: Vec<Box<dyn ParameterMatcher>>,
}

impl AllParameters {
    pub fn new(matchers: Vec<Box<dyn ParameterMatcher>>) -> Self {
        AllParameters { matchers }
    }

    /// Returns `Ok(())` when every argument matches.
    ///
    /// Otherwise the error details what the actual arguments were and
    /// which of them did not match.
    pub fn matches(&self, arguments: &[Value]) -> Result<(), Mismatch> {
        if arguments.len() != self.matchers.len() {
            return Err(Mismatch::Arity {
                expected: self.matchers.len(),
                actual: arguments.len(),
            });
        }

        let arguments: Vec<_> = self
            .matchers
            .iter()
            .zip(arguments)
            .map(|(matcher, argument)| ArgumentMatch {
                did_match: matcher.matches(argument),
                expected: matcher.to_string(),
                actual: format!("{:?}", argument),
            })
            .collect();

        if arguments.iter().all(|argument| argument.did_match) {
            Ok(())
        } else {
            Err(Mismatch::Arguments(arguments))
        }
    }
}

impl fmt::Display for AllParameters {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        let mut matchers = self.matchers.iter();
        if let Some(first) = matchers.next() {
            write!(f, "{}", first)?;
        }
        matchers.try_for_each(|matcher| write!(f, ", {}", matcher))?;
        f.write_str(")")
    }
}

/// Matches a literal argument by equality, or by identity for shared
/// values.
pub(crate) struct Literal(Value);

impl Literal {
    pub fn new(value: Value) -> Self {
        Literal(value)
    }
}

impl ParameterMatcher for Literal {
    fn matches(&self, value: &Value) -> bool {
        &self.0 == value
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

#[derive(Debug)]
pub(crate) enum Mismatch {
    Arity { expected: usize, actual: usize },
    Arguments(Vec<ArgumentMatch>),
}

#[derive(Debug)]
pub(crate) struct ArgumentMatch {
    did_match: bool,
    expected: String,
    actual: String,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let arguments = match self {
            Mismatch::Arity { expected, actual } => {
                return write!(
                    f,
                    "Expected {} arguments, got {}",
                    expected, actual
                );
            }
            Mismatch::Arguments(arguments) => arguments,
        };

        // pad each expected/actual pair to the same width so they line up
        let padded: Vec<_> = arguments
            .iter()
            .map(|arg| {
                let width = arg.expected.len().max(arg.actual.len());
                (
                    format!("{:<width$}", arg.expected, width = width),
                    format!("{:<width$}", arg.actual, width = width),
                )
            })
            .collect();

        if padded.len() == 1 {
            let (expected, actual) = &padded[0];
            return write!(
                f,
                "Argument did not match.
  Expected: {}
  Actual:   {}",
                expected, actual
            );
        }

        f.write_str("Arguments did not match\n")?;

        write!(f, "  Expected: [{}", padded[0].0)?;
        padded[1..]
            .iter()
            .try_for_each(|(expected, _)| write!(f, ", {}", expected))?;
        f.write_str("]\n")?;

        write!(f, "  Actual:   [{}", padded[0].1)?;
        padded[1..]
            .iter()
            .try_for_each(|(_, actual)| write!(f, ", {}", actual))?;
        f.write_str("]")?;

        arguments
            .iter()
            .zip(&padded)
            .enumerate()
            .filter(|(_, (arg, _))| !arg.did_match)
            .try_for_each(|(i, (_, (expected, actual)))| {
                write!(
                    f,
                    "\n  Argument {}:
    Expected: {}
    Actual:   {}",
                    i, expected, actual
                )
            })
    }
}
