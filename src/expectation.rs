use std::{
    fmt::{self, Formatter},
    sync::Arc,
};

use regex::Regex;

use crate::{
    action::Action,
    cardinality::Cardinality,
    invocation::{Invocation, MethodSig, MockRef},
    matcher::ParametersMatcher,
    ordering::{Cells, OrderingConstraint, State},
};

/// Which mocks an expectation applies to.
#[derive(Clone)]
pub(crate) enum TargetMatcher {
    Mock(MockRef),
    Any,
    Matching(Arc<dyn Fn(&MockRef) -> bool + Send + Sync>),
}

impl TargetMatcher {
    fn matches(&self, target: &MockRef) -> bool {
        match self {
            TargetMatcher::Mock(mock) => mock == target,
            TargetMatcher::Any => true,
            TargetMatcher::Matching(predicate) => predicate(target),
        }
    }
}

impl fmt::Display for TargetMatcher {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TargetMatcher::Mock(mock) => mock.fmt(f),
            TargetMatcher::Any => f.write_str("<any mock>"),
            TargetMatcher::Matching(_) => f.write_str("<matching mock>"),
        }
    }
}

/// Which methods an expectation applies to.
pub(crate) enum MethodMatcher {
    Any,
    Signature(MethodSig),
    Name(Regex),
}

impl MethodMatcher {
    fn matches(&self, method: &MethodSig) -> bool {
        match self {
            MethodMatcher::Any => true,
            MethodMatcher::Signature(signature) => signature.same_method(method),
            MethodMatcher::Name(pattern) => pattern.is_match(method.name()),
        }
    }
}

impl fmt::Display for MethodMatcher {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            MethodMatcher::Any => f.write_str("<any method>"),
            MethodMatcher::Signature(signature) => f.write_str(signature.name()),
            MethodMatcher::Name(pattern) => write!(f, "<{}>", pattern),
        }
    }
}

/// A state transition applied when an expectation matches.
#[derive(Debug, Clone)]
pub(crate) enum SideEffect {
    Enter(State),
}

impl fmt::Display for SideEffect {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SideEffect::Enter(state) => write!(f, "then {}", state),
        }
    }
}

/// One declared interaction.
pub(crate) struct Expectation {
    pub cardinality: Cardinality,
    pub invocation_count: usize,
    pub target: TargetMatcher,
    pub method: MethodMatcher,
    pub parameters: ParametersMatcher,
    pub ordering: Vec<OrderingConstraint>,
    pub side_effects: Vec<SideEffect>,
    pub action: Option<Arc<dyn Action>>,
}

impl Expectation {
    /// Whether the invocation is aimed at what this expectation
    /// describes, ignoring counts and ordering.
    pub fn matches(&self, invocation: &Invocation) -> bool {
        self.target.matches(invocation.target())
            && self.method.matches(invocation.method())
            && self.parameters.matches(invocation.arguments()).is_ok()
    }

    /// Whether the invocation may be dispatched to this expectation
    /// right now.
    pub fn is_eligible(&self, invocation: &Invocation, cells: &Cells) -> bool {
        self.cardinality.allows_more(self.invocation_count)
            && self.ordering.iter().all(|constraint| constraint.allows(cells))
            && self.matches(invocation)
    }

    /// Counts a matched invocation and applies its effects on
    /// sequences and states.
    pub fn record(&mut self, cells: &mut Cells) {
        self.invocation_count += 1;
        for constraint in &self.ordering {
            constraint.record(cells);
        }
        for effect in &self.side_effects {
            match effect {
                SideEffect::Enter(state) => cells.enter(&state.states, state.name.clone()),
            }
        }
    }

    pub fn is_satisfied(&self) -> bool {
        self.cardinality.is_satisfied(self.invocation_count)
    }

    pub fn remaining(&self) -> usize {
        self.cardinality.remaining(self.invocation_count)
    }

    /// Explains why `invocation` did not match, when it was aimed at
    /// the same mock and method.
    pub fn explain(&self, invocation: &Invocation) -> Option<String> {
        if !self.target.matches(invocation.target()) || !self.method.matches(invocation.method()) {
            return None;
        }
        self.parameters
            .matches(invocation.arguments())
            .err()
            .map(|mismatch| mismatch.to_string())
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}, ", self.cardinality)?;
        match self.invocation_count {
            0 => f.write_str("never invoked")?,
            1 => f.write_str("already invoked 1 time")?,
            n => write!(f, "already invoked {} times", n)?,
        }
        write!(f, ": {}.{}", self.target, self.method)?;
        match (&self.method, &self.parameters) {
            (MethodMatcher::Any, ParametersMatcher::Any) => {}
            (_, parameters) => write!(f, "{}", parameters)?,
        }
        for constraint in &self.ordering {
            write!(f, "; {}", constraint)?;
        }
        for effect in &self.side_effects {
            write!(f, "; {}", effect)?;
        }
        if let Some(action) = &self.action {
            write!(f, "; will {}", action)?;
        }
        Ok(())
    }
}
