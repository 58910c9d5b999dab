//! Sequences and state machines that constrain when an expectation
//! may match.
//!
//! Both are owned by the [`Mockery`](crate::Mockery) that created them;
//! the handles only name a cell inside it.

use std::{
    fmt::{self, Formatter},
    sync::{Arc, Weak},
};

use crate::mock_store::MockStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CellRef {
    pub owner: usize,
    pub index: usize,
    pub name: Arc<str>,
}

/// A named order that expectations must be invoked in.
///
/// Each expectation placed in a sequence takes the next position; it
/// is only eligible while the sequence points at that position, and
/// matching it moves the sequence on by one.
#[derive(Debug, Clone)]
pub struct Sequence {
    pub(crate) cell: CellRef,
}

impl Sequence {
    pub fn name(&self) -> &str {
        &self.cell.name
    }
}

/// A named state machine.
///
/// Starts out in no state at all unless [`starts_as`](States::starts_as)
/// says otherwise.
#[derive(Clone)]
pub struct States {
    pub(crate) cell: CellRef,
    pub(crate) store: Weak<MockStore>,
}

impl States {
    pub fn name(&self) -> &str {
        &self.cell.name
    }

    /// The named state of this machine. Use it with
    /// [`when`](crate::Expectations::when) as a precondition or with
    /// [`then`](crate::Expectations::then) as a transition.
    pub fn is(&self, state: &str) -> State {
        State {
            states: self.cell.clone(),
            name: state.into(),
        }
    }

    /// Holds whenever the machine is not in `state`.
    pub fn is_not(&self, state: &str) -> StatePredicate {
        StatePredicate {
            state: self.is(state),
            negated: true,
        }
    }

    /// Sets the state this machine starts in.
    pub fn starts_as(self, state: &str) -> Self {
        self.set(state);
        self
    }

    /// Moves the machine to `state` outside of any expectation.
    ///
    /// A [`reset`](crate::Mockery::reset) leaves the state alone.
    pub fn set(&self, state: &str) {
        if let Some(store) = self.store.upgrade() {
            store.with_cells(|cells| cells.enter(&self.cell, state.into()));
        }
    }

    /// The state the machine is in, if any.
    pub fn current(&self) -> Option<String> {
        let store = self.store.upgrade()?;
        store.with_cells(|cells| cells.current(&self.cell).map(str::to_owned))
    }
}

impl fmt::Debug for States {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("States")
            .field("name", &self.cell.name)
            .finish()
    }
}

/// One state of a [`States`] machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    pub(crate) states: CellRef,
    pub(crate) name: Arc<str>,
}

impl State {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} is {}", self.states.name, self.name)
    }
}

/// A precondition on a [`States`] machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatePredicate {
    state: State,
    negated: bool,
}

impl StatePredicate {
    pub(crate) fn owner(&self) -> usize {
        self.state.states.owner
    }
}

impl From<State> for StatePredicate {
    fn from(state: State) -> Self {
        StatePredicate {
            state,
            negated: false,
        }
    }
}

impl fmt::Display for StatePredicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let verb = if self.negated { "is not" } else { "is" };
        write!(f, "{} {} {}", self.state.states.name, verb, self.state.name)
    }
}

/// A precondition on an expectation's eligibility.
#[derive(Debug, Clone)]
pub(crate) enum OrderingConstraint {
    InSequence { sequence: CellRef, index: usize },
    When(StatePredicate),
}

impl OrderingConstraint {
    pub fn allows(&self, cells: &Cells) -> bool {
        match self {
            OrderingConstraint::InSequence { sequence, index } => {
                cells.sequences[sequence.index].pointer == *index
            }
            OrderingConstraint::When(predicate) => {
                let current = cells.states[predicate.state.states.index].current.as_deref();
                (current == Some(&*predicate.state.name)) != predicate.negated
            }
        }
    }

    /// Records that the constrained expectation matched.
    pub fn record(&self, cells: &mut Cells) {
        if let OrderingConstraint::InSequence { sequence, .. } = self {
            cells.sequences[sequence.index].pointer += 1;
        }
    }
}

impl fmt::Display for OrderingConstraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            OrderingConstraint::InSequence { sequence, index } => {
                write!(f, "in sequence {} at #{}", sequence.name, index)
            }
            OrderingConstraint::When(predicate) => write!(f, "when {}", predicate),
        }
    }
}

#[derive(Debug)]
struct SequenceCell {
    name: Arc<str>,
    pointer: usize,
    claimed: usize,
}

#[derive(Debug)]
struct StateCell {
    name: Arc<str>,
    current: Option<Arc<str>>,
}

/// The sequence pointers and state cells of one mockery.
#[derive(Debug, Default)]
pub(crate) struct Cells {
    sequences: Vec<SequenceCell>,
    states: Vec<StateCell>,
}

impl Cells {
    pub fn add_sequence(&mut self, owner: usize, name: &str) -> CellRef {
        self.sequences.push(SequenceCell {
            name: name.into(),
            pointer: 0,
            claimed: 0,
        });
        CellRef {
            owner,
            index: self.sequences.len() - 1,
            name: name.into(),
        }
    }

    pub fn add_states(&mut self, owner: usize, name: &str) -> CellRef {
        self.states.push(StateCell {
            name: name.into(),
            current: None,
        });
        CellRef {
            owner,
            index: self.states.len() - 1,
            name: name.into(),
        }
    }

    /// Hands out the next position in a sequence.
    pub fn claim(&mut self, sequence: &CellRef) -> usize {
        let cell = &mut self.sequences[sequence.index];
        cell.claimed += 1;
        cell.claimed - 1
    }

    pub fn enter(&mut self, states: &CellRef, state: Arc<str>) {
        self.states[states.index].current = Some(state);
    }

    fn current(&self, states: &CellRef) -> Option<&str> {
        self.states[states.index].current.as_deref()
    }

    /// Rewinds every sequence. Positions handed out so far belonged to
    /// expectations that no longer exist.
    pub fn rewind(&mut self) {
        for sequence in &mut self.sequences {
            sequence.pointer = 0;
            sequence.claimed = 0;
        }
    }
}

impl fmt::Display for Cells {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for states in &self.states {
            match &states.current {
                Some(current) => write!(f, "\n  {} is {}", states.name, current)?,
                None => write!(f, "\n  {} has no current state", states.name)?,
            }
        }
        for sequence in &self.sequences {
            write!(f, "\n  {} is at #{}", sequence.name, sequence.pointer)?;
        }
        Ok(())
    }
}
