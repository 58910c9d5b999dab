//! Turns a specification closure into expectations.
//!
//! The closure is run once per pass. Each pass hands out stand-ins
//! that capture the method called on them and placeholders for every
//! `with(..)` clause. When a clause needs a placeholder of a type not
//! yet known, or two placeholders cannot be told apart, the pass is
//! interrupted, the missing knowledge is recorded, and the closure runs
//! again from the top. A pass that finishes without interruption yields
//! the expectations.

mod capture;
mod clause;
mod placeholder;

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

pub use self::clause::{MethodClause, ParametersClause, ReceiverClause};
use self::{
    capture::{resolve_parameters, Capture, Unresolved, WithSlot},
    placeholder::{Collision, Placeholders},
};
use crate::{
    action::Action,
    cardinality::Cardinality,
    error::{Error, Result},
    expectation::{Expectation, MethodMatcher, SideEffect, TargetMatcher},
    invocation::Invocation,
    matcher::{self, ArgMatcher, ParametersMatcher},
    mock_store::MockStore,
    ordering::{CellRef, Cells, OrderingConstraint, Sequence, State, StatePredicate},
    proxy::Proxy,
    value::{Arg, Synthesis, TypeDesc},
};

/// Why a specification closure stopped early.
///
/// Returned by every fallible method of [`Expectations`]; pass it on
/// with `?`. Any other error can be returned with `?` too and fails the
/// whole [`checking`](crate::Mockery::checking) call.
#[derive(Debug)]
pub enum Interrupt {
    /// The mockery knows why; it will restart the closure or report
    /// the failure itself.
    Recorded,
    /// The specification failed with an error of its own.
    Failed(Error),
}

impl<E> From<E> for Interrupt
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Interrupt::Failed(Error::Specification {
            source: Box::new(error),
        })
    }
}

/// The vocabulary of a specification closure.
///
/// ```
/// # use std::sync::Arc;
/// # use mockery::{Proxy, Shared, matcher::eq, action::returns};
/// # pub trait Turtle: Send + Sync {
/// #     fn forward(&self, distance: i32);
/// #     fn heading(&self) -> i32;
/// # }
/// # impl Shared for dyn Turtle {}
/// # struct TurtleImposter(Proxy);
/// # impl Turtle for TurtleImposter {
/// #     fn forward(&self, distance: i32) { self.0.call("forward", (distance,)) }
/// #     fn heading(&self) -> i32 { self.0.call("heading", ()) }
/// # }
/// let mockery = mockery::Mockery::builder()
///     .imposter(|proxy| Arc::new(TurtleImposter(proxy)) as Arc<dyn Turtle>)
///     .build();
/// let turtle: Arc<dyn Turtle> = mockery.mock();
///
/// mockery
///     .checking(|e| {
///         e.one_of(&turtle)?.forward(e.with(eq(10))?);
///         e.allowing(&turtle)?.heading();
///         e.will(returns(90));
///         Ok(())
///     })
///     .unwrap();
///
/// turtle.forward(10);
/// assert_eq!(turtle.heading(), 90);
/// mockery.assert_is_satisfied();
/// ```
pub struct Expectations<'m> {
    store: &'m Arc<MockStore>,
    pass: Arc<Mutex<Pass>>,
}

impl<'m> Expectations<'m> {
    /// Expects exactly one call on `mock`.
    pub fn one_of<T: Arg>(&self, mock: &T) -> Result<T, Interrupt> {
        self.exactly(1).of(mock)
    }

    pub fn exactly(&self, count: usize) -> ReceiverClause<'_, 'm> {
        ReceiverClause::new(self, Cardinality::exactly(count))
    }

    pub fn at_least(&self, count: usize) -> ReceiverClause<'_, 'm> {
        ReceiverClause::new(self, Cardinality::at_least(count))
    }

    pub fn at_most(&self, count: usize) -> ReceiverClause<'_, 'm> {
        ReceiverClause::new(self, Cardinality::at_most(count))
    }

    pub fn between(&self, min: usize, max: usize) -> ReceiverClause<'_, 'm> {
        ReceiverClause::new(self, Cardinality::between(min, max))
    }

    /// Allows any number of calls on `mock`. Without a method call on
    /// the returned stand-in, every method is allowed.
    pub fn allowing<T: Arg>(&self, mock: &T) -> Result<T, Interrupt> {
        self.at_least(0).of(mock)
    }

    /// Same as [`allowing`](Expectations::allowing); reads better for
    /// calls the test does not care about.
    pub fn ignoring<T: Arg>(&self, mock: &T) -> Result<T, Interrupt> {
        self.at_least(0).of(mock)
    }

    /// Forbids the call. Only useful ahead of a broader `allowing`.
    pub fn never<T: Arg>(&self, mock: &T) -> Result<T, Interrupt> {
        self.exactly(0).of(mock)
    }

    /// Stands in for one argument of the next captured call, which
    /// must then satisfy `matcher`.
    ///
    /// Arguments passed as plain values are matched by equality (by
    /// identity for `Arc`s), so clauses and literals can be mixed in
    /// one call.
    pub fn with<T, M>(&self, matcher: M) -> Result<T, Interrupt>
    where
        T: Arg,
        M: ArgMatcher<T> + Send + Sync + 'static,
    {
        let mut guard = self.pass.lock();
        let pass = &mut *guard;
        pass.interrupted()?;

        let position = pass.cursor;
        pass.cursor += 1;

        let placeholder = pass
            .placeholders
            .get(position)
            .and_then(|value| T::from_value(value).map(|typed| (value.clone(), typed)));
        let (placeholder, typed) = match placeholder {
            Some(found) => found,
            None => {
                return Err(pass.raise(Signal::NeedsType {
                    position,
                    ty: T::type_desc(),
                }))
            }
        };

        match pass.pending.last_mut() {
            Some(pending) => {
                pending.withs.push(WithSlot {
                    position,
                    placeholder,
                    matcher: matcher::param(matcher),
                });
                Ok(typed)
            }
            None => Err(pass.fail(Error::build(
                "with() must be an argument of a method called on a stand-in",
            ))),
        }
    }

    /// Sets what the last expectation does when it matches.
    pub fn will(&self, action: impl Action + 'static) {
        let action: Arc<dyn Action> = Arc::new(action);
        self.amend("will()", |pending| pending.action = Some(action));
    }

    /// Makes the last expectation eligible only while `predicate`
    /// holds.
    pub fn when(&self, predicate: impl Into<StatePredicate>) {
        let predicate = predicate.into();
        if self.owns(predicate.owner(), "when()") {
            self.amend("when()", |pending| pending.predicates.push(predicate));
        }
    }

    /// Moves a state machine to `state` whenever the last expectation
    /// matches.
    pub fn then(&self, state: State) {
        if self.owns(state.states.owner, "then()") {
            self.amend("then()", |pending| {
                pending.side_effects.push(SideEffect::Enter(state))
            });
        }
    }

    /// Places the last expectation next in `sequence`.
    pub fn in_sequence(&self, sequence: &Sequence) {
        self.in_sequences([sequence]);
    }

    /// Places the last expectation next in every one of `sequences`.
    pub fn in_sequences<'s>(&self, sequences: impl IntoIterator<Item = &'s Sequence>) {
        let cells: Vec<CellRef> = sequences.into_iter().map(|s| s.cell.clone()).collect();
        if cells.iter().all(|cell| self.owns(cell.owner, "in_sequence()")) {
            self.amend("in_sequence()", |pending| pending.sequences.extend(cells));
        }
    }

    /// Starts an expectation on a mock of this mockery and returns a
    /// stand-in that captures the method called on it.
    fn receiver<T: Arg>(&self, cardinality: Cardinality, mock: &T) -> Result<T, Interrupt> {
        let target = self
            .store
            .target_of(&mock.clone().into_value())
            .ok_or_else(|| self.fail(Error::build("can only set expectations on mock objects")))?;
        let ordinal = self.start(cardinality, TargetMatcher::Mock(target.clone()))?;

        let imposteriser = &self.store.config().imposteriser;
        let capture = Capture::new(Arc::downgrade(&self.pass), ordinal, Arc::clone(imposteriser));
        let ty = T::type_desc();
        let stand_in = imposteriser
            .imposterise(Proxy::new(target, Arc::new(capture)), &ty, &[])
            .map_err(|e| self.fail(e))?;

        T::from_value(&stand_in).ok_or_else(|| {
            self.fail(Error::Imposteriser {
                ty: ty.name(),
                reason: format!("the stand-in was {:?}", stand_in),
            })
        })
    }

    fn start(&self, cardinality: Cardinality, target: TargetMatcher) -> Result<usize, Interrupt> {
        let mut pass = self.pass.lock();
        pass.interrupted()?;
        if let Some(max) = cardinality.max().filter(|&max| max < cardinality.min()) {
            return Err(pass.fail(Error::build(format!(
                "between({}, {}) can never be satisfied",
                cardinality.min(),
                max
            ))));
        }
        pass.pending.push(PendingExpectation::new(cardinality, target));
        Ok(pass.pending.len() - 1)
    }

    fn fail(&self, error: Error) -> Interrupt {
        self.pass.lock().fail(error)
    }

    fn owns(&self, owner: usize, clause: &str) -> bool {
        if owner == self.store.id() {
            return true;
        }
        self.fail(Error::build(format!(
            "{} was given a sequence or state machine of another mockery",
            clause
        )));
        false
    }

    fn amend(&self, clause: &str, amend: impl FnOnce(&mut PendingExpectation)) {
        let ordinal = self.pass.lock().pending.len().checked_sub(1);
        self.amend_at(ordinal, clause, amend);
    }

    fn amend_at(
        &self,
        ordinal: Option<usize>,
        clause: &str,
        amend: impl FnOnce(&mut PendingExpectation),
    ) {
        let mut pass = self.pass.lock();
        if pass.signal.is_some() {
            return;
        }

        match ordinal.and_then(|ordinal| pass.pending.get_mut(ordinal)) {
            Some(pending) => amend(pending),
            None => {
                pass.fail(Error::build(format!(
                    "{} must follow an expectation, but no expectations have been specified",
                    clause
                )));
            }
        }
    }
}

/// What stopped a pass.
enum Signal {
    NeedsType { position: usize, ty: TypeDesc },
    Collision(Collision),
    Fatal(Error),
}

/// How a pass ended.
enum Probe {
    Matched(Vec<PendingExpectation>),
    NeedsType { position: usize, ty: TypeDesc },
    Collision(Collision),
}

/// The state of one run of the specification closure.
#[derive(Default)]
pub(crate) struct Pass {
    placeholders: Placeholders,
    cursor: usize,
    pending: Vec<PendingExpectation>,
    signal: Option<Signal>,
}

impl Pass {
    fn new(placeholders: Placeholders) -> Self {
        Pass {
            placeholders,
            ..Pass::default()
        }
    }

    fn interrupted(&self) -> Result<(), Interrupt> {
        match self.signal {
            Some(_) => Err(Interrupt::Recorded),
            None => Ok(()),
        }
    }

    /// Records the first reason to stop this pass.
    fn raise(&mut self, signal: Signal) -> Interrupt {
        if self.signal.is_none() {
            self.signal = Some(signal);
        }
        Interrupt::Recorded
    }

    fn fail(&mut self, error: Error) -> Interrupt {
        self.raise(Signal::Fatal(error))
    }

    /// Records a call made on the stand-in of expectation `ordinal`.
    fn capture(&mut self, ordinal: usize, invocation: &Invocation) {
        if self.signal.is_some() {
            return;
        }
        if let Err(signal) = self.try_capture(ordinal, invocation) {
            self.signal = Some(signal);
        }
    }

    fn try_capture(&mut self, ordinal: usize, invocation: &Invocation) -> Result<(), Signal> {
        let forbidden = self.placeholders.forbidden(ordinal);
        let pending = self.pending.get_mut(ordinal).ok_or_else(|| {
            Signal::Fatal(Error::build(format!(
                "{} was called on a stand-in of an earlier pass",
                invocation
            )))
        })?;

        if pending.captured {
            return Err(Signal::Fatal(Error::build(format!(
                "{} was called on a stand-in that already captured {}; \
                 start a new expectation for every call",
                invocation, pending.method
            ))));
        }
        pending.captured = true;
        pending.method = MethodMatcher::Signature(invocation.method().clone());

        let withs = std::mem::take(&mut pending.withs);
        let parameters = resolve_parameters(ordinal, withs, invocation.arguments(), &forbidden)
            .map_err(|unresolved| match unresolved {
                Unresolved::Collision(collision) => Signal::Collision(collision),
                Unresolved::Ambiguous(reason) => Signal::Fatal(Error::ambiguous(reason)),
            })?;
        pending.parameters = ParametersMatcher::All(parameters);
        Ok(())
    }

    fn finish(self, outcome: Result<(), Interrupt>) -> Result<Probe> {
        match (self.signal, outcome) {
            (Some(Signal::Fatal(error)), _) => Err(error),
            (Some(Signal::NeedsType { position, ty }), _) => Ok(Probe::NeedsType { position, ty }),
            (Some(Signal::Collision(collision)), _) => Ok(Probe::Collision(collision)),
            (None, Err(Interrupt::Failed(error))) => Err(error),
            (None, Err(Interrupt::Recorded)) => Err(Error::build(
                "the specification was interrupted by another mockery",
            )),
            (None, Ok(())) => {
                if let Some(pending) = self.pending.iter().find(|p| !p.withs.is_empty()) {
                    return Err(Error::build(format!(
                        "with() clauses were given for {} but no method was called on its stand-in",
                        pending.target
                    )));
                }
                Ok(Probe::Matched(self.pending))
            }
        }
    }
}

/// An expectation under construction.
pub(crate) struct PendingExpectation {
    cardinality: Cardinality,
    target: TargetMatcher,
    method: MethodMatcher,
    parameters: ParametersMatcher,
    captured: bool,
    withs: Vec<WithSlot>,
    sequences: Vec<CellRef>,
    predicates: Vec<StatePredicate>,
    side_effects: Vec<SideEffect>,
    action: Option<Arc<dyn Action>>,
}

impl PendingExpectation {
    fn new(cardinality: Cardinality, target: TargetMatcher) -> Self {
        PendingExpectation {
            cardinality,
            target,
            method: MethodMatcher::Any,
            parameters: ParametersMatcher::Any,
            captured: false,
            withs: vec![],
            sequences: vec![],
            predicates: vec![],
            side_effects: vec![],
            action: None,
        }
    }

    /// Finishes the expectation, taking the next position in each of
    /// its sequences.
    pub(crate) fn into_expectation(self, cells: &mut Cells) -> Expectation {
        let mut ordering: Vec<_> = self
            .sequences
            .into_iter()
            .map(|sequence| {
                let index = cells.claim(&sequence);
                OrderingConstraint::InSequence { sequence, index }
            })
            .collect();
        ordering.extend(self.predicates.into_iter().map(OrderingConstraint::When));

        Expectation {
            cardinality: self.cardinality,
            invocation_count: 0,
            target: self.target,
            method: self.method,
            parameters: self.parameters,
            ordering,
            side_effects: self.side_effects,
            action: self.action,
        }
    }
}

/// Runs a specification closure until it settles.
pub(crate) struct SpecificationBuilder<'m> {
    store: &'m Arc<MockStore>,
}

impl<'m> SpecificationBuilder<'m> {
    pub fn new(store: &'m Arc<MockStore>) -> Self {
        SpecificationBuilder { store }
    }

    pub fn build<F>(&self, mut specification: F) -> Result<Vec<PendingExpectation>>
    where
        F: FnMut(&Expectations<'_>) -> Result<(), Interrupt>,
    {
        let config = self.store.config();
        let mut placeholders = Placeholders::default();

        for attempt in 1..=config.max_passes {
            let pass = Arc::new(Mutex::new(Pass::new(placeholders)));
            let outcome = specification(&Expectations {
                store: self.store,
                pass: Arc::clone(&pass),
            });

            // stand-ins only hold a weak reference, so this is the last
            // handle that can reach the pass
            let mut pass = std::mem::take(&mut *pass.lock());
            placeholders = std::mem::take(&mut pass.placeholders);

            match pass.finish(outcome)? {
                Probe::Matched(pending) => {
                    debug!(attempt, expectations = pending.len(), "specification settled");
                    return Ok(pending);
                }
                Probe::NeedsType { position, ty } => {
                    debug!(
                        attempt,
                        position,
                        ty = ty.name(),
                        "with() needs a placeholder, restarting specification"
                    );
                    let placeholder = ty
                        .stand_in(&Synthesis::placeholder(&config.imposteriser, position))
                        .ok_or_else(|| Error::Imposteriser {
                            ty: ty.name(),
                            reason: "no placeholder can be synthesised for a with() clause"
                                .to_string(),
                        })?;
                    placeholders.supply(position, placeholder);
                }
                Probe::Collision(collision) => {
                    debug!(
                        attempt,
                        expectation = collision.ordinal,
                        "with() placeholders collided, restarting specification"
                    );
                    placeholders.apply(collision);
                }
            }
        }

        Err(Error::build(format!(
            "the specification did not settle after {} passes",
            config.max_passes
        )))
    }
}
