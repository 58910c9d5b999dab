//! A library to declare what a test expects its collaborators to be
//! asked, and to check that they were.
//!
//! Expectations are declared inside a single closure passed to
//! [`Mockery::checking`]. Calling a method on the stand-in returned by
//! [`Expectations::one_of`] (or any other cardinality) declares which
//! method is expected; [`Expectations::with`] stands in for an argument
//! that must satisfy a [matcher](matcher). Plain values are matched by
//! equality.
//!
//! Mocks are created by an [`Imposteriser`]. The default one,
//! [`Imposters`], builds them from factories registered on the
//! [`MockeryBuilder`]: each factory wraps a [`Proxy`] in a type that
//! implements the mocked trait and forwards every method to
//! [`Proxy::call`].
//!
//! ```
//! use std::sync::Arc;
//! use mockery::{action::returns, matcher::eq, Mockery, Proxy, Shared};
//!
//! pub trait Turtle: Send + Sync {
//!     fn turn(&self, degrees: i32);
//!     fn heading(&self) -> i32;
//! }
//!
//! impl Shared for dyn Turtle {}
//!
//! struct TurtleImposter(Proxy);
//!
//! impl Turtle for TurtleImposter {
//!     fn turn(&self, degrees: i32) {
//!         self.0.call("turn", (degrees,))
//!     }
//!
//!     fn heading(&self) -> i32 {
//!         self.0.call("heading", ())
//!     }
//! }
//!
//! let mockery = Mockery::builder()
//!     .imposter(|proxy| Arc::new(TurtleImposter(proxy)) as Arc<dyn Turtle>)
//!     .build();
//! let turtle: Arc<dyn Turtle> = mockery.mock();
//!
//! mockery
//!     .checking(|e| {
//!         e.exactly(2).of(&turtle)?.turn(e.with(eq(45))?);
//!         e.allowing(&turtle)?.heading();
//!         e.will(returns(90));
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! turtle.turn(45);
//! turtle.turn(45);
//! assert_eq!(turtle.heading(), 90);
//!
//! mockery.assert_is_satisfied();
//! ```
//!
//! Calls that no expectation allows fail immediately and are reported
//! again by [`Mockery::assert_is_satisfied`], so a failure on another
//! thread is not lost.

pub mod action;
mod builder;
mod cardinality;
mod dispatcher;
mod error;
mod expectation;
mod invocation;
pub mod matcher;
mod mock_store;
mod mockery;
mod naming;
mod ordering;
mod proxy;
mod satisfaction;
mod value;

pub use crate::{
    action::Action,
    builder::{Expectations, Interrupt, MethodClause, ParametersClause, ReceiverClause},
    cardinality::Cardinality,
    error::{Error, Result, Shortfall},
    invocation::{Invocation, MethodSig, MockRef},
    mockery::{Mockery, MockeryBuilder, DEFAULT_MAX_PASSES},
    naming::{CamelCaseNamingScheme, NamingScheme},
    ordering::{Sequence, State, StatePredicate, States},
    proxy::{Imposteriser, Imposters, Invokable, Proxy},
    value::{Arg, Args, DynValue, Object, Scalar, Shared, Synthesis, TypeDesc, TypeKind, Value},
};
