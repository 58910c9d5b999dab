use std::{sync::Arc, time::Duration};

use crate::{
    action::{Action, ReturnDefaultValue},
    builder::{Expectations, Interrupt, SpecificationBuilder},
    error::Result,
    mock_store::{Config, MockStore},
    naming::{CamelCaseNamingScheme, NamingScheme},
    ordering::{Sequence, States},
    proxy::{Imposteriser, Imposters, Proxy},
    value::Arg,
};

/// How many times a specification closure may be restarted before
/// giving up.
pub const DEFAULT_MAX_PASSES: usize = 4096;

/// Creates mocks, holds the expectations on them, and checks that they
/// were met.
///
/// Mocks and stand-ins are created by an [`Imposteriser`]; register
/// one imposter per mocked type on the [`MockeryBuilder`].
pub struct Mockery {
    store: Arc<MockStore>,
}

impl Mockery {
    /// A mockery without any imposters; only useful with
    /// [`Mockery::builder`] in practice.
    pub fn new() -> Self {
        MockeryBuilder::new().build()
    }

    pub fn builder() -> MockeryBuilder {
        MockeryBuilder::new()
    }

    /// Creates a mock of `T`, named by the naming scheme.
    ///
    /// # Panics
    ///
    /// If `T` cannot be imposterised or a mock of the same name already
    /// exists.
    #[track_caller]
    pub fn mock<T: Arg>(&self) -> T {
        self.try_mock().unwrap_or_else(|e| panic!("mockery: {}", e))
    }

    /// Creates a mock of `T` called `name`.
    ///
    /// # Panics
    ///
    /// If `T` cannot be imposterised or a mock called `name` already
    /// exists.
    #[track_caller]
    pub fn mock_named<T: Arg>(&self, name: &str) -> T {
        self.try_mock_named(name).unwrap_or_else(|e| panic!("mockery: {}", e))
    }

    pub fn try_mock<T: Arg>(&self) -> Result<T> {
        self.store.create_mock(None)
    }

    pub fn try_mock_named<T: Arg>(&self, name: &str) -> Result<T> {
        self.store.create_mock(Some(name))
    }

    /// Adds the expectations declared by `specification`.
    ///
    /// The closure may run several times; every run must declare the
    /// same expectations. Nothing is added unless it succeeds.
    pub fn checking<F>(&self, specification: F) -> Result<()>
    where
        F: FnMut(&Expectations<'_>) -> Result<(), Interrupt>,
    {
        let pending = SpecificationBuilder::new(&self.store).build(specification)?;
        self.store.commit(pending);
        Ok(())
    }

    pub fn sequence(&self, name: &str) -> Sequence {
        Sequence {
            cell: self.store.add_sequence(name),
        }
    }

    pub fn states(&self, name: &str) -> States {
        States {
            cell: self.store.add_states(name),
            store: Arc::downgrade(&self.store),
        }
    }

    /// Fails with the first unexpected invocation, if any, or with the
    /// expectations that were not invoked often enough.
    pub fn check_satisfied(&self) -> Result<()> {
        self.store.check_satisfied()
    }

    /// # Panics
    ///
    /// If [`check_satisfied`](Mockery::check_satisfied) fails.
    #[track_caller]
    pub fn assert_is_satisfied(&self) {
        if let Err(e) = self.check_satisfied() {
            panic!("mockery: {}", e);
        }
    }

    /// Checks, then resets regardless of the outcome.
    pub fn check_satisfied_and_reset(&self) -> Result<()> {
        let checked = self.check_satisfied();
        self.reset();
        checked
    }

    /// # Panics
    ///
    /// If the expectations were not satisfied. The mockery is reset
    /// either way.
    #[track_caller]
    pub fn assert_is_satisfied_and_reset(&self) {
        if let Err(e) = self.check_satisfied_and_reset() {
            panic!("mockery: {}", e);
        }
    }

    /// Blocks until every expectation is satisfied.
    ///
    /// Returns early with the unexpected invocation if one happens
    /// before, or during, the wait; fails with [`Error::Timeout`] when
    /// `timeout` passes first.
    ///
    /// [`Error::Timeout`]: crate::Error::Timeout
    pub fn wait_for_satisfaction(&self, timeout: Duration) -> Result<()> {
        self.store.wait_for_satisfaction(timeout)
    }

    /// Forgets every expectation and recorded failure. Sequences start
    /// over; state machines keep their current state.
    pub fn reset(&self) {
        self.store.reset()
    }
}

impl Default for Mockery {
    fn default() -> Self {
        Mockery::new()
    }
}

/// Configures a [`Mockery`].
pub struct MockeryBuilder {
    imposters: Imposters,
    imposteriser: Option<Arc<dyn Imposteriser>>,
    naming: Arc<dyn NamingScheme>,
    default_action: Option<Arc<dyn Action>>,
    max_passes: usize,
}

impl MockeryBuilder {
    pub fn new() -> Self {
        MockeryBuilder {
            imposters: Imposters::new(),
            imposteriser: None,
            naming: Arc::new(CamelCaseNamingScheme),
            default_action: None,
            max_passes: DEFAULT_MAX_PASSES,
        }
    }

    /// Registers how to build an imposter of `T`.
    ///
    /// Ignored once a custom [`imposteriser`](MockeryBuilder::imposteriser)
    /// is set.
    pub fn imposter<T: Arg>(
        mut self,
        factory: impl Fn(Proxy) -> T + Send + Sync + 'static,
    ) -> Self {
        self.imposters.register(factory);
        self
    }

    /// Replaces the registered imposters with a custom imposteriser.
    pub fn imposteriser(mut self, imposteriser: impl Imposteriser + 'static) -> Self {
        self.imposteriser = Some(Arc::new(imposteriser));
        self
    }

    pub fn naming_scheme(mut self, naming: impl NamingScheme + 'static) -> Self {
        self.naming = Arc::new(naming);
        self
    }

    /// The action of expectations that never called
    /// [`will`](Expectations::will). Defaults to [`ReturnDefaultValue`].
    pub fn default_action(mut self, action: impl Action + 'static) -> Self {
        self.default_action = Some(Arc::new(action));
        self
    }

    /// How many times a specification closure may be restarted.
    pub fn max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    pub fn build(self) -> Mockery {
        let imposteriser = match self.imposteriser {
            Some(imposteriser) => imposteriser,
            None => Arc::new(self.imposters) as Arc<dyn Imposteriser>,
        };
        let default_action = match self.default_action {
            Some(action) => action,
            None => Arc::new(ReturnDefaultValue::new(Arc::clone(&imposteriser))) as Arc<dyn Action>,
        };

        Mockery {
            store: Arc::new(MockStore::new(Config {
                imposteriser,
                naming: self.naming,
                default_action,
                max_passes: self.max_passes,
            })),
        }
    }
}

impl Default for MockeryBuilder {
    fn default() -> Self {
        MockeryBuilder::new()
    }
}
