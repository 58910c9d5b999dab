use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Instant,
};

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::debug;

use crate::{
    action::Action,
    builder::PendingExpectation,
    dispatcher::Dispatcher,
    error::{Error, Result, Shortfall},
    expectation::Expectation,
    invocation::{Invocation, MockRef},
    naming::NamingScheme,
    ordering::{Cells, CellRef},
    proxy::{Imposteriser, Proxy},
    value::{Arg, Object, Value},
};

static NEXT_STORE: AtomicUsize = AtomicUsize::new(0);

pub(crate) struct Config {
    pub imposteriser: Arc<dyn Imposteriser>,
    pub naming: Arc<dyn NamingScheme>,
    pub default_action: Arc<dyn Action>,
    pub max_passes: usize,
}

/// Everything one mockery knows, behind a single lock.
///
/// Dispatch decides and records under the lock, then runs the chosen
/// action after releasing it so actions may call other mocks.
pub(crate) struct MockStore {
    id: usize,
    config: Config,
    ledger: Mutex<Ledger>,
    changed: Condvar,
}

#[derive(Default)]
pub(crate) struct Ledger {
    pub expectations: Vec<Expectation>,
    pub cells: Cells,
    pub failure: Option<Unexpected>,
    mocks: Vec<(Object, MockRef)>,
    names: HashSet<Arc<str>>,
    created: usize,
}

/// The first unexpected invocation, kept so later checks report it.
#[derive(Debug, Clone)]
pub(crate) struct Unexpected {
    pub invocation: String,
    pub report: String,
}

impl From<Unexpected> for Error {
    fn from(unexpected: Unexpected) -> Self {
        Error::UnexpectedInvocation {
            invocation: unexpected.invocation,
            report: unexpected.report,
        }
    }
}

impl MockStore {
    pub fn new(config: Config) -> Self {
        MockStore {
            id: NEXT_STORE.fetch_add(1, Ordering::Relaxed),
            config,
            ledger: Mutex::new(Ledger::default()),
            changed: Condvar::new(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock()
    }

    /// Wakes everyone waiting for the ledger to change.
    pub(crate) fn notify(&self) {
        self.changed.notify_all();
    }

    /// Waits for a change, or until `deadline` if there is one.
    pub(crate) fn wait(&self, ledger: &mut MutexGuard<'_, Ledger>, deadline: Option<Instant>) {
        // spurious and timed out wakeups are both re-checked by the caller
        match deadline {
            Some(deadline) => {
                let _ = self.changed.wait_until(ledger, deadline);
            }
            None => self.changed.wait(ledger),
        }
    }

    pub fn with_cells<R>(&self, f: impl FnOnce(&mut Cells) -> R) -> R {
        f(&mut self.ledger.lock().cells)
    }

    pub fn add_sequence(&self, name: &str) -> CellRef {
        self.with_cells(|cells| cells.add_sequence(self.id, name))
    }

    pub fn add_states(&self, name: &str) -> CellRef {
        self.with_cells(|cells| cells.add_states(self.id, name))
    }

    /// Creates a mock of `T` whose calls are dispatched against this
    /// store.
    pub fn create_mock<T: Arg>(self: &Arc<Self>, name: Option<&str>) -> Result<T> {
        let ty = T::type_desc();
        let imposteriser = &self.config.imposteriser;
        if !imposteriser.can_imposterise(&ty) {
            return Err(Error::Imposteriser {
                ty: ty.name(),
                reason: "no imposter was registered for it".to_string(),
            });
        }

        let name: Arc<str> = match name {
            Some(name) => name.into(),
            None => self.config.naming.default_name_for(&ty).into(),
        };

        // reserve the name first so the imposter runs without the lock held
        let id = {
            let mut ledger = self.ledger.lock();
            if !ledger.names.insert(name.clone()) {
                return Err(Error::DuplicateMockName {
                    name: name.to_string(),
                });
            }
            ledger.created += 1;
            ledger.created - 1
        };

        let target = MockRef::new(id, name.clone());
        let dispatcher = Dispatcher::new(Arc::downgrade(self), target.clone());
        let created = imposteriser
            .imposterise(Proxy::new(target.clone(), Arc::new(dispatcher)), &ty, &[])
            .and_then(|value| match &value {
                Value::Object(object) => T::from_value(&value)
                    .map(|mock| (object.clone(), mock))
                    .ok_or_else(|| Error::Imposteriser {
                        ty: ty.name(),
                        reason: format!("the imposter was a {}", object.type_name()),
                    }),
                _ => Err(Error::Imposteriser {
                    ty: ty.name(),
                    reason: "mocks must be shared behind an Arc".to_string(),
                }),
            });

        let mut ledger = self.ledger.lock();
        match created {
            Ok((object, mock)) => {
                debug!(mock = %target, ty = ty.name(), "created mock");
                ledger.mocks.push((object, target));
                Ok(mock)
            }
            Err(e) => {
                ledger.names.remove(&name);
                Err(e)
            }
        }
    }

    /// The mock `value` is, if it was created by this store.
    pub fn target_of(&self, value: &Value) -> Option<MockRef> {
        let object = match value {
            Value::Object(object) => object,
            _ => return None,
        };

        self.ledger
            .lock()
            .mocks
            .iter()
            .find(|(mock, _)| mock.addr() == object.addr())
            .map(|(_, target)| target.clone())
    }

    /// Appends the expectations of one finished specification.
    pub fn commit(&self, pending: Vec<PendingExpectation>) {
        let mut ledger = self.ledger.lock();
        let Ledger {
            expectations,
            cells,
            ..
        } = &mut *ledger;

        let added = pending.len();
        expectations.extend(pending.into_iter().map(|p| p.into_expectation(cells)));
        debug!(added, total = expectations.len(), "committed expectations");

        drop(ledger);
        self.notify();
    }
}

impl Ledger {
    /// Everything a reader needs to understand why `invocation` did not
    /// match.
    pub fn report(&self, invocation: &Invocation) -> String {
        let mut report = if self.expectations.is_empty() {
            "no expectations have been specified".to_string()
        } else {
            "expectations:".to_string()
        };

        for expectation in &self.expectations {
            let mark = if expectation.is_satisfied() { "✓" } else { "✗" };
            report += &format!("\n  {} {}", mark, expectation);
            if let Some(mismatch) = expectation.explain(invocation) {
                for line in mismatch.lines() {
                    report += &format!("\n      {}", line);
                }
            }
        }

        let cells = self.cells.to_string();
        if !cells.is_empty() {
            report += "\nordering:";
            report += &cells;
        }
        report
    }

    pub fn shortfalls(&self) -> Vec<Shortfall> {
        self.expectations
            .iter()
            .filter(|expectation| !expectation.is_satisfied())
            .map(|expectation| Shortfall {
                expectation: expectation.to_string(),
                remaining: expectation.remaining(),
            })
            .collect()
    }
}
