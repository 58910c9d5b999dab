use std::sync::{Arc, Weak};

use tracing::{trace, warn};

use crate::{
    error::{Error, Result},
    invocation::{Invocation, MockRef},
    mock_store::{MockStore, Unexpected},
    proxy::Invokable,
    value::Value,
};

/// Routes the calls of one mock to the expectations of its mockery.
pub(crate) struct Dispatcher {
    store: Weak<MockStore>,
    target: MockRef,
}

impl Dispatcher {
    pub fn new(store: Weak<MockStore>, target: MockRef) -> Self {
        Dispatcher { store, target }
    }
}

impl Invokable for Dispatcher {
    fn invoke(&self, invocation: Invocation) -> Result<Value> {
        let store = self.store.upgrade().ok_or_else(|| Error::Detached {
            target: self.target.to_string(),
        })?;
        dispatch(&store, invocation)
    }
}

/// Matches `invocation` against the first eligible expectation, in
/// declaration order, and runs its action.
pub(crate) fn dispatch(store: &MockStore, invocation: Invocation) -> Result<Value> {
    let action = {
        let mut guard = store.lock();
        let ledger = &mut *guard;

        let chosen = ledger
            .expectations
            .iter()
            .position(|expectation| expectation.is_eligible(&invocation, &ledger.cells));

        match chosen {
            Some(index) => {
                let expectation = &mut ledger.expectations[index];
                expectation.record(&mut ledger.cells);
                trace!(%invocation, expectation = index, "dispatched");
                expectation
                    .action
                    .clone()
                    .unwrap_or_else(|| Arc::clone(&store.config().default_action))
            }
            None => {
                let unexpected = Unexpected {
                    invocation: invocation.to_string(),
                    report: ledger.report(&invocation),
                };
                warn!(%invocation, "unexpected invocation");
                ledger.failure.get_or_insert_with(|| unexpected.clone());
                drop(guard);
                store.notify();
                return Err(unexpected.into());
            }
        }
    };

    store.notify();
    action.invoke(&invocation)
}
