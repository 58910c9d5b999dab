use std::time::{Duration, Instant};

use tracing::debug;

use crate::{
    error::{Error, Result},
    mock_store::MockStore,
};

impl MockStore {
    /// Fails with the first unexpected invocation, if there was one, or
    /// else with every expectation that still needs invoking.
    pub(crate) fn check_satisfied(&self) -> Result<()> {
        let ledger = self.lock();
        if let Some(failure) = &ledger.failure {
            return Err(failure.clone().into());
        }

        let shortfalls = ledger.shortfalls();
        if shortfalls.is_empty() {
            Ok(())
        } else {
            Err(Error::Unsatisfied { shortfalls })
        }
    }

    /// Blocks until every expectation is satisfied, an unexpected
    /// invocation is recorded, or `timeout` passes. A timeout too long
    /// to represent as an `Instant` never runs out.
    pub(crate) fn wait_for_satisfaction(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now().checked_add(timeout);
        let mut ledger = self.lock();

        loop {
            if let Some(failure) = &ledger.failure {
                return Err(failure.clone().into());
            }

            let shortfalls = ledger.shortfalls();
            if shortfalls.is_empty() {
                return Ok(());
            }

            if deadline.map_or(false, |deadline| Instant::now() >= deadline) {
                debug!(?timeout, unsatisfied = shortfalls.len(), "gave up waiting");
                return Err(Error::Timeout {
                    timeout,
                    shortfalls,
                });
            }

            self.wait(&mut ledger, deadline);
        }
    }

    /// Forgets every expectation and recorded failure, and rewinds
    /// sequences.
    pub(crate) fn reset(&self) {
        let mut ledger = self.lock();
        let dropped = ledger.expectations.len();
        ledger.expectations.clear();
        ledger.failure = None;
        ledger.cells.rewind();
        drop(ledger);

        debug!(dropped, "reset");
        self.notify();
    }
}
