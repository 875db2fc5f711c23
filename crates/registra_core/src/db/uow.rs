//! Unit-of-work transaction scoping.
//!
//! # Responsibility
//! - Run read-validate-write sequences against one transactional snapshot.
//! - Commit all writes indivisibly, or leave storage unchanged on any
//!   step's failure.
//!
//! # Invariants
//! - Transactions start `IMMEDIATE`, so a unit holds the database write
//!   lock for its whole read-validate-write span. Sibling queries made by
//!   the rule engine therefore see the same state the write applies to.
//! - Rollback happens on drop; no partial state survives an error or a
//!   caller abort.

use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Scoped transaction runner for multi-step calendar writes.
pub struct UnitOfWork<'conn> {
    conn: &'conn Connection,
}

impl<'conn> UnitOfWork<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Runs `op` inside one immediate transaction.
    ///
    /// Commits when `op` returns `Ok`; any `Err` (or panic unwind) drops
    /// the transaction, rolling back every write performed so far.
    pub fn run<T, E>(&self, op: impl FnOnce(&Transaction<'_>) -> Result<T, E>) -> Result<T, E>
    where
        E: From<rusqlite::Error>,
    {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let value = op(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}
