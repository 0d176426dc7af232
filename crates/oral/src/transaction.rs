use crate::{
    database::Database,
    error::{Error, Result},
};

use tracing::warn;

/// Scoped transaction guard: commit is opt-in, rollback is the default.
///
/// [`good`](Transaction::good) commits the unit of work; a guard dropped
/// without it rolls back, so early returns and `?` exits leave the
/// database untouched.
#[derive(Debug)]
pub struct Transaction {
    db: Database,
    committed: bool,
}

impl Transaction {
    pub(crate) fn begin(db: Database) -> Result<Self> {
        if db.tx_open().get() {
            return Err(Error::NestedTransaction);
        }

        db.conn().execute_batch("BEGIN")?;
        db.tx_open().set(true);

        Ok(Self {
            db,
            committed: false,
        })
    }

    /// Marks the unit of work good and commits it.
    pub fn good(mut self) -> Result<()> {
        self.committed = true;
        self.db.tx_open().set(false);
        self.db.conn().execute_batch("COMMIT")?;
        Ok(())
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if self.committed {
            return;
        }

        self.db.tx_open().set(false);
        if let Err(err) = self.db.conn().execute_batch("ROLLBACK") {
            warn!(error = %err, "failed to roll back transaction");
        }
    }
}
