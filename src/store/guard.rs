use super::{Connection, StoreResult};

/// Holds a connection in manual-commit mode for the length of one request.
///
/// `commit()` commits and restores the previous autocommit flag. Dropping
/// the guard without committing rolls back and restores the flag, so every
/// early return or `?` leaves the connection as it was found.
pub struct AutocommitGuard<'c> {
    conn: &'c dyn Connection,
    previous: bool,
    finished: bool,
}

impl<'c> AutocommitGuard<'c> {
    pub fn begin(conn: &'c dyn Connection) -> StoreResult<Self> {
        let previous = conn.autocommit();
        conn.set_autocommit(false)?;
        tracing::debug!(previous_autocommit = previous, "transaction opened");
        Ok(Self {
            conn,
            previous,
            finished: false,
        })
    }

    pub fn commit(mut self) -> StoreResult<()> {
        self.finished = true;
        if let Err(err) = self.conn.commit() {
            self.abort();
            return Err(err);
        }
        self.conn.set_autocommit(self.previous)?;
        tracing::debug!("transaction committed");
        Ok(())
    }

    fn abort(&self) {
        if let Err(err) = self.conn.rollback() {
            tracing::warn!(error = %err, "rollback failed");
        }
        if let Err(err) = self.conn.set_autocommit(self.previous) {
            tracing::warn!(error = %err, "could not restore autocommit");
        }
    }
}

impl Drop for AutocommitGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!("transaction rolled back");
            self.abort();
        }
    }
}
