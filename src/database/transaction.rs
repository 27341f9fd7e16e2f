use sqlx::{PgConnection, PgPool, Postgres, Transaction};

use super::manager::DatabaseError;

/// A transaction bound to a lexical scope.
///
/// The only way to persist the work is [`TxScope::commit`]. Every other exit
/// (an early `?` return, an explicit [`TxScope::rollback`], or a panic
/// unwinding through the owner) drops the inner sqlx transaction, which rolls
/// it back before the connection returns to the pool.
pub struct TxScope {
    tx: Transaction<'static, Postgres>,
    notice: RollbackNotice,
}

struct RollbackNotice {
    label: &'static str,
    armed: bool,
}

impl Drop for RollbackNotice {
    fn drop(&mut self) {
        if self.armed {
            if std::thread::panicking() {
                tracing::error!(tx = self.label, "panic inside transaction, rolling back");
            } else {
                tracing::warn!(tx = self.label, "transaction left without commit, rolling back");
            }
        }
    }
}

impl TxScope {
    pub async fn begin(pool: &PgPool, label: &'static str) -> Result<Self, DatabaseError> {
        let tx = pool.begin().await?;
        tracing::debug!(tx = label, "transaction started");
        Ok(Self {
            tx,
            notice: RollbackNotice { label, armed: true },
        })
    }

    pub fn conn(&mut self) -> &mut PgConnection {
        &mut self.tx
    }

    pub async fn commit(self) -> Result<(), DatabaseError> {
        let TxScope { tx, mut notice } = self;
        tx.commit().await?;
        notice.armed = false;
        tracing::debug!(tx = notice.label, "transaction committed");
        Ok(())
    }

    /// Ends the scope on an expected outcome (a rejected request, say)
    /// without the unfinished-transaction warning.
    pub async fn rollback(self) -> Result<(), DatabaseError> {
        let TxScope { tx, mut notice } = self;
        notice.armed = false;
        tx.rollback().await?;
        tracing::debug!(tx = notice.label, "transaction rolled back");
        Ok(())
    }
}
