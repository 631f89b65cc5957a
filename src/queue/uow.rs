//! Transaction wrapper with post-commit task enqueue.
//!
//! A [`UnitOfWork`] collects tasks alongside a database transaction and
//! submits them only after the transaction has durably committed. Dropping
//! the unit of work without committing rolls the transaction back and
//! submits nothing, so a task can never run for work that was never
//! persisted.

use rusqlite::{Connection, Transaction};
use stellar_db::DbError;
use tracing::warn;

use super::{Task, TaskQueue};

/// A database transaction carrying deferred tasks.
pub struct UnitOfWork<'conn> {
    tx: Transaction<'conn>,
    deferred: Vec<Task>,
}

impl<'conn> UnitOfWork<'conn> {
    /// Open a transaction on the connection.
    pub fn begin(conn: &'conn mut Connection) -> Result<Self, DbError> {
        let tx = conn
            .transaction()
            .map_err(|e| DbError::database(e.to_string()))?;
        Ok(Self {
            tx,
            deferred: Vec::new(),
        })
    }

    /// The transaction's connection, for running queries inside it.
    pub fn connection(&self) -> &Connection {
        &self.tx
    }

    /// Defer a task until commit.
    pub fn defer(&mut self, task: Task) {
        self.deferred.push(task);
    }

    /// Commit the transaction, then submit every deferred task.
    pub fn commit(self, queue: &TaskQueue) -> Result<(), DbError> {
        self.tx
            .commit()
            .map_err(|e| DbError::database(e.to_string()))?;

        for task in self.deferred {
            if queue.submit(task).is_err() {
                warn!("Task queue is closed; dropping deferred task");
            }
        }

        Ok(())
    }
}
