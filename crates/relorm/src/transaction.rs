//! Transaction helpers.
//!
//! A transaction is just another executor: [`Db::begin`] returns a [`Tx`]
//! that derefs to a [`Db`] bound to the open transaction, so every builder
//! works on it unchanged.
//!
//! # Example
//!
//! ```ignore
//! use relorm::{Db, OrmResult};
//!
//! # async fn demo(db: &Db) -> OrmResult<()> {
//! relorm::transaction!(db, tx, {
//!     tx.exec("UPDATE accounts SET balance = balance - ? WHERE id = ?", relorm::args![100, 1])
//!         .await?;
//!     Ok(())
//! })?;
//! # Ok(()) }
//! ```

use std::future::Future;
use std::ops::Deref;

use crate::db::Db;
use crate::error::{OrmError, OrmResult};

/// Run a block inside a transaction.
///
/// Commits when the block returns `Ok`, rolls back when it returns `Err`.
/// Evaluates to the block's result.
#[macro_export]
macro_rules! transaction {
    ($db:expr, $tx:ident, $body:block) => {{
        let $tx = ($db).begin().await?;

        let __relorm_tx_body_result = async { $body }.await;
        match __relorm_tx_body_result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(error) => $tx.rollback_after(error).await,
        }
    }};
}

/// An open transaction.
#[derive(Debug)]
pub struct Tx {
    db: Db,
}

impl Deref for Tx {
    type Target = Db;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

impl Tx {
    /// Handle bound to this transaction, for moving into async blocks.
    pub fn db(&self) -> Db {
        self.db.clone()
    }

    pub async fn commit(self) -> OrmResult<()> {
        self.db.executor().commit(self.db.context()).await
    }

    pub async fn rollback(self) -> OrmResult<()> {
        self.db.executor().rollback(self.db.context()).await
    }

    /// Roll back because of `error` and hand the error back.
    ///
    /// A failed rollback is logged and folded into the returned error.
    #[doc(hidden)]
    pub async fn rollback_after<T>(self, error: OrmError) -> OrmResult<T> {
        match self.rollback().await {
            Ok(()) => Err(error),
            Err(rollback_err) => {
                tracing::error!(target: "relorm", error = %rollback_err, "rollback failed");
                Err(OrmError::Other(format!(
                    "{error} (rollback failed: {rollback_err})"
                )))
            }
        }
    }
}

impl Db {
    /// Open a transaction on the current executor.
    pub async fn begin(&self) -> OrmResult<Tx> {
        let executor = self.executor().begin(self.context()).await?;
        Ok(Tx {
            db: self.rebind(executor),
        })
    }

    /// Run `f` inside a transaction: commit on `Ok`, roll back on `Err`.
    pub async fn transaction<F, Fut, T>(&self, f: F) -> OrmResult<T>
    where
        F: FnOnce(Db) -> Fut,
        Fut: Future<Output = OrmResult<T>>,
    {
        let tx = self.begin().await?;
        match f(tx.db()).await {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(error) => tx.rollback_after(error).await,
        }
    }
}
