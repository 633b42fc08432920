//! Transactional unit of work for mutating operations.
//!
//! # Invariants
//! - One `IMMEDIATE` transaction per operation.
//! - Commit happens only when the operation returns `Ok`; every other exit
//!   (error, panic) drops the guard, which rolls back.

use crate::service::error::ServiceError;
use log::{error, info};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::time::Instant;

/// Runs `operation` inside one transaction on `conn`.
///
/// `event` names the operation in `event=... module=service` log lines.
pub(crate) fn run_in_transaction<T>(
    conn: &Connection,
    event: &'static str,
    operation: impl FnOnce(&Transaction<'_>) -> Result<T, ServiceError>,
) -> Result<T, ServiceError> {
    let started_at = Instant::now();
    let result = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
        .map_err(ServiceError::from)
        .and_then(|tx| {
            let value = operation(&tx)?;
            tx.commit()?;
            Ok(value)
        });

    match &result {
        Ok(_) => info!(
            "event={} module=service status=ok duration_ms={}",
            event,
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event={} module=service status=error duration_ms={} error_code={} error={}",
            event,
            started_at.elapsed().as_millis(),
            err.kind(),
            err
        ),
    }
    result
}
