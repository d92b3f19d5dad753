//! Mapping of database errors into posting errors.

use oasis_core::posting::PostingError;
use sea_orm::{DbErr, RuntimeErr};

/// SQLSTATE raised when a serializable transaction cannot be committed.
pub const SERIALIZATION_FAILURE: &str = "40001";

/// SQLSTATE raised when Postgres breaks a deadlock.
pub const DEADLOCK_DETECTED: &str = "40P01";

/// Returns true for SQLSTATE codes that mean a concurrent transaction won.
#[must_use]
pub fn is_conflict_code(code: &str) -> bool {
    code == SERIALIZATION_FAILURE || code == DEADLOCK_DETECTED
}

/// Extracts the SQLSTATE code of a database-reported error.
#[must_use]
pub fn sqlstate(err: &DbErr) -> Option<String> {
    match err {
        DbErr::Conn(RuntimeErr::SqlxError(sqlx::Error::Database(db_err)))
        | DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(db_err)))
        | DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(db_err))) => {
            db_err.code().map(|code| code.into_owned())
        }
        _ => None,
    }
}

/// Converts a `DbErr` into a `PostingError`.
///
/// Serialization failures and deadlocks become `TransactionConflict`,
/// everything else is reported as `Database`.
#[must_use]
pub fn posting_error(err: DbErr) -> PostingError {
    match sqlstate(&err) {
        Some(code) if is_conflict_code(&code) => PostingError::TransactionConflict,
        _ => PostingError::Database(err.to_string()),
    }
}
