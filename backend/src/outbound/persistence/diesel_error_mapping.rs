//! Shared Diesel error classification.
//!
//! Each adapter owns its port error enum; this module only narrows Diesel's
//! error zoo down to the handful of cases adapters care about and logs the
//! raw details at debug level so they never reach a response body.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

/// What an adapter needs to know about a failed statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DieselFailure {
    /// A unique index rejected the write.
    UniqueViolation { constraint: Option<String> },
    /// The server closed the connection mid-statement.
    ConnectionLost,
    /// Anything else, with a client-safe description.
    Query(&'static str),
}

impl DieselFailure {
    pub(crate) fn message(&self) -> &'static str {
        match self {
            Self::UniqueViolation { .. } => "unique constraint violated",
            Self::ConnectionLost => "database connection error",
            Self::Query(message) => message,
        }
    }
}

pub(crate) fn classify_diesel_error(error: DieselError) -> DieselFailure {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(error = %error, "diesel operation failed"),
    }

    match error {
        DieselError::NotFound => DieselFailure::Query("record not found"),
        DieselError::QueryBuilderError(_) => DieselFailure::Query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            DieselFailure::UniqueViolation {
                constraint: info.constraint_name().map(str::to_owned),
            }
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            DieselFailure::ConnectionLost
        }
        _ => DieselFailure::Query("database error"),
    }
}

/// Map a failure onto a port error that only distinguishes connection loss
/// from everything else.
pub(crate) fn map_basic_failure<E>(
    failure: DieselFailure,
    query: impl FnOnce(&'static str) -> E,
    connection: impl FnOnce(&'static str) -> E,
) -> E {
    match failure {
        DieselFailure::ConnectionLost => connection(failure.message()),
        other => query(other.message()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn unique_violation_is_recognised() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key value violates unique constraint".to_string()),
        );
        assert!(matches!(
            classify_diesel_error(error),
            DieselFailure::UniqueViolation { .. }
        ));
    }

    #[rstest]
    fn closed_connection_maps_to_connection_constructor() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::ClosedConnection,
            Box::new("server closed the connection".to_string()),
        );
        let mapped: Result<(), String> = Err(map_basic_failure(
            classify_diesel_error(error),
            |message| format!("query: {message}"),
            |message| format!("connection: {message}"),
        ));
        assert_eq!(mapped, Err("connection: database connection error".to_owned()));
    }

    #[rstest]
    fn not_found_is_a_query_failure() {
        assert_eq!(
            classify_diesel_error(DieselError::NotFound),
            DieselFailure::Query("record not found")
        );
    }
}
