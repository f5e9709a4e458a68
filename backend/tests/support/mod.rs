//! Shared helpers for the storefront integration suites.
//!
//! Each file under `tests/` compiles as its own crate, so suites that need
//! embedded PostgreSQL pull these helpers in with `mod support;`.

pub mod cluster_skip;
pub mod embedded_postgres;

pub use cluster_skip::handle_cluster_setup_failure;
pub use embedded_postgres::{provision_template_database, shared_cluster_handle};

/// Render a `postgres` error with its SQLSTATE and server message.
///
/// `Display` on `postgres::Error` often collapses to `db error`, which hides
/// what actually failed.
pub fn format_postgres_error(error: &postgres::Error) -> String {
    let Some(db_error) = error.as_db_error() else {
        return error.to_string();
    };

    let mut summary = format!(
        "postgres error {:?}: {}",
        db_error.code(),
        db_error.message()
    );
    if let Some(detail) = db_error.detail() {
        summary.push_str("; detail: ");
        summary.push_str(detail);
    }
    summary
}
