//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain's driven ports backed by
//! PostgreSQL via Diesel, with async support through `diesel-async` and
//! `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: repository implementations only translate between
//!   Diesel rows and domain types. Coin arithmetic that must be atomic (the
//!   conditional debit and the recharge credit) is expressed as SQL inside
//!   one transaction, never as read-modify-write in Rust.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Strongly typed errors**: Diesel errors are narrowed by
//!   `diesel_error_mapping` and mapped onto each port's own error enum.
//!
//! # Example
//!
//! ```ignore
//! use storefront::outbound::persistence::{DbPool, DieselTransactionLedger, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/storefront")).await?;
//! let ledger = DieselTransactionLedger::new(pool);
//! ```

mod diesel_error_mapping;
mod diesel_game_catalog;
mod diesel_idempotency_repository;
mod diesel_recharge_ledger;
mod diesel_transaction_ledger;
mod diesel_user_directory;
mod models;
mod pool;
mod schema;

pub use diesel_game_catalog::DieselGameCatalog;
pub use diesel_idempotency_repository::DieselIdempotencyRepository;
pub use diesel_recharge_ledger::DieselRechargeLedger;
pub use diesel_transaction_ledger::DieselTransactionLedger;
pub use diesel_user_directory::DieselUserDirectory;
pub use pool::{DbPool, PoolConfig, PoolError, run_migrations};
