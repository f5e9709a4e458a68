//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed ports using Diesel ORM
//! - **rawg**: reqwest-backed game feed for catalog sync
//! - **security**: HMAC bearer tokens and PBKDF2 password hashing
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod persistence;
pub mod rawg;
pub mod security;
