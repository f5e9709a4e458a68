//! Ports at the edge of the domain.
//!
//! Driven ports (`UserDirectory`, `GameCatalog`, `TransactionLedger`, ...) are
//! implemented by outbound adapters. Driving ports (`TransactionCommand`,
//! `CatalogQuery`, ...) are implemented by domain services and called by the
//! HTTP layer. Each driven port has its own error enum built with
//! [`define_port_error!`]; services translate those into [`crate::domain::Error`].

mod macros;
pub(crate) use macros::define_port_error;

mod account_command;
mod account_query;
mod catalog_command;
mod catalog_query;
mod game_catalog;
mod game_feed;
mod idempotency_repository;
mod password_hasher;
mod recharge_command;
mod recharge_ledger;
mod recharge_query;
mod token_service;
mod transaction_command;
mod transaction_ledger;
mod transaction_query;
mod user_directory;

pub use account_command::AccountCommand;
pub use account_query::{AccountQuery, UserProfile};
pub use catalog_command::{CatalogCommand, SyncReport, SyncRequest};
pub use catalog_query::CatalogQuery;
pub use game_catalog::{GameCatalog, GameCatalogError, GameListing};
pub use game_feed::{FeedGame, FeedPage, GameFeed, GameFeedError, GamePricer};
pub use idempotency_repository::{IdempotencyRepository, IdempotencyRepositoryError};
pub use password_hasher::{PasswordHasher, PasswordHasherError};
pub use recharge_command::{RechargeCommand, RechargeReceipt, RechargeRequest, RechargeResponse};
pub use recharge_ledger::{RechargeLedger, RechargeLedgerError};
pub use recharge_query::RechargeQuery;
pub use token_service::{TokenError, TokenService};
pub use transaction_command::{
    BuyGameResponse, GameTransactionRequest, PurchaseReceipt, RentGameResponse, RentalReceipt,
    TransactionCommand,
};
pub use transaction_ledger::{TransactionLedger, TransactionLedgerError};
pub use transaction_query::TransactionQuery;
pub use user_directory::{UserDirectory, UserDirectoryError};

#[cfg(test)]
pub use account_command::MockAccountCommand;
#[cfg(test)]
pub use account_query::MockAccountQuery;
#[cfg(test)]
pub use catalog_command::MockCatalogCommand;
#[cfg(test)]
pub use catalog_query::MockCatalogQuery;
#[cfg(test)]
pub use game_catalog::MockGameCatalog;
#[cfg(test)]
pub use game_feed::{MockGameFeed, MockGamePricer};
#[cfg(test)]
pub use idempotency_repository::MockIdempotencyRepository;
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
#[cfg(test)]
pub use recharge_command::MockRechargeCommand;
#[cfg(test)]
pub use recharge_ledger::MockRechargeLedger;
#[cfg(test)]
pub use recharge_query::MockRechargeQuery;
#[cfg(test)]
pub use token_service::MockTokenService;
#[cfg(test)]
pub use transaction_command::MockTransactionCommand;
#[cfg(test)]
pub use transaction_ledger::MockTransactionLedger;
#[cfg(test)]
pub use transaction_query::MockTransactionQuery;
#[cfg(test)]
pub use user_directory::MockUserDirectory;
