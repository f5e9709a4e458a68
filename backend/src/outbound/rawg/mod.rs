//! RAWG outbound adapters.
//!
//! This module provides a thin HTTP implementation of the `GameFeed` port
//! used by catalog sync.

mod dto;
mod http_source;

pub use http_source::{RAWG_DEFAULT_ENDPOINT, RawgHttpSource};
