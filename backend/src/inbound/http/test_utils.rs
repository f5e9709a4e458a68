//! Test helpers for inbound HTTP components.

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::header::AUTHORIZATION;
use actix_web::{App, web};

use crate::middleware::Trace;
use crate::test_support::TestStorefront;

/// App serving every storefront route over `storefront`'s in-memory state.
///
/// The returned app owns a snapshot of the state, so it outlives the borrow.
pub fn test_app(
    storefront: &TestStorefront,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    > + use<>,
> {
    App::new()
        .app_data(web::Data::new(storefront.state()))
        .wrap(Trace)
        .configure(super::configure)
}

/// `Authorization` header tuple for `token`.
pub fn bearer(token: &str) -> (actix_web::http::header::HeaderName, String) {
    (AUTHORIZATION, format!("Bearer {token}"))
}
