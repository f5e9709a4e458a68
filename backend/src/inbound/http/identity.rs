//! Bearer-token extractors.
//!
//! Handlers take [`AuthenticatedUser`] or [`AdminUser`] as arguments; the
//! verified identity is then passed explicitly into the domain. Requests that
//! fail verification are rejected with `401` before any handler code runs.

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::{Ready, ready};
use tracing::debug;

use crate::domain::ports::TokenError;
use crate::domain::{Error, Identity, UserId};
use crate::inbound::http::state::HttpState;

const BEARER_PREFIX: &str = "Bearer ";

/// Caller holding a valid bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(Identity);

impl AuthenticatedUser {
    pub fn user_id(&self) -> &UserId {
        &self.0.user_id
    }

    pub fn identity(&self) -> &Identity {
        &self.0
    }
}

/// Caller holding a valid bearer token with the admin role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminUser(Identity);

impl AdminUser {
    pub fn user_id(&self) -> &UserId {
        &self.0.user_id
    }
}

fn bearer_token(req: &HttpRequest) -> Result<&str, Error> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| Error::unauthorized("missing bearer token"))?;
    let value = header
        .to_str()
        .map_err(|_| Error::unauthorized("authorization header is not valid text"))?;
    value
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| Error::unauthorized("authorization header must use the Bearer scheme"))
}

fn map_token_error(error: TokenError) -> Error {
    debug!(%error, "bearer token rejected");
    match error {
        TokenError::Expired => Error::unauthorized("token has expired"),
        TokenError::Signing { .. } => Error::internal("token verification unavailable"),
        TokenError::Malformed { .. } | TokenError::BadSignature => {
            Error::unauthorized("invalid token")
        }
    }
}

fn verify(req: &HttpRequest) -> Result<Identity, Error> {
    let state = req
        .app_data::<web::Data<HttpState>>()
        .ok_or_else(|| Error::internal("http state is not configured"))?;
    let token = bearer_token(req)?;
    state
        .tokens
        .verify(token, state.clock.utc())
        .map_err(map_token_error)
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(verify(req).map(Self))
    }
}

impl FromRequest for AdminUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(verify(req).and_then(|identity| {
            if identity.is_admin() {
                Ok(Self(identity))
            } else {
                Err(Error::forbidden("administrator role required"))
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserRole;
    use crate::test_support::TestStorefront;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test};
    use rstest::rstest;

    async fn whoami(user: AuthenticatedUser) -> HttpResponse {
        HttpResponse::Ok().body(user.user_id().to_string())
    }

    async fn admin_only(_admin: AdminUser) -> HttpResponse {
        HttpResponse::NoContent().finish()
    }

    #[rstest]
    #[case::missing(None, StatusCode::UNAUTHORIZED)]
    #[case::wrong_scheme(Some("Basic abc"), StatusCode::UNAUTHORIZED)]
    #[case::empty(Some("Bearer   "), StatusCode::UNAUTHORIZED)]
    #[case::garbage(Some("Bearer not-a-token"), StatusCode::UNAUTHORIZED)]
    #[actix_web::test]
    async fn bad_credentials_are_unauthorised(
        #[case] header: Option<&str>,
        #[case] expected: StatusCode,
    ) {
        let storefront = TestStorefront::new();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(storefront.state()))
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let mut request = test::TestRequest::get().uri("/me");
        if let Some(value) = header {
            request = request.insert_header((AUTHORIZATION, value));
        }
        let response = test::call_service(&app, request.to_request()).await;
        assert_eq!(response.status(), expected);
    }

    #[actix_web::test]
    async fn valid_tokens_yield_the_user_id() {
        let storefront = TestStorefront::new();
        let (user_id, token) = storefront.user_with_token(UserRole::User);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(storefront.state()))
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let response = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/me")
                .insert_header((AUTHORIZATION, format!("Bearer {token}")))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = test::read_body(response).await;
        assert_eq!(body, user_id.to_string().as_bytes());
    }

    #[rstest]
    #[case(UserRole::User, StatusCode::FORBIDDEN)]
    #[case(UserRole::Admin, StatusCode::NO_CONTENT)]
    #[actix_web::test]
    async fn admin_extractor_checks_the_role(#[case] role: UserRole, #[case] expected: StatusCode) {
        let storefront = TestStorefront::new();
        let (_, token) = storefront.user_with_token(role);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(storefront.state()))
                .route("/admin", web::post().to(admin_only)),
        )
        .await;

        let response = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/admin")
                .insert_header((AUTHORIZATION, format!("Bearer {token}")))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), expected);
    }

    #[actix_web::test]
    async fn expired_tokens_are_rejected() {
        let storefront = TestStorefront::new();
        let (_, token) = storefront.user_with_token(UserRole::User);
        storefront.clock.advance_seconds(25 * 3600);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(storefront.state()))
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let response = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/me")
                .insert_header((AUTHORIZATION, format!("Bearer {token}")))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
