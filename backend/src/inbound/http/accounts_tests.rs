//! Tests for account HTTP handlers.

use super::*;
use crate::domain::{STARTING_BALANCE, UserRole};
use crate::inbound::http::test_utils::{bearer, test_app};
use crate::test_support::TestStorefront;
use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use rstest::rstest;
use serde_json::{Value, json};

#[actix_web::test]
async fn register_login_and_profile_round_trip() {
    let storefront = TestStorefront::new();
    let app = actix_test::init_service(test_app(&storefront)).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/auth/register")
            .set_json(json!({"name": "Ada", "email": "Ada@Example.com", "password": "hunter22"}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: ProfileResponseBody = actix_test::read_body_json(res).await;
    assert_eq!(created.email, "ada@example.com");
    assert_eq!(created.coin_balance, STARTING_BALANCE.value());
    assert_eq!(created.role, "user");

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({"email": "ada@example.com", "password": "hunter22"}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let token: TokenResponseBody = actix_test::read_body_json(res).await;
    assert_eq!(token.token_type, "Bearer");

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/profile")
            .insert_header(bearer(&token.token))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let account: ProfileResponseBody = actix_test::read_body_json(res).await;
    assert_eq!(account.id, created.id);
    assert_eq!(account.name, "Ada");
}

#[rstest]
#[case::blank_name(json!({"name": " ", "email": "a@b.c", "password": "hunter22"}), "name")]
#[case::bad_email(json!({"name": "Ada", "email": "nope", "password": "hunter22"}), "email")]
#[case::short_password(json!({"name": "Ada", "email": "a@b.c", "password": "12345"}), "password")]
#[actix_web::test]
async fn register_rejects_invalid_fields(#[case] body: Value, #[case] field: &str) {
    let storefront = TestStorefront::new();
    let app = actix_test::init_service(test_app(&storefront)).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/auth/register")
            .set_json(body)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let error: Value = actix_test::read_body_json(res).await;
    assert_eq!(error["code"], "invalid_request");
    assert_eq!(error["details"]["field"], field);
}

#[actix_web::test]
async fn duplicate_email_is_a_conflict() {
    let storefront = TestStorefront::new();
    let app = actix_test::init_service(test_app(&storefront)).await;
    let body = json!({"name": "Ada", "email": "ada@example.com", "password": "hunter22"});

    for expected in [StatusCode::CREATED, StatusCode::CONFLICT] {
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/auth/register")
                .set_json(&body)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), expected);
    }
}

#[rstest]
#[case::wrong_password("ada@example.com", "hunter23")]
#[case::unknown_email("bob@example.com", "hunter22")]
#[actix_web::test]
async fn login_rejects_bad_credentials(#[case] email: &str, #[case] password: &str) {
    let storefront = TestStorefront::new();
    let app = actix_test::init_service(test_app(&storefront)).await;
    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/auth/register")
            .set_json(json!({"name": "Ada", "email": "ada@example.com", "password": "hunter22"}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({"email": email, "password": password}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().contains_key("trace-id"));
}

#[actix_web::test]
async fn profile_requires_a_token() {
    let storefront = TestStorefront::new();
    let app = actix_test::init_service(test_app(&storefront)).await;
    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get().uri("/api/profile").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn profile_reports_the_admin_role() {
    let storefront = TestStorefront::new();
    let (_, token) = storefront.user_with_token(UserRole::Admin);
    let app = actix_test::init_service(test_app(&storefront)).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/profile")
            .insert_header(bearer(&token))
            .to_request(),
    )
    .await;
    let account: ProfileResponseBody = actix_test::read_body_json(res).await;
    assert_eq!(account.role, "admin");
}

#[actix_web::test]
async fn admin_promotes_a_customer() {
    let storefront = TestStorefront::new();
    let (_, admin_token) = storefront.user_with_token(UserRole::Admin);
    let customer = storefront.user(UserRole::User);
    let app = actix_test::init_service(test_app(&storefront)).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::put()
            .uri(&format!("/users/{customer}/promote"))
            .insert_header(bearer(&admin_token))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let promoted: ProfileResponseBody = actix_test::read_body_json(res).await;
    assert_eq!(promoted.id, customer.to_string());
    assert_eq!(promoted.role, "admin");
}

#[actix_web::test]
async fn customers_cannot_promote() {
    let storefront = TestStorefront::new();
    let (customer, token) = storefront.user_with_token(UserRole::User);
    let app = actix_test::init_service(test_app(&storefront)).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::put()
            .uri(&format!("/users/{customer}/promote"))
            .insert_header(bearer(&token))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/profile")
            .insert_header(bearer(&token))
            .to_request(),
    )
    .await;
    let account: ProfileResponseBody = actix_test::read_body_json(res).await;
    assert_eq!(account.role, "user");
}

#[rstest]
#[case::unknown_account("6f1c1b9e-8f52-4c57-9a43-2d1f0c7b5a10", StatusCode::NOT_FOUND)]
#[case::malformed_id("not-a-uuid", StatusCode::BAD_REQUEST)]
#[actix_web::test]
async fn promote_rejects_bad_targets(#[case] target: &str, #[case] expected: StatusCode) {
    let storefront = TestStorefront::new();
    let (_, admin_token) = storefront.user_with_token(UserRole::Admin);
    let app = actix_test::init_service(test_app(&storefront)).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::put()
            .uri(&format!("/users/{target}/promote"))
            .insert_header(bearer(&admin_token))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), expected);
}
