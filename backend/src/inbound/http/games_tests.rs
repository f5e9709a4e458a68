//! Tests for catalog HTTP handlers.

use super::*;
use crate::domain::UserRole;
use crate::inbound::http::test_utils::{bearer, test_app};
use crate::test_support::{IMPORTED_TEST_PRICE, StaticGameFeed, TestStorefront, feed_game};
use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use rstest::rstest;
use serde_json::{Value, json};

#[actix_web::test]
async fn list_games_pages_through_the_catalog() {
    let storefront = TestStorefront::new();
    for name in ["Celeste", "Hades", "Portal"] {
        storefront.game(name, 300);
    }
    let app = actix_test::init_service(test_app(&storefront)).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/games?page=2&limit=2")
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let page: GamePageResponseBody = actix_test::read_body_json(res).await;
    assert_eq!(page.page, 2);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.total_games, 3);
    assert_eq!(page.games.len(), 1);
    assert_eq!(page.games[0].name, "Portal");
}

#[rstest]
#[case("/games?page=0")]
#[case("/games?limit=0")]
#[case("/games?limit=101")]
#[actix_web::test]
async fn list_games_rejects_bad_paging(#[case] uri: &str) {
    let storefront = TestStorefront::new();
    let app = actix_test::init_service(test_app(&storefront)).await;
    let res =
        actix_test::call_service(&app, actix_test::TestRequest::get().uri(uri).to_request()).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn get_game_distinguishes_missing_and_malformed_ids() {
    let storefront = TestStorefront::new();
    let id = storefront.game("Hades", 450);
    let app = actix_test::init_service(test_app(&storefront)).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri(&format!("/games/{id}"))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let game: GameResponseBody = actix_test::read_body_json(res).await;
    assert_eq!(game.price, 450);

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri(&format!("/games/{}", GameId::random()))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/games/not-a-uuid")
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

fn new_game_body() -> Value {
    json!({"name": "Celeste", "rating": 4.8, "price": 300, "genres": ["Platformer"]})
}

#[rstest]
#[case(UserRole::User, StatusCode::FORBIDDEN)]
#[case(UserRole::Admin, StatusCode::CREATED)]
#[actix_web::test]
async fn create_game_requires_admin(#[case] role: UserRole, #[case] expected: StatusCode) {
    let storefront = TestStorefront::new();
    let (_, token) = storefront.user_with_token(role);
    let app = actix_test::init_service(test_app(&storefront)).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/games")
            .insert_header(bearer(&token))
            .set_json(new_game_body())
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), expected);
}

#[rstest]
#[case::negative_price(json!({"name": "Celeste", "rating": 4.0, "price": -1}))]
#[case::blank_name(json!({"name": "  ", "rating": 4.0, "price": 10}))]
#[case::rating_too_high(json!({"name": "Celeste", "rating": 5.5, "price": 10}))]
#[actix_web::test]
async fn create_game_validates_fields(#[case] body: Value) {
    let storefront = TestStorefront::new();
    let (_, token) = storefront.user_with_token(UserRole::Admin);
    let app = actix_test::init_service(test_app(&storefront)).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/games")
            .insert_header(bearer(&token))
            .set_json(body)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn delete_game_removes_it_once() {
    let storefront = TestStorefront::new();
    let (_, token) = storefront.user_with_token(UserRole::Admin);
    let id = storefront.game("Hades", 450);
    let app = actix_test::init_service(test_app(&storefront)).await;

    for expected in [StatusCode::NO_CONTENT, StatusCode::NOT_FOUND] {
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::delete()
                .uri(&format!("/games/{id}"))
                .insert_header(bearer(&token))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), expected);
    }
}

#[actix_web::test]
async fn sync_imports_feed_games_once() {
    let storefront = TestStorefront::with_feed(StaticGameFeed::new(vec![vec![
        feed_game(3498, "Grand Theft Auto V"),
        feed_game(4200, "Portal 2"),
    ]]));
    let (_, token) = storefront.user_with_token(UserRole::Admin);
    let app = actix_test::init_service(test_app(&storefront)).await;

    let sync = || {
        actix_test::TestRequest::post()
            .uri("/games/sync")
            .insert_header(bearer(&token))
            .set_json(json!({"pages": 1, "pageSize": 40}))
            .to_request()
    };

    let res = actix_test::call_service(&app, sync()).await;
    assert_eq!(res.status(), StatusCode::OK);
    let report: SyncReportResponseBody = actix_test::read_body_json(res).await;
    assert_eq!((report.fetched, report.imported, report.skipped), (2, 2, 0));

    let res = actix_test::call_service(&app, sync()).await;
    let report: SyncReportResponseBody = actix_test::read_body_json(res).await;
    assert_eq!((report.imported, report.skipped), (0, 2));

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get().uri("/games").to_request(),
    )
    .await;
    let page: GamePageResponseBody = actix_test::read_body_json(res).await;
    assert_eq!(page.total_games, 2);
    assert!(
        page.games
            .iter()
            .all(|game| game.price == IMPORTED_TEST_PRICE.value())
    );
}

#[actix_web::test]
async fn sync_without_body_uses_defaults() {
    let storefront = TestStorefront::new();
    let (_, token) = storefront.user_with_token(UserRole::Admin);
    let app = actix_test::init_service(test_app(&storefront)).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/games/sync")
            .insert_header(bearer(&token))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_web::test]
async fn sync_rejects_oversized_pages() {
    let storefront = TestStorefront::new();
    let (_, token) = storefront.user_with_token(UserRole::Admin);
    let app = actix_test::init_service(test_app(&storefront)).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/games/sync")
            .insert_header(bearer(&token))
            .set_json(json!({"pageSize": 41}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
