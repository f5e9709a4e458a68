//! Coin recharge HTTP handlers.
//!
//! ```text
//! POST /recharge {"amount":500}   Idempotency-Key: <uuid> (optional)
//! GET /recharge-history
//! ```

use actix_web::{get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::ports::{RechargeRequest, RechargeResponse};
use crate::domain::{Coins, Error, MIN_RECHARGE, Recharge};
use crate::inbound::http::ApiResult;
use crate::inbound::http::idempotency::IdempotencyHeader;
use crate::inbound::http::identity::AuthenticatedUser;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Top-up payload.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RechargeRequestBody {
    /// Coins to add; at least 100.
    #[schema(minimum = 100, example = 500)]
    pub amount: i64,
}

/// Recorded top-up.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RechargeBody {
    #[schema(format = "uuid")]
    pub id: String,
    pub amount: u64,
    #[schema(example = "success")]
    pub status: String,
    #[schema(format = "date-time")]
    pub created_at: String,
}

impl From<Recharge> for RechargeBody {
    fn from(value: Recharge) -> Self {
        Self {
            id: value.id.to_string(),
            amount: value.amount.value(),
            status: value.status.as_str().to_owned(),
            created_at: value.created_at.to_rfc3339(),
        }
    }
}

/// Result of `POST /recharge`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RechargeResponseBody {
    pub recharge: RechargeBody,
    /// Balance after the credit.
    pub balance: u64,
    pub replayed: bool,
}

impl From<RechargeResponse> for RechargeResponseBody {
    fn from(value: RechargeResponse) -> Self {
        Self {
            recharge: RechargeBody::from(value.receipt.recharge),
            balance: value.receipt.balance.value(),
            replayed: value.replayed,
        }
    }
}

fn parse_amount(raw: i64) -> Result<Coins, Error> {
    u64::try_from(raw).map(Coins::new).map_err(|_| {
        Error::invalid_request(format!("amount must be at least {MIN_RECHARGE}"))
            .with_details(json!({ "field": "amount", "code": "negative_amount" }))
    })
}

/// Add coins to the caller's balance.
#[utoipa::path(
    post,
    path = "/recharge",
    request_body = RechargeRequestBody,
    params(
        ("Idempotency-Key" = Option<String>, Header, format = "uuid",
            description = "Replays the original response when retried")
    ),
    responses(
        (status = 200, description = "Balance credited", body = RechargeResponseBody),
        (status = 400, description = "Amount below the minimum", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 409, description = "Idempotency key reused with another amount", body = ErrorSchema)
    ),
    tags = ["recharges"],
    operation_id = "recharge",
    security(("BearerToken" = []))
)]
#[post("/recharge")]
pub async fn recharge(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    idempotency: IdempotencyHeader,
    payload: web::Json<RechargeRequestBody>,
) -> ApiResult<web::Json<RechargeResponseBody>> {
    let amount = parse_amount(payload.into_inner().amount)?;
    let response = state
        .recharges
        .recharge(RechargeRequest {
            user_id: user.user_id().clone(),
            amount,
            idempotency_key: idempotency.into_inner(),
        })
        .await?;
    Ok(web::Json(RechargeResponseBody::from(response)))
}

/// The caller's recharges, newest first.
#[utoipa::path(
    get,
    path = "/recharge-history",
    responses(
        (status = 200, description = "Recharges", body = [RechargeBody]),
        (status = 401, description = "Unauthorized", body = ErrorSchema)
    ),
    tags = ["recharges"],
    operation_id = "rechargeHistory",
    security(("BearerToken" = []))
)]
#[get("/recharge-history")]
pub async fn recharge_history(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<web::Json<Vec<RechargeBody>>> {
    let history = state.recharge_history.history(user.user_id()).await?;
    Ok(web::Json(history.into_iter().map(RechargeBody::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserRole;
    use crate::inbound::http::idempotency::IDEMPOTENCY_KEY_HEADER;
    use crate::inbound::http::test_utils::{bearer, test_app};
    use crate::test_support::TestStorefront;
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use rstest::rstest;

    #[actix_web::test]
    async fn recharge_credits_and_appears_in_history() {
        let storefront = TestStorefront::new();
        let (user_id, token) = storefront.user_with_token(UserRole::User);
        let app = actix_test::init_service(test_app(&storefront)).await;

        for amount in [100, 250] {
            let res = actix_test::call_service(
                &app,
                actix_test::TestRequest::post()
                    .uri("/recharge")
                    .insert_header(bearer(&token))
                    .set_json(json!({ "amount": amount }))
                    .to_request(),
            )
            .await;
            assert_eq!(res.status(), StatusCode::OK);
            storefront.clock.advance_seconds(60);
        }
        assert_eq!(storefront.store.balance_of(&user_id), Some(Coins::new(1350)));

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/recharge-history")
                .insert_header(bearer(&token))
                .to_request(),
        )
        .await;
        let history: Vec<RechargeBody> = actix_test::read_body_json(res).await;
        let amounts: Vec<u64> = history.iter().map(|entry| entry.amount).collect();
        assert_eq!(amounts, vec![250, 100]);
        assert!(history.iter().all(|entry| entry.status == "success"));
    }

    #[rstest]
    #[case(99)]
    #[case(0)]
    #[case(-500)]
    #[actix_web::test]
    async fn small_or_negative_amounts_are_rejected(#[case] amount: i64) {
        let storefront = TestStorefront::new();
        let (user_id, token) = storefront.user_with_token(UserRole::User);
        let app = actix_test::init_service(test_app(&storefront)).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/recharge")
                .insert_header(bearer(&token))
                .set_json(json!({ "amount": amount }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(storefront.store.balance_of(&user_id), Some(Coins::new(1000)));
    }

    #[actix_web::test]
    async fn retried_recharge_credits_once() {
        let storefront = TestStorefront::new();
        let (user_id, token) = storefront.user_with_token(UserRole::User);
        let app = actix_test::init_service(test_app(&storefront)).await;

        let mut replays = Vec::new();
        for _ in 0..2 {
            let res = actix_test::call_service(
                &app,
                actix_test::TestRequest::post()
                    .uri("/recharge")
                    .insert_header(bearer(&token))
                    .insert_header((IDEMPOTENCY_KEY_HEADER, "0d1b7c52-4f53-4a5e-9a59-0a4d1c0b9e11"))
                    .set_json(json!({ "amount": 300 }))
                    .to_request(),
            )
            .await;
            let body: RechargeResponseBody = actix_test::read_body_json(res).await;
            replays.push(body.replayed);
        }
        assert_eq!(replays, vec![false, true]);
        assert_eq!(storefront.store.balance_of(&user_id), Some(Coins::new(1300)));
    }
}
