//! Tests for HTTP error mapping.

use super::*;
use crate::domain::Error;
use actix_web::ResponseError;
use actix_web::body::to_bytes;
use actix_web::http::StatusCode;
use rstest::{fixture, rstest};
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn expected_trace_id() -> String {
    TRACE_ID.to_owned()
}

#[fixture]
fn internal_error_case(expected_trace_id: String) -> Error {
    Error::internal("connection string leaked: postgres://admin@db")
        .with_trace_id(expected_trace_id)
        .with_details(json!({"secret": "x"}))
}

#[fixture]
fn insufficient_funds_case(expected_trace_id: String) -> Error {
    Error::insufficient_funds("balance 200 does not cover price 300")
        .with_trace_id(expected_trace_id)
        .with_details(json!({"required": 300, "available": 200}))
}

#[rstest]
#[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
#[case(Error::unauthorized("no auth"), StatusCode::UNAUTHORIZED)]
#[case(Error::forbidden("denied"), StatusCode::FORBIDDEN)]
#[case(Error::not_found("missing"), StatusCode::NOT_FOUND)]
#[case(Error::insufficient_funds("poor"), StatusCode::BAD_REQUEST)]
#[case(Error::conflict("taken"), StatusCode::CONFLICT)]
#[case(Error::service_unavailable("down"), StatusCode::SERVICE_UNAVAILABLE)]
#[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
fn status_code_matches_error_code(#[case] err: Error, #[case] status: StatusCode) {
    assert_eq!(ResponseError::status_code(&err), status);
}

async fn assert_error_response(
    error: Error,
    expected_status: StatusCode,
    expected_trace_id: Option<&str>,
) -> Error {
    let response = ResponseError::error_response(&error);
    assert_eq!(response.status(), expected_status);

    let header = response.headers().get(TRACE_ID_HEADER);
    match expected_trace_id {
        Some(expected) => {
            let trace_id = header
                .expect("trace-id header is set by error_response")
                .to_str()
                .expect("trace-id is valid UTF-8");
            assert_eq!(trace_id, expected);
        }
        None => assert!(header.is_none(), "trace-id header should not be present"),
    }

    let bytes = to_bytes(response.into_body())
        .await
        .expect("reading response body succeeds");

    serde_json::from_slice(&bytes).expect("Error JSON deserialisation succeeds")
}

#[rstest]
#[actix_web::test]
async fn internal_errors_are_redacted_but_keep_trace_id(
    #[from(internal_error_case)] internal_error: Error,
    expected_trace_id: String,
) {
    let redacted = assert_error_response(
        internal_error,
        StatusCode::INTERNAL_SERVER_ERROR,
        Some(expected_trace_id.as_str()),
    )
    .await;
    assert_eq!(redacted.code(), ErrorCode::InternalError);
    assert_eq!(redacted.message(), REDACTED_MESSAGE);
    assert_eq!(redacted.trace_id(), Some(TRACE_ID));
    assert!(redacted.details().is_none());
}

#[rstest]
#[actix_web::test]
async fn insufficient_funds_keeps_its_details(
    #[from(insufficient_funds_case)] error: Error,
    expected_trace_id: String,
) {
    let payload =
        assert_error_response(error, StatusCode::BAD_REQUEST, Some(expected_trace_id.as_str()))
            .await;
    assert_eq!(payload.code(), ErrorCode::InsufficientFunds);
    assert_eq!(
        payload.details(),
        Some(&json!({"required": 300, "available": 200}))
    );
}

#[rstest]
#[actix_web::test]
async fn error_without_trace_id_omits_trace_header() {
    let error = Error::invalid_request("bad").with_details(json!({"field": "name"}));

    let payload = assert_error_response(error, StatusCode::BAD_REQUEST, None).await;
    assert_eq!(payload.code(), ErrorCode::InvalidRequest);
    assert_eq!(payload.trace_id(), None);
    assert_eq!(payload.details(), Some(&json!({"field": "name"})));
}

#[rstest]
fn only_internal_errors_are_redacted() {
    let conflict = Error::conflict("email taken").with_trace_id(TRACE_ID);
    assert_eq!(client_view(&conflict), conflict);

    let internal = Error::internal("boom").with_trace_id(TRACE_ID);
    let view = client_view(&internal);
    assert_eq!(view.message(), REDACTED_MESSAGE);
    assert_eq!(view.trace_id(), Some(TRACE_ID));
}

#[rstest]
fn unavailable_responses_ask_clients_to_retry() {
    let response = ResponseError::error_response(&Error::service_unavailable("pool exhausted"));
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        response
            .headers()
            .get(actix_web::http::header::RETRY_AFTER)
            .and_then(|value| value.to_str().ok()),
        Some("5")
    );
}

#[rstest]
#[case::client(actix_web::error::ErrorBadRequest("boom"), ErrorCode::InvalidRequest)]
#[case::server(actix_web::error::ErrorBadGateway("boom"), ErrorCode::InternalError)]
fn actix_errors_keep_their_class(#[case] actix_err: actix_web::Error, #[case] code: ErrorCode) {
    let err: Error = actix_err.into();
    assert_eq!(err.code(), code);
    assert_eq!(err.details(), None);
}
