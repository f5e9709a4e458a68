//! Request tracing.
//!
//! Every request runs inside [`TraceId::scope`] and an `http_request` span.
//! A well-formed `trace-id` request header is reused so callers can stitch
//! their own logs to ours; otherwise a fresh id is minted. The id is echoed
//! in the `trace-id` response header and the span records the final status.

use std::task::{Context, Poll};

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{Instrument, Span, field, info_span};

use crate::domain::{TRACE_ID_HEADER, TraceId};

/// Middleware factory; wrap the whole app with it.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use storefront::Trace;
///
/// let app = App::new().wrap(Trace);
/// ```
#[derive(Clone)]
pub struct Trace;

impl<S, B> Transform<S, ServiceRequest> for Trace
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TraceMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TraceMiddleware { service }))
    }
}

pub struct TraceMiddleware<S> {
    service: S,
}

fn incoming_trace_id(req: &ServiceRequest) -> TraceId {
    TraceId::from_header(
        req.headers()
            .get(TRACE_ID_HEADER)
            .and_then(|value| value.to_str().ok()),
    )
}

fn request_span(req: &ServiceRequest, trace_id: TraceId) -> Span {
    info_span!(
        "http_request",
        trace_id = %trace_id,
        method = %req.method(),
        path = %req.path(),
        status = field::Empty,
    )
}

impl<S, B> Service<ServiceRequest> for TraceMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let trace_id = incoming_trace_id(&req);
        let span = request_span(&req, trace_id);
        let fut = span.in_scope(|| self.service.call(req));
        let recorder = span.clone();
        Box::pin(
            TraceId::scope(trace_id, async move {
                let mut res = fut.await?;
                recorder.record("status", res.status().as_u16());
                // A UUID's text form is always a valid header value.
                if let Ok(value) = HeaderValue::from_str(&trace_id.to_string()) {
                    res.headers_mut()
                        .insert(HeaderName::from_static(TRACE_ID_HEADER), value);
                }
                Ok(res)
            })
            .instrument(span),
        )
    }
}
