//! Correlation id for one HTTP request.
//!
//! The [`crate::middleware::Trace`] middleware puts an id in Tokio task-local
//! storage for the lifetime of the request; [`crate::domain::Error`] picks it
//! up on construction. Spawned tasks start without one.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use tokio::task_local;
use uuid::Uuid;

/// Header used both to accept an upstream id and to echo the active one.
pub const TRACE_ID_HEADER: &str = "trace-id";

task_local! {
    static CURRENT: TraceId;
}

/// UUID identifying a request across logs, error bodies and response headers.
///
/// # Examples
/// ```
/// use storefront::domain::TraceId;
///
/// let upstream = TraceId::from_header(Some("0f0e8c1a-6a45-4d7e-9b89-3f1c2f6f1b11"));
/// assert_eq!(upstream.to_string(), "0f0e8c1a-6a45-4d7e-9b89-3f1c2f6f1b11");
///
/// let fresh = TraceId::from_header(Some("not-a-uuid"));
/// assert_ne!(fresh, upstream);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(Uuid);

impl TraceId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Reuse a well-formed upstream id, otherwise mint a new one.
    #[must_use]
    pub fn from_header(raw: Option<&str>) -> Self {
        raw.and_then(|value| value.trim().parse().ok())
            .unwrap_or_else(Self::generate)
    }

    /// The id of the request being handled, if any.
    #[must_use]
    pub fn current() -> Option<Self> {
        CURRENT.try_with(|id| *id).ok()
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Run `fut` with `trace_id` as the current id.
    pub async fn scope<Fut: Future>(trace_id: TraceId, fut: Fut) -> Fut::Output {
        CURRENT.scope(trace_id, fut).await
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}
