//! Request Trace Context
//!
//! Every request gets a trace identifier (`{prefix}:{sequence}`, unique per
//! process run). When the caller sends a valid W3C `traceparent`, the request
//! also runs under an activity whose id is a child of that context.
//!
//! Handlers read the result through the [`RequestTrace`] extractor instead of
//! any ambient state.

use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;

use crate::crypto::random_bytes;

/// Incoming W3C trace context header
pub const TRACEPARENT: HeaderName = HeaderName::from_static("traceparent");

/// Response header echoing [`RequestTrace::correlation_id`]
pub const REQUEST_ID: HeaderName = HeaderName::from_static("request-id");

const BASE32_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHIJKLMNOPQRSTUV";

/// Trace context of the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTrace {
    pub trace_identifier: String,
    /// Id of the active activity, present only under a distributed trace
    pub activity_id: Option<String>,
}

impl RequestTrace {
    pub fn new(trace_identifier: impl Into<String>, activity_id: Option<String>) -> Self {
        Self {
            trace_identifier: trace_identifier.into(),
            activity_id,
        }
    }

    /// Identifier shown to users: the activity id when one is active,
    /// the request's trace identifier otherwise
    pub fn correlation_id(&self) -> &str {
        self.activity_id
            .as_deref()
            .unwrap_or(&self.trace_identifier)
    }

    /// Context for a request that never went through [`assign_request_trace`]
    fn detached() -> Self {
        Self::new(uuid::Uuid::new_v4().simple().to_string(), None)
    }
}

impl<S> FromRequestParts<S> for RequestTrace
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestTrace>()
            .cloned()
            .unwrap_or_else(RequestTrace::detached))
    }
}

// ============================================================================
// traceparent
// ============================================================================

/// Parsed `traceparent` header (`version-traceid-parentid-flags`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceParent {
    trace_id: String,
    parent_id: String,
    flags: String,
}

impl TraceParent {
    /// Parse a header value; `None` when it is not a valid trace context
    pub fn parse(value: &str) -> Option<Self> {
        let mut parts = value.trim().split('-');
        let version = parts.next()?;
        let trace_id = parts.next()?;
        let parent_id = parts.next()?;
        let flags = parts.next()?;

        if !is_lower_hex(version, 2) || version == "ff" {
            return None;
        }
        // Version 00 has exactly four fields; later versions may append more
        if version == "00" && parts.next().is_some() {
            return None;
        }
        if !is_lower_hex(trace_id, 32) || trace_id.bytes().all(|b| b == b'0') {
            return None;
        }
        if !is_lower_hex(parent_id, 16) || parent_id.bytes().all(|b| b == b'0') {
            return None;
        }
        if !is_lower_hex(flags, 2) {
            return None;
        }

        Some(Self {
            trace_id: trace_id.to_string(),
            parent_id: parent_id.to_string(),
            flags: flags.to_string(),
        })
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn parent_id(&self) -> &str {
        &self.parent_id
    }

    /// Id of a new child activity: same trace and flags, fresh span id
    pub fn child_activity_id(&self) -> String {
        let span_id = hex::encode(random_bytes(8));
        format!("00-{}-{}-{}", self.trace_id, span_id, self.flags)
    }
}

fn is_lower_hex(value: &str, len: usize) -> bool {
    value.len() == len
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

// ============================================================================
// Trace identifiers
// ============================================================================

/// Produces `{13-char base32 prefix}:{sequence as 8 hex digits}`
#[derive(Debug)]
pub struct TraceIdentifierGenerator {
    prefix: String,
    sequence: AtomicU64,
}

impl TraceIdentifierGenerator {
    /// Random prefix, sequence starting at 1
    pub fn new() -> Self {
        Self::with_prefix(encode_base32(rand::random::<u64>()))
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn next_identifier(&self) -> String {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}:{:08X}", self.prefix, sequence)
    }
}

impl Default for TraceIdentifierGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn encode_base32(value: u64) -> String {
    (0..13)
        .map(|i| {
            let shift = 60 - 5 * i;
            BASE32_ALPHABET[((value >> shift) & 0x1F) as usize] as char
        })
        .collect()
}

// ============================================================================
// Middleware
// ============================================================================

/// Attach a [`RequestTrace`] to the request and a `Request-Id` header to the response
pub async fn assign_request_trace(
    State(generator): State<Arc<TraceIdentifierGenerator>>,
    mut req: Request,
    next: Next,
) -> Response {
    let activity_id = req
        .headers()
        .get(TRACEPARENT)
        .and_then(|value| value.to_str().ok())
        .and_then(TraceParent::parse)
        .map(|parent| parent.child_activity_id());

    let trace = RequestTrace::new(generator.next_identifier(), activity_id);
    tracing::debug!(
        trace_identifier = %trace.trace_identifier,
        activity_id = trace.activity_id.as_deref().unwrap_or("-"),
        "Request trace assigned"
    );

    let request_id = HeaderValue::from_str(trace.correlation_id()).ok();
    req.extensions_mut().insert(trace);

    let mut response = next.run(req).await;
    if let Some(request_id) = request_id {
        response.headers_mut().insert(REQUEST_ID, request_id);
    }
    response
}
