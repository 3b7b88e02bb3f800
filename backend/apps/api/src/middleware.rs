//! Process-wide middleware
//!
//! - `error_funnel`: logs every failed request with its context and, outside
//!   production, adds debug fields to the error envelope
//! - `per_ip_rate_limit`: global sliding-window limit keyed by client address

use axum::body::{Body, HttpBody, to_bytes};
use axum::extract::{Request, State};
use axum::http::{HeaderValue, header};
use axum::middleware::Next;
use axum::response::Response;
use kernel::{AppEnv, ErrorReport};
use platform::client::ClientInfo;
use platform::rate_limit::{RateLimitStore, RateLimiter};

/// Error bodies are small JSON envelopes; anything larger passes untouched.
const MAX_ENVELOPE_BYTES: usize = 64 * 1024;

pub async fn error_funnel(State(env): State<AppEnv>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let url = req.uri().clone();
    let client = ClientInfo::resolve(req.headers(), req.extensions());

    let response = next.run(req).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let report = response.extensions().get::<ErrorReport>().cloned();
    let message = report.as_ref().map(|r| r.message.as_str()).unwrap_or("-");
    if status.is_server_error() {
        tracing::error!(
            %method,
            %url,
            ip = %client.ip_string(),
            user_agent = client.user_agent_or_unknown(),
            status = status.as_u16(),
            error = message,
            chain = ?report.as_ref().map(|r| &r.chain),
            "Request failed"
        );
    } else {
        tracing::warn!(
            %method,
            %url,
            ip = %client.ip_string(),
            user_agent = client.user_agent_or_unknown(),
            status = status.as_u16(),
            error = message,
            "Request rejected"
        );
    }

    match report {
        Some(report) if !env.is_production() => with_debug_fields(response, &report).await,
        _ => response,
    }
}

/// Add `error` and `stack` to a JSON error envelope.
async fn with_debug_fields(response: Response, report: &ErrorReport) -> Response {
    let fits = response
        .body()
        .size_hint()
        .upper()
        .is_some_and(|len| len <= MAX_ENVELOPE_BYTES as u64);
    if !fits {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, MAX_ENVELOPE_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Error body could not be buffered");
            return Response::from_parts(parts, Body::empty());
        }
    };

    let Ok(mut envelope) = serde_json::from_slice::<serde_json::Value>(&bytes) else {
        return Response::from_parts(parts, Body::from(bytes));
    };
    let Some(fields) = envelope.as_object_mut() else {
        return Response::from_parts(parts, Body::from(bytes));
    };
    fields.insert("error".into(), report.detail().into());
    fields.insert("stack".into(), report.chain.clone().into());

    let body = envelope.to_string();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    Response::from_parts(parts, Body::from(body))
}

pub async fn per_ip_rate_limit<R>(
    State(limiter): State<RateLimiter<R>>,
    req: Request,
    next: Next,
) -> Response
where
    R: RateLimitStore + Send + Sync + 'static,
{
    let client = ClientInfo::resolve(req.headers(), req.extensions());
    let key = format!("ip:{}", client.ip_string());
    let decision = match limiter.admit(&key).await {
        Ok(decision) => decision,
        Err(denied) => return denied,
    };

    let mut response = next.run(req).await;
    decision.write_headers(response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use http_body_util::BodyExt;
    use kernel::AppError;

    fn report() -> ErrorReport {
        ErrorReport::from(&AppError::bad_request("Invalid input").with_detail("name is empty"))
    }

    async fn body_of(response: Response) -> Vec<u8> {
        response.into_body().collect().await.unwrap().to_bytes().to_vec()
    }

    #[tokio::test]
    async fn test_debug_fields_added_to_envelope() {
        let response = AppError::bad_request("Invalid input").into_response();
        let enriched = with_debug_fields(response, &report()).await;
        assert_eq!(enriched.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = serde_json::from_slice(&body_of(enriched).await).unwrap();
        assert_eq!(body["message"], "Invalid input");
        assert_eq!(body["error"], "name is empty");
    }

    #[tokio::test]
    async fn test_oversized_body_passes_through() {
        let big = format!("{{\"message\":\"{}\"}}", "x".repeat(MAX_ENVELOPE_BYTES));
        let response = (StatusCode::BAD_REQUEST, big.clone()).into_response();

        let passed = with_debug_fields(response, &report()).await;
        assert_eq!(passed.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_of(passed).await, big.into_bytes());
    }

    #[tokio::test]
    async fn test_non_json_body_is_kept() {
        let response = (StatusCode::NOT_FOUND, "plain text").into_response();
        let passed = with_debug_fields(response, &report()).await;
        assert_eq!(body_of(passed).await, b"plain text");
    }
}
