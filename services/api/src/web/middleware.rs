//! services/api/src/web/middleware.rs
//!
//! Identity middleware for API routes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use enrollment_core::{PortError, RequestContext};
use std::sync::Arc;
use tracing::{debug, error};

use crate::error::ApiError;
use crate::web::state::AppState;

/// Middleware that resolves the `Authorization: Bearer` credential into a
/// [`RequestContext`] and inserts it into request extensions.
///
/// A missing or rejected credential yields an anonymous context; operations
/// that need an identity report `Unauthorized` themselves. A verifier outage
/// fails the request.
pub async fn resolve_identity(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_owned);

    let ctx = match token {
        None => RequestContext::anonymous(),
        Some(token) => match state.verifier.verify_bearer(&token).await {
            Ok(identity) => RequestContext::authenticated(identity),
            Err(PortError::Unauthorized) => {
                debug!("Rejected bearer credential");
                RequestContext::anonymous()
            }
            Err(e) => {
                error!("Failed to verify bearer credential: {:?}", e);
                return Err(e.into());
            }
        },
    };

    req.extensions_mut().insert(ctx);
    Ok(next.run(req).await)
}

/// Extracts the token from an `Authorization` header value.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
