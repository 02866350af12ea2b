use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::error::ApiError;

/// Bearer authentication for mutating routes.
///
/// Resolves the token to a stored credential and injects the `Principal` into
/// the request. Missing, malformed, expired or orphaned tokens stop here with 401.
pub async fn require_principal(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(&headers).map_err(ApiError::unauthorized)?;

    let principal = state.authenticator.resolve_token(&token).await?;
    tracing::debug!("Authenticated request as '{}'", principal.username);

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Extract the bearer token from the Authorization header
fn extract_bearer(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| "Not authenticated".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    let (scheme, token) = auth_str
        .split_once(' ')
        .ok_or_else(|| "Authorization header must use Bearer token format".to_string())?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err("Authorization header must use Bearer token format".to_string());
    }
    if token.trim().is_empty() {
        return Err("Empty bearer token".to_string());
    }
    Ok(token.trim().to_string())
}
