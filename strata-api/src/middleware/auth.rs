/// Bearer token authentication
///
/// Validates the `Authorization: Bearer <token>` header against the identity
/// service and inserts the caller's [`AuthContext`] into the request
/// extensions. Handlers read it with `Extension<AuthContext>`.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use strata_shared::auth::context::AuthContext;

use crate::{app::AppState, error::ApiError};

/// Extracts the token from an `Authorization` header value
pub fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

/// JWT authentication middleware layer
pub async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let token = bearer_token(auth_header)
        .ok_or_else(|| ApiError::Unauthorized("Expected Bearer token".to_string()))?;

    let auth: AuthContext = state.services.identity.verify_token(token)?;
    req.extensions_mut().insert(auth);
    Ok(next.run(req).await)
}
