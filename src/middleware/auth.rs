use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::{AuthError, AuthGate};

/// Gate middleware for protected routes.
///
/// On success the `AuthContext` and its `Principal` are inserted into the
/// request extensions and the downstream response is returned untouched.
/// On failure the handler never runs and the 401 is returned directly.
pub async fn require_auth(
    State(gate): State<AuthGate>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let (mut parts, body) = request.into_parts();

    let context = gate.authenticate(&parts.headers).await?;

    parts.extensions.insert(context.principal.clone());
    parts.extensions.insert(context);

    Ok(next.run(Request::from_parts(parts, body)).await)
}
