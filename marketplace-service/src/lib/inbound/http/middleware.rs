use axum::extract::Request;
use axum::extract::State;
use axum::http::{self};
use axum::middleware::Next;
use axum::response::Response;

use super::handlers::ApiError;
use crate::identity::models::PrincipalId;
use crate::identity::models::Role;
use crate::inbound::http::router::AppState;

/// Principal attached to request extensions once its token is validated
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedPrincipal {
    pub principal_id: PrincipalId,
    pub role: Role,
}

/// Middleware that validates the bearer token and attaches the principal.
///
/// Any failure (missing header, bad signature, expiry, unparseable claims)
/// is a 401.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&req)?;

    let claims = state.authenticator.validate_token(token).map_err(|e| {
        tracing::warn!(error = %e, "Token validation failed");
        ApiError::Unauthorized("Invalid or expired token".to_string())
    })?;

    let principal_id = PrincipalId::from_string(&claims.sub).map_err(|e| {
        tracing::warn!(error = %e, "Token subject is not a principal ID");
        ApiError::Unauthorized("Invalid token format".to_string())
    })?;

    let role = claims.role.parse::<Role>().map_err(|e| {
        tracing::warn!(error = %e, "Token carries an unknown role");
        ApiError::Unauthorized("Invalid token format".to_string())
    })?;

    req.extensions_mut()
        .insert(AuthenticatedPrincipal { principal_id, role });

    Ok(next.run(req).await)
}

/// Gate composed after `authenticate`; admin satisfies every requirement.
pub async fn require_role(
    State(required): State<Role>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = req
        .extensions()
        .get::<AuthenticatedPrincipal>()
        .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

    if !principal.role.satisfies(required) {
        tracing::info!(
            principal_id = %principal.principal_id,
            role = %principal.role,
            required = %required,
            "Role requirement not met"
        );
        return Err(ApiError::Forbidden("Insufficient role".to_string()));
    }

    Ok(next.run(req).await)
}

fn extract_bearer_token(req: &Request) -> Result<&str, ApiError> {
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Invalid Authorization header".to_string()))?;

    auth_str
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            ApiError::Unauthorized(
                "Invalid Authorization header format. Expected: Bearer <token>".to_string(),
            )
        })
}

#[cfg(test)]
mod tests {
    use axum::body::Body;

    use super::*;

    fn request_with_header(value: Option<&str>) -> Request {
        let mut builder = http::Request::builder().uri("/auth/me");
        if let Some(value) = value {
            builder = builder.header(http::header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_extracts_bearer_token() {
        let req = request_with_header(Some("Bearer abc.def.ghi"));
        assert_eq!(extract_bearer_token(&req).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_missing_header_is_unauthorized() {
        let req = request_with_header(None);
        assert!(matches!(
            extract_bearer_token(&req),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_wrong_scheme_is_unauthorized() {
        for value in ["Basic dXNlcjpwYXNz", "Bearer ", "abc.def.ghi"] {
            let req = request_with_header(Some(value));
            assert!(matches!(
                extract_bearer_token(&req),
                Err(ApiError::Unauthorized(_))
            ));
        }
    }
}
