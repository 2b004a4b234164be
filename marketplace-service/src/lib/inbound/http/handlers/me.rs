use axum::http::StatusCode;
use axum::Extension;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::middleware::AuthenticatedPrincipal;

pub async fn me(
    Extension(principal): Extension<AuthenticatedPrincipal>,
) -> Result<ApiSuccess<MeResponseData>, ApiError> {
    Ok(ApiSuccess::new(
        StatusCode::OK,
        MeResponseData {
            principal_id: principal.principal_id.to_string(),
            role: principal.role.as_str().to_string(),
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponseData {
    pub principal_id: String,
    pub role: String,
}
