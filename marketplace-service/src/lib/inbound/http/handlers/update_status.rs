use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use super::ApiError;
use super::ApiJson;
use super::ApiSuccess;
use super::UserMessageData;
use crate::identity::models::PrincipalId;
use crate::identity::ports::AccountPort;
use crate::inbound::http::router::AppState;

pub async fn update_status(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    ApiJson(body): ApiJson<UpdateStatusRequest>,
) -> Result<ApiSuccess<UserMessageData>, ApiError> {
    let user_id =
        PrincipalId::from_string(&user_id).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let message = if body.is_active {
        "User activated"
    } else {
        "User deactivated"
    };

    state
        .accounts
        .set_active(&user_id, body.is_active)
        .await
        .map_err(ApiError::from)
        .map(|ref user| ApiSuccess::new(StatusCode::OK, UserMessageData::new(message, user)))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    is_active: bool,
}
