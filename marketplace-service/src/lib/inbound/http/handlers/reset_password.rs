use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use super::ApiError;
use super::ApiJson;
use super::ApiSuccess;
use super::MessageData;
use crate::identity::ports::PasswordResetPort;
use crate::inbound::http::router::AppState;

pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ResetPasswordRequest>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    state
        .password_reset
        .consume_reset(&body.token, &body.new_password)
        .await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        MessageData::new("Password has been reset"),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[serde(default)]
    token: String,
    #[serde(default)]
    new_password: String,
}
