use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use super::ApiError;
use super::ApiJson;
use super::ApiSuccess;
use super::MessageData;
use crate::identity::ports::PasswordResetPort;
use crate::inbound::http::router::AppState;

/// Identical for known and unknown emails.
pub const RESET_REQUESTED_MESSAGE: &str =
    "If an account exists for this email, a password reset link has been sent";

pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ForgotPasswordRequest>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    state.password_reset.request_reset(&body.email).await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        MessageData::new(RESET_REQUESTED_MESSAGE),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    email: String,
}
