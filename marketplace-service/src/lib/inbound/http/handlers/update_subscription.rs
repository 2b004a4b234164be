use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use super::ApiError;
use super::ApiJson;
use super::ApiSuccess;
use super::UserMessageData;
use crate::identity::models::PrincipalId;
use crate::identity::models::SubscriptionTier;
use crate::identity::ports::AccountPort;
use crate::inbound::http::router::AppState;

pub async fn update_subscription(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    ApiJson(body): ApiJson<UpdateSubscriptionRequest>,
) -> Result<ApiSuccess<UserMessageData>, ApiError> {
    let user_id =
        PrincipalId::from_string(&user_id).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let tier = body
        .subscription
        .parse::<SubscriptionTier>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    state
        .accounts
        .set_subscription(&user_id, tier)
        .await
        .map_err(ApiError::from)
        .map(|ref user| {
            ApiSuccess::new(
                StatusCode::OK,
                UserMessageData::new("Subscription updated", user),
            )
        })
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateSubscriptionRequest {
    subscription: String,
}
