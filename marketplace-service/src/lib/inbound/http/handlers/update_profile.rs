use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use serde::Deserialize;

use super::ApiError;
use super::ApiJson;
use super::ApiSuccess;
use super::UserMessageData;
use crate::identity::models::PrincipalId;
use crate::identity::models::ProfileUpdate;
use crate::identity::models::Role;
use crate::identity::ports::AccountPort;
use crate::inbound::http::middleware::AuthenticatedPrincipal;
use crate::inbound::http::router::AppState;

/// Owners edit their own profile; admins edit any.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthenticatedPrincipal>,
    Path(user_id): Path<String>,
    ApiJson(body): ApiJson<UpdateProfileRequest>,
) -> Result<ApiSuccess<UserMessageData>, ApiError> {
    let user_id =
        PrincipalId::from_string(&user_id).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    if !may_edit(&principal, &user_id) {
        return Err(ApiError::Forbidden(
            "Not allowed to modify this account".to_string(),
        ));
    }

    state
        .accounts
        .update_profile(&user_id, body.into())
        .await
        .map_err(ApiError::from)
        .map(|ref user| {
            ApiSuccess::new(StatusCode::OK, UserMessageData::new("Profile updated", user))
        })
}

fn may_edit(principal: &AuthenticatedPrincipal, user_id: &PrincipalId) -> bool {
    principal.role == Role::Admin || principal.principal_id == *user_id
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default)]
    business_name: Option<String>,
    #[serde(default)]
    wilaya: Option<String>,
}

impl From<UpdateProfileRequest> for ProfileUpdate {
    fn from(body: UpdateProfileRequest) -> Self {
        ProfileUpdate::new(body.business_name, body.wilaya)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_owner_or_admin_may_edit() {
        let owner = PrincipalId::new();
        let principal = |principal_id, role| AuthenticatedPrincipal { principal_id, role };

        assert!(may_edit(&principal(owner, Role::Pharmacist), &owner));
        assert!(may_edit(&principal(PrincipalId::new(), Role::Admin), &owner));
        assert!(!may_edit(&principal(PrincipalId::new(), Role::Supplier), &owner));
    }

    #[test]
    fn test_body_ignores_unknown_fields() {
        let body: UpdateProfileRequest = serde_json::from_value(serde_json::json!({
            "businessName": "Pharmacie du Port",
            "role": "admin",
            "isActive": true
        }))
        .unwrap();

        assert_eq!(
            ProfileUpdate::from(body),
            ProfileUpdate::new(Some("Pharmacie du Port".to_string()), None)
        );
    }
}
