use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::UserData;
use crate::identity::models::Role;
use crate::identity::models::SubscriptionTier;
use crate::identity::models::UserFilter;
use crate::identity::ports::AccountPort;
use crate::inbound::http::router::AppState;

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<ApiSuccess<Vec<UserData>>, ApiError> {
    let filter = query.try_into_filter()?;

    state
        .accounts
        .list_users(filter)
        .await
        .map_err(ApiError::from)
        .map(|users| ApiSuccess::new(StatusCode::OK, users.iter().map(UserData::from).collect()))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListUsersQuery {
    role: Option<String>,
    /// `active` or `inactive`
    status: Option<String>,
    subscription: Option<String>,
}

impl ListUsersQuery {
    fn try_into_filter(self) -> Result<UserFilter, ApiError> {
        let role = self
            .role
            .filter(|role| !role.is_empty())
            .map(|role| role.parse::<Role>())
            .transpose()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;

        let is_active = match self.status.as_deref() {
            None | Some("") => None,
            Some("active") => Some(true),
            Some("inactive") => Some(false),
            Some(other) => {
                return Err(ApiError::BadRequest(format!("Unknown status: {}", other)));
            }
        };

        let subscription = self
            .subscription
            .filter(|tier| !tier.is_empty())
            .map(|tier| tier.parse::<SubscriptionTier>())
            .transpose()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;

        Ok(UserFilter {
            role,
            is_active,
            subscription,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_into_filter() {
        let filter = ListUsersQuery {
            role: Some("fournisseur".to_string()),
            status: Some("inactive".to_string()),
            subscription: Some("or".to_string()),
        }
        .try_into_filter()
        .unwrap();

        assert_eq!(
            filter,
            UserFilter {
                role: Some(Role::Supplier),
                is_active: Some(false),
                subscription: Some(SubscriptionTier::Gold),
            }
        );
        assert_eq!(
            ListUsersQuery::default().try_into_filter().unwrap(),
            UserFilter::default()
        );
    }

    #[test]
    fn test_query_rejects_unknown_values() {
        let bad_status = ListUsersQuery {
            status: Some("banned".to_string()),
            ..ListUsersQuery::default()
        };
        let bad_role = ListUsersQuery {
            role: Some("client".to_string()),
            ..ListUsersQuery::default()
        };
        let bad_tier = ListUsersQuery {
            subscription: Some("platinum".to_string()),
            ..ListUsersQuery::default()
        };

        assert!(matches!(bad_status.try_into_filter(), Err(ApiError::BadRequest(_))));
        assert!(matches!(bad_role.try_into_filter(), Err(ApiError::BadRequest(_))));
        assert!(matches!(bad_tier.try_into_filter(), Err(ApiError::BadRequest(_))));
    }
}
