use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiJson;
use super::ApiSuccess;
use super::UserData;
use crate::identity::models::Role;
use crate::identity::models::Session;
use crate::identity::models::SessionSubject;
use crate::identity::ports::AuthenticationPort;
use crate::inbound::http::router::AppState;

pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<ApiSuccess<LoginResponseData>, ApiError> {
    state
        .authentication
        .login(&body.identifier, &body.password)
        .await
        .map_err(ApiError::from)
        .map(|session| ApiSuccess::new(StatusCode::OK, session.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequest {
    /// Email, phone or the admin identifier
    #[serde(default)]
    identifier: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginResponseData {
    pub message: String,
    pub user: SessionUserData,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SessionUserData {
    Admin { id: String, role: String },
    User(UserData),
}

impl From<Session> for LoginResponseData {
    fn from(session: Session) -> Self {
        let user = match &session.subject {
            SessionSubject::Admin { id } => SessionUserData::Admin {
                id: id.to_string(),
                role: Role::Admin.as_str().to_string(),
            },
            SessionSubject::User(profile) => SessionUserData::User(profile.into()),
        };

        Self {
            message: "Login successful".to_string(),
            user,
            token: session.token,
        }
    }
}
