use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use crate::identity::errors::IdentityError;
use crate::identity::models::UserProfile;

pub mod featured;
pub mod forgot_password;
pub mod get_user;
pub mod health;
pub mod list_users;
pub mod login;
pub mod me;
pub mod register;
pub mod reset_password;
pub mod update_profile;
pub mod update_status;
pub mod update_subscription;

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<ApiResponseBody<T>>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(ApiResponseBody::new(status, data)))
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

/// JSON body extractor whose rejections render as the `{status_code, data}` envelope.
#[derive(Debug, Clone, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InternalServerError(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    Gone(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Gone(msg) => (StatusCode::GONE, msg),
        };

        (status, Json(ApiResponseBody::new_error(status, message))).into_response()
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidPrincipalId(_)
            | IdentityError::InvalidEmail(_)
            | IdentityError::InvalidPhone(_)
            | IdentityError::InvalidRole(_)
            | IdentityError::InvalidSubscription(_)
            | IdentityError::Validation(_) => ApiError::BadRequest(err.to_string()),
            IdentityError::Conflict(_) => ApiError::Conflict(err.to_string()),
            IdentityError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
            IdentityError::AccountPending => ApiError::Forbidden(err.to_string()),
            IdentityError::ResetTokenNotFound | IdentityError::UserNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            IdentityError::ResetTokenExpired => ApiError::Gone(err.to_string()),
            IdentityError::StoreTimeout | IdentityError::Store(_) | IdentityError::Internal(_) => {
                tracing::error!(error = %err, "Request failed");
                ApiError::InternalServerError(INTERNAL_ERROR_MESSAGE.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponseBody<T: Serialize + PartialEq> {
    status_code: u16,
    data: T,
}

impl<T: Serialize + PartialEq> ApiResponseBody<T> {
    pub fn new(status_code: StatusCode, data: T) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data,
        }
    }
}

impl ApiResponseBody<ApiErrorData> {
    pub fn new_error(status_code: StatusCode, message: String) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data: ApiErrorData { message },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorData {
    pub message: String,
}

/// Body of responses that carry nothing but a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageData {
    pub message: String,
}

impl MessageData {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Sanitized user as rendered over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub id: String,
    pub email: String,
    pub phone: String,
    pub business_name: String,
    pub role: String,
    pub is_active: bool,
    pub subscription: Option<String>,
    pub wilaya: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&UserProfile> for UserData {
    fn from(user: &UserProfile) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            business_name: user.business_name.clone(),
            role: user.role.as_str().to_string(),
            is_active: user.is_active,
            subscription: user.subscription.map(|tier| tier.as_str().to_string()),
            wilaya: user.wilaya.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// `{message, user}` payload shared by the account handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserMessageData {
    pub message: String,
    pub user: UserData,
}

impl UserMessageData {
    pub fn new(message: impl Into<String>, user: &UserProfile) -> Self {
        Self {
            message: message.into(),
            user: user.into(),
        }
    }
}
