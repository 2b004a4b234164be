use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use super::ApiError;
use super::ApiJson;
use super::ApiSuccess;
use super::UserMessageData;
use crate::identity::errors::EmailError;
use crate::identity::errors::PhoneError;
use crate::identity::errors::RoleError;
use crate::identity::models::EmailAddress;
use crate::identity::models::PhoneNumber;
use crate::identity::models::RegisterCommand;
use crate::identity::models::Role;
use crate::identity::ports::AuthenticationPort;
use crate::inbound::http::router::AppState;

pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<ApiSuccess<UserMessageData>, ApiError> {
    state
        .authentication
        .register(body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|ref user| {
            ApiSuccess::new(
                StatusCode::CREATED,
                UserMessageData::new("Registration successful, account pending activation", user),
            )
        })
}

/// HTTP request body for registration (raw JSON)
///
/// Missing fields deserialize as empty and are rejected by validation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    phone: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    business_name: String,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    wilaya: Option<String>,
}

#[derive(Debug, Clone, Error)]
enum ParseRegisterRequestError {
    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    #[error("Invalid phone: {0}")]
    Phone(#[from] PhoneError),

    #[error("Invalid role: {0}")]
    Role(#[from] RoleError),
}

impl RegisterRequest {
    fn try_into_command(self) -> Result<RegisterCommand, ParseRegisterRequestError> {
        let email = EmailAddress::new(self.email)?;
        let phone = PhoneNumber::new(self.phone)?;
        let role = Role::for_registration(self.role.as_deref())?;
        Ok(
            RegisterCommand::new(email, phone, self.password, self.business_name, role)
                .with_wilaya(self.wilaya),
        )
    }
}

impl From<ParseRegisterRequestError> for ApiError {
    fn from(err: ParseRegisterRequestError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, phone: &str, role: Option<&str>) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            phone: phone.to_string(),
            password: "x".to_string(),
            business_name: "B".to_string(),
            role: role.map(str::to_string),
            wilaya: Some("Alger".to_string()),
        }
    }

    #[test]
    fn test_defaults_to_pharmacist() {
        let command = request("a@b.com", "1", None).try_into_command().unwrap();

        assert_eq!(command.role, Role::Pharmacist);
        assert_eq!(command.wilaya.as_deref(), Some("Alger"));
    }

    #[test]
    fn test_rejects_admin_role() {
        let result = request("a@b.com", "1", Some("admin")).try_into_command();
        assert!(matches!(result, Err(ParseRegisterRequestError::Role(_))));
    }

    #[test]
    fn test_rejects_missing_phone() {
        let result = request("a@b.com", "", None).try_into_command();
        assert!(matches!(result, Err(ParseRegisterRequestError::Phone(_))));
    }

    #[test]
    fn test_camel_case_body() {
        let body: RegisterRequest = serde_json::from_value(serde_json::json!({
            "email": "a@b.com",
            "phone": "1",
            "password": "x",
            "businessName": "B",
            "role": "fournisseur"
        }))
        .unwrap();

        let command = body.try_into_command().unwrap();
        assert_eq!(command.business_name, "B");
        assert_eq!(command.role, Role::Supplier);
    }
}
