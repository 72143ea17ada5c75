use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::database::models::{Command, Function, Permission, Role, User};

// ---------------------------------------------------------------------------
// Users

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserVm {
    pub id: Uuid,
    pub user_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub dob: NaiveDate,
    pub create_date: DateTime<Utc>,
}

impl From<User> for UserVm {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            user_name: u.user_name,
            email: u.email,
            phone_number: u.phone_number,
            first_name: u.first_name,
            last_name: u.last_name,
            dob: u.dob,
            create_date: u.create_date,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserCreateRequest {
    #[validate(length(min = 1, max = 50, message = "User name is required"))]
    pub user_name: String,
    #[validate(email(message = "Email format is invalid"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 50, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50, message = "Last name is required"))]
    pub last_name: String,
    pub dob: NaiveDate,
    pub phone_number: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdateRequest {
    #[validate(length(min = 1, max = 50, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50, message = "Last name is required"))]
    pub last_name: String,
    pub dob: NaiveDate,
    pub phone_number: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserPasswordChangeRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[validate(length(min = 8, message = "New password must be at least 8 characters"))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserRolesRequest {
    #[validate(length(min = 1, message = "At least one role id is required"))]
    pub role_ids: Vec<String>,
}

// ---------------------------------------------------------------------------
// Roles

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleVm {
    pub id: String,
    pub name: String,
}

impl From<Role> for RoleVm {
    fn from(r: Role) -> Self {
        Self { id: r.id, name: r.name }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RoleCreateRequest {
    #[validate(length(min = 1, max = 50, message = "Id value is required and cannot be over 50 characters"))]
    pub id: String,
    #[validate(length(min = 1, message = "Role name is required"))]
    pub name: String,
}

// ---------------------------------------------------------------------------
// Functions / commands / permissions

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FunctionVm {
    pub id: String,
    pub name: String,
    pub url: String,
    pub sort_order: i32,
    pub parent_id: Option<String>,
    pub icon: Option<String>,
}

impl From<Function> for FunctionVm {
    fn from(f: Function) -> Self {
        Self {
            id: f.id,
            name: f.name,
            url: f.url,
            sort_order: f.sort_order,
            parent_id: f.parent_id,
            icon: f.icon,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FunctionCreateRequest {
    #[validate(length(min = 1, max = 50, message = "Function id is required"))]
    pub id: String,
    #[validate(length(min = 1, max = 200, message = "Function name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 200, message = "Function url is required"))]
    pub url: String,
    pub sort_order: i32,
    pub parent_id: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandVm {
    pub id: String,
    pub name: String,
}

impl From<Command> for CommandVm {
    fn from(c: Command) -> Self {
        Self { id: c.id, name: c.name }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CommandAssignRequest {
    #[validate(length(min = 1, max = 50, message = "Command id is required"))]
    pub command_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionVm {
    pub role_id: String,
    pub function_id: String,
    pub command_id: String,
}

impl From<Permission> for PermissionVm {
    fn from(p: Permission) -> Self {
        Self {
            role_id: p.role_id,
            function_id: p.function_id,
            command_id: p.command_id,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePermissionRequest {
    pub permissions: Vec<PermissionVm>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    #[test]
    fn role_request_rules_match_field_messages() {
        let request = RoleCreateRequest { id: String::new(), name: String::new() };
        let err = request.validate().unwrap_err();
        let api: ApiError = err.into();
        match api {
            ApiError::Validation(errors) => {
                assert!(errors
                    .iter()
                    .any(|e| e.field == "id"
                        && e.message == "Id value is required and cannot be over 50 characters"));
                assert!(errors.iter().any(|e| e.field == "name" && e.message == "Role name is required"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn role_id_over_50_chars_is_rejected() {
        let request = RoleCreateRequest { id: "x".repeat(51), name: "ok".to_string() };
        let err = request.validate().unwrap_err();
        let api: ApiError = err.into();
        match api {
            ApiError::Validation(errors) => {
                assert!(errors
                    .iter()
                    .any(|e| e.message == "Id value is required and cannot be over 50 characters"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn user_create_rejects_bad_email_and_short_password() {
        let request = UserCreateRequest {
            user_name: "alice".to_string(),
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Smith".to_string(),
            dob: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            phone_number: None,
        };
        let err = request.validate().unwrap_err();
        let api: ApiError = err.into();
        match api {
            ApiError::Validation(errors) => {
                assert!(errors.iter().any(|e| e.field == "email"));
                assert!(errors.iter().any(|e| e.field == "password"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn user_vm_serializes_camel_case_without_password() {
        let vm = UserVm {
            id: Uuid::nil(),
            user_name: "alice".to_string(),
            email: "alice@example.com".to_string(),
            phone_number: None,
            first_name: "Alice".to_string(),
            last_name: "Smith".to_string(),
            dob: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            create_date: Utc::now(),
        };
        let json = serde_json::to_value(&vm).unwrap();
        assert!(json.get("userName").is_some());
        assert!(json.get("phoneNumber").is_some());
        assert!(json.get("password").is_none());
        assert!(json.get("passwordHash").is_none());
    }
}
