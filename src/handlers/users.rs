use std::collections::HashSet;

use axum::extract::{Path, Query};
use axum::http::{header, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{hash_password, verify_password};
use crate::database::manager;
use crate::database::models::{Function, Role, User};
use crate::database::{Pagination, PagingQuery};
use crate::error::{ApiError, ApiResult, FieldError};
use crate::middleware::{authorize, AuthUser, CommandCode, FunctionCode};
use crate::vm::{
    FunctionVm, RoleVm, UserCreateRequest, UserPasswordChangeRequest, UserRolesRequest, UserUpdateRequest, UserVm,
};

/// POST /api/users - register a user; unique user name and email
pub async fn post_user(auth: AuthUser, Json(request): Json<UserCreateRequest>) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::SystemUser, CommandCode::Create).await?;
    request.validate()?;
    let pool = manager::pool()?;

    let mut errors = Vec::new();
    let name_taken: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE user_name = $1)")
        .bind(&request.user_name)
        .fetch_one(pool)
        .await?;
    if name_taken {
        errors.push(FieldError::new(
            "userName",
            format!("User name '{}' is already taken", request.user_name),
        ));
    }
    let email_taken: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
        .bind(&request.email)
        .fetch_one(pool)
        .await?;
    if email_taken {
        errors.push(FieldError::new(
            "email",
            format!("Email '{}' is already taken", request.email),
        ));
    }
    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }

    let id = Uuid::new_v4();
    let password_hash = hash_password(&request.password)?;
    let user: User = sqlx::query_as(
        "INSERT INTO users (id, user_name, email, password_hash, first_name, last_name, dob, phone_number)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING *",
    )
    .bind(id)
    .bind(&request.user_name)
    .bind(&request.email)
    .bind(&password_hash)
    .bind(&request.first_name)
    .bind(&request.last_name)
    .bind(request.dob)
    .bind(&request.phone_number)
    .fetch_one(pool)
    .await?;

    tracing::info!(user = %user.user_name, "user created");

    Ok((
        StatusCode::CREATED,
        AppendHeaders([(header::LOCATION, format!("/api/users/{}", id))]),
        Json(UserVm::from(user)),
    )
        .into_response())
}

/// GET /api/users - list all users
pub async fn get_users(auth: AuthUser) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::SystemUser, CommandCode::View).await?;
    let pool = manager::pool()?;

    let users: Vec<User> = sqlx::query_as("SELECT * FROM users ORDER BY user_name")
        .fetch_all(pool)
        .await?;
    let vms: Vec<UserVm> = users.into_iter().map(UserVm::from).collect();
    Ok(Json(vms).into_response())
}

/// GET /api/users/filter - paged listing with a substring filter across
/// user name, email and phone number
pub async fn get_users_paging(auth: AuthUser, Query(query): Query<PagingQuery>) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::SystemUser, CommandCode::View).await?;
    let pool = manager::pool()?;
    let pattern = query.pattern();

    let total_records: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM users
         WHERE user_name ILIKE $1 OR email ILIKE $1 OR COALESCE(phone_number, '') ILIKE $1",
    )
    .bind(&pattern)
    .fetch_one(pool)
    .await?;

    let users: Vec<User> = sqlx::query_as(
        "SELECT * FROM users
         WHERE user_name ILIKE $1 OR email ILIKE $1 OR COALESCE(phone_number, '') ILIKE $1
         ORDER BY user_name OFFSET $2 LIMIT $3",
    )
    .bind(&pattern)
    .bind(query.offset())
    .bind(query.size())
    .fetch_all(pool)
    .await?;

    Ok(Json(Pagination {
        items: users.into_iter().map(UserVm::from).collect::<Vec<_>>(),
        total_records,
    })
    .into_response())
}

/// GET /api/users/:id
pub async fn get_by_id(auth: AuthUser, Path(id): Path<Uuid>) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::SystemUser, CommandCode::View).await?;
    let user = find_user(id).await?;
    Ok(Json(UserVm::from(user)).into_response())
}

/// PUT /api/users/:id - partial profile copy then persist
pub async fn put_user(
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UserUpdateRequest>,
) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::SystemUser, CommandCode::Update).await?;
    request.validate()?;
    let pool = manager::pool()?;
    find_user(id).await?;

    sqlx::query(
        "UPDATE users
         SET first_name = $2, last_name = $3, dob = $4, phone_number = $5, last_modified_date = $6
         WHERE id = $1",
    )
    .bind(id)
    .bind(&request.first_name)
    .bind(&request.last_name)
    .bind(request.dob)
    .bind(&request.phone_number)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// PUT /api/users/:id/change-password
pub async fn put_user_password(
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UserPasswordChangeRequest>,
) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::SystemUser, CommandCode::Update).await?;
    request.validate()?;
    let pool = manager::pool()?;
    let user = find_user(id).await?;

    if !verify_password(&request.current_password, &user.password_hash) {
        return Err(ApiError::field_error("currentPassword", "Current password is incorrect"));
    }

    let password_hash = hash_password(&request.new_password)?;
    sqlx::query("UPDATE users SET password_hash = $2, last_modified_date = $3 WHERE id = $1")
        .bind(id)
        .bind(&password_hash)
        .bind(Utc::now())
        .execute(pool)
        .await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// DELETE /api/users/:id - returns the deleted representation
pub async fn delete_user(auth: AuthUser, Path(id): Path<Uuid>) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::SystemUser, CommandCode::Delete).await?;
    let pool = manager::pool()?;
    let user = find_user(id).await?;

    sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(pool).await?;

    tracing::info!(user = %user.user_name, "user deleted");
    Ok(Json(UserVm::from(user)).into_response())
}

/// GET /api/users/:id/menu - functions the user's roles hold VIEW rights on,
/// ordered by (parent_id, sort_order), duplicates collapsed
pub async fn get_menu_by_user_permission(_auth: AuthUser, Path(id): Path<Uuid>) -> ApiResult<Response> {
    let pool = manager::pool()?;
    find_user(id).await?;

    let rows: Vec<Function> = sqlx::query_as(
        "SELECT f.id, f.name, f.url, f.sort_order, f.parent_id, f.icon
         FROM functions f
         JOIN permissions p ON p.function_id = f.id
         JOIN user_roles ur ON ur.role_id = p.role_id
         WHERE ur.user_id = $1 AND p.command_id = 'VIEW'",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let menu = collapse_menu(rows.into_iter().map(FunctionVm::from).collect());
    Ok(Json(menu).into_response())
}

/// GET /api/users/:id/roles
pub async fn get_user_roles(auth: AuthUser, Path(id): Path<Uuid>) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::SystemUser, CommandCode::View).await?;
    let pool = manager::pool()?;
    find_user(id).await?;

    let roles: Vec<Role> = sqlx::query_as(
        "SELECT r.id, r.name FROM roles r
         JOIN user_roles ur ON ur.role_id = r.id
         WHERE ur.user_id = $1 ORDER BY r.id",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let vms: Vec<RoleVm> = roles.into_iter().map(RoleVm::from).collect();
    Ok(Json(vms).into_response())
}

/// POST /api/users/:id/roles - assign roles to the user
pub async fn post_user_roles(
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UserRolesRequest>,
) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::SystemUser, CommandCode::Update).await?;
    request.validate()?;
    let pool = manager::pool()?;
    find_user(id).await?;

    for role_id in &request.role_ids {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM roles WHERE id = $1)")
            .bind(role_id)
            .fetch_one(pool)
            .await?;
        if !exists {
            return Err(ApiError::field_error("roleIds", format!("Role '{}' does not exist", role_id)));
        }
        sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(id)
            .bind(role_id)
            .execute(pool)
            .await?;
    }

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// DELETE /api/users/:id/roles - remove roles from the user
pub async fn delete_user_roles(
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UserRolesRequest>,
) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::SystemUser, CommandCode::Update).await?;
    request.validate()?;
    let pool = manager::pool()?;
    find_user(id).await?;

    sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role_id = ANY($2)")
        .bind(id)
        .bind(&request.role_ids)
        .execute(pool)
        .await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn find_user(id: Uuid) -> ApiResult<User> {
    let pool = manager::pool()?;
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    user.ok_or_else(|| ApiError::not_found(format!("User '{}' was not found", id)))
}

/// Canonical menu order with duplicates (from overlapping role grants)
/// collapsed by function id.
fn collapse_menu(mut items: Vec<FunctionVm>) -> Vec<FunctionVm> {
    items.sort_by(|a, b| {
        a.parent_id
            .cmp(&b.parent_id)
            .then_with(|| a.sort_order.cmp(&b.sort_order))
            .then_with(|| a.id.cmp(&b.id))
    });
    let mut seen = HashSet::new();
    items.retain(|f| seen.insert(f.id.clone()));
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn function(id: &str, parent: Option<&str>, sort_order: i32) -> FunctionVm {
        FunctionVm {
            id: id.to_string(),
            name: id.to_string(),
            url: format!("/{}", id.to_lowercase()),
            sort_order,
            parent_id: parent.map(str::to_string),
            icon: None,
        }
    }

    #[test]
    fn menu_is_sorted_by_parent_then_sort_order() {
        let menu = collapse_menu(vec![
            function("SYSTEM_ROLE", Some("SYSTEM"), 2),
            function("SYSTEM", None, 4),
            function("DASHBOARD", None, 1),
            function("SYSTEM_USER", Some("SYSTEM"), 1),
            function("CONTENT_CATEGORY", Some("CONTENT"), 1),
        ]);
        let ids: Vec<&str> = menu.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["DASHBOARD", "SYSTEM", "CONTENT_CATEGORY", "SYSTEM_USER", "SYSTEM_ROLE"]
        );
    }

    #[test]
    fn menu_collapses_duplicates_from_overlapping_roles() {
        let menu = collapse_menu(vec![
            function("DASHBOARD", None, 1),
            function("DASHBOARD", None, 1),
            function("SYSTEM_USER", Some("SYSTEM"), 1),
            function("DASHBOARD", None, 1),
        ]);
        assert_eq!(menu.len(), 2);
        assert_eq!(menu[0].id, "DASHBOARD");
        assert_eq!(menu[1].id, "SYSTEM_USER");
    }

    #[test]
    fn empty_menu_stays_empty() {
        assert!(collapse_menu(vec![]).is_empty());
    }
}
