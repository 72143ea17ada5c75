use axum::extract::{Path, Query};
use axum::http::{header, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::Json;
use validator::Validate;

use crate::database::manager;
use crate::database::models::{Permission, Role};
use crate::database::{Pagination, PagingQuery};
use crate::error::{ApiError, ApiResult};
use crate::middleware::{authorize, AuthUser, CommandCode, FunctionCode};
use crate::vm::{PermissionVm, RoleCreateRequest, RoleVm, UpdatePermissionRequest};

/// POST /api/roles - duplicate id reported as a field error, never a success
pub async fn post_role(auth: AuthUser, Json(request): Json<RoleCreateRequest>) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::SystemRole, CommandCode::Create).await?;
    request.validate()?;
    let pool = manager::pool()?;

    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM roles WHERE id = $1)")
        .bind(&request.id)
        .fetch_one(pool)
        .await?;
    if exists {
        return Err(ApiError::field_error("id", format!("Role '{}' already exists", request.id)));
    }

    let role: Role = sqlx::query_as("INSERT INTO roles (id, name) VALUES ($1, $2) RETURNING *")
        .bind(&request.id)
        .bind(&request.name)
        .fetch_one(pool)
        .await?;

    Ok((
        StatusCode::CREATED,
        AppendHeaders([(header::LOCATION, format!("/api/roles/{}", role.id))]),
        Json(RoleVm::from(role)),
    )
        .into_response())
}

/// GET /api/roles
pub async fn get_roles(auth: AuthUser) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::SystemRole, CommandCode::View).await?;
    let pool = manager::pool()?;

    let roles: Vec<Role> = sqlx::query_as("SELECT * FROM roles ORDER BY id").fetch_all(pool).await?;
    let vms: Vec<RoleVm> = roles.into_iter().map(RoleVm::from).collect();
    Ok(Json(vms).into_response())
}

/// GET /api/roles/filter - paged listing filtered on id and name
pub async fn get_roles_paging(auth: AuthUser, Query(query): Query<PagingQuery>) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::SystemRole, CommandCode::View).await?;
    let pool = manager::pool()?;
    let pattern = query.pattern();

    let total_records: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM roles WHERE id ILIKE $1 OR name ILIKE $1")
            .bind(&pattern)
            .fetch_one(pool)
            .await?;

    let roles: Vec<Role> = sqlx::query_as(
        "SELECT * FROM roles WHERE id ILIKE $1 OR name ILIKE $1 ORDER BY id OFFSET $2 LIMIT $3",
    )
    .bind(&pattern)
    .bind(query.offset())
    .bind(query.size())
    .fetch_all(pool)
    .await?;

    Ok(Json(Pagination {
        items: roles.into_iter().map(RoleVm::from).collect::<Vec<_>>(),
        total_records,
    })
    .into_response())
}

/// GET /api/roles/:id
pub async fn get_by_id(auth: AuthUser, Path(id): Path<String>) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::SystemRole, CommandCode::View).await?;
    let role = find_role(&id).await?;
    Ok(Json(RoleVm::from(role)).into_response())
}

/// PUT /api/roles/:id
pub async fn put_role(
    auth: AuthUser,
    Path(id): Path<String>,
    Json(request): Json<RoleCreateRequest>,
) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::SystemRole, CommandCode::Update).await?;
    request.validate()?;
    if id != request.id {
        return Err(ApiError::bad_request("Role id in path and body do not match"));
    }
    let pool = manager::pool()?;
    find_role(&id).await?;

    sqlx::query("UPDATE roles SET name = $2 WHERE id = $1")
        .bind(&id)
        .bind(&request.name)
        .execute(pool)
        .await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// DELETE /api/roles/:id - returns the deleted representation
pub async fn delete_role(auth: AuthUser, Path(id): Path<String>) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::SystemRole, CommandCode::Delete).await?;
    let pool = manager::pool()?;
    let role = find_role(&id).await?;

    sqlx::query("DELETE FROM roles WHERE id = $1").bind(&id).execute(pool).await?;

    Ok(Json(RoleVm::from(role)).into_response())
}

/// GET /api/roles/:id/permissions
pub async fn get_permissions_by_role(auth: AuthUser, Path(id): Path<String>) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::SystemPermission, CommandCode::View).await?;
    let pool = manager::pool()?;
    find_role(&id).await?;

    let permissions: Vec<Permission> = sqlx::query_as(
        "SELECT * FROM permissions WHERE role_id = $1 ORDER BY function_id, command_id",
    )
    .bind(&id)
    .fetch_all(pool)
    .await?;

    let vms: Vec<PermissionVm> = permissions.into_iter().map(PermissionVm::from).collect();
    Ok(Json(vms).into_response())
}

/// PUT /api/roles/:id/permissions - replace the role's grants in one
/// transaction
pub async fn put_permissions_by_role(
    auth: AuthUser,
    Path(id): Path<String>,
    Json(request): Json<UpdatePermissionRequest>,
) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::SystemPermission, CommandCode::Update).await?;
    let pool = manager::pool()?;
    find_role(&id).await?;

    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM permissions WHERE role_id = $1")
        .bind(&id)
        .execute(&mut *tx)
        .await?;
    for p in &request.permissions {
        sqlx::query(
            "INSERT INTO permissions (role_id, function_id, command_id)
             VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
        )
        .bind(&id)
        .bind(&p.function_id)
        .bind(&p.command_id)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    tracing::info!(role = %id, count = request.permissions.len(), "permissions replaced");
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn find_role(id: &str) -> ApiResult<Role> {
    let pool = manager::pool()?;
    let role: Option<Role> = sqlx::query_as("SELECT * FROM roles WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    role.ok_or_else(|| ApiError::not_found(format!("Role '{}' was not found", id)))
}
