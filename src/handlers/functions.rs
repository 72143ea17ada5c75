use axum::extract::{Path, Query};
use axum::http::{header, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::Json;
use validator::Validate;

use crate::database::manager;
use crate::database::models::{Command, Function};
use crate::database::{Pagination, PagingQuery};
use crate::error::{ApiError, ApiResult};
use crate::middleware::{authorize, AuthUser, CommandCode, FunctionCode};
use crate::vm::{CommandAssignRequest, CommandVm, FunctionCreateRequest, FunctionVm};

/// POST /api/functions - id is client supplied, duplicates rejected
pub async fn post_function(auth: AuthUser, Json(request): Json<FunctionCreateRequest>) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::SystemFunction, CommandCode::Create).await?;
    request.validate()?;
    let pool = manager::pool()?;

    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM functions WHERE id = $1)")
        .bind(&request.id)
        .fetch_one(pool)
        .await?;
    if exists {
        return Err(ApiError::field_error("id", format!("Function '{}' already exists", request.id)));
    }

    let function: Function = sqlx::query_as(
        "INSERT INTO functions (id, name, url, sort_order, parent_id, icon)
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(&request.id)
    .bind(&request.name)
    .bind(&request.url)
    .bind(request.sort_order)
    .bind(&request.parent_id)
    .bind(&request.icon)
    .fetch_one(pool)
    .await?;

    Ok((
        StatusCode::CREATED,
        AppendHeaders([(header::LOCATION, format!("/api/functions/{}", function.id))]),
        Json(FunctionVm::from(function)),
    )
        .into_response())
}

/// GET /api/functions - whole tree in navigation order
pub async fn get_functions(auth: AuthUser) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::SystemFunction, CommandCode::View).await?;
    let pool = manager::pool()?;

    let functions: Vec<Function> =
        sqlx::query_as("SELECT * FROM functions ORDER BY parent_id NULLS FIRST, sort_order, id")
            .fetch_all(pool)
            .await?;
    let vms: Vec<FunctionVm> = functions.into_iter().map(FunctionVm::from).collect();
    Ok(Json(vms).into_response())
}

/// GET /api/functions/filter - paged listing filtered on id, name and url
pub async fn get_functions_paging(auth: AuthUser, Query(query): Query<PagingQuery>) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::SystemFunction, CommandCode::View).await?;
    let pool = manager::pool()?;
    let pattern = query.pattern();

    let total_records: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM functions WHERE id ILIKE $1 OR name ILIKE $1 OR url ILIKE $1",
    )
    .bind(&pattern)
    .fetch_one(pool)
    .await?;

    let functions: Vec<Function> = sqlx::query_as(
        "SELECT * FROM functions WHERE id ILIKE $1 OR name ILIKE $1 OR url ILIKE $1
         ORDER BY parent_id NULLS FIRST, sort_order, id OFFSET $2 LIMIT $3",
    )
    .bind(&pattern)
    .bind(query.offset())
    .bind(query.size())
    .fetch_all(pool)
    .await?;

    Ok(Json(Pagination {
        items: functions.into_iter().map(FunctionVm::from).collect::<Vec<_>>(),
        total_records,
    })
    .into_response())
}

/// GET /api/functions/:id
pub async fn get_by_id(auth: AuthUser, Path(id): Path<String>) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::SystemFunction, CommandCode::View).await?;
    let function = find_function(&id).await?;
    Ok(Json(FunctionVm::from(function)).into_response())
}

/// PUT /api/functions/:id
pub async fn put_function(
    auth: AuthUser,
    Path(id): Path<String>,
    Json(request): Json<FunctionCreateRequest>,
) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::SystemFunction, CommandCode::Update).await?;
    request.validate()?;
    let pool = manager::pool()?;
    find_function(&id).await?;

    sqlx::query(
        "UPDATE functions SET name = $2, url = $3, sort_order = $4, parent_id = $5, icon = $6 WHERE id = $1",
    )
    .bind(&id)
    .bind(&request.name)
    .bind(&request.url)
    .bind(request.sort_order)
    .bind(&request.parent_id)
    .bind(&request.icon)
    .execute(pool)
    .await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// DELETE /api/functions/:id - returns the deleted representation
pub async fn delete_function(auth: AuthUser, Path(id): Path<String>) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::SystemFunction, CommandCode::Delete).await?;
    let pool = manager::pool()?;
    let function = find_function(&id).await?;

    sqlx::query("DELETE FROM functions WHERE id = $1").bind(&id).execute(pool).await?;

    Ok(Json(FunctionVm::from(function)).into_response())
}

/// GET /api/commands - all action verbs
pub async fn get_commands(auth: AuthUser) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::SystemFunction, CommandCode::View).await?;
    let pool = manager::pool()?;

    let commands: Vec<Command> = sqlx::query_as("SELECT * FROM commands ORDER BY id").fetch_all(pool).await?;
    let vms: Vec<CommandVm> = commands.into_iter().map(CommandVm::from).collect();
    Ok(Json(vms).into_response())
}

/// GET /api/functions/:id/commands - commands attached to the function
pub async fn get_commands_in_function(auth: AuthUser, Path(id): Path<String>) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::SystemFunction, CommandCode::View).await?;
    let pool = manager::pool()?;
    find_function(&id).await?;

    let commands: Vec<Command> = sqlx::query_as(
        "SELECT c.id, c.name FROM commands c
         JOIN command_in_functions cif ON cif.command_id = c.id
         WHERE cif.function_id = $1 ORDER BY c.id",
    )
    .bind(&id)
    .fetch_all(pool)
    .await?;

    let vms: Vec<CommandVm> = commands.into_iter().map(CommandVm::from).collect();
    Ok(Json(vms).into_response())
}

/// POST /api/functions/:id/commands - attach a command to the function
pub async fn post_command_to_function(
    auth: AuthUser,
    Path(id): Path<String>,
    Json(request): Json<CommandAssignRequest>,
) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::SystemFunction, CommandCode::Update).await?;
    request.validate()?;
    let pool = manager::pool()?;
    find_function(&id).await?;

    let command_exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM commands WHERE id = $1)")
        .bind(&request.command_id)
        .fetch_one(pool)
        .await?;
    if !command_exists {
        return Err(ApiError::not_found(format!("Command '{}' was not found", request.command_id)));
    }

    let already: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM command_in_functions WHERE function_id = $1 AND command_id = $2)",
    )
    .bind(&id)
    .bind(&request.command_id)
    .fetch_one(pool)
    .await?;
    if already {
        return Err(ApiError::bad_request("This command has already been added to the function"));
    }

    sqlx::query("INSERT INTO command_in_functions (command_id, function_id) VALUES ($1, $2)")
        .bind(&request.command_id)
        .bind(&id)
        .execute(pool)
        .await?;

    Ok(StatusCode::CREATED.into_response())
}

/// DELETE /api/functions/:id/commands/:commandId
pub async fn delete_command_in_function(
    auth: AuthUser,
    Path((id, command_id)): Path<(String, String)>,
) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::SystemFunction, CommandCode::Update).await?;
    let pool = manager::pool()?;

    let result = sqlx::query("DELETE FROM command_in_functions WHERE function_id = $1 AND command_id = $2")
        .bind(&id)
        .bind(&command_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found(format!(
            "Command '{}' is not attached to function '{}'",
            command_id, id
        )));
    }

    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn find_function(id: &str) -> ApiResult<Function> {
    let pool = manager::pool()?;
    let function: Option<Function> = sqlx::query_as("SELECT * FROM functions WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    function.ok_or_else(|| ApiError::not_found(format!("Function '{}' was not found", id)))
}
