use axum::extract::{Path, Query};
use axum::http::{header, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::Json;
use validator::Validate;

use crate::database::manager;
use crate::database::models::Category;
use crate::database::{Pagination, PagingQuery};
use crate::error::{ApiError, ApiResult};
use crate::middleware::{authorize, AuthUser, CommandCode, FunctionCode};
use crate::vm::{to_seo_alias, CategoryCreateRequest, CategoryVm};

/// POST /api/categories
pub async fn post_category(auth: AuthUser, Json(request): Json<CategoryCreateRequest>) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::ContentCategory, CommandCode::Create).await?;
    request.validate()?;
    let pool = manager::pool()?;

    let seo_alias = seo_alias_for(&request);
    let category: Category = sqlx::query_as(
        "INSERT INTO categories (name, seo_alias, seo_description, sort_order, parent_id)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(&request.name)
    .bind(&seo_alias)
    .bind(&request.seo_description)
    .bind(request.sort_order)
    .bind(request.parent_id)
    .fetch_one(pool)
    .await?;

    Ok((
        StatusCode::CREATED,
        AppendHeaders([(header::LOCATION, format!("/api/categories/{}", category.id))]),
        Json(CategoryVm::from(category)),
    )
        .into_response())
}

/// GET /api/categories
pub async fn get_categories(auth: AuthUser) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::ContentCategory, CommandCode::View).await?;
    let pool = manager::pool()?;

    let categories: Vec<Category> =
        sqlx::query_as("SELECT * FROM categories ORDER BY parent_id NULLS FIRST, sort_order, id")
            .fetch_all(pool)
            .await?;
    let vms: Vec<CategoryVm> = categories.into_iter().map(CategoryVm::from).collect();
    Ok(Json(vms).into_response())
}

/// GET /api/categories/filter - paged listing filtered on name and seo alias
pub async fn get_categories_paging(auth: AuthUser, Query(query): Query<PagingQuery>) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::ContentCategory, CommandCode::View).await?;
    let pool = manager::pool()?;
    let pattern = query.pattern();

    let total_records: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE name ILIKE $1 OR seo_alias ILIKE $1")
            .bind(&pattern)
            .fetch_one(pool)
            .await?;

    let categories: Vec<Category> = sqlx::query_as(
        "SELECT * FROM categories WHERE name ILIKE $1 OR seo_alias ILIKE $1
         ORDER BY sort_order, id OFFSET $2 LIMIT $3",
    )
    .bind(&pattern)
    .bind(query.offset())
    .bind(query.size())
    .fetch_all(pool)
    .await?;

    Ok(Json(Pagination {
        items: categories.into_iter().map(CategoryVm::from).collect::<Vec<_>>(),
        total_records,
    })
    .into_response())
}

/// GET /api/categories/:id
pub async fn get_by_id(auth: AuthUser, Path(id): Path<i32>) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::ContentCategory, CommandCode::View).await?;
    let category = find_category(id).await?;
    Ok(Json(CategoryVm::from(category)).into_response())
}

/// PUT /api/categories/:id
pub async fn put_category(
    auth: AuthUser,
    Path(id): Path<i32>,
    Json(request): Json<CategoryCreateRequest>,
) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::ContentCategory, CommandCode::Update).await?;
    request.validate()?;
    let pool = manager::pool()?;
    find_category(id).await?;

    let seo_alias = seo_alias_for(&request);
    sqlx::query(
        "UPDATE categories SET name = $2, seo_alias = $3, seo_description = $4, sort_order = $5, parent_id = $6
         WHERE id = $1",
    )
    .bind(id)
    .bind(&request.name)
    .bind(&seo_alias)
    .bind(&request.seo_description)
    .bind(request.sort_order)
    .bind(request.parent_id)
    .execute(pool)
    .await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// DELETE /api/categories/:id - returns the deleted representation
pub async fn delete_category(auth: AuthUser, Path(id): Path<i32>) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::ContentCategory, CommandCode::Delete).await?;
    let pool = manager::pool()?;
    let category = find_category(id).await?;

    let in_use: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM knowledge_bases WHERE category_id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await?;
    if in_use {
        return Err(ApiError::bad_request("Category still has knowledge base entries"));
    }

    sqlx::query("DELETE FROM categories WHERE id = $1").bind(id).execute(pool).await?;

    Ok(Json(CategoryVm::from(category)).into_response())
}

fn seo_alias_for(request: &CategoryCreateRequest) -> String {
    match request.seo_alias.as_deref().map(str::trim) {
        Some(alias) if !alias.is_empty() => alias.to_string(),
        _ => to_seo_alias(&request.name),
    }
}

async fn find_category(id: i32) -> ApiResult<Category> {
    let pool = manager::pool()?;
    let category: Option<Category> = sqlx::query_as("SELECT * FROM categories WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    category.ok_or_else(|| ApiError::not_found(format!("Category '{}' was not found", id)))
}
