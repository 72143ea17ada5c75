use axum::extract::{Path, Query};
use axum::http::{header, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use validator::Validate;

use crate::config;
use crate::database::manager;
use crate::database::models::KnowledgeBase;
use crate::database::{Pagination, PagingQuery};
use crate::error::{ApiError, ApiResult};
use crate::handlers::activity_logs::log_activity;
use crate::middleware::{authorize, AuthUser, CommandCode, FunctionCode};
use crate::vm::{
    to_seo_alias, KnowledgeBaseCreateRequest, KnowledgeBaseQuickVm, KnowledgeBaseUpdateRequest, KnowledgeBaseVm,
};

// Flat field list on purpose: Query deserializes via serde_urlencoded,
// which cannot flatten a nested struct with numeric fields.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBasePagingQuery {
    pub filter: Option<String>,
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub category_id: Option<i32>,
}

impl KnowledgeBasePagingQuery {
    fn paging(&self) -> PagingQuery {
        PagingQuery {
            filter: self.filter.clone(),
            page: self.page,
            size: self.size,
        }
    }
}

/// POST /api/knowledge-bases - owner is the caller; counters start at zero;
/// attachment metadata rows are created alongside
pub async fn post_knowledge_base(
    auth: AuthUser,
    Json(request): Json<KnowledgeBaseCreateRequest>,
) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::ContentKnowledgeBase, CommandCode::Create).await?;
    request.validate()?;
    let pool = manager::pool()?;

    let category_exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM categories WHERE id = $1)")
        .bind(request.category_id)
        .fetch_one(pool)
        .await?;
    if !category_exists {
        return Err(ApiError::field_error(
            "categoryId",
            format!("Category '{}' does not exist", request.category_id),
        ));
    }

    let seo_alias = match request.seo_alias.as_deref().map(str::trim) {
        Some(alias) if !alias.is_empty() => alias.to_string(),
        _ => to_seo_alias(&request.title),
    };

    let kb: KnowledgeBase = sqlx::query_as(
        "INSERT INTO knowledge_bases
            (category_id, owner_user_id, title, seo_alias, description, environment, problem,
             step_to_reproduce, error_message, workaround, note, labels,
             number_of_comments, number_of_votes, number_of_reports)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 0, 0, 0)
         RETURNING *",
    )
    .bind(request.category_id)
    .bind(auth.id)
    .bind(&request.title)
    .bind(&seo_alias)
    .bind(&request.description)
    .bind(&request.environment)
    .bind(&request.problem)
    .bind(&request.step_to_reproduce)
    .bind(&request.error_message)
    .bind(&request.workaround)
    .bind(&request.note)
    .bind(&request.labels)
    .fetch_one(pool)
    .await?;

    for attachment in &request.attachments {
        sqlx::query(
            "INSERT INTO attachments (file_name, file_path, file_type, file_size, knowledge_base_id)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&attachment.file_name)
        .bind(&attachment.file_path)
        .bind(&attachment.file_type)
        .bind(attachment.file_size)
        .bind(kb.id)
        .execute(pool)
        .await?;
    }

    sqlx::query(
        "UPDATE users SET number_of_knowledge_bases = COALESCE(number_of_knowledge_bases, 0) + 1 WHERE id = $1",
    )
    .bind(auth.id)
    .execute(pool)
    .await?;

    log_activity("Create", "KnowledgeBase", kb.id, auth.id, Some(&kb.title)).await;

    Ok((
        StatusCode::CREATED,
        AppendHeaders([(header::LOCATION, format!("/api/knowledge-bases/{}", kb.id))]),
        Json(KnowledgeBaseVm::from(kb)),
    )
        .into_response())
}

/// GET /api/knowledge-bases - newest first, slim projection
pub async fn get_knowledge_bases(auth: AuthUser) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::ContentKnowledgeBase, CommandCode::View).await?;
    let pool = manager::pool()?;

    let kbs: Vec<KnowledgeBase> =
        sqlx::query_as("SELECT * FROM knowledge_bases ORDER BY create_date DESC, id DESC")
            .fetch_all(pool)
            .await?;
    let vms: Vec<KnowledgeBaseQuickVm> = kbs.into_iter().map(KnowledgeBaseQuickVm::from).collect();
    Ok(Json(vms).into_response())
}

/// GET /api/knowledge-bases/filter - substring filter on title, optional
/// category constraint
pub async fn get_knowledge_bases_paging(
    auth: AuthUser,
    Query(query): Query<KnowledgeBasePagingQuery>,
) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::ContentKnowledgeBase, CommandCode::View).await?;
    let pool = manager::pool()?;
    let pattern = query.paging().pattern();

    let total_records: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM knowledge_bases
         WHERE title ILIKE $1 AND ($2::int4 IS NULL OR category_id = $2)",
    )
    .bind(&pattern)
    .bind(query.category_id)
    .fetch_one(pool)
    .await?;

    let kbs: Vec<KnowledgeBase> = sqlx::query_as(
        "SELECT * FROM knowledge_bases
         WHERE title ILIKE $1 AND ($2::int4 IS NULL OR category_id = $2)
         ORDER BY create_date DESC, id DESC OFFSET $3 LIMIT $4",
    )
    .bind(&pattern)
    .bind(query.category_id)
    .bind(query.paging().offset())
    .bind(query.paging().size())
    .fetch_all(pool)
    .await?;

    Ok(Json(Pagination {
        items: kbs.into_iter().map(KnowledgeBaseQuickVm::from).collect::<Vec<_>>(),
        total_records,
    })
    .into_response())
}

/// GET /api/knowledge-bases/latest/:take
pub async fn get_latest_knowledge_bases(auth: AuthUser, Path(take): Path<i64>) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::ContentKnowledgeBase, CommandCode::View).await?;
    let pool = manager::pool()?;
    let take = take.clamp(1, config::config().paging.max_page_size);

    let kbs: Vec<KnowledgeBase> =
        sqlx::query_as("SELECT * FROM knowledge_bases ORDER BY create_date DESC, id DESC LIMIT $1")
            .bind(take)
            .fetch_all(pool)
            .await?;
    let vms: Vec<KnowledgeBaseQuickVm> = kbs.into_iter().map(KnowledgeBaseQuickVm::from).collect();
    Ok(Json(vms).into_response())
}

/// GET /api/knowledge-bases/popular/:take
pub async fn get_popular_knowledge_bases(auth: AuthUser, Path(take): Path<i64>) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::ContentKnowledgeBase, CommandCode::View).await?;
    let pool = manager::pool()?;
    let take = take.clamp(1, config::config().paging.max_page_size);

    let kbs: Vec<KnowledgeBase> = sqlx::query_as(
        "SELECT * FROM knowledge_bases ORDER BY number_of_votes DESC NULLS LAST, id DESC LIMIT $1",
    )
    .bind(take)
    .fetch_all(pool)
    .await?;
    let vms: Vec<KnowledgeBaseQuickVm> = kbs.into_iter().map(KnowledgeBaseQuickVm::from).collect();
    Ok(Json(vms).into_response())
}

/// GET /api/knowledge-bases/:id - full projection
pub async fn get_by_id(auth: AuthUser, Path(id): Path<i32>) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::ContentKnowledgeBase, CommandCode::View).await?;
    let kb = find_knowledge_base(id).await?;
    Ok(Json(KnowledgeBaseVm::from(kb)).into_response())
}

/// PUT /api/knowledge-bases/:id
pub async fn put_knowledge_base(
    auth: AuthUser,
    Path(id): Path<i32>,
    Json(request): Json<KnowledgeBaseUpdateRequest>,
) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::ContentKnowledgeBase, CommandCode::Update).await?;
    request.validate()?;
    let pool = manager::pool()?;
    find_knowledge_base(id).await?;

    let seo_alias = match request.seo_alias.as_deref().map(str::trim) {
        Some(alias) if !alias.is_empty() => alias.to_string(),
        _ => to_seo_alias(&request.title),
    };

    sqlx::query(
        "UPDATE knowledge_bases
         SET category_id = $2, title = $3, seo_alias = $4, description = $5, environment = $6,
             problem = $7, step_to_reproduce = $8, error_message = $9, workaround = $10,
             note = $11, labels = $12, last_modified_date = $13
         WHERE id = $1",
    )
    .bind(id)
    .bind(request.category_id)
    .bind(&request.title)
    .bind(&seo_alias)
    .bind(&request.description)
    .bind(&request.environment)
    .bind(&request.problem)
    .bind(&request.step_to_reproduce)
    .bind(&request.error_message)
    .bind(&request.workaround)
    .bind(&request.note)
    .bind(&request.labels)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    log_activity("Update", "KnowledgeBase", id, auth.id, Some(&request.title)).await;

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// DELETE /api/knowledge-bases/:id - child rows go with it via FK cascade
pub async fn delete_knowledge_base(auth: AuthUser, Path(id): Path<i32>) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::ContentKnowledgeBase, CommandCode::Delete).await?;
    let pool = manager::pool()?;
    let kb = find_knowledge_base(id).await?;

    sqlx::query("DELETE FROM knowledge_bases WHERE id = $1").bind(id).execute(pool).await?;
    sqlx::query(
        "UPDATE users
         SET number_of_knowledge_bases = GREATEST(COALESCE(number_of_knowledge_bases, 0) - 1, 0)
         WHERE id = $1",
    )
    .bind(kb.owner_user_id)
    .execute(pool)
    .await?;

    log_activity("Delete", "KnowledgeBase", id, auth.id, Some(&kb.title)).await;

    Ok(Json(KnowledgeBaseVm::from(kb)).into_response())
}

pub(crate) async fn find_knowledge_base(id: i32) -> ApiResult<KnowledgeBase> {
    let pool = manager::pool()?;
    let kb: Option<KnowledgeBase> = sqlx::query_as("SELECT * FROM knowledge_bases WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    kb.ok_or_else(|| ApiError::not_found(format!("Knowledge base '{}' was not found", id)))
}
