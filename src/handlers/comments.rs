use axum::extract::{Path, Query};
use axum::http::{header, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use validator::Validate;

use crate::database::manager;
use crate::database::models::Comment;
use crate::database::{Pagination, PagingQuery};
use crate::error::{ApiError, ApiResult};
use crate::handlers::activity_logs::log_activity;
use crate::handlers::knowledge_bases::find_knowledge_base;
use crate::middleware::{authorize, AuthUser, CommandCode, FunctionCode};
use crate::vm::{CommentCreateRequest, CommentVm};

/// GET /api/knowledge-bases/:id/comments/filter
pub async fn get_comments_paging(
    auth: AuthUser,
    Path(kb_id): Path<i32>,
    Query(query): Query<PagingQuery>,
) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::ContentComment, CommandCode::View).await?;
    let pool = manager::pool()?;
    find_knowledge_base(kb_id).await?;
    let pattern = query.pattern();

    let total_records: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM comments WHERE knowledge_base_id = $1 AND content ILIKE $2",
    )
    .bind(kb_id)
    .bind(&pattern)
    .fetch_one(pool)
    .await?;

    let comments: Vec<Comment> = sqlx::query_as(
        "SELECT * FROM comments WHERE knowledge_base_id = $1 AND content ILIKE $2
         ORDER BY create_date DESC, id DESC OFFSET $3 LIMIT $4",
    )
    .bind(kb_id)
    .bind(&pattern)
    .bind(query.offset())
    .bind(query.size())
    .fetch_all(pool)
    .await?;

    Ok(Json(Pagination {
        items: comments.into_iter().map(CommentVm::from).collect::<Vec<_>>(),
        total_records,
    })
    .into_response())
}

/// GET /api/knowledge-bases/:id/comments/:commentId
pub async fn get_comment_by_id(auth: AuthUser, Path((kb_id, comment_id)): Path<(i32, i32)>) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::ContentComment, CommandCode::View).await?;
    let comment = find_comment(kb_id, comment_id).await?;
    Ok(Json(CommentVm::from(comment)).into_response())
}

/// POST /api/knowledge-bases/:id/comments - bumps the article's comment
/// counter
pub async fn post_comment(
    auth: AuthUser,
    Path(kb_id): Path<i32>,
    Json(request): Json<CommentCreateRequest>,
) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::ContentComment, CommandCode::Create).await?;
    request.validate()?;
    let pool = manager::pool()?;
    find_knowledge_base(kb_id).await?;

    let comment: Comment = sqlx::query_as(
        "INSERT INTO comments (content, knowledge_base_id, owner_user_id)
         VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(&request.content)
    .bind(kb_id)
    .bind(auth.id)
    .fetch_one(pool)
    .await?;

    sqlx::query(
        "UPDATE knowledge_bases SET number_of_comments = COALESCE(number_of_comments, 0) + 1 WHERE id = $1",
    )
    .bind(kb_id)
    .execute(pool)
    .await?;

    log_activity("Create", "Comment", comment.id, auth.id, Some(&comment.content)).await;

    Ok((
        StatusCode::CREATED,
        AppendHeaders([(
            header::LOCATION,
            format!("/api/knowledge-bases/{}/comments/{}", kb_id, comment.id),
        )]),
        Json(CommentVm::from(comment)),
    )
        .into_response())
}

/// PUT /api/knowledge-bases/:id/comments/:commentId - owner only
pub async fn put_comment(
    auth: AuthUser,
    Path((kb_id, comment_id)): Path<(i32, i32)>,
    Json(request): Json<CommentCreateRequest>,
) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::ContentComment, CommandCode::Update).await?;
    request.validate()?;
    let pool = manager::pool()?;
    let comment = find_comment(kb_id, comment_id).await?;

    if comment.owner_user_id != auth.id {
        return Err(ApiError::forbidden("You cannot edit another user's comment"));
    }

    sqlx::query("UPDATE comments SET content = $2, last_modified_date = $3 WHERE id = $1")
        .bind(comment_id)
        .bind(&request.content)
        .bind(Utc::now())
        .execute(pool)
        .await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// DELETE /api/knowledge-bases/:id/comments/:commentId - returns the
/// deleted representation and decrements the counter
pub async fn delete_comment(auth: AuthUser, Path((kb_id, comment_id)): Path<(i32, i32)>) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::ContentComment, CommandCode::Delete).await?;
    let pool = manager::pool()?;
    let comment = find_comment(kb_id, comment_id).await?;

    sqlx::query("DELETE FROM comments WHERE id = $1").bind(comment_id).execute(pool).await?;
    sqlx::query(
        "UPDATE knowledge_bases
         SET number_of_comments = GREATEST(COALESCE(number_of_comments, 0) - 1, 0)
         WHERE id = $1",
    )
    .bind(kb_id)
    .execute(pool)
    .await?;

    Ok(Json(CommentVm::from(comment)).into_response())
}

async fn find_comment(kb_id: i32, comment_id: i32) -> ApiResult<Comment> {
    let pool = manager::pool()?;
    let comment: Option<Comment> =
        sqlx::query_as("SELECT * FROM comments WHERE id = $1 AND knowledge_base_id = $2")
            .bind(comment_id)
            .bind(kb_id)
            .fetch_optional(pool)
            .await?;
    comment.ok_or_else(|| ApiError::not_found(format!("Comment '{}' was not found", comment_id)))
}
