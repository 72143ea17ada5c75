use axum::extract::Path;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use uuid::Uuid;

use crate::database::manager;
use crate::error::{ApiError, ApiResult};
use crate::handlers::knowledge_bases::find_knowledge_base;
use crate::middleware::{authorize, AuthUser, CommandCode, FunctionCode};

/// POST /api/knowledge-bases/:id/votes - at most one vote per caller per
/// article; returns the new vote total
pub async fn post_vote(auth: AuthUser, Path(kb_id): Path<i32>) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::ContentKnowledgeBase, CommandCode::View).await?;
    let pool = manager::pool()?;
    find_knowledge_base(kb_id).await?;

    let already: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM votes WHERE knowledge_base_id = $1 AND user_id = $2)",
    )
    .bind(kb_id)
    .bind(auth.id)
    .fetch_one(pool)
    .await?;
    if already {
        return Err(ApiError::bad_request("This knowledge base has already been voted by you"));
    }

    sqlx::query("INSERT INTO votes (knowledge_base_id, user_id) VALUES ($1, $2)")
        .bind(kb_id)
        .bind(auth.id)
        .execute(pool)
        .await?;

    let number_of_votes: Option<i32> = sqlx::query_scalar(
        "UPDATE knowledge_bases SET number_of_votes = COALESCE(number_of_votes, 0) + 1
         WHERE id = $1 RETURNING number_of_votes",
    )
    .bind(kb_id)
    .fetch_one(pool)
    .await?;

    Ok(Json(json!({ "numberOfVotes": number_of_votes })).into_response())
}

/// DELETE /api/knowledge-bases/:id/votes/:userId - returns the new vote
/// total
pub async fn delete_vote(auth: AuthUser, Path((kb_id, user_id)): Path<(i32, Uuid)>) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::ContentKnowledgeBase, CommandCode::View).await?;
    let pool = manager::pool()?;
    find_knowledge_base(kb_id).await?;

    let result = sqlx::query("DELETE FROM votes WHERE knowledge_base_id = $1 AND user_id = $2")
        .bind(kb_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Vote was not found"));
    }

    let number_of_votes: Option<i32> = sqlx::query_scalar(
        "UPDATE knowledge_bases SET number_of_votes = GREATEST(COALESCE(number_of_votes, 0) - 1, 0)
         WHERE id = $1 RETURNING number_of_votes",
    )
    .bind(kb_id)
    .fetch_one(pool)
    .await?;

    Ok(Json(json!({ "numberOfVotes": number_of_votes })).into_response())
}
