use axum::extract::Query;
use axum::response::{IntoResponse, Response};
use axum::Json;
use uuid::Uuid;

use crate::database::manager;
use crate::database::models::ActivityLog;
use crate::database::{Pagination, PagingQuery};
use crate::error::ApiResult;
use crate::middleware::{authorize, AuthUser, CommandCode, FunctionCode};
use crate::vm::ActivityLogVm;

/// Append an audit row. Best effort: a logging failure must not fail the
/// request that triggered it.
pub(crate) async fn log_activity(
    action: &str,
    entity_name: &str,
    entity_id: impl ToString,
    user_id: Uuid,
    content: Option<&str>,
) {
    let Ok(pool) = manager::pool() else { return };
    let result = sqlx::query(
        "INSERT INTO activity_logs (action, entity_name, entity_id, user_id, content)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(action)
    .bind(entity_name)
    .bind(entity_id.to_string())
    .bind(user_id)
    .bind(content)
    .execute(pool)
    .await;

    if let Err(e) = result {
        tracing::warn!("failed to write activity log: {}", e);
    }
}

/// GET /api/activity-logs/filter - newest first, filtered on action and
/// entity name
pub async fn get_activity_logs_paging(auth: AuthUser, Query(query): Query<PagingQuery>) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::SystemLog, CommandCode::View).await?;
    let pool = manager::pool()?;
    let pattern = query.pattern();

    let total_records: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM activity_logs WHERE action ILIKE $1 OR entity_name ILIKE $1",
    )
    .bind(&pattern)
    .fetch_one(pool)
    .await?;

    let logs: Vec<ActivityLog> = sqlx::query_as(
        "SELECT * FROM activity_logs WHERE action ILIKE $1 OR entity_name ILIKE $1
         ORDER BY create_date DESC, id DESC OFFSET $2 LIMIT $3",
    )
    .bind(&pattern)
    .bind(query.offset())
    .bind(query.size())
    .fetch_all(pool)
    .await?;

    Ok(Json(Pagination {
        items: logs.into_iter().map(ActivityLogVm::from).collect::<Vec<_>>(),
        total_records,
    })
    .into_response())
}
