use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use validator::Validate;

use crate::database::manager;
use crate::database::models::Report;
use crate::database::{Pagination, PagingQuery};
use crate::error::{ApiError, ApiResult};
use crate::handlers::knowledge_bases::find_knowledge_base;
use crate::middleware::{authorize, AuthUser, CommandCode, FunctionCode};
use crate::vm::{ReportCreateRequest, ReportVm};

/// GET /api/knowledge-bases/:id/reports/filter
pub async fn get_reports_paging(
    auth: AuthUser,
    Path(kb_id): Path<i32>,
    Query(query): Query<PagingQuery>,
) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::ContentReport, CommandCode::View).await?;
    let pool = manager::pool()?;
    find_knowledge_base(kb_id).await?;
    let pattern = query.pattern();

    let total_records: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM reports WHERE knowledge_base_id = $1 AND content ILIKE $2",
    )
    .bind(kb_id)
    .bind(&pattern)
    .fetch_one(pool)
    .await?;

    let reports: Vec<Report> = sqlx::query_as(
        "SELECT * FROM reports WHERE knowledge_base_id = $1 AND content ILIKE $2
         ORDER BY create_date DESC, id DESC OFFSET $3 LIMIT $4",
    )
    .bind(kb_id)
    .bind(&pattern)
    .bind(query.offset())
    .bind(query.size())
    .fetch_all(pool)
    .await?;

    Ok(Json(Pagination {
        items: reports.into_iter().map(ReportVm::from).collect::<Vec<_>>(),
        total_records,
    })
    .into_response())
}

/// POST /api/knowledge-bases/:id/reports - bumps the article's report
/// counter
pub async fn post_report(
    auth: AuthUser,
    Path(kb_id): Path<i32>,
    Json(request): Json<ReportCreateRequest>,
) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::ContentReport, CommandCode::Create).await?;
    request.validate()?;
    let pool = manager::pool()?;
    find_knowledge_base(kb_id).await?;

    let report: Report = sqlx::query_as(
        "INSERT INTO reports (content, knowledge_base_id, report_user_id)
         VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(&request.content)
    .bind(kb_id)
    .bind(auth.id)
    .fetch_one(pool)
    .await?;

    sqlx::query(
        "UPDATE knowledge_bases SET number_of_reports = COALESCE(number_of_reports, 0) + 1 WHERE id = $1",
    )
    .bind(kb_id)
    .execute(pool)
    .await?;

    Ok((StatusCode::CREATED, Json(ReportVm::from(report))).into_response())
}

/// DELETE /api/knowledge-bases/:id/reports/:reportId - returns the deleted
/// representation and decrements the counter
pub async fn delete_report(auth: AuthUser, Path((kb_id, report_id)): Path<(i32, i32)>) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::ContentReport, CommandCode::Delete).await?;
    let pool = manager::pool()?;

    let report: Option<Report> =
        sqlx::query_as("SELECT * FROM reports WHERE id = $1 AND knowledge_base_id = $2")
            .bind(report_id)
            .bind(kb_id)
            .fetch_optional(pool)
            .await?;
    let report = report.ok_or_else(|| ApiError::not_found(format!("Report '{}' was not found", report_id)))?;

    sqlx::query("DELETE FROM reports WHERE id = $1").bind(report_id).execute(pool).await?;
    sqlx::query(
        "UPDATE knowledge_bases
         SET number_of_reports = GREATEST(COALESCE(number_of_reports, 0) - 1, 0)
         WHERE id = $1",
    )
    .bind(kb_id)
    .execute(pool)
    .await?;

    Ok(Json(ReportVm::from(report)).into_response())
}
