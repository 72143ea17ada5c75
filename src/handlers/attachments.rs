use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use validator::Validate;

use crate::database::manager;
use crate::database::models::Attachment;
use crate::error::{ApiError, ApiResult};
use crate::handlers::knowledge_bases::find_knowledge_base;
use crate::middleware::{authorize, AuthUser, CommandCode, FunctionCode};
use crate::vm::{AttachmentCreateRequest, AttachmentVm};

/// GET /api/knowledge-bases/:id/attachments
pub async fn get_attachments(auth: AuthUser, Path(kb_id): Path<i32>) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::ContentKnowledgeBase, CommandCode::View).await?;
    let pool = manager::pool()?;
    find_knowledge_base(kb_id).await?;

    let attachments: Vec<Attachment> =
        sqlx::query_as("SELECT * FROM attachments WHERE knowledge_base_id = $1 ORDER BY id")
            .bind(kb_id)
            .fetch_all(pool)
            .await?;
    let vms: Vec<AttachmentVm> = attachments.into_iter().map(AttachmentVm::from).collect();
    Ok(Json(vms).into_response())
}

/// POST /api/knowledge-bases/:id/attachments - metadata only, blob storage
/// is out of scope
pub async fn post_attachment(
    auth: AuthUser,
    Path(kb_id): Path<i32>,
    Json(request): Json<AttachmentCreateRequest>,
) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::ContentKnowledgeBase, CommandCode::Update).await?;
    request.validate()?;
    let pool = manager::pool()?;
    find_knowledge_base(kb_id).await?;

    let attachment: Attachment = sqlx::query_as(
        "INSERT INTO attachments (file_name, file_path, file_type, file_size, knowledge_base_id)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(&request.file_name)
    .bind(&request.file_path)
    .bind(&request.file_type)
    .bind(request.file_size)
    .bind(kb_id)
    .fetch_one(pool)
    .await?;

    Ok((StatusCode::CREATED, Json(AttachmentVm::from(attachment))).into_response())
}

/// DELETE /api/knowledge-bases/:id/attachments/:attachmentId - returns the
/// deleted representation
pub async fn delete_attachment(
    auth: AuthUser,
    Path((kb_id, attachment_id)): Path<(i32, i32)>,
) -> ApiResult<Response> {
    authorize(&auth, FunctionCode::ContentKnowledgeBase, CommandCode::Update).await?;
    let pool = manager::pool()?;

    let attachment: Option<Attachment> =
        sqlx::query_as("SELECT * FROM attachments WHERE id = $1 AND knowledge_base_id = $2")
            .bind(attachment_id)
            .bind(kb_id)
            .fetch_optional(pool)
            .await?;
    let attachment =
        attachment.ok_or_else(|| ApiError::not_found(format!("Attachment '{}' was not found", attachment_id)))?;

    sqlx::query("DELETE FROM attachments WHERE id = $1").bind(attachment_id).execute(pool).await?;

    Ok(Json(AttachmentVm::from(attachment)).into_response())
}
