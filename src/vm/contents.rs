use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::database::models::{ActivityLog, Attachment, Category, Comment, KnowledgeBase, Report};

// ---------------------------------------------------------------------------
// Categories

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryVm {
    pub id: i32,
    pub name: String,
    pub seo_alias: String,
    pub seo_description: Option<String>,
    pub sort_order: i32,
    pub parent_id: Option<i32>,
    pub number_of_tickets: Option<i32>,
}

impl From<Category> for CategoryVm {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
            seo_alias: c.seo_alias,
            seo_description: c.seo_description,
            sort_order: c.sort_order,
            parent_id: c.parent_id,
            number_of_tickets: c.number_of_tickets,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCreateRequest {
    #[validate(length(min = 1, max = 200, message = "Category name is required"))]
    pub name: String,
    pub seo_alias: Option<String>,
    pub seo_description: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    pub parent_id: Option<i32>,
}

// ---------------------------------------------------------------------------
// Knowledge bases

/// Full projection, used by get-by-id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBaseVm {
    pub id: i32,
    pub category_id: i32,
    pub owner_user_id: Uuid,
    pub title: String,
    pub seo_alias: String,
    pub description: Option<String>,
    pub environment: Option<String>,
    pub problem: Option<String>,
    pub step_to_reproduce: Option<String>,
    pub error_message: Option<String>,
    pub workaround: Option<String>,
    pub note: Option<String>,
    pub labels: Option<String>,
    pub number_of_comments: Option<i32>,
    pub number_of_votes: Option<i32>,
    pub number_of_reports: Option<i32>,
    pub create_date: DateTime<Utc>,
    pub last_modified_date: Option<DateTime<Utc>>,
}

impl From<KnowledgeBase> for KnowledgeBaseVm {
    fn from(k: KnowledgeBase) -> Self {
        Self {
            id: k.id,
            category_id: k.category_id,
            owner_user_id: k.owner_user_id,
            title: k.title,
            seo_alias: k.seo_alias,
            description: k.description,
            environment: k.environment,
            problem: k.problem,
            step_to_reproduce: k.step_to_reproduce,
            error_message: k.error_message,
            workaround: k.workaround,
            note: k.note,
            labels: k.labels,
            number_of_comments: k.number_of_comments,
            number_of_votes: k.number_of_votes,
            number_of_reports: k.number_of_reports,
            create_date: k.create_date,
            last_modified_date: k.last_modified_date,
        }
    }
}

/// Slim projection for listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBaseQuickVm {
    pub id: i32,
    pub category_id: i32,
    pub title: String,
    pub seo_alias: String,
    pub description: Option<String>,
    pub number_of_votes: Option<i32>,
    pub number_of_comments: Option<i32>,
    pub create_date: DateTime<Utc>,
}

impl From<KnowledgeBase> for KnowledgeBaseQuickVm {
    fn from(k: KnowledgeBase) -> Self {
        Self {
            id: k.id,
            category_id: k.category_id,
            title: k.title,
            seo_alias: k.seo_alias,
            description: k.description,
            number_of_votes: k.number_of_votes,
            number_of_comments: k.number_of_comments,
            create_date: k.create_date,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBaseCreateRequest {
    pub category_id: i32,
    #[validate(length(min = 1, max = 500, message = "Title is required"))]
    pub title: String,
    pub seo_alias: Option<String>,
    pub description: Option<String>,
    pub environment: Option<String>,
    pub problem: Option<String>,
    pub step_to_reproduce: Option<String>,
    pub error_message: Option<String>,
    pub workaround: Option<String>,
    pub note: Option<String>,
    pub labels: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub attachments: Vec<AttachmentCreateRequest>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBaseUpdateRequest {
    pub category_id: i32,
    #[validate(length(min = 1, max = 500, message = "Title is required"))]
    pub title: String,
    pub seo_alias: Option<String>,
    pub description: Option<String>,
    pub environment: Option<String>,
    pub problem: Option<String>,
    pub step_to_reproduce: Option<String>,
    pub error_message: Option<String>,
    pub workaround: Option<String>,
    pub note: Option<String>,
    pub labels: Option<String>,
}

// ---------------------------------------------------------------------------
// Comments / votes / reports / attachments

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentVm {
    pub id: i32,
    pub content: String,
    pub knowledge_base_id: i32,
    pub owner_user_id: Uuid,
    pub create_date: DateTime<Utc>,
    pub last_modified_date: Option<DateTime<Utc>>,
}

impl From<Comment> for CommentVm {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id,
            content: c.content,
            knowledge_base_id: c.knowledge_base_id,
            owner_user_id: c.owner_user_id,
            create_date: c.create_date,
            last_modified_date: c.last_modified_date,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CommentCreateRequest {
    #[validate(length(min = 1, message = "Comment content is required"))]
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportVm {
    pub id: i32,
    pub content: String,
    pub knowledge_base_id: i32,
    pub report_user_id: Option<Uuid>,
    pub is_processed: bool,
    pub create_date: DateTime<Utc>,
}

impl From<Report> for ReportVm {
    fn from(r: Report) -> Self {
        Self {
            id: r.id,
            content: r.content,
            knowledge_base_id: r.knowledge_base_id,
            report_user_id: r.report_user_id,
            is_processed: r.is_processed,
            create_date: r.create_date,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReportCreateRequest {
    #[validate(length(min = 1, message = "Report content is required"))]
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentVm {
    pub id: i32,
    pub file_name: String,
    pub file_path: String,
    pub file_type: String,
    pub file_size: i64,
    pub knowledge_base_id: i32,
    pub create_date: DateTime<Utc>,
}

impl From<Attachment> for AttachmentVm {
    fn from(a: Attachment) -> Self {
        Self {
            id: a.id,
            file_name: a.file_name,
            file_path: a.file_path,
            file_type: a.file_type,
            file_size: a.file_size,
            knowledge_base_id: a.knowledge_base_id,
            create_date: a.create_date,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentCreateRequest {
    #[validate(length(min = 1, max = 200, message = "File name is required"))]
    pub file_name: String,
    #[validate(length(min = 1, max = 200, message = "File path is required"))]
    pub file_path: String,
    #[validate(length(min = 1, max = 50, message = "File type is required"))]
    pub file_type: String,
    pub file_size: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogVm {
    pub id: i32,
    pub action: String,
    pub entity_name: String,
    pub entity_id: String,
    pub user_id: Option<Uuid>,
    pub content: Option<String>,
    pub create_date: DateTime<Utc>,
}

impl From<ActivityLog> for ActivityLogVm {
    fn from(l: ActivityLog) -> Self {
        Self {
            id: l.id,
            action: l.action,
            entity_name: l.entity_name,
            entity_id: l.entity_id,
            user_id: l.user_id,
            content: l.content,
            create_date: l.create_date,
        }
    }
}

// ---------------------------------------------------------------------------

/// Derive a URL-safe alias from a title: lowercase alphanumerics with single
/// dashes between words.
pub fn to_seo_alias(title: &str) -> String {
    let mut alias = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !alias.is_empty() {
                alias.push('-');
            }
            pending_dash = false;
            for lower in c.to_lowercase() {
                alias.push(lower);
            }
        } else {
            pending_dash = true;
        }
    }
    alias
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seo_alias_slugifies_title() {
        assert_eq!(to_seo_alias("How to reset a password"), "how-to-reset-a-password");
        assert_eq!(to_seo_alias("  SQL: timeout?!  "), "sql-timeout");
        assert_eq!(to_seo_alias("Already-Slugged"), "already-slugged");
        assert_eq!(to_seo_alias(""), "");
    }

    #[test]
    fn quick_vm_serializes_camel_case() {
        let vm = KnowledgeBaseQuickVm {
            id: 1,
            category_id: 2,
            title: "t".to_string(),
            seo_alias: "t".to_string(),
            description: None,
            number_of_votes: Some(3),
            number_of_comments: None,
            create_date: Utc::now(),
        };
        let json = serde_json::to_value(&vm).unwrap();
        assert!(json.get("categoryId").is_some());
        assert!(json.get("numberOfVotes").is_some());
        assert!(json.get("seoAlias").is_some());
    }
}
