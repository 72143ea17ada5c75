use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Article aggregate root. The `number_of_*` counters are denormalized from
/// the child tables and maintained by the mutation handlers.
#[derive(Debug, Clone, FromRow)]
pub struct KnowledgeBase {
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

#[derive(Debug, Clone, FromRow)]
pub struct Comment {
    pub id: i32,
    pub content: String,
    pub knowledge_base_id: i32,
    pub owner_user_id: Uuid,
    pub create_date: DateTime<Utc>,
    pub last_modified_date: Option<DateTime<Utc>>,
}

/// Composite key (knowledge_base_id, user_id): one vote per user per article.
#[derive(Debug, Clone, FromRow)]
pub struct Vote {
    pub knowledge_base_id: i32,
    pub user_id: Uuid,
    pub create_date: DateTime<Utc>,
    pub last_modified_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Report {
    pub id: i32,
    pub content: String,
    pub knowledge_base_id: i32,
    pub report_user_id: Option<Uuid>,
    pub is_processed: bool,
    pub create_date: DateTime<Utc>,
    pub last_modified_date: Option<DateTime<Utc>>,
}

/// File metadata only; blob storage is out of scope.
#[derive(Debug, Clone, FromRow)]
pub struct Attachment {
    pub id: i32,
    pub file_name: String,
    pub file_path: String,
    pub file_type: String,
    pub file_size: i64,
    pub knowledge_base_id: i32,
    pub create_date: DateTime<Utc>,
    pub last_modified_date: Option<DateTime<Utc>>,
}
