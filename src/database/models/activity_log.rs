use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Append-only audit trail of content mutations.
#[derive(Debug, Clone, FromRow)]
pub struct ActivityLog {
    pub id: i32,
    pub action: String,
    pub entity_name: String,
    pub entity_id: String,
    pub user_id: Option<Uuid>,
    pub content: Option<String>,
    pub create_date: DateTime<Utc>,
}
