use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Identity record. `password_hash` never leaves the database layer; view
/// models project the public fields only.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub user_name: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub dob: NaiveDate,
    pub phone_number: Option<String>,
    pub number_of_knowledge_bases: Option<i32>,
    pub number_of_votes: Option<i32>,
    pub number_of_reports: Option<i32>,
    pub create_date: DateTime<Utc>,
    pub last_modified_date: Option<DateTime<Utc>>,
}
