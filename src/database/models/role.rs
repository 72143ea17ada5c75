use sqlx::FromRow;

/// Named access group. Id is a human-readable key such as "Admin".
#[derive(Debug, Clone, FromRow)]
pub struct Role {
    pub id: String,
    pub name: String,
}
