use sqlx::FromRow;

/// Navigable resource in the permission model; functions form a tree via
/// `parent_id` and order siblings by `sort_order`.
#[derive(Debug, Clone, FromRow)]
pub struct Function {
    pub id: String,
    pub name: String,
    pub url: String,
    pub sort_order: i32,
    pub parent_id: Option<String>,
    pub icon: Option<String>,
}

/// Action verb applicable to a function (VIEW, CREATE, UPDATE, DELETE, APPROVE).
#[derive(Debug, Clone, FromRow)]
pub struct Command {
    pub id: String,
    pub name: String,
}

/// Grant of a command on a function to a role. The composite primary key
/// (role_id, function_id, command_id) keeps grants unique.
#[derive(Debug, Clone, FromRow)]
pub struct Permission {
    pub role_id: String,
    pub function_id: String,
    pub command_id: String,
}
