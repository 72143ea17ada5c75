use crate::database::manager;
use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;

/// Addressable resources in the permission model. Values map to the text
/// primary keys of the `functions` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionCode {
    SystemUser,
    SystemRole,
    SystemFunction,
    SystemPermission,
    SystemLog,
    ContentCategory,
    ContentKnowledgeBase,
    ContentComment,
    ContentReport,
}

impl FunctionCode {
    pub fn code(&self) -> &'static str {
        match self {
            FunctionCode::SystemUser => "SYSTEM_USER",
            FunctionCode::SystemRole => "SYSTEM_ROLE",
            FunctionCode::SystemFunction => "SYSTEM_FUNCTION",
            FunctionCode::SystemPermission => "SYSTEM_PERMISSION",
            FunctionCode::SystemLog => "SYSTEM_LOG",
            FunctionCode::ContentCategory => "CONTENT_CATEGORY",
            FunctionCode::ContentKnowledgeBase => "CONTENT_KNOWLEDGEBASE",
            FunctionCode::ContentComment => "CONTENT_COMMENT",
            FunctionCode::ContentReport => "CONTENT_REPORT",
        }
    }
}

/// Action verbs, mapped to the text primary keys of the `commands` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandCode {
    View,
    Create,
    Update,
    Delete,
    Approve,
}

impl CommandCode {
    pub fn code(&self) -> &'static str {
        match self {
            CommandCode::View => "VIEW",
            CommandCode::Create => "CREATE",
            CommandCode::Update => "UPDATE",
            CommandCode::Delete => "DELETE",
            CommandCode::Approve => "APPROVE",
        }
    }
}

/// Confirm the caller holds a permission granting `command` on `function`,
/// before the handler body runs. A single boolean lookup over the
/// permission matrix for the caller's roles.
pub async fn authorize(auth: &AuthUser, function: FunctionCode, command: CommandCode) -> ApiResult<()> {
    if auth.roles.is_empty() {
        return Err(ApiError::forbidden("You are not allowed to perform this action"));
    }

    let pool = manager::pool()?;
    let granted: bool = sqlx::query_scalar(
        "SELECT EXISTS (
            SELECT 1 FROM permissions
            WHERE role_id = ANY($1) AND function_id = $2 AND command_id = $3
         )",
    )
    .bind(&auth.roles)
    .bind(function.code())
    .bind(command.code())
    .fetch_one(pool)
    .await?;

    if granted {
        Ok(())
    } else {
        tracing::debug!(
            user = %auth.user_name,
            function = function.code(),
            command = command.code(),
            "permission denied"
        );
        Err(ApiError::forbidden("You are not allowed to perform this action"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_seeded_keys() {
        assert_eq!(FunctionCode::SystemUser.code(), "SYSTEM_USER");
        assert_eq!(FunctionCode::ContentKnowledgeBase.code(), "CONTENT_KNOWLEDGEBASE");
        assert_eq!(CommandCode::View.code(), "VIEW");
        assert_eq!(CommandCode::Approve.code(), "APPROVE");
    }
}
