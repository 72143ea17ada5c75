pub mod activity_logs;
pub mod attachments;
pub mod auth;
pub mod categories;
pub mod comments;
pub mod functions;
pub mod knowledge_bases;
pub mod reports;
pub mod roles;
pub mod users;
pub mod votes;
