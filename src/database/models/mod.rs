pub mod activity_log;
pub mod category;
pub mod function;
pub mod knowledge_base;
pub mod role;
pub mod user;

pub use activity_log::ActivityLog;
pub use category::Category;
pub use function::{Command, Function, Permission};
pub use knowledge_base::{Attachment, Comment, KnowledgeBase, Report, Vote};
pub use role::Role;
pub use user::User;
