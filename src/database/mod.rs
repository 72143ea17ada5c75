pub mod manager;
pub mod models;
pub mod paging;

pub use manager::{pool, DbError};
pub use paging::{like_pattern, Pagination, PagingQuery};
