use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub seo_alias: String,
    pub seo_description: Option<String>,
    pub sort_order: i32,
    pub parent_id: Option<i32>,
    pub number_of_tickets: Option<i32>,
}
