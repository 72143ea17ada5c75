use serde::{Deserialize, Serialize};

use crate::config;

/// Paged listing response: `{ "items": [...], "totalRecords": n }`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination<T> {
    pub items: Vec<T>,
    pub total_records: i64,
}

/// Query string for `/filter` listings: optional substring filter plus
/// 1-based page number and page size.
#[derive(Debug, Clone, Deserialize)]
pub struct PagingQuery {
    pub filter: Option<String>,
    pub page: Option<i64>,
    pub size: Option<i64>,
}

impl PagingQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn size(&self) -> i64 {
        let paging = &config::config().paging;
        self.size
            .unwrap_or(paging.default_page_size)
            .clamp(1, paging.max_page_size)
    }

    /// Skip count for the requested page.
    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.size()
    }

    /// ILIKE pattern for the filter, or a match-everything pattern when the
    /// filter is absent or blank.
    pub fn pattern(&self) -> String {
        match self.filter.as_deref().map(str::trim) {
            Some(f) if !f.is_empty() => like_pattern(f),
            _ => "%".to_string(),
        }
    }
}

/// Wrap a user-supplied substring in `%...%`, escaping LIKE metacharacters
/// so the filter always means a literal substring match.
pub fn like_pattern(filter: &str) -> String {
    let mut escaped = String::with_capacity(filter.len() + 2);
    escaped.push('%');
    for c in filter.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: i64, size: i64) -> PagingQuery {
        PagingQuery { filter: None, page: Some(page), size: Some(size) }
    }

    #[test]
    fn offset_is_page_minus_one_times_size() {
        assert_eq!(query(1, 10).offset(), 0);
        assert_eq!(query(2, 10).offset(), 10);
        assert_eq!(query(5, 3).offset(), 12);
    }

    #[test]
    fn last_page_offset_leaves_only_remainder() {
        // 23 records, size 5 -> 5 addressable pages, last page holds 3
        let total = 23i64;
        let size = 5i64;
        let pages = (total + size - 1) / size;
        assert_eq!(pages, 5);
        let last = query(pages, size);
        assert_eq!(total - last.offset(), 3);
    }

    #[test]
    fn page_and_size_are_clamped() {
        assert_eq!(query(0, 10).page(), 1);
        assert_eq!(query(-3, 10).offset(), 0);
        assert_eq!(query(1, 0).size(), 1);
    }

    #[test]
    fn defaults_apply_when_absent() {
        let q = PagingQuery { filter: None, page: None, size: None };
        assert_eq!(q.page(), 1);
        assert!(q.size() >= 1);
        assert_eq!(q.offset(), 0);
    }

    #[test]
    fn like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("abc"), "%abc%");
        assert_eq!(like_pattern("50%"), "%50\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn blank_filter_matches_everything() {
        let q = PagingQuery { filter: Some("   ".to_string()), page: None, size: None };
        assert_eq!(q.pattern(), "%");
        let q = PagingQuery { filter: Some("kb".to_string()), page: None, size: None };
        assert_eq!(q.pattern(), "%kb%");
    }
}
