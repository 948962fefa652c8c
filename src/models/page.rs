use serde::{Deserialize, Serialize};

pub const MAX_PAGE_SIZE: i64 = 100;
pub const FEED_PAGE_SIZE: i64 = 10;
pub const COMMENT_PAGE_SIZE: i64 = 20;

/// Raw query parameters for ranked listings.
///
/// Kept as strings so malformed numbers normalize to defaults instead of
/// being rejected by the extractor.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub sort: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Normalized offset pagination request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Clamps `limit` into [1, 100] and `page` to at least 1. Never fails.
    pub fn new(page: Option<i64>, limit: Option<i64>, default_limit: i64) -> Self {
        let limit = match limit {
            Some(l) if l >= 1 => l.min(MAX_PAGE_SIZE),
            Some(_) => 1,
            None => default_limit,
        };
        let page = page.unwrap_or(1).max(1);
        Self { page, limit }
    }

    pub fn from_params(params: &ListParams, default_limit: i64) -> Self {
        let parse = |raw: &Option<String>| raw.as_deref().and_then(|s| s.trim().parse::<i64>().ok());
        Self::new(parse(&params.page), parse(&params.limit), default_limit)
    }

    pub fn skip(&self) -> usize {
        ((self.page - 1).saturating_mul(self.limit)) as usize
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total_items: i64,
    pub total_pages: i64,
    pub current_page: i64,
    pub page_size: i64,
}

impl PageMeta {
    pub fn new(total_items: i64, request: PageRequest) -> Self {
        let total_pages = ((total_items + request.limit - 1) / request.limit).max(1);
        Self {
            total_items,
            total_pages,
            current_page: request.page,
            page_size: request.limit,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}

/// Feed ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FeedSort {
    #[default]
    New,
    Old,
    Hot,
}

impl FeedSort {
    /// Unknown values fall back to `New`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("old") => FeedSort::Old,
            Some("hot") => FeedSort::Hot,
            _ => FeedSort::New,
        }
    }
}

/// Comment listing ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommentSort {
    #[default]
    New,
    Old,
    Popular,
}

impl CommentSort {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("old") => CommentSort::Old,
            Some("popular") => CommentSort::Popular,
            _ => CommentSort::New,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_inputs_normalize() {
        assert_eq!(PageRequest::new(Some(0), Some(0), 10), PageRequest { page: 1, limit: 1 });
        assert_eq!(PageRequest::new(Some(-4), Some(500), 10), PageRequest { page: 1, limit: 100 });
        assert_eq!(PageRequest::new(None, None, 20), PageRequest { page: 1, limit: 20 });
        assert_eq!(PageRequest::new(Some(3), Some(7), 10).skip(), 14);
    }

    #[test]
    fn garbage_params_fall_back_to_defaults() {
        let params = ListParams {
            sort: Some("sideways".to_string()),
            page: Some("abc".to_string()),
            limit: Some("".to_string()),
        };
        assert_eq!(PageRequest::from_params(&params, 10), PageRequest { page: 1, limit: 10 });
        assert_eq!(FeedSort::parse(params.sort.as_deref()), FeedSort::New);
        assert_eq!(CommentSort::parse(Some("popular")), CommentSort::Popular);
    }

    #[test]
    fn total_pages_is_at_least_one() {
        let req = PageRequest::new(Some(1), Some(10), 10);
        assert_eq!(PageMeta::new(0, req).total_pages, 1);
        assert_eq!(PageMeta::new(10, req).total_pages, 1);
        assert_eq!(PageMeta::new(11, req).total_pages, 2);
        assert_eq!(PageMeta::new(25, req).total_pages, 3);
    }
}
