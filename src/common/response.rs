// src/common/response.rs

use serde::Serialize;
use utoipa::ToSchema;

/// Envelope padrão de sucesso: `{ "success": true, "data": ... }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Página normalizada (1-based, limite entre 1 e 100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl Page {
    pub const DEFAULT_LIMIT: i64 = 10;
    pub const MAX_LIMIT: i64 = 100;
    // Acima disso o OFFSET já passa de qualquer tabela real
    pub const MAX_PAGE: i64 = i64::MAX / Self::MAX_LIMIT;

    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: page.clamp(1, Self::MAX_PAGE),
            limit: limit.clamp(1, Self::MAX_LIMIT),
        }
    }

    /// Página vinda da query string (`?page=&limit=`).
    pub fn requested(page: Option<i64>, limit: Option<i64>) -> Self {
        Self::new(page.unwrap_or(1), limit.unwrap_or(Self::DEFAULT_LIMIT))
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
    pub items_per_page: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: i64, page: Page) -> Self {
        let total_pages = (total + page.limit - 1) / page.limit;
        Self {
            data,
            meta: PageMeta {
                current_page: page.page,
                total_pages,
                total_items: total,
                items_per_page: page.limit,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_is_normalized() {
        let page = Page::new(0, 500);
        assert_eq!(page, Page { page: 1, limit: 100 });
        assert_eq!(Page::new(3, 10).offset(), 20);
        assert_eq!(Page::requested(None, None), Page { page: 1, limit: 10 });
    }

    #[test]
    fn huge_page_numbers_do_not_overflow() {
        let page = Page::new(i64::MAX, 100);
        assert_eq!(page.page, Page::MAX_PAGE);
        assert!(page.offset() > 0);
        assert!(Page::requested(Some(i64::MAX), Some(i64::MAX)).offset() > 0);
    }

    #[test]
    fn total_pages_rounds_up() {
        let p = Paginated::new(vec![1, 2, 3], 21, Page::new(1, 10));
        assert_eq!(p.meta.total_pages, 3);
        let empty: Paginated<i32> = Paginated::new(vec![], 0, Page::new(1, 10));
        assert_eq!(empty.meta.total_pages, 0);
    }
}
