use serde::Deserialize;

pub const DEFAULT_PER_PAGE: i64 = 20;
pub const MAX_PER_PAGE: i64 = 100;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PageParams {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
    pub has_prev: bool,
    pub has_next: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    pub number: i64,
    pub current: bool,
}

impl Pagination {
    /// Requests past the last page land on the last page.
    pub fn new(params: &PageParams, total: i64) -> Self {
        let per_page = params.per_page();
        let total = total.max(0);
        let total_pages = (total / per_page + i64::from(total % per_page != 0)).max(1);
        let page = params.page().min(total_pages);

        Self {
            page,
            per_page,
            total,
            total_pages,
            has_prev: page > 1,
            has_next: page < total_pages,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }

    pub fn prev_page(&self) -> i64 {
        (self.page - 1).max(1)
    }

    pub fn next_page(&self) -> i64 {
        self.page.saturating_add(1).min(self.total_pages)
    }

    /// Up to five page numbers centred on the current page.
    pub fn links(&self) -> Vec<PageLink> {
        let start = (self.page - 2).max(1);
        let end = start.saturating_add(4).min(self.total_pages);
        let start = (end - 4).max(1);
        (start..=end)
            .map(|number| PageLink {
                number,
                current: number == self.page,
            })
            .collect()
    }
}
