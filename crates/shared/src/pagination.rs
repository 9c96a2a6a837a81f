use serde::{Deserialize, Serialize};

use crate::query::{ListQuery, DEFAULT_PER_PAGE};

/// `ceil(total_count / per_page)`; zero rows means zero pages.
pub fn total_pages(total_count: u64, per_page: u32) -> u32 {
    let per_page = if per_page == 0 {
        DEFAULT_PER_PAGE
    } else {
        per_page
    };
    u32::try_from(total_count.div_ceil(u64::from(per_page))).unwrap_or(u32::MAX)
}

/// Skip/take window applied after filtering and sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub skip: u64,
    pub take: u32,
}

impl Window {
    pub fn for_query(query: &ListQuery) -> Self {
        let page = u64::from(query.page.max(1));
        Self {
            skip: (page - 1) * u64::from(query.per_page),
            take: query.per_page,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub total_count: u64,
    pub total_pages: u32,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    pub fn new(rows: Vec<T>, total_count: u64, query: &ListQuery) -> Self {
        Self {
            rows,
            total_count,
            total_pages: total_pages(total_count, query.per_page),
            page: query.page,
            per_page: query.per_page,
        }
    }

    /// A page past the last one is a valid, empty result.
    pub fn is_past_end(&self) -> bool {
        self.page > self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1 && self.total_pages > 0
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            rows: self.rows.into_iter().map(f).collect(),
            total_count: self.total_count,
            total_pages: self.total_pages,
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLink {
    Previous(u32),
    Number { page: u32, current: bool },
    Gap,
    Next(u32),
}

/// Links for a pagination control: previous, first, current +/- 1, last,
/// next. Runs of skipped pages collapse into a single [`PageLink::Gap`].
pub fn page_links(current: u32, total_pages: u32) -> Vec<PageLink> {
    if total_pages == 0 {
        return Vec::new();
    }
    let current = current.max(1);
    let mut links = Vec::new();

    if current > 1 {
        links.push(PageLink::Previous((current - 1).min(total_pages)));
    }

    let mut last_shown = 0;
    for page in 1..=total_pages {
        let near = page.abs_diff(current) <= 1;
        if page == 1 || page == total_pages || near {
            if page > last_shown + 1 {
                links.push(PageLink::Gap);
            }
            links.push(PageLink::Number {
                page,
                current: page == current,
            });
            last_shown = page;
        }
    }

    if current < total_pages {
        links.push(PageLink::Next(current + 1));
    }
    links
}

#[cfg(test)]
#[path = "tests/pagination_tests.rs"]
mod tests;
