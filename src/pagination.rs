//! Page-number pagination for dashboard list views.

use sea_orm::{ConnectionTrait, PaginatorTrait, SelectorTrait};

use crate::errors::ServiceError;

/// One page of a paginated query.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub pages: u64,
}

impl<T> Page<T> {
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.pages
    }

    pub fn prev_num(&self) -> Option<u64> {
        self.has_prev().then(|| self.page - 1)
    }

    pub fn next_num(&self) -> Option<u64> {
        self.has_next().then(|| self.page + 1)
    }

    /// Page numbers to show in a pager; `None` marks a gap.
    pub fn iter_pages(&self) -> Vec<Option<u64>> {
        self.iter_pages_with(2, 2, 5, 2)
    }

    pub fn iter_pages_with(
        &self,
        left_edge: u64,
        left_current: u64,
        right_current: u64,
        right_edge: u64,
    ) -> Vec<Option<u64>> {
        let mut out = Vec::new();
        let mut last = 0;
        for num in 1..=self.pages {
            let near_current = num + left_current + 1 > self.page && num < self.page + right_current;
            if num <= left_edge || near_current || num + right_edge > self.pages {
                if last + 1 != num {
                    out.push(None);
                }
                out.push(Some(num));
                last = num;
            }
        }
        out
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            pages: self.pages,
        }
    }
}

/// Reads the `page` query value. Missing or non-numeric values mean page 1.
pub fn parse_page(raw: Option<&str>) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok()).unwrap_or(1)
}

/// Fetches page `page` (1-based) of `select`.
///
/// Pages below 1 and pages past the last are `NotFound`; an empty result
/// still has a page 1.
pub async fn paginate<'db, C, S>(
    db: &'db C,
    select: S,
    page: i64,
    per_page: u64,
) -> Result<Page<<S::Selector as SelectorTrait>::Item>, ServiceError>
where
    C: ConnectionTrait,
    S: PaginatorTrait<'db, C>,
{
    if page < 1 {
        return Err(ServiceError::NotFound(format!("Page {page} not found")));
    }
    let page = page as u64;
    let per_page = per_page.max(1);

    let paginator = select.paginate(db, per_page);
    let counts = paginator.num_items_and_pages().await?;
    if page > counts.number_of_pages.max(1) {
        return Err(ServiceError::NotFound(format!("Page {page} not found")));
    }
    let items = paginator.fetch_page(page - 1).await?;

    Ok(Page {
        items,
        page,
        per_page,
        total: counts.number_of_items,
        pages: counts.number_of_pages,
    })
}
