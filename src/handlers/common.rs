use askama::Template;
use axum::response::{Html, IntoResponse, Redirect, Response};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use url::form_urlencoded;

use crate::errors::ServiceError;
use crate::pagination::{parse_page, Page};

/// Prefix every dashboard route is nested under.
pub const DASHBOARD: &str = "/dashboard";

pub type HtmlResult = Result<Response, ServiceError>;

/// Renders a template into an HTML response.
pub fn render<T: Template>(template: &T) -> HtmlResult {
    Ok(Html(template.render()?).into_response())
}

/// `303 See Other` to a dashboard path.
pub fn see_other(path: &str) -> Response {
    Redirect::to(&format!("{DASHBOARD}{path}")).into_response()
}

/// The `page` query value, 1 when missing or garbage.
pub fn page_param(params: &HashMap<String, String>) -> i64 {
    parse_page(params.get("page").map(String::as_str))
}

/// Lenient integer query value; empty or garbage reads as absent.
pub fn int_param(params: &HashMap<String, String>, key: &str) -> Option<i32> {
    params.get(key).and_then(|v| v.trim().parse().ok())
}

pub fn heading(id: Option<i32>, noun: &str) -> String {
    match id {
        Some(_) => format!("Edit {noun}"),
        None => format!("Create {noun}"),
    }
}

/// Form target: `/{base}/create` or `/{base}/{id}/edit`.
pub fn manage_url(base: &str, id: Option<i32>) -> String {
    match id {
        Some(id) => format!("{DASHBOARD}/{base}/{id}/edit"),
        None => format!("{DASHBOARD}/{base}/create"),
    }
}

pub fn format_datetime(value: &DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M").to_string()
}

pub fn yes_no(value: bool) -> String {
    if value { "Yes" } else { "No" }.to_string()
}

/// One entry of a pager. Gaps have no url.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    pub number: u64,
    pub url: String,
    pub current: bool,
    pub gap: bool,
}

/// Pager links for a list page, carrying the list's other query parameters along.
#[derive(Debug, Clone, Default)]
pub struct Pager {
    pub links: Vec<PageLink>,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
    pub total: u64,
}

impl Pager {
    pub fn new<T>(page: &Page<T>, path: &str, params: &HashMap<String, String>) -> Self {
        let mut kept: Vec<(&str, &str)> = params
            .iter()
            .filter(|(k, v)| k.as_str() != "page" && !v.trim().is_empty())
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        kept.sort_unstable();

        let path = format!("{DASHBOARD}{path}");
        let url = |number: u64| page_url(&path, &kept, number);

        let links = page
            .iter_pages()
            .into_iter()
            .map(|entry| match entry {
                Some(number) => PageLink {
                    number,
                    url: url(number),
                    current: number == page.page,
                    gap: false,
                },
                None => PageLink {
                    number: 0,
                    url: String::new(),
                    current: false,
                    gap: true,
                },
            })
            .collect();

        Self {
            links,
            prev_url: page.prev_num().map(url),
            next_url: page.next_num().map(url),
            total: page.total,
        }
    }
}

fn page_url(path: &str, params: &[(&str, &str)], page: u64) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        query.append_pair(key, value);
    }
    query.append_pair("page", &page.to_string());
    format!("{path}?{}", query.finish())
}

/// A row of the generic list table.
#[derive(Debug, Clone)]
pub struct ListRow {
    pub id: i32,
    pub cells: Vec<String>,
}

/// Generic paginated table with create, edit and delete links under `/dashboard/{base}`.
#[derive(Template)]
#[template(path = "list.html")]
pub struct ListTemplate {
    pub title: &'static str,
    pub base: &'static str,
    pub columns: &'static [&'static str],
    pub rows: Vec<ListRow>,
    pub pager: Pager,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(page: u64, pages: u64) -> Page<()> {
        Page {
            items: Vec::new(),
            page,
            per_page: 10,
            total: pages * 10,
            pages,
        }
    }

    #[test]
    fn pager_keeps_filters_and_drops_page() {
        let params: HashMap<String, String> = [
            ("page", "2"),
            ("title", "red shoe"),
            ("sale", "1"),
            ("category", ""),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let pager = Pager::new(&page(2, 3), "/products", &params);
        assert_eq!(
            pager.prev_url.as_deref(),
            Some("/dashboard/products?sale=1&title=red+shoe&page=1")
        );
        assert_eq!(
            pager.next_url.as_deref(),
            Some("/dashboard/products?sale=1&title=red+shoe&page=3")
        );
        assert_eq!(pager.links.len(), 3);
        assert!(pager.links[1].current);
    }

    #[test]
    fn pager_marks_gaps() {
        let pager = Pager::new(&page(1, 20), "/attributes", &HashMap::new());
        assert!(pager.prev_url.is_none());
        assert!(pager.links.iter().any(|l| l.gap));
        assert_eq!(pager.links.first().map(|l| l.number), Some(1));
        assert_eq!(pager.links.last().map(|l| l.number), Some(20));
    }

    #[test]
    fn lenient_query_integers() {
        let params: HashMap<String, String> = [("product_id", " 7 "), ("page", "x")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(int_param(&params, "product_id"), Some(7));
        assert_eq!(int_param(&params, "missing"), None);
        assert_eq!(page_param(&params), 1);
    }
}
