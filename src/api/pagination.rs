use axum::http::Uri;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use super::{ApiError, InvalidPageSnafu};

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 20;

const PAGE_PARAM: &str = "page";

/// Raw paging query parameters. Kept as text so that junk values fall back to defaults
/// instead of failing the whole request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

impl PageParams {
    pub fn page_size(&self) -> usize {
        self.page_size
            .as_deref()
            .and_then(|size| size.trim().parse::<usize>().ok())
            .filter(|&size| size > 0)
            .map_or(DEFAULT_PAGE_SIZE, |size| size.min(MAX_PAGE_SIZE))
    }

    /// The requested 1-based page number, given the total number of pages.
    pub fn page_number(&self, page_count: usize) -> Result<usize, ApiError> {
        let number = match self.page.as_deref().map(str::trim) {
            None => 1,
            Some("last") => page_count,
            Some(text) => text
                .parse::<usize>()
                .ok()
                .filter(|&number| number >= 1)
                .ok_or_else(|| InvalidPageSnafu.build())?,
        };

        if number > page_count {
            return InvalidPageSnafu.fail();
        }

        Ok(number)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// Builds links to sibling pages of the current request.
#[derive(Debug, Clone)]
pub struct PageLinks {
    base: String,
    query: Vec<(String, String)>,
}

impl PageLinks {
    /// `host` makes the links absolute.
    pub fn new(uri: &Uri, host: Option<&str>) -> Self {
        let base = match host {
            Some(host) => format!("http://{host}{}", uri.path()),
            None => uri.path().to_string(),
        };

        let query = form_urlencoded::parse(uri.query().unwrap_or_default().as_bytes())
            .filter(|(key, _)| key != PAGE_PARAM)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        Self { base, query }
    }

    /// The link to the first page carries no `page` parameter at all.
    pub fn to_page(&self, number: usize) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        serializer.extend_pairs(&self.query);
        if number > 1 {
            serializer.append_pair(PAGE_PARAM, &number.to_string());
        }

        let query = serializer.finish();
        if query.is_empty() {
            self.base.clone()
        } else {
            format!("{}?{query}", self.base)
        }
    }
}

/// Cuts one page out of `items`.
pub fn paginate<T>(
    items: Vec<T>, params: &PageParams, links: &PageLinks,
) -> Result<Page<T>, ApiError> {
    let count = items.len();
    let size = params.page_size();
    let page_count = count.div_ceil(size).max(1);
    let number = params.page_number(page_count)?;

    let results = items
        .into_iter()
        .skip((number - 1) * size)
        .take(size)
        .collect();

    Ok(Page {
        count,
        next: (number < page_count).then(|| links.to_page(number + 1)),
        previous: (number > 1).then(|| links.to_page(number - 1)),
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: Option<&str>, page_size: Option<&str>) -> PageParams {
        PageParams {
            page: page.map(str::to_string),
            page_size: page_size.map(str::to_string),
        }
    }

    fn links(uri: &str) -> PageLinks {
        PageLinks::new(&uri.parse::<Uri>().unwrap(), Some("testserver"))
    }

    #[test]
    fn page_size_is_capped_and_defaulted() {
        assert_eq!(params(None, None).page_size(), 20);
        assert_eq!(params(None, Some("5")).page_size(), 5);
        assert_eq!(params(None, Some("50")).page_size(), 20);
        assert_eq!(params(None, Some("0")).page_size(), 20);
        assert_eq!(params(None, Some("-3")).page_size(), 20);
        assert_eq!(params(None, Some("lots")).page_size(), 20);
    }

    #[test]
    fn first_page_of_many() {
        let items: Vec<u32> = (0..45).collect();
        let page = paginate(items, &params(None, None), &links("/users/1/latest")).unwrap();

        assert_eq!(page.count, 45);
        assert_eq!(page.results, (0..20).collect::<Vec<_>>());
        assert_eq!(page.next.as_deref(), Some("http://testserver/users/1/latest?page=2"));
        assert_eq!(page.previous, None);
    }

    #[test]
    fn middle_page_links_both_ways() {
        let items: Vec<u32> = (0..45).collect();
        let page = paginate(
            items,
            &params(Some("2"), Some("20")),
            &links("/users/1/latest?page=2&page_size=20"),
        )
        .unwrap();

        assert_eq!(page.results, (20..40).collect::<Vec<_>>());
        assert_eq!(
            page.next.as_deref(),
            Some("http://testserver/users/1/latest?page_size=20&page=3")
        );
        assert_eq!(
            page.previous.as_deref(),
            Some("http://testserver/users/1/latest?page_size=20")
        );
    }

    #[test]
    fn last_page_by_name() {
        let items: Vec<u32> = (0..45).collect();
        let page = paginate(items, &params(Some("last"), None), &links("/x")).unwrap();

        assert_eq!(page.results, (40..45).collect::<Vec<_>>());
        assert_eq!(page.next, None);
    }

    #[test]
    fn out_of_range_pages_are_rejected() {
        for page in ["0", "4", "abc", "-1"] {
            let items: Vec<u32> = (0..45).collect();
            let result = paginate(items, &params(Some(page), None), &links("/x"));
            assert!(
                matches!(result, Err(ApiError::InvalidPage { .. })),
                "page {page} should be invalid"
            );
        }
    }

    #[test]
    fn relative_links_without_host() {
        let links = PageLinks::new(&"/x?page=3".parse::<Uri>().unwrap(), None);
        assert_eq!(links.to_page(1), "/x");
        assert_eq!(links.to_page(2), "/x?page=2");
    }
}
