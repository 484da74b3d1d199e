//! Page-number pagination: `?page=N&limit=M`.

use url::Url;

use crate::error::PaginationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSettings {
    /// Page size used when `limit` is absent or unparseable.
    pub default_size: i64,
    /// Upper bound for a client-supplied `limit`.
    pub max_size: i64,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            default_size: 6,
            max_size: 50,
        }
    }
}

/// A requested page, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: i64,
    pub size: i64,
}

/// Links and total count for one page of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMeta {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
}

impl PageRequest {
    /// Interpret raw `page` / `limit` query values.
    ///
    /// A bad `limit` falls back to the default size and an oversized one is
    /// capped. A `page` that is not a positive integer is rejected.
    pub fn parse(
        page: Option<&str>,
        limit: Option<&str>,
        settings: &PageSettings,
    ) -> Result<Self, PaginationError> {
        let size = limit
            .and_then(|l| l.trim().parse::<i64>().ok())
            .filter(|l| *l > 0)
            .map(|l| l.min(settings.max_size))
            .unwrap_or(settings.default_size);

        let number = match page.map(str::trim) {
            None | Some("") => 1,
            Some("last") => i64::MAX,
            Some(p) => p
                .parse::<i64>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(PaginationError::InvalidPage)?,
        };

        Ok(Self { number, size })
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1).saturating_mul(self.size)
    }

    pub fn limit(&self) -> i64 {
        self.size
    }

    /// Resolve `last` and check the page exists for a listing of `count` rows.
    /// The first page always exists, even when the listing is empty.
    pub fn resolve(self, count: i64) -> Result<Self, PaginationError> {
        let pages = num_pages(count, self.size);
        let number = if self.number == i64::MAX {
            pages
        } else {
            self.number
        };
        if number > pages {
            return Err(PaginationError::InvalidPage);
        }
        Ok(Self { number, ..self })
    }

    /// Count and neighbour links for this page, built from the current URL so
    /// that other query parameters are preserved.
    pub fn meta(&self, count: i64, current: &Url) -> PageMeta {
        let pages = num_pages(count, self.size);
        let next = (self.number < pages).then(|| page_url(current, self.number + 1));
        let previous = (self.number > 1).then(|| page_url(current, self.number - 1));
        PageMeta {
            count,
            next,
            previous,
        }
    }
}

pub fn num_pages(count: i64, size: i64) -> i64 {
    if count <= 0 || size <= 0 {
        return 1;
    }
    (count + size - 1) / size
}

/// `current` with its `page` parameter replaced. Page 1 drops the parameter.
pub fn page_url(current: &Url, page: i64) -> String {
    let kept: Vec<(String, String)> = current
        .query_pairs()
        .filter(|(k, _)| k != "page")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut url = current.clone();
    if kept.is_empty() && page <= 1 {
        url.set_query(None);
        return url.to_string();
    }

    {
        let mut query = url.query_pairs_mut();
        query.clear();
        query.extend_pairs(kept.iter());
        if page > 1 {
            query.append_pair("page", &page.to_string());
        }
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_defaults() {
        let req = PageRequest::parse(None, None, &PageSettings::default()).unwrap();
        assert_eq!(req, PageRequest { number: 1, size: 6 });
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn test_limit_is_capped_and_bad_limit_ignored() {
        let settings = PageSettings::default();
        assert_eq!(
            PageRequest::parse(None, Some("500"), &settings).unwrap().size,
            50
        );
        assert_eq!(
            PageRequest::parse(None, Some("abc"), &settings).unwrap().size,
            6
        );
        assert_eq!(
            PageRequest::parse(None, Some("0"), &settings).unwrap().size,
            6
        );
    }

    #[test]
    fn test_bad_page_is_rejected() {
        let settings = PageSettings::default();
        assert_eq!(
            PageRequest::parse(Some("abc"), None, &settings),
            Err(PaginationError::InvalidPage)
        );
        assert_eq!(
            PageRequest::parse(Some("0"), None, &settings),
            Err(PaginationError::InvalidPage)
        );
    }

    #[test]
    fn test_sixteen_users_first_page() {
        let req = PageRequest::parse(None, None, &PageSettings::default())
            .unwrap()
            .resolve(16)
            .unwrap();
        assert_eq!((req.offset(), req.limit()), (0, 6));

        let meta = req.meta(16, &url("http://testserver/api/users/"));
        assert_eq!(meta.count, 16);
        assert_eq!(
            meta.next.as_deref(),
            Some("http://testserver/api/users/?page=2")
        );
        assert_eq!(meta.previous, None);
    }

    #[test]
    fn test_last_page_links() {
        let req = PageRequest::parse(Some("3"), None, &PageSettings::default())
            .unwrap()
            .resolve(16)
            .unwrap();
        assert_eq!(req.offset(), 12);

        let meta = req.meta(16, &url("http://testserver/api/users/?page=3"));
        assert_eq!(meta.next, None);
        assert_eq!(
            meta.previous.as_deref(),
            Some("http://testserver/api/users/?page=2")
        );
    }

    #[test]
    fn test_previous_link_to_first_page_drops_page_param() {
        let req = PageRequest::parse(Some("2"), None, &PageSettings::default())
            .unwrap()
            .resolve(16)
            .unwrap();
        let meta = req.meta(
            16,
            &url("http://testserver/api/recipes/?author=3&page=2"),
        );
        assert_eq!(
            meta.previous.as_deref(),
            Some("http://testserver/api/recipes/?author=3")
        );
        assert_eq!(
            meta.next.as_deref(),
            Some("http://testserver/api/recipes/?author=3&page=3")
        );
    }

    #[test]
    fn test_page_past_the_end() {
        let req = PageRequest::parse(Some("4"), None, &PageSettings::default()).unwrap();
        assert_eq!(req.resolve(16), Err(PaginationError::InvalidPage));
    }

    #[test]
    fn test_empty_listing_has_one_page() {
        let req = PageRequest::parse(None, None, &PageSettings::default())
            .unwrap()
            .resolve(0)
            .unwrap();
        let meta = req.meta(0, &url("http://testserver/api/users/"));
        assert_eq!((meta.count, meta.next, meta.previous), (0, None, None));
    }

    #[test]
    fn test_last_resolves_to_final_page() {
        let req = PageRequest::parse(Some("last"), Some("5"), &PageSettings::default())
            .unwrap()
            .resolve(11)
            .unwrap();
        assert_eq!(req.number, 3);
    }
}
