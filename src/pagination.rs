use crate::client::ProjectLister;
use crate::config::Scope;
use crate::errors::HarvestError;
use crate::raw_gitlab::RawProject;

/// How many projects to ask for in each request.
pub const DEFAULT_PER_PAGE: u32 = 50;

/// Which page to ask for next.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PageCursor {
    pub per_page: u32,
    pub page: u32,
}

impl Default for PageCursor {
    fn default() -> PageCursor {
        PageCursor {
            per_page: DEFAULT_PER_PAGE,
            page: 1,
        }
    }
}

/// The pagination details GitLab sends back alongside each page.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct PageInfo {
    pub current_page: u32,
    /// Not sent for very large collections.
    pub total_pages: Option<u32>,
    pub next_page: Option<u32>,
}

impl PageInfo {
    /// Have we seen every page?
    pub fn is_last(&self) -> bool {
        match self.total_pages {
            Some(total) => self.current_page >= total,
            None => self.next_page.is_none(),
        }
    }

    /// The page to request after this one, or `None` once every page has
    /// been seen.
    ///
    /// Pages are always visited one after the other. `next_page` only decides
    /// whether there is another page when the total isn't known.
    pub fn following(&self) -> Option<u32> {
        if self.is_last() {
            None
        } else {
            self.current_page.checked_add(1)
        }
    }
}

/// A single page of projects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub projects: Vec<RawProject>,
    pub info: PageInfo,
}

/// An iterator which keeps requesting pages until GitLab says there are
/// none left.
///
/// The first error is yielded and then the walker is finished, there's no
/// way to resume part way through.
pub struct PageWalker<'a, L: ?Sized> {
    lister: &'a L,
    scope: &'a Scope,
    cursor: Option<PageCursor>,
}

impl<'a, L: ProjectLister + ?Sized> PageWalker<'a, L> {
    pub fn new(lister: &'a L, scope: &'a Scope) -> PageWalker<'a, L> {
        PageWalker {
            lister,
            scope,
            cursor: Some(PageCursor::default()),
        }
    }

    fn fetch(&mut self, cursor: PageCursor) -> Result<Vec<RawProject>, HarvestError> {
        info!("Getting GitLab project information...");
        debug!("Requesting page {} for the {}", cursor.page, self.scope);

        let Page { projects, info } = self
            .lister
            .list(self.scope, cursor)
            .map_err(|cause| HarvestError::PageFetch {
                scope: self.scope.name().to_string(),
                page: cursor.page,
                cause,
            })?;

        trace!(
            "Received {} projects (page {} of {:?})",
            projects.len(),
            info.current_page,
            info.total_pages
        );

        self.cursor = info.following().map(|page| PageCursor { page, ..cursor });

        Ok(projects)
    }
}

impl<'a, L: ProjectLister + ?Sized> Iterator for PageWalker<'a, L> {
    type Item = Result<Vec<RawProject>, HarvestError>;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor.take()?;
        Some(self.fetch(cursor))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::errors::FetchError;
    use reqwest::StatusCode;
    use serde_json::json;
    use std::cell::RefCell;

    /// A lister which serves canned pages and remembers what was asked for.
    pub(crate) struct MockLister {
        pages: Vec<Vec<RawProject>>,
        fail_on: Option<u32>,
        next_page: fn(u32) -> Option<u32>,
        pub(crate) requests: RefCell<Vec<(Scope, PageCursor)>>,
    }

    impl MockLister {
        pub(crate) fn new(pages: Vec<Vec<RawProject>>) -> MockLister {
            MockLister {
                pages,
                fail_on: None,
                next_page: |current| Some(current + 1),
                requests: RefCell::new(Vec::new()),
            }
        }

        pub(crate) fn failing_on(mut self, page: u32) -> MockLister {
            self.fail_on = Some(page);
            self
        }

        fn with_next_page(mut self, next_page: fn(u32) -> Option<u32>) -> MockLister {
            self.next_page = next_page;
            self
        }

        pub(crate) fn pages_requested(&self) -> Vec<u32> {
            self.requests.borrow().iter().map(|(_, c)| c.page).collect()
        }
    }

    impl ProjectLister for MockLister {
        fn list(&self, scope: &Scope, cursor: PageCursor) -> Result<Page, FetchError> {
            self.requests.borrow_mut().push((scope.clone(), cursor));

            if self.fail_on == Some(cursor.page) {
                return Err(FetchError::BadStatus {
                    status: StatusCode::NOT_FOUND,
                    url: format!("mock://{}?page={}", scope.name(), cursor.page),
                });
            }

            let total = self.pages.len() as u32;
            let projects = self
                .pages
                .get(cursor.page as usize - 1)
                .cloned()
                .unwrap_or_default();
            let next_page = if cursor.page < total {
                (self.next_page)(cursor.page)
            } else {
                None
            };

            Ok(Page {
                projects,
                info: PageInfo {
                    current_page: cursor.page,
                    total_pages: Some(total),
                    next_page,
                },
            })
        }
    }

    pub(crate) fn project(id: u64, path: &str, archived: bool) -> RawProject {
        RawProject::from_value(json!({
            "id": id,
            "path_with_namespace": path,
            "archived": archived,
            "http_url_to_repo": format!("https://gitlab.com/{}.git", path),
            "ssh_url_to_repo": format!("git@gitlab.com:{}.git", path),
        }))
        .unwrap()
    }

    fn numbered_pages(count: usize) -> Vec<Vec<RawProject>> {
        (0..count)
            .map(|i| vec![project(i as u64, &format!("org/repo-{}", i), false)])
            .collect()
    }

    #[test]
    fn visit_every_page_in_order() {
        let lister = MockLister::new(numbered_pages(3));
        let scope = Scope::Group(String::from("org"));

        let pages: Vec<_> = PageWalker::new(&lister, &scope)
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(pages.len(), 3);
        assert_eq!(lister.pages_requested(), vec![1, 2, 3]);
        assert!(lister
            .requests
            .borrow()
            .iter()
            .all(|(_, c)| c.per_page == DEFAULT_PER_PAGE));
    }

    #[test]
    fn missing_next_page_still_moves_forward() {
        let lister = MockLister::new(numbered_pages(3)).with_next_page(|_| None);
        let scope = Scope::User(String::from("someone"));

        let pages = PageWalker::new(&lister, &scope).count();

        assert_eq!(pages, 3);
        assert_eq!(lister.pages_requested(), vec![1, 2, 3]);
    }

    #[test]
    fn a_single_page_is_a_single_request() {
        let lister = MockLister::new(Vec::new());
        let scope = Scope::Group(String::from("empty"));

        let pages: Vec<_> = PageWalker::new(&lister, &scope)
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(pages, vec![Vec::new()]);
        assert_eq!(lister.pages_requested(), vec![1]);
    }

    #[test]
    fn stop_at_the_first_error() {
        let lister = MockLister::new(numbered_pages(4)).failing_on(2);
        let scope = Scope::Group(String::from("org"));
        let mut walker = PageWalker::new(&lister, &scope);

        assert!(walker.next().unwrap().is_ok());
        match walker.next() {
            Some(Err(HarvestError::PageFetch { page, .. })) => assert_eq!(page, 2),
            other => panic!("Expected a page fetch error, got {:?}", other),
        }
        assert!(walker.next().is_none());
        assert_eq!(lister.pages_requested(), vec![1, 2]);
    }

    #[test]
    fn skipping_next_page_values_are_ignored() {
        let lister = MockLister::new(numbered_pages(3)).with_next_page(|current| Some(current + 2));
        let scope = Scope::Group(String::from("org"));

        let pages = PageWalker::new(&lister, &scope).count();

        assert_eq!(pages, 3);
        assert_eq!(lister.pages_requested(), vec![1, 2, 3]);
    }

    #[test]
    fn when_total_pages_is_unknown_follow_next_page() {
        let mut info = PageInfo {
            current_page: 7,
            total_pages: None,
            next_page: Some(8),
        };
        assert!(!info.is_last());
        assert_eq!(info.following(), Some(8));

        info.next_page = None;
        assert!(info.is_last());
        assert_eq!(info.following(), None);
    }

    #[test]
    fn the_largest_page_number_is_the_last() {
        let info = PageInfo {
            current_page: u32::MAX,
            total_pages: None,
            next_page: Some(5),
        };

        assert_eq!(info.following(), None);
    }
}
