//! Talking to the GitLab REST API.

use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{StatusCode, Url};
use serde_json::Value;
use std::fmt::{self, Debug, Formatter};

use crate::config::Scope;
use crate::errors::{FetchError, HarvestError};
use crate::pagination::{Page, PageCursor, PageInfo};
use crate::raw_gitlab::RawProject;

/// The API endpoint used when no base URL is given.
pub const DEFAULT_BASE_URL: &str = "https://gitlab.com/api/v4/";
const API_SUFFIX: &str = "api/v4/";
const TOKEN_HEADER: &str = "private-token";

/// Something which can list the projects in a [`Scope`], one page at a
/// time.
pub trait ProjectLister {
    fn list(&self, scope: &Scope, cursor: PageCursor) -> Result<Page, FetchError>;
}

/// A GitLab API client bound to a particular instance and token.
#[derive(Clone)]
pub struct GitLabClient {
    client: Client,
    base_url: Url,
    headers: HeaderMap,
    token: String,
}

impl GitLabClient {
    /// Create a client for `base_url` (or gitlab.com if `None`).
    ///
    /// This only validates its inputs, no requests are sent.
    pub fn new(base_url: Option<&str>, token: &str) -> Result<GitLabClient, HarvestError> {
        let base_url = match base_url.map(str::trim) {
            Some(url) if !url.is_empty() => normalize_base_url(url)?,
            _ => Url::parse(DEFAULT_BASE_URL).map_err(|e| {
                HarvestError::client_construction(format!("Invalid default URL, {}", e))
            })?,
        };

        if token.is_empty() {
            warn!("No GitLab token provided, only public projects will be visible");
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("gitlab-harvest/", env!("CARGO_PKG_VERSION"))),
        );
        let mut token_value = HeaderValue::from_str(token).map_err(|_| {
            HarvestError::client_construction("The token contains invalid characters")
        })?;
        token_value.set_sensitive(true);
        headers.insert(TOKEN_HEADER, token_value);

        let client = Client::builder().build().map_err(|e| {
            HarvestError::client_construction(format!("Unable to initialize the HTTP client, {}", e))
        })?;

        debug!("Created a GitLab client for {}", base_url);

        Ok(GitLabClient {
            client,
            base_url,
            headers,
            token: token.to_string(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The URL for one page of a listing.
    pub fn listing_url(&self, scope: &Scope, cursor: PageCursor) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();

        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| FetchError::BadUrl(self.base_url.to_string()))?;
            segments.pop_if_empty();

            match *scope {
                Scope::Group(ref group) => segments.extend(&["groups", group.as_str(), "projects"]),
                Scope::User(ref user) => segments.extend(&["users", user.as_str(), "projects"]),
            };
        }

        {
            let mut query = url.query_pairs_mut();
            if scope.is_group() {
                query.append_pair("include_subgroups", "true");
            }
            query
                .append_pair("per_page", &cursor.per_page.to_string())
                .append_pair("page", &cursor.page.to_string());
        }

        Ok(url)
    }

    fn send_request(&self, url: Url) -> Result<Response, FetchError> {
        debug!("Sending request to {}", url);

        let request = self
            .client
            .get(url.clone())
            .headers(self.headers.clone())
            .build()?;

        if log_enabled!(::log::Level::Trace) {
            let mut redacted_header = format!("Request Headers {:#?}", request.headers());
            if !self.token.is_empty() {
                redacted_header = redacted_header.replace(&self.token, "XXXXXXXXXX");
            }

            for line in redacted_header.lines() {
                trace!("{}", line);
            }
        }

        let response = self.client.execute(request)?;
        let status = response.status();
        debug!("Received response ({})", status);

        if log_enabled!(::log::Level::Trace) {
            for line in format!("Response Headers {:#?}", response.headers()).lines() {
                trace!("{}", line);
            }
        }

        Ok(response)
    }
}

impl Debug for GitLabClient {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("GitLabClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl ProjectLister for GitLabClient {
    fn list(&self, scope: &Scope, cursor: PageCursor) -> Result<Page, FetchError> {
        let url = self.listing_url(scope, cursor)?;
        let response = self.send_request(url.clone())?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes()?;

        read_page(&url, status, &headers, &body, cursor)
    }
}

/// Turn a listing response into a [`Page`].
pub fn read_page(
    url: &Url,
    status: StatusCode,
    headers: &HeaderMap,
    body: &[u8],
    cursor: PageCursor,
) -> Result<Page, FetchError> {
    if !status.is_success() {
        warn!("Request failed with {}", status);
        return Err(FetchError::BadStatus {
            status,
            url: url.to_string(),
        });
    }

    let info = page_info(headers, cursor);
    let body: Vec<Value> = serde_json::from_slice(body)?;
    let projects = body
        .into_iter()
        .map(RawProject::from_value)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Page { projects, info })
}

/// Make sure a user-provided URL points at the v4 API and ends in a slash.
fn normalize_base_url(raw: &str) -> Result<Url, HarvestError> {
    let mut url = raw.to_string();

    if !url.ends_with('/') {
        url.push('/');
    }
    if !url.ends_with(API_SUFFIX) {
        url.push_str(API_SUFFIX);
    }

    let parsed = Url::parse(&url).map_err(|e| {
        HarvestError::client_construction(format!("Invalid base URL \"{}\", {}", raw, e))
    })?;

    if parsed.cannot_be_a_base() {
        return Err(HarvestError::client_construction(format!(
            "\"{}\" can't be used as a base URL",
            raw
        )));
    }

    Ok(parsed)
}

/// Read GitLab's `X-Page`, `X-Total-Pages` and `X-Next-Page` headers.
///
/// Missing or garbled headers are treated as absent rather than as an
/// error.
pub fn page_info(headers: &HeaderMap, cursor: PageCursor) -> PageInfo {
    PageInfo {
        current_page: numeric_header(headers, "x-page").unwrap_or(cursor.page),
        total_pages: numeric_header(headers, "x-total-pages"),
        next_page: numeric_header(headers, "x-next-page"),
    }
}

fn numeric_header(headers: &HeaderMap, name: &str) -> Option<u32> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .and_then(|value| value.parse().ok())
}
