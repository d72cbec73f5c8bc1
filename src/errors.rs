//! The errors encountered in this crate.

use failure::Fail;
use reqwest::StatusCode;
use std::io;

/// Something went wrong while enumerating projects. Either of these aborts
/// the whole enumeration.
#[derive(Debug, Fail)]
pub enum HarvestError {
    /// The token or base URL were rejected before we ever hit the network.
    #[fail(display = "Unable to create a GitLab client: {}", reason)]
    ClientConstruction { reason: String },
    /// Fetching one of the listing pages failed.
    #[fail(display = "Unable to fetch page {} of the projects for {}", page, scope)]
    PageFetch {
        scope: String,
        page: u32,
        #[cause]
        cause: FetchError,
    },
}

impl HarvestError {
    pub(crate) fn client_construction<S: Into<String>>(reason: S) -> HarvestError {
        HarvestError::ClientConstruction {
            reason: reason.into(),
        }
    }
}

/// The reason a single listing request failed.
///
/// A "404 Not Found" (the group or user doesn't exist) isn't given its own
/// variant, if you care about it then look at the status in
/// [`FetchError::BadStatus`].
#[derive(Debug, Fail)]
pub enum FetchError {
    #[fail(display = "Unable to send the request")]
    Http(#[cause] reqwest::Error),
    #[fail(display = "Request to {} failed with {}", url, status)]
    BadStatus { status: StatusCode, url: String },
    #[fail(display = "Unable to deserialize the response")]
    Decode(#[cause] serde_json::Error),
    #[fail(display = "Unable to build a request URL for \"{}\"", _0)]
    BadUrl(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(other: reqwest::Error) -> FetchError {
        FetchError::Http(other)
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(other: serde_json::Error) -> FetchError {
        FetchError::Decode(other)
    }
}

/// Saving a project snapshot failed. This is only ever logged, it never
/// stops the enumeration.
#[derive(Debug, Fail)]
pub enum SnapshotError {
    #[fail(display = "Unable to create the snapshot directory ({})", path)]
    CreateDir {
        path: String,
        #[cause]
        cause: io::Error,
    },
    #[fail(display = "Unable to serialize the snapshot for {}", path)]
    Serialize {
        path: String,
        #[cause]
        cause: serde_json::Error,
    },
    #[fail(display = "Unable to write the snapshot ({})", path)]
    Write {
        path: String,
        #[cause]
        cause: io::Error,
    },
}
