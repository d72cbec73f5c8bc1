use serde_derive::{Deserialize, Serialize};

use crate::config::Protocol;
use crate::raw_gitlab::RawProject;

/// Everything needed to clone a single repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneTarget {
    /// The project's full path (e.g. `org/team/service`).
    pub path: String,
    /// The canonical remote URL, never contains a token.
    pub url: String,
    /// The URL to actually clone from.
    pub clone_url: String,
}

impl CloneTarget {
    pub fn from_project(project: &RawProject, protocol: Protocol, token: &str) -> CloneTarget {
        let (url, clone_url) = match protocol {
            Protocol::Https => (
                project.http_url_to_repo.clone(),
                insert_credential(&project.http_url_to_repo, token),
            ),
            Protocol::Ssh => (
                project.ssh_url_to_repo.clone(),
                project.ssh_url_to_repo.clone(),
            ),
        };

        CloneTarget {
            path: project.path_with_namespace.clone(),
            url,
            clone_url,
        }
    }
}

/// Use `credential` as the userinfo part of a URL, replacing whatever was
/// there before (`https://host/path` becomes `https://credential@host/path`).
///
/// Everything else is left exactly as-is. URLs without a `scheme://` are
/// returned unchanged.
pub fn insert_credential(url: &str, credential: &str) -> String {
    let (scheme, rest) = match url.find("://") {
        Some(ix) => (&url[..ix + 3], &url[ix + 3..]),
        None => {
            warn!("Unable to add a token to \"{}\", it has no scheme", url);
            return url.to_string();
        }
    };

    let authority_end = rest.find(|c: char| c == '/' || c == '?' || c == '#').unwrap_or(rest.len());
    let (authority, path) = rest.split_at(authority_end);
    let host = match authority.rfind('@') {
        Some(ix) => &authority[ix + 1..],
        None => authority,
    };

    format!("{}{}@{}{}", scheme, credential, host, path)
}
