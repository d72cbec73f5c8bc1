//! Find every repository in a GitLab group (or under a user account) and
//! work out how each one should be cloned.
//!
//! The general flow is:
//!
//! 1. Build a [`GitLabClient`] from the token and (optional) base URL
//! 2. Walk each page of the group/user project listing
//! 3. Throw away anything the [`ClonePolicy`] says we aren't interested in
//! 4. Save a snapshot of each group project's raw JSON (best effort)
//! 5. Turn the remaining projects into [`CloneTarget`]s
//!
//! Actually cloning the repositories is left to the caller.

#[macro_use]
extern crate log;

pub mod client;
pub mod config;
pub mod errors;
pub mod filter;
pub mod harvest;
pub mod pagination;
pub mod raw_gitlab;
pub mod snapshot;
pub mod target;

pub use crate::client::{GitLabClient, ProjectLister, DEFAULT_BASE_URL};
pub use crate::config::{ClonePolicy, Protocol, Scope};
pub use crate::errors::{FetchError, HarvestError, SnapshotError};
pub use crate::harvest::{Harvester, Targets};
pub use crate::pagination::{Page, PageCursor, PageInfo, PageWalker};
pub use crate::raw_gitlab::RawProject;
pub use crate::snapshot::{FsSnapshots, MetadataSink};
pub use crate::target::{insert_credential, CloneTarget};
