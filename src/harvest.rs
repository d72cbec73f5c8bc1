//! Stitching the listing, filtering, snapshotting and URL generation
//! together.

use failure::Fail;
use std::vec::IntoIter;

use crate::client::ProjectLister;
use crate::config::{ClonePolicy, Scope};
use crate::errors::HarvestError;
use crate::filter;
use crate::pagination::PageWalker;
use crate::raw_gitlab::RawProject;
use crate::snapshot::MetadataSink;
use crate::target::CloneTarget;

/// Finds the repositories in a group or user account.
pub struct Harvester<'a, L: ?Sized> {
    lister: &'a L,
    policy: &'a ClonePolicy,
    sink: Option<&'a dyn MetadataSink>,
}

impl<'a, L: ProjectLister + ?Sized> Harvester<'a, L> {
    pub fn new(lister: &'a L, policy: &'a ClonePolicy) -> Harvester<'a, L> {
        Harvester {
            lister,
            policy,
            sink: None,
        }
    }

    /// Save a snapshot of every project found while enumerating a group.
    pub fn with_snapshots(mut self, sink: &'a dyn MetadataSink) -> Harvester<'a, L> {
        self.sink = Some(sink);
        self
    }

    /// Lazily enumerate the clone targets for a scope, in the order GitLab
    /// returns them.
    ///
    /// Iteration stops after the first error.
    pub fn targets(&self, scope: &'a Scope) -> Targets<'a, L> {
        if scope.is_group() && self.policy.namespace_filter().is_none() {
            info!(
                "No namespace set, to reduce results use the namespace option (e.g. --namespace=gitlab-org/security-products)"
            );
        }

        // snapshots are only taken for groups
        let sink = if scope.is_group() { self.sink } else { None };

        Targets {
            pages: PageWalker::new(self.lister, scope),
            current: Vec::new().into_iter(),
            policy: self.policy,
            sink,
            scope,
            done: false,
        }
    }

    /// Collect every clone target for a scope.
    ///
    /// If any page can't be fetched you get the error and nothing else.
    pub fn harvest(&self, scope: &'a Scope) -> Result<Vec<CloneTarget>, HarvestError> {
        let targets = self.targets(scope).collect::<Result<Vec<_>, _>>()?;
        info!("Found {} projects for the {}", targets.len(), scope);

        Ok(targets)
    }
}

/// An iterator over the [`CloneTarget`]s in a scope.
pub struct Targets<'a, L: ?Sized> {
    pages: PageWalker<'a, L>,
    current: IntoIter<RawProject>,
    policy: &'a ClonePolicy,
    sink: Option<&'a dyn MetadataSink>,
    scope: &'a Scope,
    done: bool,
}

impl<'a, L: ProjectLister + ?Sized> Targets<'a, L> {
    fn process(&self, project: RawProject) -> Option<CloneTarget> {
        if !filter::is_wanted(&project, self.policy) {
            trace!("Skipping {}", project.path_with_namespace);
            return None;
        }

        if let Some(sink) = self.sink {
            if let Err(e) = sink.store(&project) {
                warn!("Unable to save a snapshot of {}, {}", project.path_with_namespace, e);
                for cause in (&e as &dyn Fail).iter_causes() {
                    warn!("\tCaused By: {}", cause);
                }
            }
        }

        if !self.scope.is_group() {
            debug!("Project Path: {}", project.path_with_namespace);
        }

        Some(CloneTarget::from_project(
            &project,
            self.policy.protocol,
            self.policy.token(),
        ))
    }
}

impl<'a, L: ProjectLister + ?Sized> Iterator for Targets<'a, L> {
    type Item = Result<CloneTarget, HarvestError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            while let Some(project) = self.current.next() {
                if let Some(target) = self.process(project) {
                    return Some(Ok(target));
                }
            }

            match self.pages.next() {
                Some(Ok(projects)) => self.current = projects.into_iter(),
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => {
                    self.done = true;
                    return None;
                }
            }
        }
    }
}
