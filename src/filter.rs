use crate::config::ClonePolicy;
use crate::raw_gitlab::RawProject;

/// Should this project be kept?
///
/// Each project is judged on its own, nothing is remembered between calls.
pub fn is_wanted(project: &RawProject, policy: &ClonePolicy) -> bool {
    in_namespace(project, policy) && !skipped_as_archived(project, policy)
}

fn in_namespace(project: &RawProject, policy: &ClonePolicy) -> bool {
    match policy.namespace_filter() {
        Some(namespace) => project
            .path_with_namespace
            .to_lowercase()
            .starts_with(&namespace.to_lowercase()),
        None => true,
    }
}

fn skipped_as_archived(project: &RawProject, policy: &ClonePolicy) -> bool {
    policy.skip_archived && project.archived
}
