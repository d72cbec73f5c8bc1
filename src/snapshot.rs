//! Saving the raw project records to disk.

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::SnapshotError;
use crate::raw_gitlab::RawProject;

/// Somewhere to stash a copy of each project we find.
pub trait MetadataSink {
    /// Save the project, returning where it ended up.
    fn store(&self, project: &RawProject) -> Result<PathBuf, SnapshotError>;
}

/// Writes each project to `{root}/{path_with_namespace}/{id}.json`.
///
/// A project always maps to the same file, so rerunning just overwrites the
/// previous snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct FsSnapshots {
    root: PathBuf,
}

impl FsSnapshots {
    pub fn new<P: Into<PathBuf>>(root: P) -> FsSnapshots {
        FsSnapshots { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn location(&self, project: &RawProject) -> PathBuf {
        self.root
            .join(&project.path_with_namespace)
            .join(format!("{}.json", project.id))
    }
}

impl MetadataSink for FsSnapshots {
    fn store(&self, project: &RawProject) -> Result<PathBuf, SnapshotError> {
        let dir = self.root.join(&project.path_with_namespace);
        fs::create_dir_all(&dir).map_err(|cause| SnapshotError::CreateDir {
            path: dir.display().to_string(),
            cause,
        })?;

        let filename = self.location(project);
        let contents = to_indented_json(project).map_err(|cause| SnapshotError::Serialize {
            path: filename.display().to_string(),
            cause,
        })?;

        trace!("Writing a snapshot to {}", filename.display());
        fs::write(&filename, contents).map_err(|cause| SnapshotError::Write {
            path: filename.display().to_string(),
            cause,
        })?;

        Ok(filename)
    }
}

/// Pretty-print with a single space of indentation.
fn to_indented_json<S: Serialize>(value: &S) -> Result<Vec<u8>, serde_json::Error> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b" ");
    let mut ser = Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut ser)?;

    Ok(buffer)
}
