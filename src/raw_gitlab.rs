//! The project records returned by the GitLab API.

use serde::de::{Deserialize, Deserializer, Error as DeError};
use serde::ser::{Serialize, Serializer};
use serde_derive::Deserialize;
use serde_json::Value;

/// A project exactly as GitLab gave it to us.
///
/// We only ever look at a handful of fields, but the entire document is kept
/// around so it can be written out again without losing anything.
#[derive(Debug, Clone, PartialEq)]
pub struct RawProject {
    pub id: u64,
    pub path_with_namespace: String,
    pub archived: bool,
    pub http_url_to_repo: String,
    pub ssh_url_to_repo: String,
    raw: Value,
}

#[derive(Deserialize)]
struct Fields {
    id: u64,
    path_with_namespace: String,
    #[serde(default)]
    archived: bool,
    #[serde(default)]
    http_url_to_repo: String,
    #[serde(default)]
    ssh_url_to_repo: String,
}

impl RawProject {
    pub fn from_value(raw: Value) -> Result<RawProject, serde_json::Error> {
        let Fields {
            id,
            path_with_namespace,
            archived,
            http_url_to_repo,
            ssh_url_to_repo,
        } = serde_json::from_value(raw.clone())?;

        Ok(RawProject {
            id,
            path_with_namespace,
            archived,
            http_url_to_repo,
            ssh_url_to_repo,
            raw,
        })
    }

    /// The original JSON document.
    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

impl<'de> Deserialize<'de> for RawProject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        RawProject::from_value(raw).map_err(D::Error::custom)
    }
}

impl Serialize for RawProject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pull_out_the_interesting_fields() {
        let src = json!({
            "id": 42,
            "description": "Some project",
            "path_with_namespace": "org/team/service",
            "archived": true,
            "http_url_to_repo": "https://gitlab.com/org/team/service.git",
            "ssh_url_to_repo": "git@gitlab.com:org/team/service.git",
            "namespace": { "id": 7, "full_path": "org/team" }
        });

        let got = RawProject::from_value(src.clone()).unwrap();

        assert_eq!(got.id, 42);
        assert_eq!(got.path_with_namespace, "org/team/service");
        assert!(got.archived);
        assert_eq!(got.ssh_url_to_repo, "git@gitlab.com:org/team/service.git");
        assert_eq!(got.raw(), &src);
    }

    #[test]
    fn serializing_gives_back_the_original_document() {
        let src = r#"{"path_with_namespace":"a/b","id":1,"zzz":null,"archived":false}"#;

        let project: RawProject = serde_json::from_str(src).unwrap();
        let round_tripped = serde_json::to_string(&project).unwrap();

        assert_eq!(round_tripped, src);
    }

    #[test]
    fn projects_need_an_id_and_path() {
        let src = json!({ "name": "orphan" });

        assert!(RawProject::from_value(src).is_err());
    }
}
