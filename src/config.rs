use failure::{Error, Fail, ResultExt};
use sec::Secret;
use serde_derive::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// The namespace filter value which means "don't filter by namespace".
pub const UNSET_NAMESPACE: &str = "unset";

/// Everything which controls which repositories are kept and how their
/// clone URLs are generated.
///
/// This gets resolved once at startup and is never changed afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "kebab-case")]
pub struct ClonePolicy {
    /// Only keep projects whose `path_with_namespace` starts with this
    /// (case-insensitive). `"unset"` disables the filter.
    #[serde(default = "unset_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub skip_archived: bool,
    #[serde(default)]
    pub protocol: Protocol,
    #[serde(default = "empty_token")]
    pub token: Secret<String>,
    /// Talk to a self-hosted instance instead of gitlab.com.
    #[serde(default)]
    pub base_url: Option<String>,
    /// The directory project snapshots are saved under.
    #[serde(default = "current_dir")]
    pub output_root: PathBuf,
    /// Snapshots go in `{output_root}/{org_label}_meta/`.
    #[serde(default)]
    pub org_label: String,
}

impl ClonePolicy {
    /// Load a policy from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<ClonePolicy, Error> {
        let path = path.as_ref();
        debug!("Loading the clone policy from {}", path.display());

        let contents = fs::read_to_string(path)
            .with_context(|_| format!("Unable to read {}", path.display()))?;

        ClonePolicy::from_toml(&contents)
    }

    pub fn from_toml(src: &str) -> Result<ClonePolicy, Error> {
        let policy = toml::from_str(src).context("Invalid clone policy")?;
        Ok(policy)
    }

    /// An example policy, useful for generating a config file.
    pub fn example() -> ClonePolicy {
        ClonePolicy {
            namespace: String::from("my-org/backend"),
            skip_archived: true,
            base_url: Some(String::from("https://gitlab.example.com/")),
            token: Secret::new(String::from("your-personal-access-token")),
            output_root: PathBuf::from("/srv/repos"),
            org_label: String::from("my-org"),
            ..Default::default()
        }
    }

    pub fn as_toml(&self) -> Result<String, Error> {
        let src = toml::to_string_pretty(self).context("Unable to serialize the policy")?;
        Ok(src)
    }

    /// The namespace prefix to filter on, if one was set.
    pub fn namespace_filter(&self) -> Option<&str> {
        let ns = self.namespace.trim();

        if ns.is_empty() || ns == UNSET_NAMESPACE {
            None
        } else {
            Some(ns)
        }
    }

    pub fn token(&self) -> &str {
        self.token.reveal()
    }

    /// The directory all project snapshots for this run are written to.
    pub fn meta_dir(&self) -> PathBuf {
        self.output_root.join(format!("{}_meta", self.org_label))
    }
}

impl Default for ClonePolicy {
    fn default() -> ClonePolicy {
        ClonePolicy {
            namespace: unset_namespace(),
            skip_archived: false,
            protocol: Protocol::default(),
            token: empty_token(),
            base_url: None,
            output_root: current_dir(),
            org_label: String::new(),
        }
    }
}

fn unset_namespace() -> String {
    UNSET_NAMESPACE.to_string()
}

fn empty_token() -> Secret<String> {
    Secret::new(String::new())
}

fn current_dir() -> PathBuf {
    PathBuf::from(".")
}

/// How the repositories will be cloned.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Https,
    Ssh,
}

impl Default for Protocol {
    fn default() -> Protocol {
        Protocol::Https
    }
}

impl FromStr for Protocol {
    type Err = UnknownProtocol;

    fn from_str(s: &str) -> Result<Protocol, UnknownProtocol> {
        match s.trim().to_lowercase().as_str() {
            "https" => Ok(Protocol::Https),
            "ssh" => Ok(Protocol::Ssh),
            _ => Err(UnknownProtocol(s.to_string())),
        }
    }
}

impl Display for Protocol {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match *self {
            Protocol::Https => write!(f, "https"),
            Protocol::Ssh => write!(f, "ssh"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Fail)]
#[fail(display = "Unknown clone protocol \"{}\", expected \"https\" or \"ssh\"", _0)]
pub struct UnknownProtocol(pub String);

/// The GitLab namespace being enumerated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// A group (and all its subgroups), identified by its full path.
    Group(String),
    /// A user account, identified by username or numeric id.
    User(String),
}

impl Scope {
    pub fn name(&self) -> &str {
        match *self {
            Scope::Group(ref name) | Scope::User(ref name) => name,
        }
    }

    pub fn is_group(&self) -> bool {
        match *self {
            Scope::Group(_) => true,
            Scope::User(_) => false,
        }
    }
}

impl Display for Scope {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match *self {
            Scope::Group(ref name) => write!(f, "group \"{}\"", name),
            Scope::User(ref name) => write!(f, "user \"{}\"", name),
        }
    }
}
