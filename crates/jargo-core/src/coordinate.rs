use std::collections::BTreeSet;
use std::fmt;

use crate::version::{self, MavenVersion};

/// Maven-compatible dependency scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scope {
    Compile,
    Runtime,
    Test,
    Provided,
    System,
}

impl Scope {
    /// Parse a scope name. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim() {
            "compile" => Some(Self::Compile),
            "runtime" => Some(Self::Runtime),
            "test" => Some(Self::Test),
            "provided" => Some(Self::Provided),
            "system" => Some(Self::System),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compile => "compile",
            Self::Runtime => "runtime",
            Self::Test => "test",
            Self::Provided => "provided",
            Self::System => "system",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dependency or project identity: GAV plus classifier, scope, optional
/// flag, system path and the exclusions it carries.
///
/// Fields may still contain `${...}` references until the coordinate has
/// been expanded against the node that declared it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Coordinate {
    pub group_id: Option<String>,
    pub artifact_id: String,
    /// Exact version, range (`[1.0,2.0)`) or `-SNAPSHOT` version.
    pub version: Option<String>,
    /// Concrete version pinned for a range or a timestamped snapshot.
    pub snapshot_version: Option<String>,
    pub classifier: Option<String>,
    pub scope: Option<String>,
    pub optional: bool,
    pub system_path: Option<String>,
    /// `groupId:artifactId` pairs excluded below this dependency.
    pub exclusions: BTreeSet<String>,
}

impl Coordinate {
    pub fn new(group_id: &str, artifact_id: &str, version: Option<&str>) -> Self {
        Self {
            group_id: Some(group_id.to_string()),
            artifact_id: artifact_id.to_string(),
            version: version.map(str::to_string),
            ..Default::default()
        }
    }

    /// Parse `group:artifact[:version[:classifier]]`.
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() < 2 || parts.len() > 4 || parts.iter().any(|p| p.is_empty()) {
            return None;
        }
        let mut c = Self::new(parts[0], parts[1], parts.get(2).copied());
        c.classifier = parts.get(3).map(|s| s.to_string());
        Some(c)
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope.as_str().to_string());
        self
    }

    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn with_exclusion(mut self, group_id: &str, artifact_id: &str) -> Self {
        self.exclusions.insert(format!("{group_id}:{artifact_id}"));
        self
    }

    /// The parsed scope; an absent scope means `compile`.
    pub fn scope(&self) -> Option<Scope> {
        match self.scope.as_deref() {
            None | Some("") => Some(Scope::Compile),
            Some(s) => Scope::parse(s),
        }
    }

    /// `groupId:artifactId`, the form used in exclusion sets.
    pub fn group_artifact(&self) -> String {
        format!("{}:{}", self.group_id.as_deref().unwrap_or(""), self.artifact_id)
    }

    /// Version-independent memo key: `groupId:artifactId[:classifier]`.
    pub fn key(&self) -> String {
        match &self.classifier {
            Some(c) => format!("{}:{c}", self.group_artifact()),
            None => self.group_artifact(),
        }
    }

    /// `groupId:artifactId:version[:classifier]` for messages.
    pub fn gav(&self) -> String {
        let mut s = format!(
            "{}:{}",
            self.group_artifact(),
            self.version.as_deref().unwrap_or("?")
        );
        if let Some(c) = &self.classifier {
            s.push(':');
            s.push_str(c);
        }
        s
    }

    /// The concrete version: the pinned one if a range or snapshot was
    /// resolved, else the declared one.
    pub fn get_version(&self) -> Option<&str> {
        self.snapshot_version.as_deref().or(self.version.as_deref())
    }

    pub fn is_snapshot(&self) -> bool {
        self.version
            .as_deref()
            .is_some_and(|v| v.ends_with("-SNAPSHOT"))
    }

    pub fn is_range(&self) -> bool {
        self.version.as_deref().is_some_and(version::is_range)
    }

    /// Directory name of this version inside a repository layout.
    ///
    /// Snapshots live under their `-SNAPSHOT` directory even when pinned to a
    /// timestamped build; ranges live under the pinned version.
    pub fn directory_version(&self) -> Option<&str> {
        if self.is_snapshot() {
            self.version.as_deref()
        } else {
            self.get_version()
        }
    }

    fn file_stem(&self) -> String {
        format!(
            "{}-{}",
            self.artifact_id,
            self.get_version().unwrap_or_default()
        )
    }

    /// `artifactId-version[-classifier].jar`
    pub fn jar_name(&self) -> String {
        match &self.classifier {
            Some(c) => format!("{}-{c}.jar", self.file_stem()),
            None => format!("{}.jar", self.file_stem()),
        }
    }

    /// `artifactId-version.pom`
    pub fn pom_name(&self) -> String {
        format!("{}.pom", self.file_stem())
    }

    /// Total order key: artifactId, groupId, version, classifier.
    pub fn sort_key(&self) -> SortKey {
        SortKey {
            artifact_id: self.artifact_id.clone(),
            group_id: self.group_id.clone().unwrap_or_default(),
            version: MavenVersion::parse(self.get_version().unwrap_or_default()),
            classifier: self.classifier.clone(),
        }
    }

    /// Identity for de-duplication: same artifact regardless of version.
    pub fn identity(&self) -> (String, String, Option<String>) {
        (
            self.artifact_id.clone(),
            self.group_id.clone().unwrap_or_default(),
            self.classifier.clone(),
        )
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.gav())
    }
}

/// Ordering key for resolved sets. An absent classifier sorts first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SortKey {
    pub artifact_id: String,
    pub group_id: String,
    pub version: MavenVersion,
    pub classifier: Option<String>,
}
