//! `maven-metadata.xml` parsing for range pinning and SNAPSHOT resolution.

use quick_xml::events::Event;
use quick_xml::Reader;

use jargo_core::version::VersionRange;
use jargo_util::errors::JargoError;

/// Artifact-level metadata listing available versions.
#[derive(Debug, Clone, Default)]
pub struct MavenMetadata {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub latest: Option<String>,
    pub release: Option<String>,
    pub versions: Vec<String>,
}

impl MavenMetadata {
    /// Highest listed version inside `range`.
    pub fn pin(&self, range: &VersionRange) -> Option<String> {
        range.highest(self.versions.iter().map(String::as_str))
    }
}

/// Version-level metadata naming the newest build of a SNAPSHOT.
#[derive(Debug, Clone, Default)]
pub struct SnapshotMetadata {
    pub version: Option<String>,
    pub timestamp: Option<String>,
    pub build_number: Option<u32>,
    /// The repository holds the plain `-SNAPSHOT` file instead of timestamped builds.
    pub local_copy: bool,
}

impl SnapshotMetadata {
    /// Concrete version of the newest build.
    ///
    /// For `1.0-SNAPSHOT` with timestamp `20240101.120000` and build `5`,
    /// returns `1.0-20240101.120000-5`.
    pub fn pinned_version(&self) -> Option<String> {
        if self.local_copy {
            return None;
        }
        let base = self.version.as_deref()?.strip_suffix("-SNAPSHOT")?;
        let ts = self.timestamp.as_deref()?;
        let bn = self.build_number?;
        Some(format!("{base}-{ts}-{bn}"))
    }
}

/// Drive `on_leaf` with the `>`-joined element path and text of every element.
fn walk(xml: &str, what: &str, mut on_leaf: impl FnMut(&str, &str)) -> miette::Result<()> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut path: Vec<String> = Vec::new();
    let mut text_buf = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                path.push(String::from_utf8_lossy(e.name().as_ref()).to_string());
                text_buf.clear();
            }
            Ok(Event::Text(ref e)) => {
                text_buf = e.unescape().unwrap_or_default().to_string();
            }
            Ok(Event::End(_)) => {
                on_leaf(&path.join(">"), &text_buf);
                path.pop();
                text_buf.clear();
            }
            Ok(Event::Eof) => return Ok(()),
            Err(e) => {
                return Err(JargoError::Generic {
                    message: format!("Failed to parse {what}: {e}"),
                }
                .into());
            }
            _ => {}
        }
    }
}

/// Parse an artifact-level `maven-metadata.xml` that lists available versions.
pub fn parse_metadata(xml: &str) -> miette::Result<MavenMetadata> {
    let mut meta = MavenMetadata::default();
    walk(xml, "maven-metadata.xml", |ctx, text| match ctx {
        "metadata>groupId" => meta.group_id = Some(text.to_string()),
        "metadata>artifactId" => meta.artifact_id = Some(text.to_string()),
        "metadata>versioning>latest" => meta.latest = Some(text.to_string()),
        "metadata>versioning>release" => meta.release = Some(text.to_string()),
        "metadata>versioning>versions>version" => meta.versions.push(text.to_string()),
        _ => {}
    })?;
    Ok(meta)
}

/// Parse a version-level `maven-metadata.xml` for SNAPSHOT timestamp resolution.
pub fn parse_snapshot_metadata(xml: &str) -> miette::Result<SnapshotMetadata> {
    let mut meta = SnapshotMetadata::default();
    walk(xml, "snapshot metadata", |ctx, text| match ctx {
        "metadata>version" => meta.version = Some(text.to_string()),
        "metadata>versioning>snapshot>timestamp" => meta.timestamp = Some(text.to_string()),
        "metadata>versioning>snapshot>buildNumber" => meta.build_number = text.parse().ok(),
        "metadata>versioning>snapshot>localCopy" => meta.local_copy = text == "true",
        _ => {}
    })?;
    Ok(meta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_artifact_metadata() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata>
  <groupId>org.scijava</groupId>
  <artifactId>scijava-common</artifactId>
  <versioning>
    <latest>2.9.0</latest>
    <release>2.9.0</release>
    <versions>
      <version>2.7.0</version>
      <version>2.8.1</version>
      <version>2.10.0-SNAPSHOT</version>
      <version>2.9.0</version>
    </versions>
    <lastUpdated>20240101120000</lastUpdated>
  </versioning>
</metadata>"#;
        let meta = parse_metadata(xml).unwrap();
        assert_eq!(meta.group_id.as_deref(), Some("org.scijava"));
        assert_eq!(meta.release.as_deref(), Some("2.9.0"));
        assert_eq!(meta.versions.len(), 4);

        let range = VersionRange::parse("[2.8,2.10)").unwrap().unwrap();
        assert_eq!(meta.pin(&range).as_deref(), Some("2.9.0"));
    }

    #[test]
    fn parse_snapshot_meta() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata>
  <groupId>com.example</groupId>
  <artifactId>my-lib</artifactId>
  <version>1.0-SNAPSHOT</version>
  <versioning>
    <snapshot>
      <timestamp>20240615.143022</timestamp>
      <buildNumber>42</buildNumber>
    </snapshot>
    <lastUpdated>20240615143022</lastUpdated>
  </versioning>
</metadata>"#;
        let meta = parse_snapshot_metadata(xml).unwrap();
        assert_eq!(meta.build_number, Some(42));
        assert_eq!(meta.pinned_version().as_deref(), Some("1.0-20240615.143022-42"));
    }

    #[test]
    fn local_copy_is_not_pinned() {
        let xml = r#"<metadata><version>1.0-SNAPSHOT</version><versioning><snapshot>
<localCopy>true</localCopy></snapshot></versioning></metadata>"#;
        let meta = parse_snapshot_metadata(xml).unwrap();
        assert!(meta.local_copy);
        assert!(meta.pinned_version().is_none());
    }

    #[test]
    fn malformed_xml_is_error() {
        assert!(parse_metadata("<metadata><versioning></metadata>").is_err());
    }
}
