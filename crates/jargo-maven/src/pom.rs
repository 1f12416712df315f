//! POM file parsing into [`ProjectDescriptor`]s, with profile activation.
//!
//! `${...}` references are kept verbatim: they are expanded later against the
//! node chain, where parent properties are known.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::Reader;

use jargo_core::coordinate::Coordinate;
use jargo_core::descriptor::{DescriptorSource, ProjectDescriptor};
use jargo_util::errors::JargoError;

const PROFILE: &str = "project>profiles>profile";
const DEPENDENCY: &str = "project>dependencies>dependency";
const MANAGED_DEPENDENCY: &str = "project>dependencyManagement>dependencies>dependency";

/// Facts profile activation is evaluated against.
#[derive(Debug, Clone)]
pub struct ActivationContext {
    /// Directory `<file><exists>` paths are relative to.
    pub base_dir: PathBuf,
    /// Properties that count as defined in addition to the POM's own.
    pub properties: BTreeMap<String, String>,
    /// Operating system name as the JVM reports it (`Linux`, `Mac OS X`, ...).
    pub os_name: String,
}

impl ActivationContext {
    pub fn new(base_dir: impl Into<PathBuf>, properties: BTreeMap<String, String>) -> Self {
        let os_name = match std::env::consts::OS {
            "linux" => "Linux",
            "macos" => "Mac OS X",
            "windows" => "Windows",
            other => other,
        };
        Self {
            base_dir: base_dir.into(),
            properties,
            os_name: os_name.to_string(),
        }
    }

    fn property(&self, pom: &ProjectDescriptor, name: &str) -> Option<String> {
        self.properties
            .get(name)
            .or_else(|| pom.properties.get(name))
            .cloned()
            .or_else(|| std::env::var(name.strip_prefix("env.")?).ok())
    }
}

#[derive(Debug, Default)]
struct Activation {
    active_by_default: bool,
    property_name: Option<String>,
    property_value: Option<String>,
    os_name: Option<String>,
    os_family: Option<String>,
    file_exists: Option<String>,
    file_missing: Option<String>,
}

impl Activation {
    /// Any satisfied condition activates the profile.
    fn is_active(&self, ctx: &ActivationContext, pom: &ProjectDescriptor) -> bool {
        if self.active_by_default {
            return true;
        }
        if let Some(name) = &self.property_name {
            let (negate, name) = match name.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, name.as_str()),
            };
            let value = ctx.property(pom, name);
            let defined = match (&value, &self.property_value) {
                (Some(v), Some(wanted)) => v == wanted,
                (v, None) => v.is_some(),
                (None, Some(_)) => false,
            };
            if negate ^ defined {
                return true;
            }
        }
        let os = ctx.os_name.to_lowercase();
        if let Some(name) = &self.os_name {
            if name.eq_ignore_ascii_case(&ctx.os_name) {
                return true;
            }
        }
        if let Some(family) = &self.os_family {
            let family = family.to_lowercase();
            let matched = match family.as_str() {
                "windows" => os.starts_with("win"),
                "mac" => os.starts_with("mac"),
                "unix" => !os.starts_with("win") && !os.starts_with("mac"),
                other => {
                    tracing::warn!("Ignoring unknown OS family: {other}");
                    false
                }
            };
            if matched {
                return true;
            }
        }
        if let Some(file) = &self.file_exists {
            if ctx.base_dir.join(file).exists() {
                return true;
            }
        }
        if let Some(file) = &self.file_missing {
            if !ctx.base_dir.join(file).exists() {
                return true;
            }
        }
        false
    }
}

#[derive(Debug, Default)]
struct Profile {
    id: Option<String>,
    activation: Activation,
    section: ProjectDescriptor,
}

/// Elements under construction while walking the document.
#[derive(Debug, Default)]
struct Cursor {
    dependency: Option<Coordinate>,
    exclusion: Option<(Option<String>, Option<String>)>,
    plugin: Option<String>,
}

#[derive(Debug, Default)]
struct PomHandler {
    pom: ProjectDescriptor,
    profiles: Vec<Profile>,
    profile: Option<Profile>,
    cursor: Cursor,
}

impl PomHandler {
    fn start(&mut self, ctx: &str) {
        if ctx == PROFILE {
            self.profile = Some(Profile::default());
            return;
        }
        let local = match ctx.strip_prefix(PROFILE) {
            Some(rest) => format!("project{rest}"),
            None => ctx.to_string(),
        };
        match local.as_str() {
            DEPENDENCY | MANAGED_DEPENDENCY => self.cursor.dependency = Some(Coordinate::default()),
            "project>build>plugins>plugin" => self.cursor.plugin = None,
            l if l.ends_with(">exclusions>exclusion") && self.cursor.dependency.is_some() => {
                self.cursor.exclusion = Some((None, None));
            }
            _ => {}
        }
    }

    fn end(&mut self, ctx: &str, text: &str) {
        let Some(rest) = ctx.strip_prefix(PROFILE) else {
            end_section(&mut self.pom, &mut self.cursor, ctx, text);
            return;
        };
        if rest.is_empty() {
            if let Some(p) = self.profile.take() {
                self.profiles.push(p);
            }
            return;
        }
        let Some(profile) = self.profile.as_mut() else {
            return;
        };
        let activation = &mut profile.activation;
        let value = Some(text.to_string());
        match rest {
            ">id" => profile.id = value,
            ">activation>activeByDefault" => {
                activation.active_by_default = text.eq_ignore_ascii_case("true");
            }
            ">activation>property>name" => activation.property_name = value,
            ">activation>property>value" => activation.property_value = value,
            ">activation>os>name" => activation.os_name = value,
            ">activation>os>family" => activation.os_family = value,
            ">activation>file>exists" => activation.file_exists = value,
            ">activation>file>missing" => activation.file_missing = value,
            _ => {
                let local = format!("project{rest}");
                end_section(&mut profile.section, &mut self.cursor, &local, text);
            }
        }
    }

    /// Merge active profiles into the main section, in declaration order.
    fn finish(mut self, ctx: &ActivationContext) -> ProjectDescriptor {
        for profile in self.profiles {
            if !profile.activation.is_active(ctx, &self.pom) {
                tracing::debug!(
                    "ignoring profile {}",
                    profile.id.as_deref().unwrap_or("<unnamed>")
                );
                continue;
            }
            tracing::debug!(
                "activating profile {}",
                profile.id.as_deref().unwrap_or("<unnamed>")
            );
            let section = profile.section;
            self.pom.properties.extend(section.properties);
            self.pom.dependencies.extend(section.dependencies);
            self.pom
                .dependency_management
                .extend(section.dependency_management);
            self.pom.modules.extend(section.modules);
            self.pom.repositories.extend(section.repositories);
            let build = section.build;
            if build.source_directory.is_some() {
                self.pom.build.source_directory = build.source_directory;
            }
            self.pom
                .build
                .resource_directories
                .extend(build.resource_directories);
            self.pom.build.source = build.source.or(self.pom.build.source);
            self.pom.build.target = build.target.or(self.pom.build.target);
            self.pom.build.main_class = build.main_class.or(self.pom.build.main_class);
        }
        self.pom
    }
}

/// Record the text of a closed element into `section`.
///
/// `ctx` is relative to `project`, with any profile prefix removed.
fn end_section(section: &mut ProjectDescriptor, cursor: &mut Cursor, ctx: &str, text: &str) {
    let value = Some(text.to_string());

    if let Some(field) = ctx
        .strip_prefix(DEPENDENCY)
        .or_else(|| ctx.strip_prefix(MANAGED_DEPENDENCY))
    {
        let managed = ctx.starts_with(MANAGED_DEPENDENCY);
        end_dependency(section, cursor, managed, field, text);
        return;
    }
    if let Some(name) = ctx.strip_prefix("project>properties>") {
        if !name.contains('>') {
            section.properties.insert(name.to_string(), text.to_string());
        }
        return;
    }

    match ctx {
        "project>groupId" => section.group_id = value,
        "project>artifactId" => section.artifact_id = text.to_string(),
        "project>version" => section.version = value,
        "project>packaging" => section.packaging = value,
        "project>parent>groupId" => {
            section.parent.get_or_insert_with(Default::default).group_id = text.to_string();
        }
        "project>parent>artifactId" => {
            section.parent.get_or_insert_with(Default::default).artifact_id = text.to_string();
        }
        "project>parent>version" => {
            section.parent.get_or_insert_with(Default::default).version = text.to_string();
        }
        "project>parent>relativePath" => {
            section.parent.get_or_insert_with(Default::default).relative_path = value;
        }
        "project>modules>module" => section.modules.push(text.to_string()),
        "project>repositories>repository>url" => section.repositories.push(text.to_string()),
        "project>build>sourceDirectory" => section.build.source_directory = value,
        "project>build>resources>resource>directory" => {
            section.build.resource_directories.push(text.to_string());
        }
        "project>build>plugins>plugin>artifactId" => cursor.plugin = value,
        "project>build>plugins>plugin>configuration>source"
            if cursor.plugin.as_deref() == Some("maven-compiler-plugin") =>
        {
            section.build.source = value;
        }
        "project>build>plugins>plugin>configuration>target"
            if cursor.plugin.as_deref() == Some("maven-compiler-plugin") =>
        {
            section.build.target = value;
        }
        "project>build>plugins>plugin>configuration>archive>manifest>mainClass"
            if cursor.plugin.as_deref() == Some("maven-jar-plugin") =>
        {
            section.build.main_class = value;
        }
        _ => {}
    }
}

fn end_dependency(
    section: &mut ProjectDescriptor,
    cursor: &mut Cursor,
    managed: bool,
    field: &str,
    text: &str,
) {
    if field.is_empty() {
        if let Some(dep) = cursor.dependency.take() {
            if managed {
                section.dependency_management.push(dep);
            } else {
                section.dependencies.push(dep);
            }
        }
        return;
    }
    let Some(dep) = cursor.dependency.as_mut() else {
        return;
    };
    let value = Some(text.to_string());
    match field {
        ">groupId" => dep.group_id = value,
        ">artifactId" => dep.artifact_id = text.to_string(),
        ">version" => dep.version = value,
        ">scope" => dep.scope = value,
        ">optional" => dep.optional = text.trim().eq_ignore_ascii_case("true"),
        ">systemPath" => dep.system_path = value,
        ">classifier" => dep.classifier = value,
        ">exclusions>exclusion>groupId" => {
            if let Some(excl) = cursor.exclusion.as_mut() {
                excl.0 = value;
            }
        }
        ">exclusions>exclusion>artifactId" => {
            if let Some(excl) = cursor.exclusion.as_mut() {
                excl.1 = value;
            }
        }
        ">exclusions>exclusion" => {
            if let Some((Some(g), Some(a))) = cursor.exclusion.take() {
                dep.exclusions.insert(format!("{g}:{a}"));
            }
        }
        _ => {}
    }
}

/// Parse a POM XML string, applying the profiles active under `ctx`.
pub fn parse_pom(xml: &str, ctx: &ActivationContext) -> miette::Result<ProjectDescriptor> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut handler = PomHandler::default();
    let mut path: Vec<String> = Vec::new();
    let mut text_buf = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                path.push(String::from_utf8_lossy(e.name().as_ref()).to_string());
                text_buf.clear();
                handler.start(&path.join(">"));
            }
            Ok(Event::Text(ref e)) => {
                text_buf = e.unescape().unwrap_or_default().trim().to_string();
            }
            Ok(Event::End(_)) => {
                handler.end(&path.join(">"), &text_buf);
                path.pop();
                text_buf.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(JargoError::Generic {
                    message: format!("Failed to parse POM XML: {e}"),
                }
                .into());
            }
            _ => {}
        }
    }

    let pom = handler.finish(ctx);
    if pom.artifact_id.is_empty() {
        return Err(JargoError::Generic {
            message: "POM declares no artifactId".to_string(),
        }
        .into());
    }
    Ok(pom)
}

/// Reads `pom.xml` and repository `.pom` files from disk.
#[derive(Debug, Clone, Default)]
pub struct PomDescriptorSource {
    properties: BTreeMap<String, String>,
}

impl PomDescriptorSource {
    /// `properties` count as defined when evaluating profile activation.
    pub fn new(properties: BTreeMap<String, String>) -> Self {
        Self { properties }
    }
}

impl DescriptorSource for PomDescriptorSource {
    fn load(&self, path: &Path) -> miette::Result<Option<ProjectDescriptor>> {
        if !path.is_file() {
            return Ok(None);
        }
        let descriptor_error = |message: String| JargoError::Descriptor {
            path: path.display().to_string(),
            message,
        };
        let xml = std::fs::read_to_string(path).map_err(|e| descriptor_error(e.to_string()))?;
        let base_dir = path.parent().unwrap_or(Path::new("."));
        let ctx = ActivationContext::new(base_dir, self.properties.clone());
        let pom = parse_pom(&xml, &ctx).map_err(|e| descriptor_error(e.to_string()))?;
        tracing::trace!("parsed {}", path.display());
        Ok(Some(pom))
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ActivationContext {
        ActivationContext::new(".", BTreeMap::new())
    }

    const SIMPLE_POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
    <modelVersion>4.0.0</modelVersion>
    <groupId>org.example</groupId>
    <artifactId>my-lib</artifactId>
    <version>1.0.0</version>
    <packaging>jar</packaging>

    <properties>
        <scijava.version>2.9.0</scijava.version>
    </properties>

    <dependencies>
        <dependency>
            <groupId>org.scijava</groupId>
            <artifactId>scijava-common</artifactId>
            <version>${scijava.version}</version>
        </dependency>
        <dependency>
            <groupId>junit</groupId>
            <artifactId>junit</artifactId>
            <version>4.13.2</version>
            <scope>test</scope>
            <optional>true</optional>
        </dependency>
    </dependencies>
</project>"#;

    #[test]
    fn parse_simple_pom() {
        let pom = parse_pom(SIMPLE_POM, &ctx()).unwrap();
        assert_eq!(pom.group_id.as_deref(), Some("org.example"));
        assert_eq!(pom.artifact_id, "my-lib");
        assert_eq!(pom.version.as_deref(), Some("1.0.0"));
        assert_eq!(pom.packaging(), "jar");
        assert_eq!(pom.dependencies.len(), 2);
        assert_eq!(pom.properties["scijava.version"], "2.9.0");
    }

    #[test]
    fn references_are_kept_verbatim() {
        let pom = parse_pom(SIMPLE_POM, &ctx()).unwrap();
        assert_eq!(
            pom.dependencies[0].version.as_deref(),
            Some("${scijava.version}")
        );
    }

    #[test]
    fn scope_and_optional() {
        let pom = parse_pom(SIMPLE_POM, &ctx()).unwrap();
        assert_eq!(pom.dependencies[0].scope, None);
        assert!(!pom.dependencies[0].optional);
        assert_eq!(pom.dependencies[1].scope.as_deref(), Some("test"));
        assert!(pom.dependencies[1].optional);
    }

    #[test]
    fn dependency_management_with_exclusions() {
        let xml = r#"<project>
    <groupId>org.example</groupId>
    <artifactId>parent</artifactId>
    <version>1.0.0</version>
    <dependencyManagement>
        <dependencies>
            <dependency>
                <groupId>com.google.guava</groupId>
                <artifactId>guava</artifactId>
                <version>32.0.0-jre</version>
                <exclusions>
                    <exclusion>
                        <groupId>com.google.code.findbugs</groupId>
                        <artifactId>jsr305</artifactId>
                    </exclusion>
                </exclusions>
            </dependency>
        </dependencies>
    </dependencyManagement>
</project>"#;
        let pom = parse_pom(xml, &ctx()).unwrap();
        assert!(pom.dependencies.is_empty());
        assert_eq!(pom.dependency_management.len(), 1);
        let managed = &pom.dependency_management[0];
        assert_eq!(managed.version.as_deref(), Some("32.0.0-jre"));
        assert!(managed.exclusions.contains("com.google.code.findbugs:jsr305"));
    }

    #[test]
    fn parent_modules_and_build() {
        let xml = r#"<project>
    <parent>
        <groupId>org.example</groupId>
        <artifactId>parent-pom</artifactId>
        <version>2.0.0</version>
        <relativePath>../pom.xml</relativePath>
    </parent>
    <artifactId>child</artifactId>
    <packaging>pom</packaging>
    <modules><module>core</module><module>app</module></modules>
    <repositories>
        <repository><id>internal</id><url>https://maven.example.com/</url></repository>
    </repositories>
    <build>
        <sourceDirectory>src</sourceDirectory>
        <plugins>
            <plugin>
                <artifactId>maven-compiler-plugin</artifactId>
                <configuration><source>1.8</source><target>1.8</target></configuration>
            </plugin>
            <plugin>
                <artifactId>maven-jar-plugin</artifactId>
                <configuration>
                    <archive><manifest><mainClass>org.example.Main</mainClass></manifest></archive>
                </configuration>
            </plugin>
            <plugin>
                <artifactId>other-plugin</artifactId>
                <configuration><source>99</source></configuration>
            </plugin>
        </plugins>
    </build>
</project>"#;
        let pom = parse_pom(xml, &ctx()).unwrap();
        let parent = pom.parent.as_ref().unwrap();
        assert_eq!(parent.artifact_id, "parent-pom");
        assert_eq!(parent.relative_path.as_deref(), Some("../pom.xml"));
        assert!(pom.group_id.is_none());
        assert_eq!(pom.modules, vec!["core", "app"]);
        assert_eq!(pom.repositories, vec!["https://maven.example.com/"]);
        assert_eq!(pom.build.source_directory.as_deref(), Some("src"));
        assert_eq!(pom.build.source.as_deref(), Some("1.8"));
        assert_eq!(pom.build.target.as_deref(), Some("1.8"));
        assert_eq!(pom.build.main_class.as_deref(), Some("org.example.Main"));
    }

    const PROFILE_POM: &str = r#"<project>
    <groupId>g</groupId>
    <artifactId>p</artifactId>
    <version>1</version>
    <profiles>
        <profile>
            <id>default</id>
            <activation><activeByDefault>true</activeByDefault></activation>
            <dependencies>
                <dependency><groupId>g</groupId><artifactId>by-default</artifactId><version>1</version></dependency>
            </dependencies>
        </profile>
        <profile>
            <id>with-flag</id>
            <activation><property><name>flag</name></property></activation>
            <properties><flavor>flagged</flavor></properties>
        </profile>
        <profile>
            <id>without-flag</id>
            <activation><property><name>!flag</name></property></activation>
            <dependencies>
                <dependency><groupId>g</groupId><artifactId>no-flag</artifactId><version>1</version></dependency>
            </dependencies>
        </profile>
        <profile>
            <id>marker</id>
            <activation><file><exists>marker.txt</exists></file></activation>
            <modules><module>extra</module></modules>
        </profile>
        <profile>
            <id>never</id>
            <activation><os><family>no-such-family</family></os></activation>
            <dependencies>
                <dependency><groupId>g</groupId><artifactId>never</artifactId><version>1</version></dependency>
            </dependencies>
        </profile>
    </profiles>
</project>"#;

    #[test]
    fn profiles_without_flag() {
        let tmp = tempfile::TempDir::new().unwrap();
        let ctx = ActivationContext::new(tmp.path(), BTreeMap::new());
        let pom = parse_pom(PROFILE_POM, &ctx).unwrap();
        let names: Vec<&str> = pom.dependencies.iter().map(|d| d.artifact_id.as_str()).collect();
        assert_eq!(names, vec!["by-default", "no-flag"]);
        assert!(!pom.properties.contains_key("flavor"));
        assert!(pom.modules.is_empty());
    }

    #[test]
    fn profiles_with_flag_and_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("marker.txt"), "").unwrap();
        let props = BTreeMap::from([("flag".to_string(), "yes".to_string())]);
        let ctx = ActivationContext::new(tmp.path(), props);
        let pom = parse_pom(PROFILE_POM, &ctx).unwrap();
        let names: Vec<&str> = pom.dependencies.iter().map(|d| d.artifact_id.as_str()).collect();
        assert_eq!(names, vec!["by-default"]);
        assert_eq!(pom.properties["flavor"], "flagged");
        assert_eq!(pom.modules, vec!["extra"]);
    }

    #[test]
    fn os_family_matches_current_platform() {
        let mut ctx = ctx();
        ctx.os_name = "Windows 10".to_string();
        let activation = Activation {
            os_family: Some("windows".to_string()),
            ..Default::default()
        };
        assert!(activation.is_active(&ctx, &ProjectDescriptor::default()));
        ctx.os_name = "Linux".to_string();
        assert!(!activation.is_active(&ctx, &ProjectDescriptor::default()));
        let unix = Activation {
            os_family: Some("unix".to_string()),
            ..Default::default()
        };
        assert!(unix.is_active(&ctx, &ProjectDescriptor::default()));
    }

    #[test]
    fn missing_artifact_id_is_error() {
        assert!(parse_pom("<project><groupId>g</groupId></project>", &ctx()).is_err());
    }

    #[test]
    fn source_loads_from_disk() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("pom.xml");
        std::fs::write(&path, SIMPLE_POM).unwrap();
        let source = PomDescriptorSource::default();
        let pom = source.load(&path).unwrap().unwrap();
        assert_eq!(pom.artifact_id, "my-lib");
        assert!(source.load(&tmp.path().join("missing.xml")).unwrap().is_none());

        std::fs::write(&path, "<project><artifactId>x</project>").unwrap();
        let err = source.load(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid project descriptor"), "got: {err}");
    }
}
