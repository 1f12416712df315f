//! Version conflicts seen during resolution.
//!
//! A conflict is recorded whenever an artifact identity was skipped because
//! another version of it was already in the resolved set.

use std::fmt;

/// A report of all version conflicts encountered during resolution.
#[derive(Debug, Clone, Default)]
pub struct ConflictReport {
    pub conflicts: Vec<VersionConflict>,
}

/// One skipped request: `dependent` asked for `requested` but `resolved`
/// had already been chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConflict {
    pub group: String,
    pub artifact: String,
    pub requested: String,
    pub resolved: String,
    pub dependent: String,
}

impl ConflictReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a conflict; an identical one already recorded is not repeated.
    pub fn add(&mut self, conflict: VersionConflict) {
        if !self.conflicts.contains(&conflict) {
            self.conflicts.push(conflict);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conflicts.is_empty() {
            return write!(f, "No version conflicts.");
        }
        writeln!(f, "Version conflicts ({}):", self.conflicts.len())?;
        for c in &self.conflicts {
            writeln!(f, "  {c}")?;
        }
        Ok(())
    }
}

impl fmt::Display for VersionConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} requested {} by {} but resolved {}",
            self.group, self.artifact, self.requested, self.dependent, self.resolved
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conflict() -> VersionConflict {
        VersionConflict {
            group: "org.example".to_string(),
            artifact: "lib".to_string(),
            requested: "2.0".to_string(),
            resolved: "1.0".to_string(),
            dependent: "org.example:app:1.0".to_string(),
        }
    }

    #[test]
    fn empty_report() {
        let report = ConflictReport::new();
        assert!(report.is_empty());
        assert_eq!(report.len(), 0);
        assert_eq!(report.to_string(), "No version conflicts.");
    }

    #[test]
    fn report_with_conflicts() {
        let mut report = ConflictReport::new();
        report.add(conflict());
        report.add(conflict());
        assert_eq!(report.len(), 1);
        let s = report.to_string();
        assert!(s.contains("org.example:lib requested 2.0"));
        assert!(s.contains("but resolved 1.0"));
    }
}
