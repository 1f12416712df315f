//! Maven version ordering and range matching.
//!
//! Versions are split on `.` and `-` into segments which are compared slot by
//! slot. Within a slot the order is:
//!
//! `alpha` < `beta` < `milestone` < `rc` < `snapshot` < missing/release < `sp`
//! < other text < numbers
//!
//! so `1.2.0-SNAPSHOT` < `1.2.0` < `1.2.1`, and a missing segment sorts below
//! any number or free text (`1.0` < `1.0.0` < `1.0.0-jre`).

use std::cmp::Ordering;
use std::fmt;

use jargo_util::errors::JargoError;

/// A parsed Maven version with comparable segments.
#[derive(Debug, Clone)]
pub struct MavenVersion {
    pub original: String,
    segments: Vec<Segment>,
}

impl PartialEq for MavenVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MavenVersion {}

#[derive(Debug, Clone, Eq, PartialEq)]
enum Segment {
    Numeric(u64),
    Qualifier(QualifierKind),
    Text(String),
}

/// Well-known Maven qualifiers with defined ordering.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
enum QualifierKind {
    Alpha,
    Beta,
    Milestone,
    Rc,
    Snapshot,
    Release,
    Sp,
}

impl Segment {
    fn rank(seg: Option<&Segment>) -> u8 {
        match seg {
            Some(Segment::Qualifier(q)) if *q < QualifierKind::Release => 0,
            None | Some(Segment::Qualifier(QualifierKind::Release)) => 1,
            Some(Segment::Qualifier(_)) => 2,
            Some(Segment::Text(_)) => 3,
            Some(Segment::Numeric(_)) => 4,
        }
    }
}

impl MavenVersion {
    pub fn parse(version: &str) -> Self {
        Self {
            original: version.to_string(),
            segments: parse_segments(version),
        }
    }

    pub fn is_snapshot(&self) -> bool {
        self.original.ends_with("-SNAPSHOT")
    }

    /// The base version without the `-SNAPSHOT` suffix.
    pub fn base_version(&self) -> &str {
        self.original
            .strip_suffix("-SNAPSHOT")
            .unwrap_or(&self.original)
    }
}

impl fmt::Display for MavenVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl Ord for MavenVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let max_len = self.segments.len().max(other.segments.len());
        for i in 0..max_len {
            let ord = compare_segments(self.segments.get(i), other.segments.get(i));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for MavenVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn compare_segments(a: Option<&Segment>, b: Option<&Segment>) -> Ordering {
    let by_rank = Segment::rank(a).cmp(&Segment::rank(b));
    if by_rank != Ordering::Equal {
        return by_rank;
    }
    match (a, b) {
        (Some(Segment::Numeric(a)), Some(Segment::Numeric(b))) => a.cmp(b),
        (Some(Segment::Qualifier(a)), Some(Segment::Qualifier(b))) => a.cmp(b),
        (Some(Segment::Text(a)), Some(Segment::Text(b))) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

fn parse_segments(version: &str) -> Vec<Segment> {
    version
        .split(['.', '-'])
        .filter(|token| !token.is_empty())
        .map(classify)
        .collect()
}

fn classify(token: &str) -> Segment {
    if let Ok(n) = token.parse::<u64>() {
        return Segment::Numeric(n);
    }
    let lower = token.to_lowercase();
    match lower.as_str() {
        "alpha" | "a" => Segment::Qualifier(QualifierKind::Alpha),
        "beta" | "b" => Segment::Qualifier(QualifierKind::Beta),
        "milestone" | "m" => Segment::Qualifier(QualifierKind::Milestone),
        "rc" | "cr" => Segment::Qualifier(QualifierKind::Rc),
        "snapshot" => Segment::Qualifier(QualifierKind::Snapshot),
        "ga" | "final" | "release" => Segment::Qualifier(QualifierKind::Release),
        "sp" => Segment::Qualifier(QualifierKind::Sp),
        _ => Segment::Text(lower),
    }
}

/// Compare two version strings under the Maven order.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    MavenVersion::parse(a).cmp(&MavenVersion::parse(b))
}

/// Whether a version expression is a range (`[...]` or `(...)`).
pub fn is_range(version: &str) -> bool {
    let v = version.trim_start();
    v.starts_with('[') || v.starts_with('(')
}

/// A Maven version range expression.
///
/// Supports: `[1.0,2.0)`, `[1.0,]`, `(,2.0)`, `[1.0]` (exact).
#[derive(Debug, Clone)]
pub struct VersionRange {
    pub lower: Option<Bound>,
    pub upper: Option<Bound>,
}

#[derive(Debug, Clone)]
pub struct Bound {
    pub version: MavenVersion,
    pub inclusive: bool,
}

impl VersionRange {
    /// Parse a Maven version range string.
    ///
    /// Returns `Ok(None)` for bare versions (not a range) and an error for a
    /// range that cannot be understood.
    pub fn parse(spec: &str) -> miette::Result<Option<Self>> {
        let s = spec.trim();
        if !is_range(s) {
            return Ok(None);
        }
        let malformed = |message: &str| JargoError::MalformedVersion {
            expression: spec.to_string(),
            message: message.to_string(),
        };

        let open_inclusive = s.starts_with('[');
        let close_inclusive = match s.chars().last() {
            Some(']') => true,
            Some(')') if s.len() > 1 => false,
            _ => return Err(malformed("missing closing bracket").into()),
        };
        let inner = &s[1..s.len() - 1];
        if inner.contains(['[', ']', '(', ')']) {
            return Err(malformed("unions of ranges are not supported").into());
        }

        match inner.split_once(',') {
            Some((lower, upper)) => {
                if upper.contains(',') {
                    return Err(malformed("too many bounds").into());
                }
                let bound = |v: &str, inclusive: bool| {
                    let v = v.trim();
                    (!v.is_empty()).then(|| Bound {
                        version: MavenVersion::parse(v),
                        inclusive,
                    })
                };
                let range = VersionRange {
                    lower: bound(lower, open_inclusive),
                    upper: bound(upper, close_inclusive),
                };
                if let (Some(lo), Some(hi)) = (&range.lower, &range.upper) {
                    if lo.version > hi.version {
                        return Err(malformed("lower bound exceeds upper bound").into());
                    }
                }
                Ok(Some(range))
            }
            None => {
                let inner = inner.trim();
                if inner.is_empty() || !open_inclusive || !close_inclusive {
                    return Err(malformed("an exact version must be written as [x]").into());
                }
                let v = MavenVersion::parse(inner);
                Ok(Some(VersionRange {
                    lower: Some(Bound {
                        version: v.clone(),
                        inclusive: true,
                    }),
                    upper: Some(Bound {
                        version: v,
                        inclusive: true,
                    }),
                }))
            }
        }
    }

    /// Check if a version satisfies this range.
    pub fn contains(&self, version: &MavenVersion) -> bool {
        if let Some(ref lower) = self.lower {
            let cmp = version.cmp(&lower.version);
            if cmp == Ordering::Less || (!lower.inclusive && cmp == Ordering::Equal) {
                return false;
            }
        }
        if let Some(ref upper) = self.upper {
            let cmp = version.cmp(&upper.version);
            if cmp == Ordering::Greater || (!upper.inclusive && cmp == Ordering::Equal) {
                return false;
            }
        }
        true
    }

    /// The highest of `candidates` inside this range.
    pub fn highest<'a>(&self, candidates: impl IntoIterator<Item = &'a str>) -> Option<String> {
        candidates
            .into_iter()
            .map(MavenVersion::parse)
            .filter(|v| self.contains(v))
            .max()
            .map(|v| v.original)
    }
}
