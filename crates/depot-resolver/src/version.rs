//! Dotted-numeric version ordering used to rank candidate versions.
//!
//! Versions are split on `.` and compared segment by segment as integers,
//! left to right. A shorter version is padded with zeros on the right, so
//! `1.2` and `1.2.0` compare equal. A segment that does not start with a
//! digit counts as `0`; a segment such as `3-rc1` contributes its leading
//! digits (`3`).

use std::cmp::Ordering;
use std::fmt;

/// A version string with its parsed numeric segments.
#[derive(Debug, Clone)]
pub struct NumericVersion {
    pub original: String,
    segments: Vec<u64>,
}

impl NumericVersion {
    pub fn parse(version: &str) -> Self {
        Self {
            original: version.to_string(),
            segments: version.split('.').map(leading_number).collect(),
        }
    }

    pub fn segments(&self) -> &[u64] {
        &self.segments
    }
}

fn leading_number(segment: &str) -> u64 {
    let digits: String = segment
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

impl PartialEq for NumericVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for NumericVersion {}

impl Ord for NumericVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let max_len = self.segments.len().max(other.segments.len());
        for i in 0..max_len {
            let a = self.segments.get(i).copied().unwrap_or(0);
            let b = other.segments.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for NumericVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for NumericVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

/// Compare two version strings numerically.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    NumericVersion::parse(a).cmp(&NumericVersion::parse(b))
}

/// Sort version strings newest first.
///
/// Numerically equal versions (`1.0` vs `1.0.0`) are ordered by their raw
/// text so the result is deterministic.
pub fn sort_descending(versions: &mut [String]) {
    versions.sort_by(|a, b| compare_versions(b, a).then_with(|| b.cmp(a)));
}
