//! # Version Comparator
//!
//! Orders dot-separated numeric version strings segment by segment.
//!
//! Comparison is numeric, never lexicographic: `"1.9"` sorts before `"1.10"`.
//! Missing trailing segments compare as zero, so `"1.2"` and `"1.2.0"` are
//! equal.

use crate::CatalogError;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A parsed version: one non-negative integer per dot-separated segment.
#[derive(Debug, Clone)]
pub struct Version {
    segments: Vec<u64>,
}

impl Version {
    /// Parse a version string.
    ///
    /// Each segment must be a non-empty run of ASCII digits that fits in a
    /// `u64`. Signs, whitespace and empty segments are rejected.
    pub fn parse(input: &str) -> Result<Self, CatalogError> {
        let segments = input
            .split('.')
            .map(|segment| {
                if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(CatalogError::InvalidVersion(input.to_string()));
                }
                segment
                    .parse::<u64>()
                    .map_err(|_| CatalogError::InvalidVersion(input.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { segments })
    }

    /// The numeric segments, in order.
    #[must_use]
    pub fn segments(&self) -> &[u64] {
        &self.segments
    }

    /// Byte key whose lexicographic order is the version order.
    ///
    /// Trailing zero segments are dropped and the rest are written as
    /// big-endian `u64`s, so equal versions share a key.
    #[must_use]
    pub fn sort_key(&self) -> Vec<u8> {
        let significant = self
            .segments
            .iter()
            .rposition(|&segment| segment != 0)
            .map_or(0, |last| last + 1);
        self.segments[..significant]
            .iter()
            .flat_map(|segment| segment.to_be_bytes())
            .collect()
    }
}

impl FromStr for Version {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        (0..len)
            .map(|i| {
                let a = self.segments.get(i).copied().unwrap_or(0);
                let b = other.segments.get(i).copied().unwrap_or(0);
                a.cmp(&b)
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

/// Compare two version strings numerically.
///
/// Fails with `InvalidVersion` if either side does not parse.
pub fn compare_versions(a: &str, b: &str) -> Result<Ordering, CatalogError> {
    Ok(Version::parse(a)?.cmp(&Version::parse(b)?))
}

// =============================================================================
// TESTS
// =============================================================================
