//! Versions, locations and constraints.
//!
//! A [`BinaryVersion`] pairs a semantic version with the place its artifact
//! lives. Equality, hashing and ordering look at the version only, so the same
//! release seen locally and remotely collapses to one set entry.
//!
//! File names encode versions as `<tool>-v<version>`. Decoding takes the
//! trailing dash-delimited part and strips one leading tag letter, see
//! [`decode_file_name`].

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use semver::{Version, VersionReq};

/// Where the artifact of a [`BinaryVersion`] can be obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Direct download URL from a remote index.
    Url(String),
    /// File inside a cache directory.
    Path(PathBuf),
}

impl Location {
    /// Returns the URL for remote locations.
    #[must_use]
    pub fn as_url(&self) -> Option<&str> {
        match self {
            Self::Url(url) => Some(url),
            Self::Path(_) => None,
        }
    }

    /// Returns the file path for local locations.
    #[must_use]
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(path) => Some(path),
            Self::Url(_) => None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A version plus the location of its artifact.
#[derive(Debug, Clone)]
pub struct BinaryVersion {
    /// The semantic version; the identity of this value.
    pub version: Version,
    /// Where the artifact lives; metadata only.
    pub location: Location,
}

impl BinaryVersion {
    /// Creates a version available for download at `url`.
    #[must_use]
    pub fn remote(version: Version, url: impl Into<String>) -> Self {
        Self {
            version,
            location: Location::Url(url.into()),
        }
    }

    /// Creates a version present at `path` in a cache directory.
    #[must_use]
    pub fn local(version: Version, path: impl Into<PathBuf>) -> Self {
        Self {
            version,
            location: Location::Path(path.into()),
        }
    }
}

impl PartialEq for BinaryVersion {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
    }
}

impl Eq for BinaryVersion {}

impl PartialOrd for BinaryVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BinaryVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.version.cmp(&other.version)
    }
}

impl Hash for BinaryVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.version.hash(state);
    }
}

impl fmt::Display for BinaryVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.version.fmt(f)
    }
}

/// A predicate over versions plus a "pick the maximum" selection rule.
///
/// Wraps [`semver::VersionReq`]. A bare version such as `1.2.0` means exactly
/// that version rather than cargo's caret default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConstraint {
    raw: String,
    req: VersionReq,
}

impl VersionConstraint {
    /// Parses a constraint expression.
    ///
    /// # Errors
    ///
    /// Returns the semver error if `input` is neither a version nor a range.
    pub fn parse(input: &str) -> Result<Self, semver::Error> {
        let trimmed = input.trim();
        let req = match Version::parse(trimmed) {
            Ok(version) => Self::exact(&version).req,
            Err(_) => VersionReq::parse(trimmed)?,
        };
        Ok(Self {
            raw: trimmed.to_string(),
            req,
        })
    }

    /// Constraint matching exactly `version`, pre-release included.
    #[must_use]
    pub fn exact(version: &Version) -> Self {
        let comparator = semver::Comparator {
            op: semver::Op::Exact,
            major: version.major,
            minor: Some(version.minor),
            patch: Some(version.patch),
            pre: version.pre.clone(),
        };
        Self {
            raw: version.to_string(),
            req: VersionReq {
                comparators: vec![comparator],
            },
        }
    }

    /// Whether `version` satisfies this constraint.
    #[must_use]
    pub fn matches(&self, version: &Version) -> bool {
        self.req.matches(version)
    }

    /// Returns the greatest element of `candidates` satisfying the constraint.
    pub fn select<'a, I>(&self, candidates: I) -> Option<&'a BinaryVersion>
    where
        I: IntoIterator<Item = &'a BinaryVersion>,
    {
        candidates
            .into_iter()
            .filter(|candidate| self.matches(&candidate.version))
            .max()
    }
}

impl FromStr for VersionConstraint {
    type Err = semver::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Strips one leading tag character (such as the `v` in `v1.2.0`).
///
/// Only a non-digit first character is treated as a tag, so an untagged
/// `1.4.2` comes back unchanged instead of losing its major version.
#[must_use]
pub fn strip_tag_prefix(segment: &str) -> &str {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) if !first.is_ascii_digit() => chars.as_str(),
        _ => segment,
    }
}

/// Decodes the version encoded at the end of an artifact file name.
///
/// The version is the trailing dash-delimited part of the name with one tag
/// letter stripped: `zkvyper-linux-amd64-musl-v1.3.9` decodes to `1.3.9`.
/// Pre-release versions contain dashes themselves, so candidates are tried
/// from the leftmost dash onward and the first one that parses wins:
/// `zkvyper-v2.0.0-beta.1` decodes to `2.0.0-beta.1`.
///
/// Returns `None` when no suffix decodes to a version.
#[must_use]
pub fn decode_file_name(name: &str) -> Option<Version> {
    name.match_indices('-')
        .map(|(idx, _)| &name[idx + 1..])
        .chain(std::iter::once(name))
        .find_map(|candidate| Version::parse(strip_tag_prefix(candidate)).ok())
}

/// Encodes a version into an artifact file name for `tool`.
#[must_use]
pub fn encode_file_name(tool: &str, version: &Version) -> String {
    format!("{tool}-v{version}")
}
