//! Storage path model.
//!
//! Every path handed to a [`BlobStore`] is an [`Area`] plus a validated
//! relative path. The internal string form `"<area>/<relative>"` is produced
//! and parsed here and nowhere else; callers never strip prefixes by hand.
//!
//! [`BlobStore`]: crate::storage::BlobStore

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, UploadError};

/// Logical storage area.
///
/// `Private` holds originals and assembled artifacts; `Public` is the
/// subtree a static file route may serve directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Area {
    Private,
    Public,
}

impl Area {
    pub fn as_str(&self) -> &'static str {
        match self {
            Area::Private => "private",
            Area::Public => "public",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "private" => Some(Area::Private),
            "public" => Some(Area::Public),
            _ => None,
        }
    }
}

/// A validated (area, relative path) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePath {
    area: Area,
    rel: String,
}

impl StoragePath {
    /// Builds a path from an area and a `/`-separated relative path.
    ///
    /// Segments may not be empty, `.`, `..`, or contain `\`, `:` or NUL;
    /// anything a filesystem could reinterpret is rejected up front.
    pub fn new(area: Area, rel: impl Into<String>) -> Result<Self> {
        let rel = rel.into();
        validate_relative(&rel)?;
        Ok(Self { area, rel })
    }

    pub fn private(rel: impl Into<String>) -> Result<Self> {
        Self::new(Area::Private, rel)
    }

    pub fn public(rel: impl Into<String>) -> Result<Self> {
        Self::new(Area::Public, rel)
    }

    pub fn area(&self) -> Area {
        self.area
    }

    /// Caller-facing form: the relative path without the area prefix.
    pub fn relative(&self) -> &str {
        &self.rel
    }

    /// Internal string form, `"<area>/<relative>"`. This is what gets
    /// persisted in file records.
    pub fn to_internal(&self) -> String {
        format!("{}/{}", self.area.as_str(), self.rel)
    }

    /// Parses the internal string form back into a typed path.
    pub fn from_internal(s: &str) -> Result<Self> {
        let (area, rel) = s
            .split_once('/')
            .ok_or_else(|| UploadError::InvalidPath(s.to_string()))?;
        let area = Area::parse(area).ok_or_else(|| UploadError::InvalidPath(s.to_string()))?;
        Self::new(area, rel)
    }

    /// Appends one path segment.
    pub fn join(&self, segment: &str) -> Result<Self> {
        Self::new(self.area, format!("{}/{}", self.rel, segment))
    }

    /// Absolute location under a storage root.
    pub(crate) fn on_disk(&self, root: &Path) -> PathBuf {
        let mut path = root.join(self.area.as_str());
        for segment in self.rel.split('/') {
            path.push(segment);
        }
        path
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.area.as_str(), self.rel)
    }
}

fn validate_relative(rel: &str) -> Result<()> {
    if rel.is_empty() {
        return Err(UploadError::InvalidPath(rel.to_string()));
    }

    for segment in rel.split('/') {
        let ok = !segment.is_empty()
            && segment != "."
            && segment != ".."
            && !segment.contains(['\\', ':', '\0']);
        if !ok {
            return Err(UploadError::InvalidPath(rel.to_string()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_round_trip() {
        let path = StoragePath::private("uploads/7/notes/abc.pdf").unwrap();
        let internal = path.to_internal();
        assert_eq!(internal, "private/uploads/7/notes/abc.pdf");

        let parsed = StoragePath::from_internal(&internal).unwrap();
        assert_eq!(parsed, path);
        assert_eq!(parsed.to_internal(), internal);
    }

    #[test]
    fn relative_form_round_trip() {
        let path = StoragePath::public("uploads/3/avatar/x.png").unwrap();
        assert_eq!(path.relative(), "uploads/3/avatar/x.png");

        // Area + relative form reconstructs the same path.
        let rebuilt = StoragePath::new(path.area(), path.relative()).unwrap();
        assert_eq!(rebuilt, path);
    }

    #[test]
    fn rejects_traversal_and_absolute() {
        assert!(StoragePath::private("../etc/passwd").is_err());
        assert!(StoragePath::private("uploads/../../x").is_err());
        assert!(StoragePath::private("/uploads/x").is_err());
        assert!(StoragePath::private("uploads//x").is_err());
        assert!(StoragePath::private("uploads/./x").is_err());
        assert!(StoragePath::private("").is_err());
        assert!(StoragePath::private("uploads/a\\b").is_err());
    }

    #[test]
    fn rejects_unknown_area() {
        assert!(StoragePath::from_internal("shared/uploads/x").is_err());
        assert!(StoragePath::from_internal("no-separator").is_err());
    }

    #[test]
    fn join_validates_segments() {
        let base = StoragePath::private("tmp/chunks").unwrap();
        assert_eq!(
            base.join("abc").unwrap().to_internal(),
            "private/tmp/chunks/abc"
        );
        assert!(base.join("..").is_err());
        assert!(base.join("").is_err());
    }

    #[test]
    fn on_disk_nests_under_area() {
        let path = StoragePath::private("uploads/1/a.txt").unwrap();
        let abs = path.on_disk(Path::new("/srv/data"));
        assert_eq!(abs, PathBuf::from("/srv/data/private/uploads/1/a.txt"));
    }
}
