//! Field addresses: ordered keys from the root of the value tree.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

impl PathSegment {
    /// List position addressed by this segment. Digit-only keys count too,
    /// since hosts frequently hand paths over as strings.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathSegment::Index(i) => Some(*i),
            PathSegment::Key(k) => k.parse().ok(),
        }
    }

    pub fn as_key(&self) -> Option<&str> {
        match self {
            PathSegment::Key(k) => Some(k),
            PathSegment::Index(_) => None,
        }
    }

    /// Unescaped text of the segment.
    pub fn raw(&self) -> String {
        match self {
            PathSegment::Index(i) => i.to_string(),
            PathSegment::Key(k) => k.clone(),
        }
    }

    /// True for list-item segments (`3`, `"3"`).
    pub fn is_index(&self) -> bool {
        match self {
            PathSegment::Index(_) => true,
            PathSegment::Key(k) => !k.is_empty() && k.bytes().all(|b| b.is_ascii_digit()),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(k: &str) -> Self { PathSegment::Key(k.to_string()) }
}

impl From<String> for PathSegment {
    fn from(k: String) -> Self { PathSegment::Key(k) }
}

impl From<usize> for PathSegment {
    fn from(i: usize) -> Self { PathSegment::Index(i) }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(i) => write!(f, "{i}"),
            PathSegment::Key(k) => write!(f, "{}", k.replace('~', "~0").replace('/', "~1")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<PathSegment>);

impl Path {
    pub fn root() -> Self { Self(Vec::new()) }

    pub fn segments(&self) -> &[PathSegment] { &self.0 }

    pub fn is_root(&self) -> bool { self.0.is_empty() }

    pub fn last(&self) -> Option<&PathSegment> { self.0.last() }

    /// New path with `segment` appended.
    pub fn join(&self, segment: impl Into<PathSegment>) -> Self {
        let mut out = self.0.clone();
        out.push(segment.into());
        Self(out)
    }

    pub fn parent(&self) -> Option<Path> {
        let (_, init) = self.0.split_last()?;
        Some(Self(init.to_vec()))
    }

    pub fn starts_with(&self, prefix: &Path) -> bool { self.0.starts_with(&prefix.0) }

    /// JSON Pointer rendering, `""` for the root.
    pub fn to_pointer(&self) -> String {
        self.0.iter().map(|s| format!("/{s}")).collect()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "/")
        } else {
            write!(f, "{}", self.to_pointer())
        }
    }
}

impl From<Vec<PathSegment>> for Path {
    fn from(v: Vec<PathSegment>) -> Self { Self(v) }
}

impl FromIterator<PathSegment> for Path {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self { Self(iter.into_iter().collect()) }
}

/// `path!["items", 0, "name"]`
#[macro_export]
macro_rules! path {
    () => { $crate::path::Path::root() };
    ($($seg:expr),+ $(,)?) => {
        $crate::path::Path::from(vec![$($crate::path::PathSegment::from($seg)),+])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_rendering_escapes_keys() {
        let p = path!["a/b", 2usize, "c~d"];
        assert_eq!(p.to_pointer(), "/a~1b/2/c~0d");
        assert_eq!(Path::root().to_string(), "/");
    }

    #[test]
    fn digit_keys_count_as_indexes() {
        assert!(PathSegment::from("12").is_index());
        assert_eq!(PathSegment::from("12").as_index(), Some(12));
        assert!(!PathSegment::from("x1").is_index());
        assert!(!PathSegment::from("").is_index());
    }

    #[test]
    fn deserializes_mixed_segments() {
        let p: Path = serde_json::from_str(r#"["items", 1, "name"]"#).unwrap();
        assert_eq!(p, path!["items", 1usize, "name"]);
    }
}
