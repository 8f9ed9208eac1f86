//! Location of a structure mismatch inside nested data.

use std::fmt;

/// One step from a parent value to a child value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A mapping key.
    Key(String),
    /// A sequence index.
    Index(usize),
}

/// Keys and indices accumulated while recursing into a value.
///
/// Renders as `dict.foo`, `list[2]`, `a.b[0].c`; the root renders as `$`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationPath {
    segments: Vec<PathSegment>,
}

impl ValidationPath {
    /// The empty path (the root value).
    pub fn root() -> Self {
        Self::default()
    }

    pub fn push_key(&mut self, key: impl Into<String>) {
        self.segments.push(PathSegment::Key(key.into()));
    }

    pub fn push_index(&mut self, index: usize) {
        self.segments.push(PathSegment::Index(index));
    }

    pub fn pop(&mut self) -> Option<PathSegment> {
        self.segments.pop()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for ValidationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "$");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => write!(f, "{key}")?,
                PathSegment::Key(key) => write!(f, ".{key}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_display() {
        assert_eq!(ValidationPath::root().to_string(), "$");
    }

    #[test]
    fn test_mixed_path_display() {
        let mut path = ValidationPath::root();
        path.push_key("plugins");
        path.push_index(2);
        path.push_key("name");
        assert_eq!(path.to_string(), "plugins[2].name");
    }

    #[test]
    fn test_leading_index() {
        let mut path = ValidationPath::root();
        path.push_index(0);
        path.push_key("id");
        assert_eq!(path.to_string(), "[0].id");
    }

    #[test]
    fn test_pop_returns_last_segment() {
        let mut path = ValidationPath::root();
        path.push_key("a");
        path.push_index(1);
        assert_eq!(path.pop(), Some(PathSegment::Index(1)));
        assert_eq!(path.to_string(), "a");
        path.pop();
        assert!(path.is_root());
    }
}
