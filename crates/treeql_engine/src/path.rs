//! Addresses of nodes in the tree view.
//!
//! A path names an operation and then one segment per tree level:
//!
//! ```text
//! user.friends(first).@User.name      fields, an argument, an inline fragment
//! signUp(company){address}{city}      input fields of an argument
//! search(filter)[1]{term}             a list row
//! 1:ping                              a field of the second operation
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PathError;

/// One step from a tree node to one of its children.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "key", rename_all = "camelCase")]
pub enum PathSegment {
    Field(String),
    Fragment(String),
    Argument(String),
    InputField(String),
    Row(usize),
}

/// The address of a node in the tree view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TreePath {
    pub operation: usize,
    pub segments: Vec<PathSegment>,
}

impl TreePath {
    #[must_use]
    pub const fn new(operation: usize) -> Self {
        Self {
            operation,
            segments: Vec::new(),
        }
    }

    /// This path extended by one segment.
    #[must_use]
    pub fn child(&self, segment: PathSegment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self {
            operation: self.operation,
            segments,
        }
    }

    #[must_use]
    pub fn field(&self, name: impl Into<String>) -> Self {
        self.child(PathSegment::Field(name.into()))
    }

    #[must_use]
    pub fn fragment(&self, type_name: impl Into<String>) -> Self {
        self.child(PathSegment::Fragment(type_name.into()))
    }

    #[must_use]
    pub fn argument(&self, name: impl Into<String>) -> Self {
        self.child(PathSegment::Argument(name.into()))
    }

    #[must_use]
    pub fn input_field(&self, name: impl Into<String>) -> Self {
        self.child(PathSegment::InputField(name.into()))
    }

    #[must_use]
    pub fn row(&self, index: usize) -> Self {
        self.child(PathSegment::Row(index))
    }

    /// The path of the parent node, `None` at the operation.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.segments.split_last()?;
        Some(Self {
            operation: self.operation,
            segments: rest.to_vec(),
        })
    }

    #[must_use]
    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Number of segments.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Whether this path is `ancestor` or lies below it.
    #[must_use]
    pub fn starts_with(&self, ancestor: &Self) -> bool {
        self.operation == ancestor.operation && self.segments.starts_with(&ancestor.segments)
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.operation > 0 {
            write!(f, "{}:", self.operation)?;
        }
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if i == 0 => f.write_str(name)?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Fragment(name) if i == 0 => write!(f, "@{name}")?,
                PathSegment::Fragment(name) => write!(f, ".@{name}")?,
                PathSegment::Argument(name) => write!(f, "({name})")?,
                PathSegment::InputField(name) => write!(f, "{{{name}}}")?,
                PathSegment::Row(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for TreePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PathParser::new(s).parse()
    }
}

struct PathParser<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> PathParser<'a> {
    const fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    fn parse(mut self) -> Result<TreePath, PathError> {
        let mut path = TreePath::new(self.operation_prefix()?);

        while let Some(c) = self.peek() {
            let segment = match c {
                '.' => {
                    if path.segments.is_empty() {
                        return Err(self.error("path cannot start with `.`"));
                    }
                    self.pos += 1;
                    self.field_or_fragment()?
                }
                '(' => PathSegment::Argument(self.delimited('(', ')')?),
                '{' => PathSegment::InputField(self.delimited('{', '}')?),
                '[' => {
                    let start = self.pos;
                    let digits = self.delimited_raw('[', ']')?;
                    let index = digits.parse().map_err(|_| PathError {
                        path: self.source.to_string(),
                        offset: start + 1,
                        message: "expected a row number".to_string(),
                    })?;
                    PathSegment::Row(index)
                }
                _ if path.segments.is_empty() => self.field_or_fragment()?,
                _ => return Err(self.error("expected `.`, `(`, `{` or `[`")),
            };
            path.segments.push(segment);
        }

        if path.segments.is_empty() {
            return Err(self.error("empty path"));
        }
        Ok(path)
    }

    /// Parses an optional `N:` operation index.
    fn operation_prefix(&mut self) -> Result<usize, PathError> {
        let digits = self
            .source
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        if digits == 0 || self.source.as_bytes().get(digits) != Some(&b':') {
            return Ok(0);
        }
        let index = self.source[..digits]
            .parse()
            .map_err(|_| self.error("operation index out of range"))?;
        self.pos = digits + 1;
        Ok(index)
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn field_or_fragment(&mut self) -> Result<PathSegment, PathError> {
        if self.peek() == Some('@') {
            self.pos += 1;
            Ok(PathSegment::Fragment(self.name()?))
        } else {
            Ok(PathSegment::Field(self.name()?))
        }
    }

    fn name(&mut self) -> Result<String, PathError> {
        let rest = &self.source[self.pos..];
        let len = rest
            .char_indices()
            .find(|&(i, c)| !(c == '_' || c.is_ascii_alphabetic() || (i > 0 && c.is_ascii_digit())))
            .map_or(rest.len(), |(i, _)| i);
        if len == 0 {
            return Err(self.error("expected a name"));
        }
        self.pos += len;
        Ok(rest[..len].to_string())
    }

    fn delimited(&mut self, open: char, close: char) -> Result<String, PathError> {
        self.expect(open)?;
        let name = self.name()?;
        self.expect(close)?;
        Ok(name)
    }

    fn delimited_raw(&mut self, open: char, close: char) -> Result<&'a str, PathError> {
        self.expect(open)?;
        let rest = &self.source[self.pos..];
        let end = rest
            .find(close)
            .ok_or_else(|| self.error(&format!("missing `{close}`")))?;
        self.pos += end + close.len_utf8();
        Ok(&rest[..end])
    }

    fn expect(&mut self, c: char) -> Result<(), PathError> {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            Ok(())
        } else {
            Err(self.error(&format!("expected `{c}`")))
        }
    }

    fn error(&self, message: &str) -> PathError {
        PathError {
            path: self.source.to_string(),
            offset: self.pos,
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_starts_with() {
        let user: TreePath = "user".parse().unwrap();
        let name: TreePath = "user.name".parse().unwrap();
        assert!(name.starts_with(&user));
        assert!(user.starts_with(&user));
        assert!(!user.starts_with(&name));
        assert!(!"1:user.name".parse::<TreePath>().unwrap().starts_with(&user));
        assert!(!"users".parse::<TreePath>().unwrap().starts_with(&user));
    }

    #[test]
    fn test_parse_and_display() {
        for text in [
            "user",
            "user.friends(first).@User.name",
            "signUp(company){address}{city}",
            "search(filter)[1]{term}",
            "1:ping",
            "@User.name",
        ] {
            let path: TreePath = text.parse().unwrap();
            assert_eq!(path.to_string(), text);
        }
    }

    #[test]
    fn test_parsed_segments() {
        let path: TreePath = "2:search(filter)[1]{term}".parse().unwrap();
        assert_eq!(
            path,
            TreePath::new(2)
                .field("search")
                .argument("filter")
                .row(1)
                .input_field("term")
        );
        assert_eq!(path.depth(), 4);
        assert_eq!(path.last(), Some(&PathSegment::InputField("term".to_string())));
        assert_eq!(path.parent().unwrap().to_string(), "2:search(filter)[1]");
        assert_eq!(TreePath::new(0).parent(), None);
    }

    #[test]
    fn test_invalid_paths() {
        for (text, offset) in [("", 0), (".user", 0), ("user..name", 5), ("user(", 5), ("a[x]", 2), ("a b", 1)] {
            let err = text.parse::<TreePath>().unwrap_err();
            assert_eq!(err.offset, offset, "{text}");
        }
    }
}
