//! Fully-qualified attribute paths.
//!
//! A path is the ordered list of name segments from the top of the form down
//! to an attribute. Its dotted rendering keys locale entries, conditionals,
//! interaction hints and read-only rules.

use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path(Vec<String>);

impl Path {
    pub fn root() -> Self {
        Path(Vec::new())
    }

    /// Split a dotted string into segments. The empty string is the root.
    pub fn parse(dotted: &str) -> Self {
        if dotted.is_empty() {
            return Path::root();
        }
        Path(dotted.split('.').map(str::to_owned).collect())
    }

    pub fn child(&self, segment: &str) -> Path {
        let mut segments = self.0.clone();
        segments.push(segment.to_owned());
        Path(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// True when `self` equals `ancestor` or lies below it.
    pub fn is_within(&self, ancestor: &Path) -> bool {
        !ancestor.is_root() && self.0.starts_with(&ancestor.0)
    }

    /// `<path>.<suffix>`, e.g. the `label` key of an attribute.
    pub fn key(&self, suffix: &str) -> String {
        if self.is_root() {
            suffix.to_owned()
        } else {
            format!("{}.{}", self, suffix)
        }
    }

    /// The first segment and the dotted remainder.
    pub fn split_head(&self) -> Option<(&str, String)> {
        let (head, tail) = self.0.split_first()?;
        Some((head.as_str(), tail.join(".")))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_and_display() {
        let p = Path::root().child("address").child("city");
        assert_eq!(p.to_string(), "address.city");
        assert_eq!(p.key("label"), "address.city.label");
        assert_eq!(Path::root().key("label"), "label");
    }

    #[test]
    fn within_matches_self_and_descendants_only() {
        let ro = Path::parse("address");
        assert!(Path::parse("address").is_within(&ro));
        assert!(Path::parse("address.city").is_within(&ro));
        assert!(!Path::parse("addresses").is_within(&ro));
        assert!(!Path::parse("home.address").is_within(&ro));
        assert!(!Path::parse("address").is_within(&Path::root()));
    }

    #[test]
    fn split_head_for_rule_facts() {
        let p = Path::parse("q.answer");
        assert_eq!(p.split_head(), Some(("q", "answer".to_string())));
        let deep = Path::parse("a.b.c");
        assert_eq!(deep.split_head(), Some(("a", "b.c".to_string())));
        assert_eq!(Path::root().split_head(), None);
    }
}
