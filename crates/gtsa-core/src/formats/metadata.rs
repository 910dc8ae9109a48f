//! # Metadata Tags
//!
//! Histogram files carry named parameters on comment lines:
//!
//! ```text
//! # qcoord = 4
//! # qdih = 3
//! ```
//!
//! The first token after `#` is the tag; the remaining tokens are its values.
//! Scalar lookups use the last value, so both `# qdih 3` and `# qdih = 3`
//! read as `3`. A repeated tag keeps its last occurrence.

use std::collections::BTreeMap;
use std::io::{BufRead, Write};

use crate::{GtsaError, primitives};

/// Tag name -> value tokens parsed from `#` comment lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    tags: BTreeMap<String, Vec<String>>,
}

impl Metadata {
    /// Create an empty tag set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every comment line of a stream, ignoring data lines.
    pub fn read<R: BufRead>(reader: R) -> Result<Self, GtsaError> {
        let mut meta = Self::new();
        for line in reader.lines() {
            meta.absorb_line(&line?);
        }
        Ok(meta)
    }

    /// Parse tags from an in-memory document.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut meta = Self::new();
        for line in text.lines() {
            meta.absorb_line(line);
        }
        meta
    }

    /// Record the tag on `line` if it is a comment line. Returns whether the
    /// line was a comment (tagged or not).
    pub(crate) fn absorb_line(&mut self, line: &str) -> bool {
        let Some(body) = line.trim_start().strip_prefix(primitives::COMMENT_PREFIX) else {
            return false;
        };
        let mut tokens = body.split_whitespace();
        if let Some(tag) = tokens.next() {
            self.tags
                .insert(tag.to_string(), tokens.map(str::to_string).collect());
        }
        true
    }

    /// Set a tag, replacing any previous values.
    pub fn insert(&mut self, tag: impl Into<String>, values: Vec<String>) {
        self.tags.insert(tag.into(), values);
    }

    /// Set a scalar tag written as `# tag = value`.
    pub fn insert_scalar(&mut self, tag: impl Into<String>, value: f64) {
        self.insert(tag, vec!["=".to_string(), value.to_string()]);
    }

    /// All value tokens of a tag.
    #[must_use]
    pub fn values(&self, tag: &str) -> Option<&[String]> {
        self.tags.get(tag).map(Vec::as_slice)
    }

    /// Whether the tag is present.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains_key(tag)
    }

    /// The last token of a tag parsed as a number.
    pub fn scalar(&self, tag: &str) -> Result<f64, GtsaError> {
        let values = self
            .values(tag)
            .ok_or_else(|| GtsaError::MissingTag(tag.to_string()))?;
        let last = values.last().ok_or_else(|| GtsaError::InvalidTag {
            tag: tag.to_string(),
            value: String::new(),
        })?;
        last.parse::<f64>().map_err(|_| GtsaError::InvalidTag {
            tag: tag.to_string(),
            value: last.clone(),
        })
    }

    /// Number of distinct tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Whether no tags were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Write every tag as a `# tag values...` line, in tag order.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<(), GtsaError> {
        for (tag, values) in &self.tags {
            if values.is_empty() {
                writeln!(writer, "# {}", tag)?;
            } else {
                writeln!(writer, "# {} {}", tag, values.join(" "))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_is_last_token() {
        let meta = Metadata::parse("# qcoord = 4\n# qdih 3\n0 0 1\n");
        assert_eq!(meta.scalar("qcoord").expect("qcoord"), 4.0);
        assert_eq!(meta.scalar("qdih").expect("qdih"), 3.0);
        assert_eq!(
            meta.values("qcoord").expect("values"),
            &["=".to_string(), "4".to_string()]
        );
    }

    #[test]
    fn duplicate_tag_last_wins() {
        let meta = Metadata::parse("# qdih 2\n# qdih 5\n");
        assert_eq!(meta.scalar("qdih").expect("qdih"), 5.0);
        assert_eq!(meta.len(), 1);
    }

    #[test]
    fn missing_and_invalid_tags() {
        let meta = Metadata::parse("# qcoord = four\n# empty\n#\n");
        assert!(matches!(meta.scalar("qdih"), Err(GtsaError::MissingTag(_))));
        assert!(matches!(
            meta.scalar("qcoord"),
            Err(GtsaError::InvalidTag { .. })
        ));
        assert!(matches!(
            meta.scalar("empty"),
            Err(GtsaError::InvalidTag { .. })
        ));
    }

    #[test]
    fn read_collects_tags_from_stream() {
        let text = "# qcoord = 4\n0 0 0\n\n# qdih = 3\n1 0 1.5\n";
        let meta = Metadata::read(text.as_bytes()).expect("read");
        assert!(meta.contains("qcoord"));
        assert!(meta.contains("qdih"));
        assert!(!meta.contains("0"));
        assert_eq!(meta.len(), 2);
        assert_eq!(meta, Metadata::parse(text));
    }

    #[test]
    fn data_lines_ignored() {
        let meta = Metadata::parse("1 0 2.5\n\n");
        assert!(meta.is_empty());
    }

    #[test]
    fn written_tags_parse_back() {
        let mut meta = Metadata::new();
        meta.insert_scalar("qcoord", 4.0);
        meta.insert_scalar("qdih", 2.5);
        let mut out = Vec::new();
        meta.write(&mut out).expect("write");
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(text, "# qcoord = 4\n# qdih = 2.5\n");
        assert_eq!(Metadata::parse(&text), meta);
    }
}
