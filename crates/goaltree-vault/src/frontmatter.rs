//! Note frontmatter
//!
//! A note is an optional YAML metadata block (`---` ... `---` or `...`) at the
//! very start of the text, followed by the markdown body. Detection follows
//! pulldown-cmark's YAML-style metadata blocks, so a leading thematic break
//! (`---` followed by a blank line) is body, not frontmatter.

use crate::error::FrontmatterError;
use goaltree_core::PropertyBag;
use pulldown_cmark::{Event, MetadataBlockKind, Options, Parser, Tag};
use serde_yaml::Value;

/// Raw frontmatter and body slices of a note
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split<'a> {
    /// YAML text between the delimiters
    pub yaml: &'a str,
    /// Everything after the closing delimiter line
    pub body: &'a str,
}

/// Locate the frontmatter block of a note, if it has one
#[must_use]
pub fn split(text: &str) -> Option<Split<'_>> {
    let open = text.strip_prefix("---")?;
    let open = open.trim_start_matches([' ', '\t']);
    let yaml_start = text.len() - open.strip_prefix("\r\n").or_else(|| open.strip_prefix('\n'))?.len();

    let mut offset = yaml_start;
    let mut closing: Option<(usize, usize)> = None;
    for line in text[yaml_start..].split_inclusive('\n') {
        let fence = line.trim_end();
        if fence == "---" || fence == "..." {
            closing = Some((offset, offset + line.len()));
            break;
        }
        offset += line.len();
    }
    let (yaml_end, body_start) = closing?;

    if yaml_end > yaml_start && !is_metadata_block(text) {
        return None;
    }

    Some(Split {
        yaml: &text[yaml_start..yaml_end],
        body: &text[body_start..],
    })
}

fn is_metadata_block(text: &str) -> bool {
    let mut parser = Parser::new_ext(text, Options::ENABLE_YAML_STYLE_METADATA_BLOCKS);
    matches!(
        parser.next(),
        Some(Event::Start(Tag::MetadataBlock(MetadataBlockKind::YamlStyle)))
    )
}

/// Parse frontmatter YAML into a property bag; empty YAML is an empty bag
pub fn parse_properties(yaml: &str) -> Result<PropertyBag, FrontmatterError> {
    match serde_yaml::from_str::<Value>(yaml)? {
        Value::Null => Ok(PropertyBag::new()),
        Value::Mapping(mapping) => Ok(PropertyBag::from_mapping(mapping)),
        _ => Err(FrontmatterError::NotAMapping),
    }
}

/// A note split into its property bag and body
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    /// Frontmatter properties, in document order
    pub properties: PropertyBag,
    /// Markdown body
    pub body: String,
}

impl Note {
    /// Parse note text
    pub fn parse(text: &str) -> Result<Self, FrontmatterError> {
        match split(text) {
            Some(parts) => Ok(Self {
                properties: parse_properties(parts.yaml)?,
                body: parts.body.to_string(),
            }),
            None => Ok(Self {
                properties: PropertyBag::new(),
                body: text.to_string(),
            }),
        }
    }

    /// Render note text; an empty bag renders no frontmatter block
    pub fn render(&self) -> Result<String, FrontmatterError> {
        if self.properties.is_empty() {
            return Ok(self.body.clone());
        }
        let yaml = serde_yaml::to_string(&self.properties.to_mapping())?;
        Ok(format!("---\n{yaml}---\n{}", self.body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn splits_frontmatter_and_body() {
        let text = "---\ngoal: \"[[Root]]\"\nprogress: 40\n---\n# Title\n\nBody\n";
        let parts = split(text).unwrap();
        assert_eq!(parts.yaml, "goal: \"[[Root]]\"\nprogress: 40\n");
        assert_eq!(parts.body, "# Title\n\nBody\n");
    }

    #[test]
    fn dots_close_the_block() {
        let parts = split("---\na: 1\n...\nrest").unwrap();
        assert_eq!(parts.yaml, "a: 1\n");
        assert_eq!(parts.body, "rest");
    }

    #[test]
    fn empty_block_is_frontmatter() {
        let parts = split("---\n---\nbody").unwrap();
        assert_eq!(parts.yaml, "");
        assert_eq!(parts.body, "body");
    }

    #[test]
    fn thematic_break_is_not_frontmatter() {
        assert!(split("---\n\nparagraph\n---\n").is_none());
        assert!(split("# Heading\n---\na: 1\n---\n").is_none());
        assert!(split("---\na: 1\nno closing fence\n").is_none());
    }

    #[test]
    fn note_round_trip_keeps_order_and_body() {
        let text = "---\nzeta: 1\nalpha: two\n---\n\nBody text\n";
        let note = Note::parse(text).unwrap();
        assert_eq!(note.properties.keys().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
        assert_eq!(note.render().unwrap(), text);
    }

    #[test]
    fn note_without_frontmatter() {
        let mut note = Note::parse("Just text\n").unwrap();
        assert!(note.properties.is_empty());
        assert_eq!(note.render().unwrap(), "Just text\n");

        note.properties.insert("progress", Value::from(10));
        assert_eq!(note.render().unwrap(), "---\nprogress: 10\n---\nJust text\n");
    }

    #[test]
    fn non_mapping_frontmatter_is_rejected() {
        assert!(matches!(
            Note::parse("---\n- a\n- b\n---\n"),
            Err(FrontmatterError::NotAMapping)
        ));
        assert!(matches!(
            Note::parse("---\na: [unclosed\n---\n"),
            Err(FrontmatterError::Yaml(_))
        ));
    }
}
