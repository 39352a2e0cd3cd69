//! Structured outline of an expanded document: nested sections built from headings.

use crate::error::{DocgenError, Result};
use crate::markdown::{SlugRegistry, heading_text, parser};
use pulldown_cmark::{Event, Tag, html};
use serde::{Deserialize, Serialize};

/// Top of the outline tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outline {
    /// Path of the document the outline was built from
    pub source: String,
    /// HTML of the content preceding the first heading
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<Section>,
}

/// A heading and everything up to the next heading of the same or higher level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub level: usize,
    pub name: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub desc: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<Section>,
}

impl Outline {
    /// Pretty JSON representation
    ///
    /// # Errors
    ///
    /// Returns `DocgenError::Json` if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Builds the section outline of `text`
///
/// Only top-level headings open sections. A heading nested in a blockquote or
/// list item is rendered as part of the enclosing section's `desc`.
///
/// # Errors
///
/// Returns `DocgenError::Outline` when a heading skips a level relative to its
/// parent (e.g. `#` directly followed by `###`).
pub fn build_outline(text: &str, source: &str) -> Result<Outline> {
    let mut outline = Outline {
        source: source.to_string(),
        desc: None,
        sections: Vec::new(),
    };
    let mut stack: Vec<Section> = Vec::new();
    let mut body: Vec<Event<'_>> = Vec::new();
    let mut slugs = SlugRegistry::default();
    let mut events = parser(text);

    // Open tags; headings inside blockquotes or list items stay in the body
    let mut nesting = 0usize;

    while let Some(event) = events.next() {
        let level = match event {
            Event::Start(Tag::Heading { level, .. }) if nesting == 0 => level as usize,
            other => {
                match &other {
                    Event::Start(_) => nesting += 1,
                    Event::End(_) => nesting = nesting.saturating_sub(1),
                    _ => {}
                }
                body.push(other);
                continue;
            }
        };

        flush_body(&mut body, &mut outline, &mut stack);

        let title = heading_text(&mut events);

        while stack.last().is_some_and(|s| s.level >= level) {
            close_section(&mut stack, &mut outline);
        }

        let parent_level = stack.last().map_or(0, |s| s.level);
        if level > parent_level + 1 {
            return Err(DocgenError::Outline {
                source_path: source.to_string(),
                message: format!(
                    "heading level {level} ({title:?}) directly under level {parent_level}"
                ),
            });
        }

        stack.push(Section {
            level,
            name: slugs.unique(&title),
            title,
            desc: String::new(),
            sections: Vec::new(),
        });
    }

    flush_body(&mut body, &mut outline, &mut stack);
    while !stack.is_empty() {
        close_section(&mut stack, &mut outline);
    }

    Ok(outline)
}

fn flush_body(body: &mut Vec<Event<'_>>, outline: &mut Outline, stack: &mut [Section]) {
    if body.is_empty() {
        return;
    }

    let mut rendered = String::new();
    html::push_html(&mut rendered, body.drain(..));

    match stack.last_mut() {
        Some(section) => section.desc.push_str(&rendered),
        None => outline.desc.get_or_insert_with(String::new).push_str(&rendered),
    }
}

fn close_section(stack: &mut Vec<Section>, outline: &mut Outline) {
    if let Some(section) = stack.pop() {
        match stack.last_mut() {
            Some(parent) => parent.sections.push(section),
            None => outline.sections.push(section),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outline_nesting() {
        let text = "\
intro text

# File System

File I/O.

## fs.rename(oldPath, newPath)

Renames a file.

## fs.stat(path)

### Class: fs.Stats

# Path
";
        let outline = build_outline(text, "docs/fs.markdown").unwrap();
        assert_eq!(outline.source, "docs/fs.markdown");
        assert_eq!(outline.desc.as_deref(), Some("<p>intro text</p>\n"));
        assert_eq!(outline.sections.len(), 2);

        let fs = &outline.sections[0];
        assert_eq!(fs.title, "File System");
        assert_eq!(fs.name, "file_system");
        assert_eq!(fs.desc, "<p>File I/O.</p>\n");
        assert_eq!(fs.sections.len(), 2);
        assert_eq!(fs.sections[0].name, "fs_rename_oldpath_newpath");
        assert_eq!(fs.sections[1].sections[0].title, "Class: fs.Stats");
        assert_eq!(fs.sections[1].sections[0].level, 3);

        assert_eq!(outline.sections[1].title, "Path");
        assert!(outline.sections[1].sections.is_empty());
    }

    #[test]
    fn test_outline_without_headings() {
        let outline = build_outline("just *text*", "notes.markdown").unwrap();
        assert!(outline.sections.is_empty());
        assert_eq!(outline.desc.as_deref(), Some("<p>just <em>text</em></p>\n"));

        let outline = build_outline("", "empty.markdown").unwrap();
        assert_eq!(outline.desc, None);
    }

    #[test]
    fn test_outline_rejects_skipped_level() {
        let result = build_outline("# Top\n\n### Too deep\n", "bad.markdown");
        match result {
            Err(DocgenError::Outline {
                source_path,
                message,
            }) => {
                assert_eq!(source_path, "bad.markdown");
                assert!(message.contains("Too deep"));
            }
            other => panic!("expected Outline error, got {other:?}"),
        }

        assert!(build_outline("## Starts at two\n", "bad.markdown").is_err());
    }

    #[test]
    fn test_outline_keeps_nested_headings_in_desc() {
        let text = "# Top\n\n> ## Quoted\n> text\n\n- item\n\n  ### In list\n\nafter\n";
        let outline = build_outline(text, "quote.markdown").unwrap();

        assert_eq!(outline.sections.len(), 1);
        let top = &outline.sections[0];
        assert!(top.sections.is_empty());
        assert!(top.desc.contains("<blockquote>\n<h2>Quoted</h2>"));
        assert!(top.desc.contains("</blockquote>"));
        assert!(top.desc.contains("<h3>In list</h3>"));
        assert!(top.desc.contains("</li>"));
        assert!(top.desc.ends_with("<p>after</p>\n"));
        assert_eq!(
            top.desc.matches("<blockquote>").count(),
            top.desc.matches("</blockquote>").count()
        );
    }

    #[test]
    fn test_outline_json() {
        let outline = build_outline("# Net\n\nSockets.\n", "net.markdown").unwrap();
        let json = outline.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["source"], "net.markdown");
        assert!(value.get("desc").is_none());
        assert_eq!(value["sections"][0]["name"], "net");
        assert_eq!(value["sections"][0]["desc"], "<p>Sockets.</p>\n");
        assert!(value["sections"][0].get("sections").is_none());

        let parsed: Outline = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, outline);
    }
}
