//! Shared markdown helpers for the outline builder and the page renderer.

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use std::collections::HashMap;

/// Parser with the extensions used by API docs (tables, strikethrough)
pub fn parser(text: &str) -> Parser<'_> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    Parser::new_ext(text, options)
}

/// Lowercases and collapses every run of non-alphanumerics into `_`
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_separator = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('_');
            }
            pending_separator = false;
            slug.push(c);
        } else {
            pending_separator = true;
        }
    }

    slug
}

/// Hands out unique slugs within one document
#[derive(Debug, Default)]
pub struct SlugRegistry {
    seen: HashMap<String, usize>,
}

impl SlugRegistry {
    pub fn unique(&mut self, text: &str) -> String {
        let base = slugify(text);
        let count = self.seen.entry(base.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            base
        } else {
            format!("{base}_{}", *count - 1)
        }
    }
}

/// A heading as it appears in the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: usize,
    pub title: String,
    pub slug: String,
}

/// Consumes events up to the end of the current heading, returning its plain text
pub fn heading_text<'a>(events: &mut impl Iterator<Item = Event<'a>>) -> String {
    let mut title = String::new();
    for event in events.by_ref() {
        match event {
            Event::End(TagEnd::Heading(_)) => break,
            Event::Text(text) | Event::Code(text) => title.push_str(&text),
            Event::SoftBreak | Event::HardBreak => title.push(' '),
            _ => {}
        }
    }
    title.trim().to_string()
}

/// Lists every heading of `text` in order, with unique slugs
pub fn headings(text: &str) -> Vec<Heading> {
    let mut slugs = SlugRegistry::default();
    let mut headings = Vec::new();
    let mut events = parser(text);

    while let Some(event) = events.next() {
        if let Event::Start(Tag::Heading { level, .. }) = event {
            let title = heading_text(&mut events);
            let slug = slugs.unique(&title);
            headings.push(Heading {
                level: level as usize,
                title,
                slug,
            });
        }
    }

    headings
}
