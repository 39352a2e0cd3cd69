//! HTML pages rendered through a Tera template.
//!
//! Templates see the following variables:
//!
//! - `content` - the document rendered to HTML (use `{{ content | safe }}`)
//! - `toc` - a nested `<ul>` linking every heading (also needs `| safe`)
//! - `title` - text of the first heading, or the source file stem
//! - `section` - the source file stem, e.g. `fs` for `fs.markdown`
//! - `generator` - `docgen` and its version

use crate::error::{DocgenError, Result};
use crate::markdown::{Heading, headings, parser};
use pulldown_cmark::{Event, Tag, html};
use std::path::Path;
use tera::{Context, Tera};

const TEMPLATE_NAME: &str = "page.html";

/// Page used when no template is supplied
pub const DEFAULT_TEMPLATE: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{{ title }}</title>
  <meta name="generator" content="{{ generator }}">
</head>
<body class="{{ section }}">
  <nav id="toc">
{{ toc | safe }}
  </nav>
  <main id="apicontent">
{{ content | safe }}
  </main>
</body>
</html>
"#;

/// Renders expanded documents into HTML pages
#[derive(Debug)]
pub struct PageRenderer {
    tera: Tera,
}

impl PageRenderer {
    /// Loads the template at `template`, or the built-in page when `None`
    ///
    /// # Errors
    ///
    /// - `DocgenError::FileNotFound` / `DocgenError::FileUnreadable` if the template can't be read.
    /// - `DocgenError::Template` if the template doesn't parse.
    pub fn new(template: Option<&Path>) -> Result<Self> {
        let source = match template {
            Some(path) => {
                tracing::debug!("Loading template {}", path.display());
                crate::fs_utils::read_file_contents(path)?
            }
            None => DEFAULT_TEMPLATE.to_string(),
        };
        Self::from_source(&source)
    }

    /// Builds a renderer from template text
    ///
    /// # Errors
    ///
    /// Returns `DocgenError::Template` if the template doesn't parse.
    pub fn from_source(source: &str) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, source)?;
        Ok(Self { tera })
    }

    /// Renders `text` as a page for the document at `source`
    ///
    /// # Errors
    ///
    /// Returns `DocgenError::Template` if rendering fails, e.g. on an unknown variable.
    pub fn render(&self, text: &str, source: &Path) -> Result<String> {
        let headings = headings(text);
        let section = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let title = headings
            .first()
            .map_or_else(|| section.clone(), |h| h.title.clone());

        let mut context = Context::new();
        context.insert("content", &render_body(text, &headings));
        context.insert("toc", &toc_html(&headings));
        context.insert("title", &title);
        context.insert("section", &section);
        context.insert(
            "generator",
            &format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        );

        self.tera
            .render(TEMPLATE_NAME, &context)
            .map_err(DocgenError::from)
    }
}

/// Markdown to HTML, with heading ids matching the table of contents
fn render_body(text: &str, headings: &[Heading]) -> String {
    let mut slugs = headings.iter().map(|h| h.slug.clone());
    let events = parser(text).map(|mut event| {
        if let Event::Start(Tag::Heading { id, .. }) = &mut event
            && let Some(slug) = slugs.next()
        {
            *id = Some(slug.into());
        }
        event
    });

    let mut body = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut body, events);
    body
}

fn toc_html(headings: &[Heading]) -> String {
    let Some(base) = headings.iter().map(|h| h.level).min() else {
        return String::new();
    };

    let mut toc = String::new();
    let mut depth = 0;
    for heading in headings {
        let target = heading.level - base + 1;
        while depth < target {
            toc.push_str("<ul>\n");
            depth += 1;
        }
        while depth > target {
            toc.push_str("</ul>\n");
            depth -= 1;
        }
        toc.push_str(&format!(
            "<li><a href=\"#{}\">{}</a></li>\n",
            heading.slug,
            escape_html(&heading.title)
        ));
    }
    for _ in 0..depth {
        toc.push_str("</ul>\n");
    }

    toc
}

fn escape_html(content: &str) -> String {
    content
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
