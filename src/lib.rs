//! # docgen
//!
//! A documentation generator that expands `@include` directives in markdown
//! sources and renders the result as a JSON section outline or as HTML pages.
//!
//! ## Features
//!
//! - Lines of the form `@include name` or `@include name.ext` are replaced by
//!   the contents of `name.markdown` / `name.ext`, recursively
//! - Fragments resolve against the directory of the top-level document
//! - Bounded inclusion depth, so self-including fragments fail cleanly
//! - JSON outlines of nested sections
//! - HTML pages rendered through a Tera template
//!
//! ## Usage
//!
//! ### As a Library
//!
//! ```no_run
//! use docgen::{IncludeConfig, expand_file};
//! use std::path::Path;
//!
//! let input = Path::new("doc/api/fs.markdown");
//! let config = IncludeConfig::for_input(input);
//!
//! match expand_file(input, &config) {
//!     Ok(expansion) => println!("{}", expansion.text),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```
//!
//! ### As a CLI Tool
//!
//! ```bash
//! # Print the JSON outline of a document
//! docgen --out=out doc/api/fs.markdown
//!
//! # Render an HTML page with a custom template
//! docgen --format=html --template=doc/template.html --out=out/api doc/api/fs.markdown
//!
//! # Render every source in a directory
//! docgen --format=html --out=out/api doc/api
//! ```

pub mod error;
pub mod fs_utils;
pub mod generate;
pub mod include;
pub mod markdown;
pub mod outline;
pub mod page;

// Re-export main types and functions for convenience
pub use error::{DocgenError, Result};
pub use generate::{GenerateConfig, Generated, Generator, OutputFormat};
pub use include::{
    Expansion, FragmentCheck, FragmentStatus, IncludeConfig, IncludeDirective, check_includes,
    expand, expand_file, find_directives,
};
pub use outline::{Outline, Section, build_outline};
pub use page::PageRenderer;
