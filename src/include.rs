use crate::error::{DocgenError, Result};
use crate::fs_utils::{read_file_contents, resolve_fragment_path};
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Extension appended to directives that don't name one
pub const DEFAULT_EXTENSION: &str = "markdown";

/// Default bound on nested inclusion
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// A whole line of the form `@include name[.ext]`
const DIRECTIVE_PATTERN: &str = r"(?imR)^@include[ \t]+([A-Za-z0-9_-]+)(?:\.([A-Za-z]+))?$";

/// Configuration for include resolution
#[derive(Debug, Clone)]
pub struct IncludeConfig {
    /// Directory of the top-level document; fragments at every depth resolve against it
    pub base_dir: PathBuf,
    /// Deepest allowed fragment nesting (the top-level document is depth 0)
    pub max_depth: usize,
    /// Extension appended when a directive has none
    pub default_extension: String,
}

impl Default for IncludeConfig {
    fn default() -> Self {
        Self {
            base_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            max_depth: DEFAULT_MAX_DEPTH,
            default_extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

impl IncludeConfig {
    /// Configuration resolving fragments next to `input`
    pub fn for_input(input: &Path) -> Self {
        let base_dir = input
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Self {
            base_dir,
            max_depth: DEFAULT_MAX_DEPTH,
            default_extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

/// An `@include` directive found in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeDirective {
    /// The matched text, e.g. `@include fs.txt`
    pub literal: String,
    /// Bare fragment name, e.g. `fs`
    pub name: String,
    /// Extension written in the directive, if any
    pub extension: Option<String>,
    /// Starting byte offset in the document
    pub start: usize,
    /// Ending byte offset in the document
    pub end: usize,
}

impl IncludeDirective {
    /// Filename of the referenced fragment; an explicit extension is kept verbatim
    pub fn file_name(&self, default_extension: &str) -> String {
        match &self.extension {
            Some(ext) => format!("{}.{ext}", self.name),
            None => format!("{}.{default_extension}", self.name),
        }
    }
}

/// A fully expanded document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    /// Filename of the last fragment processed, or the document's own name
    /// when it contained no directives. Output filenames are derived from it.
    pub name: String,
    /// Document text with every directive replaced
    pub text: String,
}

/// Finds every include directive in the given text, in document order
///
/// # Errors
///
/// Returns `DocgenError::Regex` if there's an error compiling the regex pattern.
pub fn find_directives(text: &str) -> Result<Vec<IncludeDirective>> {
    let pattern = Regex::new(DIRECTIVE_PATTERN)?;
    let mut directives = Vec::new();

    for capture in pattern.captures_iter(text) {
        if let Some(full_match) = capture.get(0)
            && let Some(name) = capture.get(1)
        {
            directives.push(IncludeDirective {
                literal: full_match.as_str().to_string(),
                name: name.as_str().to_string(),
                extension: capture.get(2).map(|ext| ext.as_str().to_string()),
                start: full_match.start(),
                end: full_match.end(),
            });
        }
    }

    trace!("Found {} include directive(s)", directives.len());
    Ok(directives)
}

/// Expands every include directive in `text`, recursively
///
/// # Errors
///
/// - `DocgenError::FileNotFound` / `DocgenError::FileUnreadable` if a fragment can't be read.
/// - `DocgenError::IncludeDepthExceeded` if nesting goes past `config.max_depth`.
pub fn expand(name: &str, text: &str, config: &IncludeConfig) -> Result<Expansion> {
    expand_at_depth(name, text, config, 0)
}

/// Reads `path` and expands it with fragments resolved next to it
///
/// # Errors
///
/// Same as [`expand`], plus errors reading `path` itself.
pub fn expand_file(path: &Path, config: &IncludeConfig) -> Result<Expansion> {
    let text = read_file_contents(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    expand(&name, &text, config)
}

fn expand_at_depth(
    name: &str,
    text: &str,
    config: &IncludeConfig,
    depth: usize,
) -> Result<Expansion> {
    let directives = find_directives(text)?;
    if directives.is_empty() {
        return Ok(Expansion {
            name: name.to_string(),
            text: text.to_string(),
        });
    }

    let mut result = text.to_string();
    let mut last_name = name.to_string();
    let mut substituted = HashSet::new();

    for directive in &directives {
        let file_name = directive.file_name(&config.default_extension);

        // An identical literal was already replaced everywhere
        if substituted.insert(directive.literal.as_str()) {
            if depth >= config.max_depth {
                return Err(DocgenError::IncludeDepthExceeded {
                    fragment: file_name,
                    max_depth: config.max_depth,
                });
            }

            let path = resolve_fragment_path(&config.base_dir, &file_name);
            debug!("Including {} (depth {})", path.display(), depth + 1);

            let contents = read_file_contents(&path)?;
            let fragment = expand_at_depth(&file_name, &contents, config, depth + 1)?;
            result = replace_directive(&result, &directive.literal, &fragment.text);
        }

        last_name = file_name;
    }

    Ok(Expansion {
        name: last_name,
        text: result,
    })
}

fn is_token_continuation(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
}

/// Replaces every occurrence of `literal` that isn't the prefix of a longer directive
fn replace_directive(text: &str, literal: &str, replacement: &str) -> String {
    let mut result = String::with_capacity(text.len() + replacement.len());
    let mut last = 0;

    for (idx, _) in text.match_indices(literal) {
        let end = idx + literal.len();
        if text[end..].chars().next().is_some_and(is_token_continuation) {
            continue;
        }
        result.push_str(&text[last..idx]);
        result.push_str(replacement);
        last = end;
    }

    result.push_str(&text[last..]);
    result
}

/// Outcome of looking up one fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentStatus {
    /// Fragment was read successfully
    Found,
    /// No file at the resolved path
    Missing,
    /// File exists but couldn't be read; carries the reason
    Unreadable(String),
}

/// One fragment visited while checking an inclusion tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentCheck {
    /// Directive as written in the including document
    pub directive: String,
    /// Derived fragment filename
    pub file_name: String,
    /// Resolved path on disk
    pub path: PathBuf,
    /// Nesting depth of the fragment (direct includes are depth 1)
    pub depth: usize,
    /// Result of reading the fragment
    pub status: FragmentStatus,
}

impl FragmentCheck {
    /// Whether the fragment was found and read
    pub fn is_ok(&self) -> bool {
        self.status == FragmentStatus::Found
    }
}

/// Walks the inclusion tree of `text` without splicing anything
///
/// Each distinct directive of each document is reported once, depth first.
///
/// # Errors
///
/// - `DocgenError::Regex` if the directive pattern can't be compiled.
/// - `DocgenError::IncludeDepthExceeded` if nesting goes past `config.max_depth`.
pub fn check_includes(text: &str, config: &IncludeConfig) -> Result<Vec<FragmentCheck>> {
    let mut checks = Vec::new();
    check_at_depth(text, config, 0, &mut checks)?;
    Ok(checks)
}

fn check_at_depth(
    text: &str,
    config: &IncludeConfig,
    depth: usize,
    checks: &mut Vec<FragmentCheck>,
) -> Result<()> {
    let directives = find_directives(text)?;
    let mut seen = HashSet::new();

    for directive in &directives {
        if !seen.insert(directive.literal.as_str()) {
            continue;
        }

        let file_name = directive.file_name(&config.default_extension);
        if depth >= config.max_depth {
            return Err(DocgenError::IncludeDepthExceeded {
                fragment: file_name,
                max_depth: config.max_depth,
            });
        }

        let path = resolve_fragment_path(&config.base_dir, &file_name);
        let (status, contents) = match read_file_contents(&path) {
            Ok(contents) => (FragmentStatus::Found, Some(contents)),
            Err(DocgenError::FileNotFound { .. }) => (FragmentStatus::Missing, None),
            Err(e) => (FragmentStatus::Unreadable(e.to_string()), None),
        };

        checks.push(FragmentCheck {
            directive: directive.literal.clone(),
            file_name,
            path,
            depth: depth + 1,
            status,
        });

        if let Some(contents) = contents {
            check_at_depth(&contents, config, depth + 1, checks)?;
        }
    }

    Ok(())
}
