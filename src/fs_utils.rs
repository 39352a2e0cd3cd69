use crate::error::{DocgenError, Result};
use globset::GlobSet;
use ignore::WalkBuilder;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File extensions picked up when a whole directory is generated
pub const SOURCE_EXTENSIONS: &[&str] = &["markdown", "md"];

/// Reads the contents of a file at the given path
///
/// # Errors
///
/// - `DocgenError::FileNotFound` if the path doesn't exist.
/// - `DocgenError::FileUnreadable` for anything else: a directory, missing
///   permissions, or content that isn't UTF-8.
pub fn read_file_contents(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => DocgenError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => DocgenError::FileUnreadable {
            path: path.to_path_buf(),
            source,
        },
    })
}

/// Resolves a fragment filename against the directory it is included from
pub fn resolve_fragment_path(base_dir: &Path, file_name: &str) -> PathBuf {
    base_dir.join(file_name)
}

/// Creates the output directory (and any parents) if it doesn't exist yet
///
/// # Errors
///
/// Returns `DocgenError::Io` if the directory can't be created.
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        tracing::debug!("Creating output directory {}", dir.display());
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// Replaces the extension of a resolved document name, e.g. `fs.markdown` -> `fs.html`
pub fn output_file_name(resolved_name: &str, extension: &str) -> String {
    Path::new(resolved_name)
        .with_extension(extension)
        .to_string_lossy()
        .into_owned()
}

/// Names starting with `_` are include-only fragments, never standalone pages
pub fn is_include_only(resolved_name: &str) -> bool {
    resolved_name.starts_with('_')
}

/// Filters applied while discovering sources in a directory
#[derive(Debug, Clone, Default)]
pub struct SourceFilter {
    /// Glob patterns, relative to the walked directory, to skip
    pub exclude: Option<GlobSet>,
    /// Whether `.gitignore` files are honoured
    pub use_gitignore: bool,
}

/// Collects every documentation source under `dir`, sorted by path
///
/// # Errors
///
/// - `DocgenError::FileNotFound` if `dir` is not a directory.
/// - `DocgenError::Walk` if traversal fails.
pub fn collect_sources(dir: &Path, filter: &SourceFilter) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(DocgenError::FileNotFound {
            path: dir.to_path_buf(),
        });
    }

    let walker = WalkBuilder::new(dir)
        .hidden(true)
        .git_ignore(filter.use_gitignore)
        .git_global(filter.use_gitignore)
        .git_exclude(filter.use_gitignore)
        .ignore(filter.use_gitignore)
        .require_git(false)
        .build();

    let mut sources = Vec::new();
    for entry in walker {
        let entry = entry?;
        let path = entry.path();

        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        let is_source = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext));
        if !is_source {
            continue;
        }

        if let Some(exclude) = &filter.exclude {
            let relative = path.strip_prefix(dir).unwrap_or(path);
            if exclude.is_match(relative) {
                tracing::trace!("Excluded {}", relative.display());
                continue;
            }
        }

        sources.push(path.to_path_buf());
    }

    sources.sort();
    Ok(sources)
}
