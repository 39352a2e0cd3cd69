use crate::error::{DocgenError, Result};
use crate::fs_utils::{ensure_output_dir, is_include_only, output_file_name};
use crate::include::{DEFAULT_MAX_DEPTH, IncludeConfig, expand_file};
use crate::outline::build_outline;
use crate::page::PageRenderer;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Representation an expanded document is rendered into
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Section outline as JSON
    #[default]
    Json,
    /// Page rendered through an HTML template
    Html,
}

impl OutputFormat {
    /// Extension of the files written in this format
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Html => "html",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = DocgenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "html" => Ok(Self::Html),
            _ => Err(DocgenError::InvalidFormat {
                format: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Configuration for generating output from documentation sources
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    /// Directory generated files are written to
    pub out_dir: PathBuf,
    pub format: OutputFormat,
    /// Tera template for HTML output; the built-in page is used when `None`
    pub template: Option<PathBuf>,
    /// Bound on nested inclusion
    pub max_depth: usize,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("out"),
            format: OutputFormat::default(),
            template: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// A rendered document, not yet written anywhere
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generated {
    Outline { name: String, json: String },
    Page { name: String, html: String },
}

impl Generated {
    /// Name returned by include resolution, which decides the output filename
    pub fn name(&self) -> &str {
        match self {
            Self::Outline { name, .. } | Self::Page { name, .. } => name,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::Outline { json, .. } => json,
            Self::Page { html, .. } => html,
        }
    }

    fn extension(&self) -> &'static str {
        match self {
            Self::Outline { .. } => OutputFormat::Json.extension(),
            Self::Page { .. } => OutputFormat::Html.extension(),
        }
    }

    /// Where this document is written, or `None` for include-only fragments
    pub fn output_path(&self, out_dir: &Path) -> Option<PathBuf> {
        if is_include_only(self.name()) {
            return None;
        }
        Some(out_dir.join(output_file_name(self.name(), self.extension())))
    }
}

/// Expands and renders documentation sources
#[derive(Debug)]
pub struct Generator {
    config: GenerateConfig,
    renderer: Option<PageRenderer>,
}

impl Generator {
    /// Prepares a generator; an HTML template is loaded up front so that
    /// template errors surface before any document is resolved
    ///
    /// # Errors
    ///
    /// Returns template loading errors from [`PageRenderer::new`].
    pub fn new(config: GenerateConfig) -> Result<Self> {
        let renderer = match config.format {
            OutputFormat::Html => Some(PageRenderer::new(config.template.as_deref())?),
            OutputFormat::Json => None,
        };
        Ok(Self { config, renderer })
    }

    pub fn config(&self) -> &GenerateConfig {
        &self.config
    }

    /// Resolves the includes of `input` and renders the result
    ///
    /// # Errors
    ///
    /// - Include resolution errors (missing fragment, depth exceeded).
    /// - `DocgenError::Outline` / `DocgenError::Template` render errors.
    pub fn generate(&self, input: &Path) -> Result<Generated> {
        tracing::info!("Input  = {}", input.display());

        let include = IncludeConfig {
            max_depth: self.config.max_depth,
            ..IncludeConfig::for_input(input)
        };
        let expansion = expand_file(input, &include)?;

        match &self.renderer {
            Some(renderer) => Ok(Generated::Page {
                name: expansion.name,
                html: renderer.render(&expansion.text, input)?,
            }),
            None => {
                let outline = build_outline(&expansion.text, &input.display().to_string())?;
                Ok(Generated::Outline {
                    name: expansion.name,
                    json: outline.to_json()?,
                })
            }
        }
    }

    /// Writes a generated document into the output directory
    ///
    /// Returns the written path, or `None` when the document is include-only.
    ///
    /// # Errors
    ///
    /// Returns `DocgenError::Io` if the directory or file can't be written.
    pub fn write(&self, generated: &Generated) -> Result<Option<PathBuf>> {
        let Some(path) = generated.output_path(&self.config.out_dir) else {
            tracing::info!("Skipping include-only {}", generated.name());
            return Ok(None);
        };

        ensure_output_dir(&self.config.out_dir)?;
        fs::write(&path, generated.content())?;
        tracing::info!("Wrote {}", path.display());
        Ok(Some(path))
    }

    /// Generates and writes every source in order, returning the written paths
    ///
    /// Two sources resolving to the same output file is an error; the first
    /// page stays on disk and nothing is written for the second.
    ///
    /// # Errors
    ///
    /// - `DocgenError::OutputCollision` if an output path is claimed twice.
    /// - Any error from [`Generator::generate`] or [`Generator::write`].
    pub fn generate_all(&self, sources: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut claimed: HashMap<PathBuf, &Path> = HashMap::new();
        let mut written = Vec::new();

        for source in sources {
            let generated = self.generate(source)?;
            if let Some(path) = generated.output_path(&self.config.out_dir) {
                if let Some(first) = claimed.get(&path) {
                    return Err(DocgenError::OutputCollision {
                        path,
                        first: first.to_path_buf(),
                        second: source.clone(),
                    });
                }
                claimed.insert(path, source);
            }

            if let Some(path) = self.write(&generated)? {
                written.push(path);
            }
        }

        Ok(written)
    }
}
