use clap::{Parser, ValueEnum};
use docgen::fs_utils::{SourceFilter, collect_sources, read_file_contents, resolve_fragment_path};
use docgen::include::DEFAULT_MAX_DEPTH;
use docgen::{
    DocgenError, FragmentStatus, GenerateConfig, Generated, Generator, IncludeConfig,
    OutputFormat, Result, check_includes, find_directives,
};
use globset::{Glob, GlobSetBuilder};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const LONG_HELP: &str = r#"
Directives:
  @include name        - Replaced by the contents of name.markdown
  @include name.ext    - Replaced by the contents of name.ext
  Directives must fill a whole line. Fragments are looked up next to the
  input file and may include further fragments.

Output:
  json  - Section outline printed on stdout (written as .json files when
          INPUT is a directory)
  html  - Page written to --out, named after the last included fragment.
          Names starting with '_' are include-only and never written.

Template variables (Tera syntax):
  {{ content | safe }}  {{ toc | safe }}  {{ title }}  {{ section }}  {{ generator }}

Examples:
  # Print the outline of a document
  docgen --out=out doc/api/fs.markdown
  # Render an HTML page
  docgen --format=html --template=doc/template.html --out=out/api doc/api/fs.markdown
  # Render every source in a directory
  docgen --format=html --out=out/api doc/api -x 'drafts/**'
  # Check that every fragment resolves
  docgen --dry-run doc/api/all.markdown
  # List the directives of a document as JSON
  docgen --list=json doc/api/all.markdown
"#;

/// Documentation generator with @include expansion.
#[derive(Parser, Debug)]
#[command(
    name = "docgen",
    version,
    about = "Expand @include directives and render documentation as JSON or HTML.",
    after_long_help = LONG_HELP
)]
struct Cli {
    /// Documentation source to process, or a directory of sources
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Output format: json or html
    #[arg(long, value_name = "FORMAT", env = "DOCGEN_FORMAT", default_value = "json")]
    format: OutputFormat,

    /// Tera template used for HTML output
    #[arg(long, value_name = "FILE", env = "DOCGEN_TEMPLATE")]
    template: Option<PathBuf>,

    /// Directory generated files are written to
    #[arg(long, value_name = "DIR", env = "DOCGEN_OUT")]
    out: Option<PathBuf>,

    /// Maximum nesting depth of @include directives
    #[arg(long, value_name = "DEPTH", default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Exclude glob patterns (repeatable), relative to a directory INPUT
    #[arg(short = 'x', long = "exclude", value_name = "GLOB", action = clap::ArgAction::Append)]
    exclude: Vec<String>,

    /// Disable compliance with .gitignore files when INPUT is a directory
    #[arg(long)]
    no_gitignore: bool,

    /// Check that every fragment resolves, without generating anything
    #[arg(long, conflicts_with = "list")]
    dry_run: bool,

    /// List directives in INPUT (optionally with format: plain, detailed, json)
    #[arg(long, value_name = "FORMAT", num_args = 0..=1, require_equals = true, default_missing_value = "plain", conflicts_with = "dry_run")]
    list: Option<ListFormat>,

    /// Increase verbosity (can be used multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq)]
enum ListFormat {
    /// Simple list of directives
    Plain,
    /// Detailed information about each directive
    Detailed,
    /// JSON output for scripting
    Json,
}

#[derive(Serialize)]
struct DirectiveInfo {
    directive: String,
    start: usize,
    end: usize,
    file_name: String,
    path: String,
    exists: bool,
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.quiet, cli.verbose);

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn setup_logging(quiet: bool, verbosity: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match (quiet, verbosity) {
        (true, _) => tracing::Level::ERROR,
        (false, 0) => tracing::Level::WARN,
        (false, 1) => tracing::Level::INFO,
        (false, 2) => tracing::Level::DEBUG,
        (false, _) => tracing::Level::TRACE,
    };

    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

/// Returns `Ok(false)` when a dry run found unresolved fragments
fn run(cli: &Cli) -> Result<bool> {
    let input = cli.input.as_deref().ok_or(DocgenError::MissingInput)?;

    if let Some(list_format) = cli.list {
        list_directives(input, list_format)?;
        return Ok(true);
    }

    if cli.dry_run {
        return dry_run(input, cli.max_depth);
    }

    let out_dir = cli.out.clone().ok_or(DocgenError::MissingOutputDir)?;
    tracing::info!("Output = {}", out_dir.display());

    let generator = Generator::new(GenerateConfig {
        out_dir,
        format: cli.format,
        template: cli.template.clone(),
        max_depth: cli.max_depth,
    })?;

    if input.is_dir() {
        generate_directory(&generator, input, &source_filter(cli)?)?;
    } else {
        generate_file(&generator, input)?;
    }

    Ok(true)
}

fn source_filter(cli: &Cli) -> Result<SourceFilter> {
    let exclude = if cli.exclude.is_empty() {
        None
    } else {
        let mut builder = GlobSetBuilder::new();
        for pat in &cli.exclude {
            builder.add(Glob::new(pat)?);
        }
        Some(builder.build()?)
    };

    Ok(SourceFilter {
        exclude,
        use_gitignore: !cli.no_gitignore,
    })
}

fn generate_file(generator: &Generator, input: &Path) -> Result<()> {
    match generator.generate(input)? {
        Generated::Outline { json, .. } => {
            let mut stdout = io::stdout();
            writeln!(stdout, "{json}")?;
            stdout.flush()?;
        }
        page @ Generated::Page { .. } => {
            if let Some(path) = generator.write(&page)? {
                println!("{}", path.display());
            }
        }
    }
    Ok(())
}

fn generate_directory(generator: &Generator, dir: &Path, filter: &SourceFilter) -> Result<()> {
    let sources = collect_sources(dir, filter)?;
    tracing::info!("Found {} source(s) in {}", sources.len(), dir.display());

    for path in generator.generate_all(&sources)? {
        println!("{}", path.display());
    }
    Ok(())
}

fn list_directives(input: &Path, format: ListFormat) -> Result<()> {
    tracing::debug!("Listing directives in {}", input.display());

    let text = read_file_contents(input)?;
    let config = IncludeConfig::for_input(input);
    let directives = find_directives(&text)?;

    let infos: Vec<DirectiveInfo> = directives
        .iter()
        .map(|directive| {
            let file_name = directive.file_name(&config.default_extension);
            let path = resolve_fragment_path(&config.base_dir, &file_name);
            DirectiveInfo {
                directive: directive.literal.clone(),
                start: directive.start,
                end: directive.end,
                exists: path.is_file(),
                path: path.display().to_string(),
                file_name,
            }
        })
        .collect();

    match format {
        ListFormat::Plain => {
            for info in &infos {
                println!("{}", info.directive);
            }
        }
        ListFormat::Detailed => {
            for info in &infos {
                println!("Directive: {}", info.directive);
                println!("  Position: {}..{}", info.start, info.end);
                println!("  Fragment: {}", info.file_name);
                println!("  Path: {}", info.path);
                println!("  Exists: {}", if info.exists { "yes" } else { "no" });
                println!();
            }
        }
        ListFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&infos)?);
        }
    }

    Ok(())
}

fn dry_run(input: &Path, max_depth: usize) -> Result<bool> {
    tracing::info!("Performing dry run - checking fragments of {}", input.display());

    let text = read_file_contents(input)?;
    let config = IncludeConfig {
        max_depth,
        ..IncludeConfig::for_input(input)
    };
    let checks = check_includes(&text, &config)?;

    for check in &checks {
        let indent = "  ".repeat(check.depth - 1);
        match &check.status {
            FragmentStatus::Found => {
                println!("{indent}✓ {} -> {}", check.directive, check.path.display());
            }
            FragmentStatus::Missing => {
                println!(
                    "{indent}✗ {} -> {} (not found)",
                    check.directive,
                    check.path.display()
                );
            }
            FragmentStatus::Unreadable(reason) => {
                println!("{indent}✗ {} -> {reason}", check.directive);
            }
        }
    }

    let valid_count = checks.iter().filter(|c| c.is_ok()).count();
    let invalid_count = checks.len() - valid_count;

    println!("\nSummary: {} fragments checked", checks.len());
    if valid_count > 0 {
        println!("  ✓ {valid_count} valid");
    }
    if invalid_count > 0 {
        println!("  ✗ {invalid_count} invalid");
    }

    Ok(invalid_count == 0)
}
