//! # mdprint
//!
//! Markdown to styled PDF — comrak rendering, syntect syntax highlighting,
//! and headless Chromium rasterization.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use mdprint::{ConvertRequest, convert_markdown_file};
//!
//! let destination = convert_markdown_file(&ConvertRequest {
//!     input: PathBuf::from("notes.md"),
//!     ..ConvertRequest::default()
//! })
//! .expect("conversion failed");
//! println!("wrote {}", destination.display());
//! ```
//!
//! ## Lower-level API
//!
//! The pipeline stages are available individually:
//!
//! ```rust,no_run
//! use std::path::Path;
//! use mdprint::{config::Config, render, style, template};
//!
//! let document = Path::new("/abs/notes.md");
//! let config = Config::default();
//! let fragment = render::render_markdown("# Hello", document, &config);
//! let styles = style::read_styles(document, None, &config);
//! let page = template::compose_page("notes.md", &styles, &fragment);
//! ```

pub mod config;
pub mod export;
pub mod highlight;
pub mod render;
pub mod resolve;
pub mod style;
pub mod template;

#[cfg(feature = "cli")]
pub mod watch;

use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

pub use config::{Config, ConfigError};
pub use export::ExportError;

/// Supported export formats. PDF is the only target today; the enum exists
/// so the CLI surface stays stable if more ever arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Pdf,
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pdf => write!(f, "pdf"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FormatParseError {
    value: String,
}

impl Display for FormatParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unsupported output type: {} (only: pdf)", self.value)
    }
}

impl std::error::Error for FormatParseError {}

impl TryFrom<&str> for OutputFormat {
    type Error = FormatParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pdf" => Ok(Self::Pdf),
            _ => Err(FormatParseError {
                value: value.to_string(),
            }),
        }
    }
}

/// One conversion: input document plus everything that can override the
/// defaults.
#[derive(Debug, Clone, Default)]
pub struct ConvertRequest {
    /// Path to the `.md` source file.
    pub input: PathBuf,
    /// Explicit destination file path. Default: derived from config /
    /// source location.
    pub output: Option<PathBuf>,
    /// Export format. Only [`OutputFormat::Pdf`] exists.
    pub format: OutputFormat,
    /// JSON config file. `None` uses the built-in defaults.
    pub config_file: Option<PathBuf>,
    /// Workspace root for workspace-relative resolution. `None` uses the
    /// process current directory.
    pub workspace: Option<PathBuf>,
}

/// Convert one Markdown file to PDF, loading configuration as part of the
/// call. Returns the destination path.
pub fn convert_markdown_file(request: &ConvertRequest) -> Result<PathBuf, Error> {
    let config = Config::load(request.config_file.as_deref()).map_err(Error::Config)?;
    convert_with_config(
        &request.input,
        request.output.as_deref(),
        request.workspace.as_deref(),
        &config,
    )
}

/// Convert one Markdown file with an already-loaded configuration.
pub fn convert_with_config(
    input: &Path,
    output: Option<&Path>,
    workspace: Option<&Path>,
    config: &Config,
) -> Result<PathBuf, Error> {
    if !is_markdown_file(input) {
        return Err(Error::InvalidInput(input.to_path_buf()));
    }

    let document = std::path::absolute(input).map_err(Error::Io)?;
    let content = fs::read_to_string(&document).map_err(Error::Io)?;

    let workspace = workspace
        .map(Path::to_path_buf)
        .or_else(|| std::env::current_dir().ok());
    let workspace = workspace.as_deref();

    let fragment = render::render_markdown(&content, &document, config);
    let styles = style::read_styles(&document, workspace, config);

    let title = document
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned();
    let page = template::compose_page(&title, &styles, &fragment);

    export::export_pdf(&page, &document, output, workspace, config).map_err(Error::Export)
}

fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
        && path.is_file()
}

/// Top-level error type combining all pipeline stages.
#[derive(Debug)]
pub enum Error {
    /// The input is missing or not a `.md` file.
    InvalidInput(PathBuf),
    Config(ConfigError),
    Io(std::io::Error),
    Export(ExportError),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(path) => write!(
                f,
                "markdown file '{}' does not exist or is not an '.md' file",
                path.display()
            ),
            Self::Config(err) => write!(f, "config: {err}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::Export(err) => write!(f, "export: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidInput(_) => None,
            Self::Config(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Export(err) => Some(err),
        }
    }
}
