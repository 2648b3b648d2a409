//! PDF export: write the composed HTML to a sibling temporary file, drive a
//! headless Chromium instance over it, and emit the PDF at the resolved
//! destination.
//!
//! Every browser step returns a typed error that aborts the rest of the
//! conversion; the browser process and the temporary file are both cleaned
//! up on drop, so an aborted conversion leaks neither.

use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions};

use crate::config::Config;
use crate::resolve;

#[derive(Debug)]
pub enum ExportError {
    Io(std::io::Error),
    /// `outputDirectory` named an absolute path that is not a directory.
    InvalidOutputDirectory(PathBuf),
    Launch(String),
    Browser(String),
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::InvalidOutputDirectory(path) => {
                write!(f, "output directory '{}' does not exist", path.display())
            }
            Self::Launch(msg) => write!(f, "browser launch failed: {msg}"),
            Self::Browser(msg) => write!(f, "browser error: {msg}"),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

/// Rasterize `html` to a PDF file on disk and return the destination path.
pub fn export_pdf(
    html: &str,
    document: &Path,
    output: Option<&Path>,
    workspace: Option<&Path>,
    config: &Config,
) -> Result<PathBuf, ExportError> {
    let destination = resolve_destination(document, output, workspace, config)?;
    let temp = TempHtml::create(document, html, config.debug)?;

    let mut builder = LaunchOptions::default_builder();
    builder.headless(true).sandbox(false);
    let executable = config.executable_path.trim();
    if !executable.is_empty() {
        builder.path(Some(PathBuf::from(executable)));
    }
    let launch = builder
        .build()
        .map_err(|e| ExportError::Launch(e.to_string()))?;

    // The browser process is killed when `browser` drops, including on the
    // error paths below.
    let browser = Browser::new(launch).map_err(|e| ExportError::Launch(e.to_string()))?;
    let tab = browser
        .new_tab()
        .map_err(|e| ExportError::Browser(e.to_string()))?;

    let url = resolve::file_uri(&temp.path().to_string_lossy());
    tab.navigate_to(&url)
        .map_err(|e| ExportError::Browser(e.to_string()))?;
    tab.wait_until_navigated()
        .map_err(|e| ExportError::Browser(e.to_string()))?;

    // Let file-URI images finish decoding before printing.
    thread::sleep(Duration::from_millis(200));

    let bytes = tab
        .print_to_pdf(Some(pdf_options(config)))
        .map_err(|e| ExportError::Browser(e.to_string()))?;

    fs::write(&destination, bytes).map_err(ExportError::Io)?;
    Ok(destination)
}

/// Where the PDF lands: the explicit override, else `outputDirectory`
/// (`~`-expanded, absolute, workspace-relative, or document-relative),
/// else next to the source file.
fn resolve_destination(
    document: &Path,
    output: Option<&Path>,
    workspace: Option<&Path>,
    config: &Config,
) -> Result<PathBuf, ExportError> {
    if let Some(path) = output {
        return Ok(path.to_path_buf());
    }

    let sibling = document.with_extension("pdf");
    let setting = config.output_directory.trim();
    if setting.is_empty() {
        return Ok(sibling);
    }

    let file_name = sibling.file_name().unwrap_or_default().to_os_string();

    if let Some(rest) = setting.strip_prefix('~')
        && let Some(home) = resolve::home_dir()
    {
        let dir = PathBuf::from(format!("{}{rest}", home.display()));
        fs::create_dir_all(&dir).map_err(ExportError::Io)?;
        return Ok(dir.join(file_name));
    }

    let setting_path = Path::new(setting);
    if setting_path.is_absolute() {
        if !setting_path.is_dir() {
            return Err(ExportError::InvalidOutputDirectory(
                setting_path.to_path_buf(),
            ));
        }
        return Ok(setting_path.join(file_name));
    }

    let dir = if !config.output_directory_relative_path_file
        && let Some(root) = workspace
    {
        root.join(setting_path)
    } else {
        document
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(setting_path)
    };

    fs::create_dir_all(&dir).map_err(ExportError::Io)?;
    Ok(dir.join(file_name))
}

fn pdf_options(config: &Config) -> PrintToPdfOptions {
    let width = length_in_inches(&config.width);
    let height = length_in_inches(&config.height);

    // Explicit width/height take precedence over the named paper format.
    let (paper_width, paper_height) = match (width, height) {
        (None, None) => {
            let (w, h) = paper_format(&config.format);
            (Some(w), Some(h))
        }
        _ => (width, height),
    };

    PrintToPdfOptions {
        landscape: Some(config.orientation == "landscape"),
        display_header_footer: Some(config.display_header_footer),
        header_template: non_empty(&config.header_template),
        footer_template: non_empty(&config.footer_template),
        print_background: Some(config.print_background),
        scale: Some(config.scale),
        paper_width,
        paper_height,
        margin_top: length_in_inches(&config.margin.top),
        margin_right: length_in_inches(&config.margin.right),
        margin_bottom: length_in_inches(&config.margin.bottom),
        margin_left: length_in_inches(&config.margin.left),
        page_ranges: non_empty(&config.page_ranges),
        prefer_css_page_size: Some(false),
        ..Default::default()
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse a CSS length (`px`, `in`, `cm`, `mm`, or a bare pixel count)
/// into inches for the CDP print call.
fn length_in_inches(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    for (suffix, per_inch) in [("px", 96.0), ("in", 1.0), ("cm", 2.54), ("mm", 25.4)] {
        if let Some(number) = value.strip_suffix(suffix) {
            return number.trim().parse::<f64>().ok().map(|n| n / per_inch);
        }
    }

    value.parse::<f64>().ok().map(|n| n / 96.0)
}

/// Named paper formats in inches. Unknown names fall back to A4.
fn paper_format(name: &str) -> (f64, f64) {
    match name.trim().to_ascii_lowercase().as_str() {
        "letter" => (8.5, 11.0),
        "legal" => (8.5, 14.0),
        "tabloid" => (11.0, 17.0),
        "ledger" => (17.0, 11.0),
        "a0" => (33.1, 46.8),
        "a1" => (23.4, 33.1),
        "a2" => (16.54, 23.4),
        "a3" => (11.7, 16.54),
        "" | "a4" => (8.27, 11.69),
        "a5" => (5.83, 8.27),
        "a6" => (4.13, 5.83),
        other => {
            eprintln!("[mdprint] unknown paper format '{other}', using A4");
            (8.27, 11.69)
        }
    }
}

/// Sibling temporary HTML file, removed on drop unless debug mode keeps it.
/// The name is unique per conversion so concurrent runs over the same
/// source cannot clobber each other.
struct TempHtml {
    path: PathBuf,
    keep: bool,
}

impl TempHtml {
    fn create(document: &Path, html: &str, keep: bool) -> Result<Self, ExportError> {
        static SEQUENCE: AtomicUsize = AtomicUsize::new(0);
        let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);

        let stem = document
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned();
        let name = format!("{stem}_tmp_{}_{sequence}.html", process::id());
        let path = document
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(name);

        fs::write(&path, html).map_err(ExportError::Io)?;
        Ok(Self { path, keep })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempHtml {
    fn drop(&mut self) {
        if !self.keep {
            let _ = fs::remove_file(&self.path);
        }
    }
}
