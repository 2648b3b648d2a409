//! Assembling the CSS injected into the exported document.
//!
//! Fixed order: bundled base theme, user stylesheet links, highlight theme,
//! bundled supplementary theme. A missing or unreadable CSS source simply
//! contributes nothing.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::highlight;
use crate::resolve;

const BASE_CSS: &str = include_str!("markdown.css");
const SUPPLEMENT_CSS: &str = include_str!("markdown_pdf.css");
const HLJS_CSS: &str = include_str!("hljs.css");

/// Produce the HTML fragment of `<style>` blocks and `<link>` tags for the
/// document head.
pub fn read_styles(document: &Path, workspace: Option<&Path>, config: &Config) -> String {
    let mut out = String::new();

    if config.include_default_styles {
        out.push_str(&style_block(BASE_CSS));
    }

    for href in &config.styles {
        let resolved = resolve::resolve_href(
            href,
            document,
            workspace,
            config.styles_relative_path_file,
        );
        if !resolved.is_empty() {
            out.push_str(&format!(
                "<link rel=\"stylesheet\" href=\"{resolved}\" type=\"text/css\">"
            ));
        }
    }

    if config.highlight {
        out.push_str(&highlight_styles(document, config));
    }

    if config.include_default_styles {
        out.push_str(&style_block(SUPPLEMENT_CSS));
    }

    out
}

fn highlight_styles(document: &Path, config: &Config) -> String {
    let value = config.highlight_style.trim();

    if value.is_empty() {
        return style_block(HLJS_CSS);
    }

    if value.ends_with(".css") {
        let path = css_file_path(value, document);
        return match fs::read_to_string(&path) {
            Ok(css) => style_block(&css),
            Err(_) => String::new(),
        };
    }

    highlight::theme_block_css(value)
        .map(|css| style_block(&css))
        .unwrap_or_default()
}

/// A custom highlight stylesheet path: `~`-expanded, absolute, or relative
/// to the document's directory.
fn css_file_path(value: &str, document: &Path) -> PathBuf {
    if let Some(rest) = value.strip_prefix('~')
        && let Some(home) = resolve::home_dir()
    {
        return PathBuf::from(format!("{}{rest}", home.display()));
    }

    let path = Path::new(value);
    if path.is_absolute() {
        return path.to_path_buf();
    }

    document
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(path)
}

fn style_block(css: &str) -> String {
    if css.trim().is_empty() {
        String::new()
    } else {
        format!("\n<style>\n{css}\n</style>\n")
    }
}
