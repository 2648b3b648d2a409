//! Conversion configuration, loaded once per conversion from a JSON file.
//!
//! Key names are camelCase to match the config files the tool has always
//! accepted. Every field has a default, so `{}` is a valid config and a
//! missing `--config` flag falls back to the built-in defaults.

use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;

use serde::Deserialize;

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "read config failed: {err}"),
            Self::Parse(err) => write!(f, "config is not valid JSON: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Base directory for generated output. Empty means the source
    /// directory. Supports `~` and workspace-relative forms.
    pub output_directory: String,
    /// When `false`, `outputDirectory` resolves against the workspace
    /// root instead of the document directory.
    pub output_directory_relative_path_file: bool,
    /// When `false`, stylesheet paths resolve against the workspace root
    /// instead of the document directory.
    pub styles_relative_path_file: bool,
    /// Include the bundled base and supplementary CSS themes.
    pub include_default_styles: bool,
    /// Ordered list of additional stylesheet references.
    pub styles: Vec<String>,
    /// Enable syntax highlighting of fenced code blocks.
    pub highlight: bool,
    /// Named built-in theme, or a path when it ends in `.css`.
    pub highlight_style: String,
    /// Treat single line breaks as hard breaks.
    pub breaks: bool,
    /// Override path to the browser executable.
    pub executable_path: String,
    /// Keep the temporary HTML file after export.
    pub debug: bool,

    // Passed through to the PDF rasterization call.
    pub scale: f64,
    pub display_header_footer: bool,
    pub header_template: String,
    pub footer_template: String,
    pub print_background: bool,
    pub orientation: String,
    pub page_ranges: String,
    pub format: String,
    pub width: String,
    pub height: String,
    pub margin: Margin,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Margin {
    pub top: String,
    pub right: String,
    pub bottom: String,
    pub left: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_directory: String::new(),
            output_directory_relative_path_file: true,
            styles_relative_path_file: true,
            include_default_styles: true,
            styles: Vec::new(),
            highlight: true,
            highlight_style: String::new(),
            breaks: false,
            executable_path: String::new(),
            debug: false,
            scale: 1.0,
            display_header_footer: false,
            header_template: String::new(),
            footer_template: String::new(),
            print_background: true,
            orientation: String::new(),
            page_ranges: String::new(),
            format: "A4".to_string(),
            width: String::new(),
            height: String::new(),
            margin: Margin::default(),
        }
    }
}

impl Config {
    /// Load a config file, or the built-in defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(ConfigError::Io)?;
                serde_json::from_str(&text).map_err(ConfigError::Parse)
            }
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_object_is_a_valid_config() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert!(config.include_default_styles);
        assert!(config.highlight);
        assert!(config.styles_relative_path_file);
        assert_eq!(config.format, "A4");
        assert_eq!(config.scale, 1.0);
    }

    #[test]
    fn camel_case_keys_are_recognized() {
        let config: Config = serde_json::from_str(
            r#"{
                "outputDirectory": "out",
                "stylesRelativePathFile": false,
                "includeDefaultStyles": false,
                "styles": ["a.css", "b.css"],
                "highlightStyle": "custom.css",
                "displayHeaderFooter": true,
                "printBackground": false,
                "margin": { "top": "2cm", "left": "1cm" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.output_directory, "out");
        assert!(!config.styles_relative_path_file);
        assert!(!config.include_default_styles);
        assert_eq!(config.styles, vec!["a.css", "b.css"]);
        assert_eq!(config.highlight_style, "custom.css");
        assert!(config.display_header_footer);
        assert!(!config.print_background);
        assert_eq!(config.margin.top, "2cm");
        assert_eq!(config.margin.left, "1cm");
        assert_eq!(config.margin.bottom, "");
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let config: Config = serde_json::from_str(r#"{"somethingElse": 1}"#).unwrap();
        assert!(config.highlight);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = Config::load(Some(Path::new("/nonexistent/config.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn load_reads_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"breaks": true, "format": "Letter"}}"#).unwrap();
        let config = Config::load(Some(file.path())).unwrap();
        assert!(config.breaks);
        assert_eq!(config.format, "Letter");
    }

    #[test]
    fn no_path_means_builtin_defaults() {
        let config = Config::load(None).unwrap();
        assert!(config.output_directory.is_empty());
        assert!(!config.debug);
    }
}
