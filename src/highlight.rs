//! Fenced-code-block highlighting backed by syntect.
//!
//! A recognized language tag produces inline-styled spans; anything else is
//! HTML-escaped and left plain. Either way the content is wrapped in the
//! fixed `<pre class="hljs"><code><div>...</div></code></pre>` structure the
//! bundled stylesheets target.

use std::sync::OnceLock;

use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{IncludeBackground, styled_line_to_highlighted_html};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

pub const DEFAULT_THEME: &str = "InspiredGitHub";

static SYNTAXES: OnceLock<SyntaxSet> = OnceLock::new();
static THEMES: OnceLock<ThemeSet> = OnceLock::new();

fn syntaxes() -> &'static SyntaxSet {
    SYNTAXES.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn themes() -> &'static ThemeSet {
    THEMES.get_or_init(ThemeSet::load_defaults)
}

/// Map the short theme names accepted in config files onto syntect's
/// bundled theme names. Unknown names resolve to `None`.
fn lookup_theme(name: &str) -> Option<&'static Theme> {
    let key = match name {
        "" | "github" => DEFAULT_THEME,
        "solarized-dark" => "Solarized (dark)",
        "solarized-light" => "Solarized (light)",
        other => other,
    };
    themes().themes.get(key)
}

pub struct Highlighter {
    theme: &'static Theme,
}

impl Highlighter {
    /// Build a highlighter for a named theme, falling back to the default
    /// theme when the name is unknown or refers to a stylesheet path.
    pub fn from_theme_name(name: &str) -> Self {
        let name = if name.ends_with(".css") { "" } else { name };
        let theme = lookup_theme(name).unwrap_or_else(|| {
            eprintln!("[mdprint] unknown highlight theme '{name}', using {DEFAULT_THEME}");
            &themes().themes[DEFAULT_THEME]
        });
        Self { theme }
    }

    /// Render one fenced code block to its fixed HTML wrapper.
    pub fn render_block(&self, code: &str, lang: &str) -> String {
        let inner = self
            .highlight_spans(code, lang)
            .unwrap_or_else(|| html_escape(code));
        format!("<pre class=\"hljs\"><code><div>{inner}</div></code></pre>")
    }

    fn highlight_spans(&self, code: &str, lang: &str) -> Option<String> {
        let lang = lang.split_whitespace().next()?;
        let syntax = syntaxes().find_syntax_by_token(lang)?;

        let mut lines = HighlightLines::new(syntax, self.theme);
        let mut out = String::with_capacity(code.len());
        for line in LinesWithEndings::from(code) {
            let ranges = lines.highlight_line(line, syntaxes()).ok()?;
            out.push_str(&styled_line_to_highlighted_html(&ranges, IncludeBackground::No).ok()?);
        }
        Some(out)
    }
}

/// CSS block styling the `pre.hljs` wrapper after a named theme's base
/// colors. `None` when the theme name is unknown.
pub fn theme_block_css(name: &str) -> Option<String> {
    let theme = lookup_theme(name)?;
    let background = theme
        .settings
        .background
        .map_or_else(|| "#ffffff".to_string(), hex_color);
    let foreground = theme
        .settings
        .foreground
        .map_or_else(|| "#000000".to_string(), hex_color);
    Some(format!(
        "pre.hljs {{ background-color: {background}; color: {foreground}; }}\n"
    ))
}

fn hex_color(color: syntect::highlighting::Color) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
}

pub fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognized_language_is_highlighted() {
        let highlighter = Highlighter::from_theme_name("");
        let html = highlighter.render_block("let x = 1;\n", "rust");
        assert!(html.starts_with("<pre class=\"hljs\"><code><div>"));
        assert!(html.ends_with("</div></code></pre>"));
        assert!(html.contains("<span"));
    }

    #[test]
    fn unrecognized_language_is_escaped() {
        let highlighter = Highlighter::from_theme_name("");
        let html = highlighter.render_block("<b> & stuff\n", "nosuchlang");
        assert!(html.contains("&lt;b&gt; &amp; stuff"));
        assert!(!html.contains("<span"));
    }

    #[test]
    fn empty_language_is_escaped() {
        let highlighter = Highlighter::from_theme_name("");
        let html = highlighter.render_block("plain\n", "");
        assert_eq!(
            html,
            "<pre class=\"hljs\"><code><div>plain\n</div></code></pre>"
        );
    }

    #[test]
    fn theme_css_for_known_theme() {
        let css = theme_block_css("").unwrap();
        assert!(css.starts_with("pre.hljs { background-color: #"));
    }

    #[test]
    fn theme_css_for_unknown_theme_is_none() {
        assert!(theme_block_css("no-such-theme").is_none());
    }

    #[test]
    fn escape_covers_markup_characters() {
        assert_eq!(html_escape("a<b>&\"'"), "a&lt;b&gt;&amp;&quot;&#39;");
    }
}
