//! Markdown to HTML-fragment rendering.
//!
//! comrak does the parsing; before formatting, the AST is rewritten so that
//! image references point at resolved file URIs and fenced code blocks carry
//! their highlighted HTML. Heading ids and `:::` containers are handled
//! around the comrak pass: containers as a line-level preprocessing step,
//! heading ids as a post-processing step over the emitted HTML.

use std::path::Path;
use std::sync::OnceLock;

use comrak::{
    Arena, ComrakOptions, format_html,
    nodes::{AstNode, NodeHtmlBlock, NodeValue},
    parse_document,
};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use regex::Regex;

use crate::config::Config;
use crate::highlight::{Highlighter, html_escape};
use crate::resolve;

/// Render Markdown to an HTML fragment, resolving image references against
/// the document's location.
pub fn render_markdown(content: &str, document: &Path, config: &Config) -> String {
    let prepared = expand_containers(content);

    let mut options = ComrakOptions::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;
    options.extension.autolink = true;
    // Anchors are added in post-processing with our own slug rules.
    options.extension.header_ids = None;
    options.render.hardbreaks = config.breaks;
    options.render.unsafe_ = true;

    let highlighter = config
        .highlight
        .then(|| Highlighter::from_theme_name(&config.highlight_style));

    let arena = Arena::new();
    let root = parse_document(&arena, &prepared, &options);
    rewrite_tree(root, document, highlighter.as_ref());

    let mut output = Vec::new();
    format_html(root, &options, &mut output).unwrap_or_default();
    let html = String::from_utf8(output).unwrap_or_default();

    add_heading_ids(&html)
}

fn rewrite_tree<'a>(node: &'a AstNode<'a>, document: &Path, highlighter: Option<&Highlighter>) {
    for child in node.children() {
        {
            let mut data = child.data.borrow_mut();
            match data.value {
                NodeValue::Image(ref mut link) => {
                    link.url = resolve::resolve_image_src(&link.url, document);
                }
                NodeValue::HtmlBlock(ref mut block) => {
                    block.literal = rewrite_img_srcs(&block.literal, document);
                }
                _ => {}
            }

            let replacement = match data.value {
                NodeValue::CodeBlock(ref code) if code.fenced => {
                    Some(render_code_block(&code.literal, &code.info, highlighter))
                }
                _ => None,
            };
            if let Some(literal) = replacement {
                data.value = NodeValue::HtmlBlock(NodeHtmlBlock {
                    block_type: 0,
                    literal,
                });
            }
        }
        rewrite_tree(child, document, highlighter);
    }
}

fn render_code_block(code: &str, info: &str, highlighter: Option<&Highlighter>) -> String {
    match highlighter {
        Some(highlighter) => highlighter.render_block(code, info),
        None => format!(
            "<pre class=\"hljs\"><code><div>{}</div></code></pre>",
            html_escape(code)
        ),
    }
}

/// Rewrite `src` attributes of `<img>` tags embedded in raw HTML.
fn rewrite_img_srcs(html: &str, document: &Path) -> String {
    static IMG_SRC_RE: OnceLock<Regex> = OnceLock::new();
    let re = IMG_SRC_RE.get_or_init(|| {
        Regex::new(r#"(?i)(<img[^>]*?src\s*=\s*)(["'])([^"']*)(["'])"#).expect("valid regex")
    });

    re.replace_all(html, |caps: &regex::Captures| {
        let resolved = resolve::resolve_image_src(&caps[3], document);
        format!("{}{}{}{}", &caps[1], &caps[2], resolved, &caps[4])
    })
    .to_string()
}

/// Expand `::: name` fenced containers into div wrappers before parsing.
/// Blank lines around the emitted tags keep the container content in
/// Markdown territory rather than inside the raw HTML block.
fn expand_containers(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len() + 32);
    let mut in_code_fence = false;

    for line in markdown.lines() {
        let trimmed = line.trim_start();

        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_code_fence = !in_code_fence;
            out.push_str(line);
            out.push('\n');
            continue;
        }

        if !in_code_fence
            && let Some(info) = trimmed.strip_prefix(":::")
        {
            let info = info.trim();
            if info.is_empty() {
                out.push_str("\n</div>\n\n");
            } else {
                out.push_str(&format!("\n<div class=\"{}\">\n\n", html_escape(info)));
            }
            continue;
        }

        out.push_str(line);
        out.push('\n');
    }

    out
}

/// Add `id` attributes to headings that have none, using the slug of the
/// heading's text content.
fn add_heading_ids(html: &str) -> String {
    static HEADING_RE: OnceLock<Regex> = OnceLock::new();
    static TAG_RE: OnceLock<Regex> = OnceLock::new();

    let heading = HEADING_RE
        .get_or_init(|| Regex::new(r"(?s)<h([1-6])>(.*?)</h([1-6])>").expect("valid regex"));
    let tag = TAG_RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("valid regex"));

    heading
        .replace_all(html, |caps: &regex::Captures| {
            let level = &caps[1];
            let inner = &caps[2];
            let text = unescape_entities(&tag.replace_all(inner, ""));
            format!("<h{level} id=\"{}\">{inner}</h{level}>", slug(&text))
        })
        .to_string()
}

fn unescape_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

const SLUG_STRIP: &str = "[]!\"#$%&'()*+,./:;<=>?@\\^_{|}~`";

// Keep alphanumerics and hyphens, percent-encode the rest.
const SLUG_ENCODE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-');

/// Slugify a heading: trim, lowercase, strip a fixed punctuation set,
/// collapse whitespace to hyphens, trim stray hyphens, percent-encode.
pub fn slug(text: &str) -> String {
    let cleaned: String = text
        .trim()
        .to_lowercase()
        .chars()
        .filter(|ch| !SLUG_STRIP.contains(*ch))
        .collect();

    let hyphenated = cleaned.split_whitespace().collect::<Vec<_>>().join("-");
    let trimmed = hyphenated.trim_matches('-');

    utf8_percent_encode(trimmed, SLUG_ENCODE).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn doc() -> PathBuf {
        PathBuf::from("/work/docs/readme.md")
    }

    fn render(markdown: &str) -> String {
        render_markdown(markdown, &doc(), &Config::default())
    }

    #[test]
    fn slug_basics() {
        assert_eq!(slug("Hello World"), "hello-world");
        assert_eq!(slug("  Spaced   Out  "), "spaced-out");
        assert_eq!(slug("What's New?"), "whats-new");
    }

    #[test]
    fn slug_is_idempotent() {
        let once = slug("Some Heading, With Punctuation!");
        assert_eq!(slug(&once), once);
    }

    #[test]
    fn slug_case_and_punctuation_collapse() {
        assert_eq!(slug("My Title"), slug("my title!"));
        assert_eq!(slug("A.B.C"), slug("abc"));
    }

    #[test]
    fn slug_percent_encodes_non_ascii() {
        assert_eq!(slug("héllo"), "h%C3%A9llo");
    }

    #[test]
    fn headings_get_slug_ids() {
        let html = render("# My Title\n\n## What's New?");
        assert!(html.contains("<h1 id=\"my-title\">My Title</h1>"));
        assert!(html.contains("<h2 id=\"whats-new\">What's New?</h2>"));
    }

    #[test]
    fn image_src_is_resolved_against_document() {
        let html = render("![cat](pics/cat.png)");
        let expected = resolve::resolve_image_src("pics/cat.png", &doc());
        assert!(html.contains(&format!("src=\"{expected}\"")));
        assert_eq!(expected, "file:///work/docs/pics/cat.png");
    }

    #[test]
    fn raw_html_img_src_is_resolved() {
        let html = render("intro\n\n<img src=\"pics/dog.png\" alt=\"d\">\n\ntail");
        assert!(html.contains("src=\"file:///work/docs/pics/dog.png\""));
    }

    #[test]
    fn remote_image_passes_through() {
        let html = render("![c](https://example.com/c.png)");
        assert!(html.contains("src=\"https://example.com/c.png\""));
    }

    #[test]
    fn recognized_language_is_highlighted() {
        let html = render("```rust\nlet x = 1;\n```");
        assert!(html.contains("<pre class=\"hljs\"><code><div>"));
        assert!(html.contains("<span"));
    }

    #[test]
    fn unrecognized_language_is_escaped_not_highlighted() {
        let html = render("```nosuchlang\na < b\n```");
        assert!(html.contains("a &lt; b"));
        assert!(!html.contains("<span"));
    }

    #[test]
    fn highlight_disabled_still_wraps_and_escapes() {
        let config = Config {
            highlight: false,
            ..Config::default()
        };
        let html = render_markdown("```rust\nlet x = 1;\n```", &doc(), &config);
        assert!(html.contains("<pre class=\"hljs\"><code><div>let x = 1;"));
        assert!(!html.contains("<span"));
    }

    #[test]
    fn checkboxes_are_rendered() {
        let html = render("- [x] done\n- [ ] todo");
        assert!(html.contains("type=\"checkbox\""));
        assert!(html.contains("checked"));
    }

    #[test]
    fn containers_become_divs() {
        let html = render("::: warning\nhere be *dragons*\n:::");
        assert!(html.contains("<div class=\"warning\">"));
        assert!(html.contains("<em>dragons</em>"));
        assert!(html.contains("</div>"));
    }

    #[test]
    fn container_fence_inside_code_block_is_untouched() {
        let html = render("```\n::: not-a-container\n```");
        assert!(html.contains("::: not-a-container"));
        assert!(!html.contains("<div class=\"not-a-container\">"));
    }

    #[test]
    fn breaks_follow_config() {
        let soft = render("line one\nline two");
        assert!(!soft.contains("<br"));

        let config = Config {
            breaks: true,
            ..Config::default()
        };
        let hard = render_markdown("line one\nline two", &doc(), &config);
        assert!(hard.contains("<br"));
    }
}
