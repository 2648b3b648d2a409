//! HTML page composition: the rendered fragment, assembled styles and a
//! title substituted into the bundled template. The template is compiled
//! into the binary, so there is no missing-template failure mode.

const PAGE_TEMPLATE: &str = include_str!("template.html");

/// Merge title, style fragment and body content into a complete HTML
/// document.
pub fn compose_page(title: &str, style: &str, content: &str) -> String {
    PAGE_TEMPLATE
        .replace("{{title}}", &crate::highlight::html_escape(title))
        .replace("{{style}}", style)
        .replace("{{content}}", content)
}
