//! Reference resolution: turning image `src` values, stylesheet hrefs and
//! output-directory settings into absolute, scheme-correct locations.

use std::path::{Path, PathBuf};

/// Build a `file:` URI from a filesystem path.
///
/// Backslashes are normalized to forward slashes and `#` is percent-encoded
/// so fragment characters in paths are not misinterpreted. Absolute paths
/// always come out in the three-slash `file:///` form; `//server/share`
/// stays a two-slash UNC reference.
pub fn file_uri(path: &str) -> String {
    let normalized = path.replace('\\', "/").replace('#', "%23");

    if normalized.starts_with("//") {
        format!("file:{normalized}")
    } else if normalized.starts_with('/') {
        format!("file://{normalized}")
    } else {
        format!("file:///{normalized}")
    }
}

/// Resolve a stylesheet (or other) href against the document location.
///
/// First match wins: already an `http`/`https` URL, `~`-relative,
/// absolute or `file:`-scheme, workspace-relative (only when
/// `relative_to_document` is disabled and a workspace root is known),
/// otherwise relative to the document's directory. An empty href is
/// returned unchanged.
pub fn resolve_href(
    href: &str,
    document: &Path,
    workspace: Option<&Path>,
    relative_to_document: bool,
) -> String {
    resolve_href_with(href, document, workspace, relative_to_document, home_dir())
}

fn resolve_href_with(
    href: &str,
    document: &Path,
    workspace: Option<&Path>,
    relative_to_document: bool,
    home: Option<PathBuf>,
) -> String {
    if href.is_empty() {
        return href.to_string();
    }

    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }

    if let Some(rest) = href.strip_prefix('~')
        && let Some(home) = home
    {
        return file_uri(&format!("{}{rest}", home.display()));
    }

    if let Some(stripped) = strip_file_scheme(href) {
        return file_uri(stripped);
    }

    if is_absolute(href) {
        return file_uri(href);
    }

    if !relative_to_document
        && let Some(root) = workspace
    {
        return file_uri(&root.join(href).to_string_lossy());
    }

    let dir = document.parent().unwrap_or_else(|| Path::new(""));
    file_uri(&dir.join(href).to_string_lossy())
}

/// Resolve an image `src` against the document location.
///
/// Unlike stylesheet hrefs, an image reference that already carries a
/// `file:` scheme is normalized to the three-slash `file:///` form, and
/// any other scheme (`http:`, `data:`, ...) passes through untouched.
pub fn resolve_image_src(src: &str, document: &Path) -> String {
    let href = src.replace(['"', '\''], "");
    if href.is_empty() {
        return href;
    }

    if let Some(stripped) = strip_file_scheme(&href) {
        return file_uri(stripped);
    }

    if !has_scheme(&href) || is_absolute(&href) {
        let dir = document.parent().unwrap_or_else(|| Path::new(""));
        return file_uri(&dir.join(&href).to_string_lossy());
    }

    src.to_string()
}

fn strip_file_scheme(href: &str) -> Option<&str> {
    let rest = href.strip_prefix("file://")?;
    // "file:///x" and "file://x" both mean the absolute path "/x".
    Some(rest.trim_start_matches('/'))
}

fn is_absolute(href: &str) -> bool {
    Path::new(href).is_absolute() || is_windows_drive(href)
}

fn is_windows_drive(href: &str) -> bool {
    let bytes = href.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && bytes.get(2) != Some(&b':')
}

fn has_scheme(href: &str) -> bool {
    if is_windows_drive(href) {
        return false;
    }
    let Some(colon) = href.find(':') else {
        return false;
    };
    let scheme = &href[..colon];
    scheme.len() >= 2
        && scheme.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

pub fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> PathBuf {
        PathBuf::from("/work/docs/readme.md")
    }

    #[test]
    fn absolute_path_gets_three_slashes() {
        assert_eq!(file_uri("/usr/share/style.css"), "file:///usr/share/style.css");
    }

    #[test]
    fn backslashes_are_normalized() {
        assert_eq!(file_uri("C:\\docs\\style.css"), "file:///C:/docs/style.css");
    }

    #[test]
    fn hash_is_percent_encoded() {
        assert_eq!(file_uri("/tmp/a#b.css"), "file:///tmp/a%23b.css");
    }

    #[test]
    fn url_passes_through() {
        let href = "https://example.com/style.css";
        assert_eq!(resolve_href(href, &doc(), None, true), href);
        assert_eq!(
            resolve_href("http://example.com/x", &doc(), None, true),
            "http://example.com/x"
        );
    }

    #[test]
    fn empty_href_passes_through() {
        assert_eq!(resolve_href("", &doc(), None, true), "");
    }

    #[test]
    fn tilde_expands_to_home() {
        let uri = resolve_href_with(
            "~/styles/site.css",
            &doc(),
            None,
            true,
            Some(PathBuf::from("/home/amy")),
        );
        assert_eq!(uri, "file:///home/amy/styles/site.css");
    }

    #[test]
    fn absolute_href_becomes_file_uri() {
        assert_eq!(
            resolve_href("/etc/styles/a.css", &doc(), None, true),
            "file:///etc/styles/a.css"
        );
    }

    #[test]
    fn file_scheme_is_normalized() {
        assert_eq!(
            resolve_href("file:///etc/a.css", &doc(), None, true),
            "file:///etc/a.css"
        );
        assert_eq!(
            resolve_href("file://etc/a.css", &doc(), None, true),
            "file:///etc/a.css"
        );
    }

    #[test]
    fn relative_href_resolves_against_document() {
        assert_eq!(
            resolve_href("img/a.css", &doc(), None, true),
            "file:///work/docs/img/a.css"
        );
    }

    #[test]
    fn workspace_relative_when_flag_disabled() {
        let root = PathBuf::from("/work");
        assert_eq!(
            resolve_href("shared/a.css", &doc(), Some(&root), false),
            "file:///work/shared/a.css"
        );
        // Flag enabled: workspace ignored even if known.
        assert_eq!(
            resolve_href("shared/a.css", &doc(), Some(&root), true),
            "file:///work/docs/shared/a.css"
        );
    }

    #[test]
    fn image_relative_resolves_against_document() {
        assert_eq!(
            resolve_image_src("pics/cat.png", &doc()),
            "file:///work/docs/pics/cat.png"
        );
    }

    #[test]
    fn image_two_slash_file_scheme_normalized() {
        assert_eq!(
            resolve_image_src("file://work/pics/cat.png", &doc()),
            "file:///work/pics/cat.png"
        );
    }

    #[test]
    fn image_other_scheme_passes_through() {
        let src = "https://example.com/cat.png";
        assert_eq!(resolve_image_src(src, &doc()), src);
        let data = "data:image/png;base64,AAAA";
        assert_eq!(resolve_image_src(data, &doc()), data);
    }

    #[test]
    fn image_absolute_path_becomes_file_uri() {
        assert_eq!(
            resolve_image_src("/srv/pics/cat.png", &doc()),
            "file:///srv/pics/cat.png"
        );
    }

    #[test]
    fn image_hash_in_path_is_encoded() {
        assert_eq!(
            resolve_image_src("pics/c#t.png", &doc()),
            "file:///work/docs/pics/c%23t.png"
        );
    }
}
