//! Static file serving rooted at the configured directory.
//!
//! File requests are handled by `tower_http::services::ServeDir`, which takes
//! care of GET/HEAD semantics, Range requests, content types, traversal
//! rejection, and 405 responses for other methods. Everything `ServeDir`
//! cannot serve as a file falls through to [`directory_listing`], which
//! renders an HTML listing for directory requests (or a 404 when listings
//! are disabled).

use std::path::{Path, PathBuf};

use axum::extract::State;
use axum::handler::Handler;
use axum::http::Uri;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Router;
use tower_http::services::ServeDir;

use crate::error::AppError;
use crate::state::AppState;

/// Create the static file router.
///
/// Returns a router whose fallback service is a `ServeDir` rooted at the
/// configured serve root, resolving `index.html` for directory requests
/// and falling back to the directory-listing handler for everything else.
pub fn create_static_service(state: AppState) -> Router {
    let root = state.config.serve.root.clone();

    let serve_dir = ServeDir::new(root)
        .append_index_html_on_directories(true)
        .fallback(directory_listing.with_state(state));

    Router::new().fallback_service(serve_dir)
}

/// Fallback handler for requests `ServeDir` could not answer with a file.
///
/// Directory requests get a trailing-slash redirect, then either the
/// configured index file or an HTML listing. Anything else is a 404 --
/// `ServeDir` already tried and failed to serve it as a file.
async fn directory_listing(
    State(state): State<AppState>,
    uri: Uri,
) -> Result<Response, AppError> {
    let serve = &state.config.serve;
    let request_path = uri.path();

    let rel = sanitize_path(request_path)
        .ok_or_else(|| AppError::NotFound(request_path.to_string()))?;
    let full = serve.root.join(rel);

    let meta = tokio::fs::metadata(&full)
        .await
        .map_err(|e| AppError::from_io(e, request_path))?;
    if !meta.is_dir() {
        return Err(AppError::NotFound(request_path.to_string()));
    }

    // Directory URLs are canonicalized with a trailing slash so relative
    // hrefs in the listing resolve inside the directory.
    if !request_path.ends_with('/') {
        return Ok(Redirect::permanent(&format!("{}/", request_path)).into_response());
    }

    // A configured index file takes precedence over a listing. ServeDir only
    // resolves the literal "index.html", so other names are handled here.
    let index = full.join(&serve.index_file);
    if tokio::fs::try_exists(&index).await.unwrap_or(false) {
        let target = format!("{}{}", request_path, urlencoding::encode(&serve.index_file));
        return Ok(Redirect::temporary(&target).into_response());
    }

    if !serve.directory_listing {
        return Err(AppError::NotFound(request_path.to_string()));
    }

    let html = render_listing(request_path, &full).await?;
    Ok(Html(html).into_response())
}

/// Map a request path onto a relative filesystem path under the serve root.
///
/// Each segment is percent-decoded individually; a segment that decodes to a
/// parent-directory reference, a path separator, or a NUL rejects the whole
/// path. Returns `None` for paths that must never resolve to a file.
pub fn sanitize_path(path: &str) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for segment in path.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        let decoded = urlencoding::decode(segment).ok()?;
        if decoded == ".."
            || decoded.contains('/')
            || decoded.contains('\\')
            || decoded.contains('\0')
        {
            return None;
        }
        out.push(decoded.as_ref());
    }
    Some(out)
}

/// Render the HTML directory listing for `dir`, shown under `request_path`.
async fn render_listing(request_path: &str, dir: &Path) -> Result<String, AppError> {
    let mut read_dir = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| AppError::from_io(e, request_path))?;

    let mut entries: Vec<(String, bool)> = Vec::new();
    while let Some(entry) = read_dir
        .next_entry()
        .await
        .map_err(|e| AppError::from_io(e, request_path))?
    {
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_dir = entry
            .file_type()
            .await
            .map(|t| t.is_dir())
            .unwrap_or(false);
        entries.push((name, is_dir));
    }
    entries.sort();

    let title = escape_html(request_path);
    let mut items = String::new();
    for (name, is_dir) in &entries {
        let (href, display) = if *is_dir {
            (
                format!("{}/", urlencoding::encode(name)),
                format!("{}/", name),
            )
        } else {
            (urlencoding::encode(name).into_owned(), name.clone())
        };
        items.push_str(&format!(
            "        <li><a href=\"{}\">{}</a></li>\n",
            href,
            escape_html(&display)
        ));
    }

    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Directory listing for {}</title>
</head>
<body>
    <h1>Directory listing for {}</h1>
    <hr>
    <ul>
{}    </ul>
    <hr>
</body>
</html>"#,
        title, title, items
    ))
}

/// Minimal HTML escaping for listing entries and titles.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_accepts_simple_paths() {
        assert_eq!(sanitize_path("/"), Some(PathBuf::new()));
        assert_eq!(sanitize_path("/a/b.txt"), Some(PathBuf::from("a/b.txt")));
        assert_eq!(sanitize_path("/a//b/"), Some(PathBuf::from("a/b")));
        assert_eq!(sanitize_path("/./a"), Some(PathBuf::from("a")));
    }

    #[test]
    fn sanitize_decodes_segments() {
        assert_eq!(
            sanitize_path("/some%20file.txt"),
            Some(PathBuf::from("some file.txt"))
        );
    }

    #[test]
    fn sanitize_rejects_traversal() {
        assert_eq!(sanitize_path("/../secret"), None);
        assert_eq!(sanitize_path("/a/../../secret"), None);
        assert_eq!(sanitize_path("/%2e%2e/secret"), None);
        assert_eq!(sanitize_path("/a/%2e%2e/%2e%2e/secret"), None);
    }

    #[test]
    fn sanitize_rejects_embedded_separators_and_nul() {
        assert_eq!(sanitize_path("/a%2fb"), None);
        assert_eq!(sanitize_path("/a%5cb"), None);
        assert_eq!(sanitize_path("/a%00b"), None);
    }

    #[test]
    fn escape_html_covers_special_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#x27;&lt;/a&gt;"
        );
        assert_eq!(escape_html("plain-name.txt"), "plain-name.txt");
    }

    #[tokio::test]
    async fn listing_contains_sorted_entries_with_encoded_hrefs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b file.txt"), b"x").unwrap();
        std::fs::write(dir.path().join("a.txt"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let html = render_listing("/", dir.path()).await.unwrap();

        assert!(html.contains("Directory listing for /"));
        assert!(html.contains(r#"<a href="a.txt">a.txt</a>"#));
        assert!(html.contains(r#"<a href="b%20file.txt">b file.txt</a>"#));
        assert!(html.contains(r#"<a href="sub/">sub/</a>"#));

        let a = html.find("a.txt").unwrap();
        let b = html.find("b%20file.txt").unwrap();
        let s = html.find("sub/").unwrap();
        assert!(a < b && b < s);
    }

    #[tokio::test]
    async fn listing_missing_directory_maps_to_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = render_listing("/gone/", &dir.path().join("gone"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
