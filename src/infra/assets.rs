//! Embedded static asset serving utilities.

use axum::{
    body::Body,
    extract::Path,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use include_dir::{Dir, include_dir};
use mime_guess::MimeGuess;

use crate::application::error::ErrorReport;

static STATIC_PUBLIC_ASSETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/static/public");

/// Serve embedded public static assets.
pub async fn serve_public(path: Option<Path<String>>) -> Response {
    let captured = path.map(|Path(value)| value);
    match resolve_asset(captured) {
        Some((contents, mime)) => asset_response(contents, mime),
        None => not_found_response("infra::assets::serve_public"),
    }
}

fn resolve_asset(path: Option<String>) -> Option<(Bytes, MimeGuess)> {
    let candidate = path.unwrap_or_default();
    let candidate = candidate.trim_start_matches('/');

    // No directory listings, no traversal.
    if candidate.is_empty() || candidate.ends_with('/') || candidate.contains("..") {
        return None;
    }

    let file = STATIC_PUBLIC_ASSETS.get_file(candidate)?;
    Some((
        Bytes::from_static(file.contents()),
        mime_guess::from_path(candidate),
    ))
}

fn asset_response(contents: Bytes, mime: MimeGuess) -> Response {
    let mut response = Response::new(Body::from(contents));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    let mime = mime.first_or_octet_stream();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=31536000, immutable"),
    );

    response
}

fn not_found_response(source: &'static str) -> Response {
    let mut response = StatusCode::NOT_FOUND.into_response();
    ErrorReport::from_message(source, StatusCode::NOT_FOUND, "Static asset not found")
        .attach(&mut response);
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stylesheet_resolves_with_css_mime() {
        let (contents, mime) = resolve_asset(Some("site.css".to_string())).expect("bundled asset");
        assert!(!contents.is_empty());
        assert_eq!(mime.first_or_octet_stream().as_ref(), "text/css");
    }

    #[test]
    fn traversal_and_listing_requests_resolve_to_nothing() {
        assert!(resolve_asset(Some("../Cargo.toml".to_string())).is_none());
        assert!(resolve_asset(Some(String::new())).is_none());
        assert!(resolve_asset(Some("nested/".to_string())).is_none());
    }
}
