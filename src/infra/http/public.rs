use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header::CONTENT_TYPE},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;

use crate::{
    application::{
        catalog::CatalogService, syndication::SyndicationService, views::ViewCounterService,
    },
    presentation::views::{
        IndexTemplate, LayoutChrome, LayoutContext, PageContext, PageMetaView, PostDetailContext,
        PostTemplate, render_not_found_response, render_template_response,
    },
};

use super::middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct HttpState {
    pub catalog: Arc<CatalogService>,
    pub views: ViewCounterService,
    pub syndication: Arc<SyndicationService>,
    pub chrome: LayoutChrome,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/posts/{slug}", get(post_detail))
        .route(
            "/api/views/{slug}",
            get(api_view_count).post(api_record_view),
        )
        .route("/healthz", get(healthz))
        .route("/robots.txt", get(robots_txt))
        .route("/sitemap.xml", get(sitemap))
        .route("/rss.xml", get(rss_feed))
        .route("/static/{*path}", get(crate::infra::assets::serve_public))
        .fallback(fallback_not_found)
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

async fn index(State(state): State<HttpState>) -> Response {
    let posts = state.catalog.post_cards();
    let content = PageContext {
        post_count: posts.len(),
        posts,
    };

    let chrome = state.chrome.clone();
    let canonical = canonical_url(&chrome.meta.canonical, "/");
    let view = LayoutContext::new(chrome.with_canonical(canonical), content);
    render_template_response(IndexTemplate { view }, StatusCode::OK)
}

async fn post_detail(State(state): State<HttpState>, Path(slug): Path<String>) -> Response {
    let Some(mut content) = state.catalog.post_detail(&slug) else {
        return render_not_found_response(state.chrome.clone());
    };

    // The single store read on the render path; failures degrade to zero.
    content.views = state.views.view_count(&slug).await;

    let chrome = state.chrome.clone();
    let canonical = canonical_url(&chrome.meta.canonical, &format!("/posts/{slug}"));
    let meta = post_meta(&chrome, &content, canonical);
    let view = LayoutContext::new(chrome.with_meta(meta), content);
    render_template_response(PostTemplate { view }, StatusCode::OK)
}

/// Current view count for a resolvable slug, as consumed by the page.
async fn api_view_count(State(state): State<HttpState>, Path(slug): Path<String>) -> Response {
    if !state.catalog.resolves(&slug) {
        return unknown_slug_response();
    }

    let count = state.views.view_count(&slug).await;
    Json(json!({ "slug": slug, "count": count })).into_response()
}

/// Page-load beacon target. Dispatches a fire-and-forget increment and
/// acknowledges immediately; the response never waits on the store.
async fn api_record_view(State(state): State<HttpState>, Path(slug): Path<String>) -> Response {
    if !state.catalog.resolves(&slug) {
        return unknown_slug_response();
    }

    state.views.record_view(&slug);
    StatusCode::ACCEPTED.into_response()
}

fn unknown_slug_response() -> Response {
    let mut response =
        (StatusCode::NOT_FOUND, Json(json!({ "error": "unknown slug" }))).into_response();
    crate::application::error::ErrorReport::from_message(
        "infra::http::public::unknown_slug",
        StatusCode::NOT_FOUND,
        "Slug did not resolve against the content index",
    )
    .attach(&mut response);
    response
}

async fn healthz() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn robots_txt(State(state): State<HttpState>) -> Response {
    plain_response(state.syndication.robots_txt())
}

async fn sitemap(State(state): State<HttpState>) -> Response {
    xml_response(state.syndication.sitemap_xml(), "application/xml")
}

async fn rss_feed(State(state): State<HttpState>) -> Response {
    xml_response(state.syndication.rss_feed(), "application/rss+xml")
}

async fn fallback_not_found(State(state): State<HttpState>) -> Response {
    render_not_found_response(state.chrome.clone())
}

fn post_meta(chrome: &LayoutChrome, content: &PostDetailContext, canonical: String) -> PageMetaView {
    chrome
        .meta
        .clone()
        .with_canonical(canonical)
        .with_content(content.title.clone(), content.description.clone())
}

pub(crate) fn canonical_url(base: &str, path: &str) -> String {
    let root = normalize_public_site_url(base);
    let trimmed = path.trim_start_matches('/');
    if trimmed.is_empty() {
        root
    } else {
        format!("{root}{trimmed}")
    }
}

fn normalize_public_site_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    format!("{trimmed}/")
}

fn xml_response(body: String, content_type: &'static str) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

fn plain_response(body: String) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::from(body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_urls_join_without_duplicate_slashes() {
        assert_eq!(
            canonical_url("https://example.dev/", "/posts/x"),
            "https://example.dev/posts/x"
        );
        assert_eq!(canonical_url("https://example.dev", "/"), "https://example.dev/");
    }
}
