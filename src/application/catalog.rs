//! Read-side catalog over the compiled-in content index.
//!
//! Turns static post records into view models. Resolution by slug is exact
//! and case-sensitive; a miss is signalled as `None` and the HTTP layer owns
//! turning that into a not-found page.

use crate::domain::posts::{self, Post, PostBlock, PostSection};
use crate::presentation::views::{PostCard, PostDetailContext, SectionView};

#[derive(Clone, Default)]
pub struct CatalogService;

impl CatalogService {
    pub fn new() -> Self {
        Self
    }

    /// Cards for the public listing: published posts only, newest first.
    pub fn post_cards(&self) -> Vec<PostCard> {
        posts::published().into_iter().map(post_to_card).collect()
    }

    /// Full view model for one post, or `None` when the slug does not
    /// resolve. Drafts resolve here; only listings filter on the flag.
    pub fn post_detail(&self, slug: &str) -> Option<PostDetailContext> {
        posts::find_by_slug(slug).map(build_post_context)
    }

    /// Existence check without building the view model.
    pub fn resolves(&self, slug: &str) -> bool {
        posts::find_by_slug(slug).is_some()
    }
}

fn post_to_card(post: &'static Post) -> PostCard {
    PostCard {
        slug: post.slug.to_string(),
        title: post.title.to_string(),
        description: post.description.to_string(),
        published: posts::format_human_date(post.date),
        iso_date: posts::format_iso_date(post.date),
    }
}

fn build_post_context(post: &'static Post) -> PostDetailContext {
    PostDetailContext {
        slug: post.slug.to_string(),
        title: post.title.to_string(),
        description: post.description.to_string(),
        author: post.author.to_string(),
        published: posts::format_human_date(post.date),
        iso_date: posts::format_iso_date(post.date),
        url: post.url.map(str::to_string),
        repository: post.repository.map(str::to_string),
        sections: post.sections.iter().map(section_view).collect(),
        has_code_blocks: posts::post_has_code_blocks(post),
        views: 0,
    }
}

fn section_view(section: &PostSection) -> SectionView {
    SectionView {
        anchor: section.id.to_string(),
        title: section.title.to_string(),
        body_html: render_blocks(section.blocks),
    }
}

fn render_blocks(blocks: &[PostBlock]) -> String {
    let mut html = String::new();
    for block in blocks {
        match block {
            PostBlock::Paragraph(text) => {
                html.push_str("<p>");
                html.push_str(&escape_html(text));
                html.push_str("</p>\n");
            }
            PostBlock::Code { language, code } => {
                html.push_str("<pre><code class=\"language-");
                html.push_str(&escape_html(language));
                html.push_str("\">");
                html.push_str(&escape_html(code));
                html.push_str("</code></pre>\n");
            }
            PostBlock::List(items) => {
                html.push_str("<ul>\n");
                for item in *items {
                    html.push_str("<li>");
                    html.push_str(&escape_html(item));
                    html.push_str("</li>\n");
                }
                html.push_str("</ul>\n");
            }
        }
    }
    html
}

fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
