mod data;

use time::{Date, format_description::FormatItem, macros::format_description};

pub use data::POSTS;

pub const HUMAN_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[month repr:long] [day padding:none], [year]");
pub const ISO_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

#[derive(Clone)]
pub enum PostBlock {
    Paragraph(&'static str),
    Code {
        language: &'static str,
        code: &'static str,
    },
    List(&'static [&'static str]),
}

#[derive(Clone)]
pub struct PostSection {
    pub id: &'static str,
    pub title: &'static str,
    pub blocks: &'static [PostBlock],
}

/// One record of the compiled-in content index. Produced by the authoring
/// pipeline before the server starts; immutable at request time.
#[derive(Clone)]
pub struct Post {
    pub slug: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub published: bool,
    pub date: Date,
    pub author: &'static str,
    pub url: Option<&'static str>,
    pub repository: Option<&'static str>,
    pub sections: &'static [PostSection],
}

pub fn all() -> &'static [Post] {
    &POSTS
}

/// Resolve a post by exact, case-sensitive slug match.
///
/// Deliberately does not re-check the `published` flag: public listings are
/// already filtered, and the index owns which drafts exist at all.
pub fn find_by_slug(slug: &str) -> Option<&'static Post> {
    POSTS.iter().find(|post| post.slug == slug)
}

/// Published records, newest first. The only set reachable from listings.
pub fn published() -> Vec<&'static Post> {
    let mut posts: Vec<&Post> = POSTS.iter().filter(|post| post.published).collect();
    posts.sort_by(|a, b| b.date.cmp(&a.date));
    posts
}

pub fn format_human_date(date: Date) -> String {
    date.format(HUMAN_DATE_FORMAT).expect("valid calendar date")
}

pub fn format_iso_date(date: Date) -> String {
    date.format(ISO_DATE_FORMAT).expect("valid calendar date")
}

pub fn post_has_code_blocks(post: &Post) -> bool {
    post.sections.iter().any(|section| {
        section
            .blocks
            .iter()
            .any(|block| matches!(block, PostBlock::Code { .. }))
    })
}
