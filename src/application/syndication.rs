//! Syndication and crawl surface: RSS feed, sitemap.xml, robots.txt.
//!
//! All three are generated from the published set of the compiled-in index,
//! so they are pure functions of configuration and never fail at request time.

use time::{Date, format_description::well_known::Rfc2822};

use crate::config::SiteSettings;
use crate::domain::posts;

#[derive(Clone)]
pub struct SyndicationService {
    base_url: String,
    title: String,
    description: String,
}

impl SyndicationService {
    pub fn new(site: &SiteSettings) -> Self {
        Self {
            base_url: normalize_public_site_url(&site.public_url),
            title: site.title.clone(),
            description: site.description.clone(),
        }
    }

    fn absolute(&self, path: &str) -> String {
        let trimmed = path.trim_start_matches('/');
        if trimmed.is_empty() {
            self.base_url.clone()
        } else {
            format!("{}{trimmed}", self.base_url)
        }
    }

    /// RSS 2.0 feed over the published posts, newest first.
    pub fn rss_feed(&self) -> String {
        let mut xml = String::from(concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
            "<rss version=\"2.0\">\n<channel>\n",
        ));
        xml.push_str(&format!("<title>{}</title>\n", xml_escape(&self.title)));
        xml.push_str(&format!("<link>{}</link>\n", xml_escape(&self.base_url)));
        xml.push_str(&format!(
            "<description>{}</description>\n",
            xml_escape(&self.description)
        ));

        for post in posts::published() {
            let link = self.absolute(&format!("posts/{}", post.slug));
            xml.push_str("<item>\n");
            xml.push_str(&format!("<title>{}</title>\n", xml_escape(post.title)));
            xml.push_str(&format!("<link>{}</link>\n", xml_escape(&link)));
            xml.push_str(&format!(
                "<guid isPermaLink=\"true\">{}</guid>\n",
                xml_escape(&link)
            ));
            xml.push_str(&format!(
                "<pubDate>{}</pubDate>\n",
                rfc2822_midnight(post.date)
            ));
            xml.push_str(&format!(
                "<description>{}</description>\n",
                xml_escape(post.description)
            ));
            xml.push_str("</item>\n");
        }

        xml.push_str("</channel>\n</rss>\n");
        xml
    }

    /// sitemap.xml covering the landing page and every published post.
    pub fn sitemap_xml(&self) -> String {
        let mut xml = String::from(concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
            "<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
        ));
        xml.push_str(&format!("<url><loc>{}</loc></url>\n", xml_escape(&self.base_url)));

        for post in posts::published() {
            let link = self.absolute(&format!("posts/{}", post.slug));
            xml.push_str(&format!(
                "<url><loc>{}</loc><lastmod>{}</lastmod></url>\n",
                xml_escape(&link),
                posts::format_iso_date(post.date)
            ));
        }

        xml.push_str("</urlset>\n");
        xml
    }

    pub fn robots_txt(&self) -> String {
        format!(
            "User-agent: *\nAllow: /\nSitemap: {}\n",
            self.absolute("sitemap.xml")
        )
    }
}

fn normalize_public_site_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    format!("{trimmed}/")
}

fn rfc2822_midnight(date: Date) -> String {
    date.midnight()
        .assume_utc()
        .format(&Rfc2822)
        .expect("valid publication date")
}

fn xml_escape(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> SyndicationService {
        SyndicationService::new(&SiteSettings {
            public_url: "https://example.dev".to_string(),
            title: "Example".to_string(),
            description: "An example site".to_string(),
            author: "Example Author".to_string(),
        })
    }

    #[test]
    fn feed_links_are_absolute_and_exclude_drafts() {
        let feed = service().rss_feed();
        assert!(feed.contains("<link>https://example.dev/posts/contract-creation</link>"));
        assert!(!feed.contains("counting-views-honestly"));
    }

    #[test]
    fn sitemap_covers_landing_page_and_published_posts() {
        let sitemap = service().sitemap_xml();
        assert!(sitemap.contains("<loc>https://example.dev/</loc>"));
        assert!(sitemap.contains("https://example.dev/posts/zero-copy-frames"));
        assert!(sitemap.contains("<lastmod>2022-11-28</lastmod>"));
    }

    #[test]
    fn robots_points_at_the_sitemap() {
        let robots = service().robots_txt();
        assert!(robots.starts_with("User-agent: *\n"));
        assert!(robots.contains("Sitemap: https://example.dev/sitemap.xml"));
    }
}
