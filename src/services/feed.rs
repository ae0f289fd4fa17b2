//! Latest publications from the UN iLibrary RSS feed.

use chrono::DateTime;
use quick_xml::events::Event;
use quick_xml::Reader;
use scraper::{Html, Selector};
use std::sync::Arc;

use crate::{
    config::FeedConfig,
    error::{AppError, AppResult},
    models::FeedItem,
    services::fetcher::HttpClient,
};

const COVER_SELECTOR: &str = "img.cover";
const PDF_FORM_SELECTOR: &str = "form.ft-download-content__form--pdf";

pub struct FeedHarvester {
    client: Arc<dyn HttpClient>,
    config: FeedConfig,
}

impl FeedHarvester {
    pub fn new(client: Arc<dyn HttpClient>, config: FeedConfig) -> Self {
        Self { client, config }
    }

    /// Fetch the feed and, when `scrape` is set, enrich each item from its landing page
    pub async fn harvest(&self, url: Option<&str>, scrape: bool) -> AppResult<Vec<FeedItem>> {
        let url = url.unwrap_or(&self.config.url);
        tracing::info!("Fetching RSS feed");
        tracing::debug!("Feed URL: {}", url);

        let body = self.client.get(url).await?.into_body()?;
        let mut items = parse_feed(&body)?;
        tracing::info!("Feed has {} items", items.len());

        if scrape {
            for (idx, item) in items.iter_mut().enumerate() {
                tracing::debug!("Scraping item {}/{}", idx + 1, item.link);
                self.enrich(item).await;
            }
        }
        Ok(items)
    }

    async fn enrich(&self, item: &mut FeedItem) {
        if item.link.is_empty() {
            return;
        }
        match self.client.get(&item.link).await {
            Ok(response) if response.status == 200 => {
                let (cover, pdf) = scrape_landing_page(&response.body, &self.config.site_root);
                item.cover_image = cover;
                item.pdf_link = pdf;
            }
            Ok(response) => {
                tracing::debug!("Landing page {} answered {}", item.link, response.status);
            }
            Err(e) => {
                tracing::warn!("Failed to fetch landing page {}: {}", item.link, e);
            }
        }
    }
}

#[derive(Clone, Copy)]
enum ItemField {
    Title,
    Published,
    Id,
    Summary,
    Link,
}

/// Parse the `<item>` elements of an RSS 2.0 document
pub fn parse_feed(xml: &str) -> AppResult<Vec<FeedItem>> {
    let mut reader = Reader::from_str(xml);
    let mut items = Vec::new();
    let mut item: Option<FeedItem> = None;
    let mut field: Option<ItemField> = None;
    let mut depth = 0usize;
    let mut saw_rss = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                depth += 1;
                match e.local_name().as_ref() {
                    b"rss" | b"RDF" => saw_rss = true,
                    b"item" => item = Some(FeedItem::default()),
                    name if item.is_some() => {
                        field = match name {
                            b"title" => Some(ItemField::Title),
                            b"pubDate" | b"date" => Some(ItemField::Published),
                            b"guid" => Some(ItemField::Id),
                            b"description" => Some(ItemField::Summary),
                            b"link" => Some(ItemField::Link),
                            _ => None,
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(t) => {
                if let (Some(f), Some(it)) = (field, item.as_mut()) {
                    push_text(it, f, &t.unescape()?);
                }
            }
            Event::CData(c) => {
                if let (Some(f), Some(it)) = (field, item.as_mut()) {
                    push_text(it, f, &String::from_utf8_lossy(&c));
                }
            }
            Event::End(e) => {
                depth = depth.saturating_sub(1);
                if e.local_name().as_ref() == b"item" {
                    if let Some(mut it) = item.take() {
                        it.published = normalize_date(&it.published);
                        if it.id.is_empty() {
                            it.id = it.link.clone();
                        }
                        items.push(it);
                    }
                }
                field = None;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_rss {
        return Err(AppError::parse("document is not an RSS feed"));
    }
    if depth != 0 {
        return Err(AppError::parse("unexpected end of feed"));
    }
    Ok(items)
}

fn push_text(item: &mut FeedItem, field: ItemField, text: &str) {
    let target = match field {
        ItemField::Title => &mut item.title,
        ItemField::Published => &mut item.published,
        ItemField::Id => &mut item.id,
        ItemField::Summary => &mut item.summary,
        ItemField::Link => &mut item.link,
    };
    target.push_str(text.trim());
}

/// RFC 2822 feed dates become RFC 3339; anything else is kept verbatim
fn normalize_date(raw: &str) -> String {
    DateTime::parse_from_rfc2822(raw)
        .map(|d| d.to_rfc3339())
        .unwrap_or_else(|_| raw.to_string())
}

/// Cover image and PDF download link of a publication landing page
pub fn scrape_landing_page(html: &str, site_root: &str) -> (Option<String>, Option<String>) {
    let document = Html::parse_document(html);

    let cover = select_attr(&document, COVER_SELECTOR, "src").map(|src| absolutize(&src, site_root));
    let pdf = select_attr(&document, PDF_FORM_SELECTOR, "action")
        .map(|action| absolutize(&action, site_root));

    (cover, pdf)
}

fn select_attr(document: &Html, css: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    document
        .select(&selector)
        .find_map(|el| el.value().attr(attr))
        .map(String::from)
}

fn absolutize(link: &str, site_root: &str) -> String {
    if link.starts_with('/') {
        format!("{}{}", site_root.trim_end_matches('/'), link)
    } else {
        link.to_string()
    }
}
