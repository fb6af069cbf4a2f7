//! Event listing extractors
//!
//! The index page lists events as `a.event-item-link` cards carrying the
//! title, banner and category; each card links to a detail page.

use crate::crawler::target::DEFAULT_CATEGORY;
use crate::crawler::CrawlTarget;
use crate::extract::{
    element_text, first_attr, first_text, selector, DetailParser, ExtractedFields, FieldError,
    IndexParser,
};
use crate::url::{clean_image_url, resolve_link};
use crate::ExtractError;
use scraper::Html;
use serde_json::{Map, Value};
use url::Url;

/// Reads event cards from a listing page
#[derive(Debug, Clone, Default)]
pub struct EventIndexParser;

impl IndexParser for EventIndexParser {
    fn parse_index(&self, html: &str, base: &Url) -> Result<Vec<CrawlTarget>, ExtractError> {
        let document = Html::parse_document(html);
        let card_selector = selector("a.event-item-link")?;
        let title_selector = selector("div.event-text h2")?;
        let image_selector = selector(".event-img-wrapper img")?;
        let category_selector = selector(".event-item-wrapper > p")?;

        let mut targets: Vec<CrawlTarget> = Vec::new();

        for card in document.select(&card_selector) {
            let Some(url) = card
                .value()
                .attr("href")
                .and_then(|href| resolve_link(href, base))
            else {
                continue;
            };
            let Some(title) = first_text(card, &title_selector) else {
                tracing::debug!("Skipping untitled event card {}", url);
                continue;
            };
            if targets.iter().any(|t| t.url == url) {
                continue;
            }

            let category =
                first_text(card, &category_selector).unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
            let banner = first_attr(card, &image_selector, "src")
                .and_then(|src| clean_image_url(&src, base))
                .map(String::from);

            targets.push(
                CrawlTarget::new(url, title, category)
                    .with_field("banner_url", banner.map_or(Value::Null, Value::String)),
            );
        }

        tracing::debug!("Found {} event links on {}", targets.len(), base);
        Ok(targets)
    }
}

/// Reads the fields of an event detail page
#[derive(Debug, Clone, Default)]
pub struct EventDetailParser;

impl DetailParser for EventDetailParser {
    fn parse_detail(&self, html: &str, url: &Url) -> Result<ExtractedFields, ExtractError> {
        if html.trim().is_empty() {
            return Err(ExtractError::Empty(url.to_string()));
        }

        let document = Html::parse_document(html);
        let root = document.root_element();
        let mut fields = ExtractedFields::new();
        fields.insert("url", url.as_str());

        let heading = selector("h1")?;
        fields.record("title", first_text(root, &heading).ok_or(FieldError::Missing));

        let og_image = selector("meta[property='og:image'], meta[name='og:image']")?;
        let inline_image = selector(".entry-content img, .event-header img, .event-banner img")?;
        let banner = match first_attr(root, &og_image, "content")
            .or_else(|| first_attr(root, &inline_image, "src"))
        {
            Some(src) => clean_image_url(&src, url)
                .map(String::from)
                .ok_or_else(|| FieldError::Malformed(format!("unusable image '{}'", src))),
            None => Err(FieldError::Missing),
        };
        fields.record("banner_url", banner);

        let time = selector("time")?;
        let date_text = selector(".event-date, .date, .meta-date")?;
        let start = root
            .select(&time)
            .next()
            .map(|element| {
                element
                    .value()
                    .attr("datetime")
                    .map(str::to_string)
                    .unwrap_or_else(|| element_text(element))
            })
            .filter(|value| !value.is_empty())
            .or_else(|| first_text(root, &date_text));
        fields.record("start_time", start.ok_or(FieldError::Missing));

        let paragraph = selector(".entry-content p, .article-content p, p")?;
        fields.record(
            "description",
            first_text(root, &paragraph).ok_or(FieldError::Missing),
        );

        let category_links = selector(".category a, .tag a, a.tag")?;
        let categories: Vec<String> = root
            .select(&category_links)
            .map(element_text)
            .filter(|text| !text.is_empty())
            .collect();
        if !categories.is_empty() {
            fields.insert("categories", categories);
        }

        let detail_rows = selector(".event-details li, .event-meta li, .meta li")?;
        let mut details = Map::new();
        for row in root.select(&detail_rows) {
            let text = element_text(row);
            if let Some((key, value)) = text.split_once(':') {
                details.insert(key.trim().to_string(), Value::String(value.trim().to_string()));
            }
        }
        if !details.is_empty() {
            fields.insert("details", Value::Object(details));
        }

        let gallery = selector(".entry-content img")?;
        let images: Vec<String> = root
            .select(&gallery)
            .filter_map(|img| img.value().attr("src"))
            .filter_map(|src| clean_image_url(src, url))
            .map(String::from)
            .collect();
        if !images.is_empty() {
            fields.insert("images", images);
        }

        fields.log_problems(url.as_str());
        Ok(fields)
    }
}
