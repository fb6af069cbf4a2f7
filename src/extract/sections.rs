//! Table-of-contents driven section extraction
//!
//! Long pages announce their sections in a table of contents. Each section
//! id is mapped onto a [`SectionKind`], and every kind has exactly one
//! extractor. Ids that map to no kind are ignored.

use crate::extract::{element_text, first_attr, first_text, selector, ExtractedFields, FieldError};
use crate::url::clean_image_url;
use crate::ExtractError;
use scraper::{ElementRef, Html};
use serde_json::{Map, Value};
use url::Url;

/// The closed set of sections an extractor exists for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Header,
    Schedule,
    Body,
    Details,
    Tags,
}

impl SectionKind {
    pub const ALL: [SectionKind; 5] = [
        SectionKind::Header,
        SectionKind::Schedule,
        SectionKind::Body,
        SectionKind::Details,
        SectionKind::Tags,
    ];

    /// Key under which the section's record is stored
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Header => "header",
            SectionKind::Schedule => "schedule",
            SectionKind::Body => "body",
            SectionKind::Details => "details",
            SectionKind::Tags => "tags",
        }
    }

    /// Maps a section id (as found in a table of contents) to its kind
    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim().trim_start_matches('#').to_ascii_lowercase().replace('_', "-");

        match id.as_str() {
            "header" | "overview" | "summary" => Some(SectionKind::Header),
            "schedule" | "date-and-time" | "dates" | "when" | "event-schedule" => {
                Some(SectionKind::Schedule)
            }
            "description" | "about" | "body" | "content" => Some(SectionKind::Body),
            "details" | "event-details" | "bonuses" | "info" | "additional" => {
                Some(SectionKind::Details)
            }
            "tags" | "categories" => Some(SectionKind::Tags),
            _ => None,
        }
    }

    /// Returns the extractor for this kind
    pub fn extractor(&self) -> &'static dyn SectionExtractor {
        match self {
            SectionKind::Header => &HeaderSection,
            SectionKind::Schedule => &ScheduleSection,
            SectionKind::Body => &BodySection,
            SectionKind::Details => &DetailsSection,
            SectionKind::Tags => &TagsSection,
        }
    }
}

/// Turns one document fragment into a (partial) record
pub trait SectionExtractor: Send + Sync {
    fn extract(&self, section: ElementRef<'_>, base: &Url) -> Result<ExtractedFields, ExtractError>;
}

/// Returns the section ids listed in the document's table of contents
///
/// Falls back to the ids of headings and sections when there is no table
/// of contents. Order is document order, duplicates removed.
pub fn table_of_contents(document: &Html) -> Result<Vec<String>, ExtractError> {
    let toc_links = selector(".toc a[href^='#'], #toc a[href^='#'], nav.toc a[href^='#']")?;
    let mut ids: Vec<String> = Vec::new();

    for link in document.select(&toc_links) {
        if let Some(id) = link.value().attr("href").map(|h| h.trim_start_matches('#')) {
            if !id.is_empty() && !ids.iter().any(|known| known == id) {
                ids.push(id.to_string());
            }
        }
    }

    if ids.is_empty() {
        let anchors = selector("h2[id], h3[id], section[id]")?;
        for element in document.select(&anchors) {
            if let Some(id) = element.value().attr("id") {
                if !id.is_empty() && !ids.iter().any(|known| known == id) {
                    ids.push(id.to_string());
                }
            }
        }
    }

    Ok(ids)
}

/// Cuts the section with `id` out of the document
///
/// If the anchor sits inside an `<article>` the whole article is the
/// section; otherwise the anchor plus its following siblings up to the next
/// `h2`/`h3` heading.
pub fn section_fragment(document: &Html, id: &str) -> Result<Option<Html>, ExtractError> {
    let with_id = selector("[id]")?;
    let Some(anchor) = document
        .select(&with_id)
        .find(|element| element.value().attr("id") == Some(id))
    else {
        return Ok(None);
    };

    let article = anchor
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|element| element.value().name() == "article");
    if let Some(article) = article {
        return Ok(Some(Html::parse_fragment(&article.html())));
    }

    let mut parts = vec![anchor.html()];
    for sibling in anchor.next_siblings().filter_map(ElementRef::wrap) {
        if matches!(sibling.value().name(), "h2" | "h3") {
            break;
        }
        parts.push(sibling.html());
    }

    Ok(Some(Html::parse_fragment(&parts.join("\n"))))
}

/// Title and banner image
pub struct HeaderSection;

impl SectionExtractor for HeaderSection {
    fn extract(&self, section: ElementRef<'_>, base: &Url) -> Result<ExtractedFields, ExtractError> {
        let heading = selector("h1, h2, h3")?;
        let image = selector("img")?;
        let mut fields = ExtractedFields::new();

        fields.record("title", first_text(section, &heading).ok_or(FieldError::Missing));

        let banner = match first_attr(section, &image, "src") {
            Some(src) => clean_image_url(&src, base)
                .map(String::from)
                .ok_or_else(|| FieldError::Malformed(format!("unusable image '{}'", src))),
            None => Err(FieldError::Missing),
        };
        fields.record("banner_url", banner);

        Ok(fields)
    }
}

/// Start and end times
pub struct ScheduleSection;

impl SectionExtractor for ScheduleSection {
    fn extract(&self, section: ElementRef<'_>, _base: &Url) -> Result<ExtractedFields, ExtractError> {
        let time = selector("time")?;
        let date_text = selector(".event-date, .date, .meta-date")?;
        let mut fields = ExtractedFields::new();

        let times: Vec<String> = section
            .select(&time)
            .map(|element| {
                element
                    .value()
                    .attr("datetime")
                    .map(str::to_string)
                    .unwrap_or_else(|| element_text(element))
            })
            .filter(|value| !value.is_empty())
            .collect();

        let start = times
            .first()
            .cloned()
            .or_else(|| first_text(section, &date_text));
        fields.record("start_time", start.ok_or(FieldError::Missing));
        fields.record("end_time", times.get(1).cloned().ok_or(FieldError::Missing));

        let text = element_text(section).to_ascii_lowercase();
        fields.insert("is_local_time", text.contains("local time"));

        Ok(fields)
    }
}

/// Paragraph text
pub struct BodySection;

impl SectionExtractor for BodySection {
    fn extract(&self, section: ElementRef<'_>, _base: &Url) -> Result<ExtractedFields, ExtractError> {
        let paragraph = selector("p")?;
        let mut fields = ExtractedFields::new();

        let paragraphs: Vec<String> = section
            .select(&paragraph)
            .map(element_text)
            .filter(|text| !text.is_empty())
            .collect();

        let description = if paragraphs.is_empty() {
            Err(FieldError::Missing)
        } else {
            Ok(paragraphs.join("\n\n"))
        };
        fields.record("description", description);

        Ok(fields)
    }
}

/// `Key: value` list items and two-column table rows
pub struct DetailsSection;

impl SectionExtractor for DetailsSection {
    fn extract(&self, section: ElementRef<'_>, _base: &Url) -> Result<ExtractedFields, ExtractError> {
        let items = selector("li")?;
        let rows = selector("tr")?;
        let header_cell = selector("th")?;
        let data_cell = selector("td")?;
        let mut details = Map::new();

        for item in section.select(&items) {
            let text = element_text(item);
            if let Some((key, value)) = text.split_once(':') {
                let (key, value) = (key.trim(), value.trim());
                if !key.is_empty() {
                    details.insert(key.to_string(), Value::String(value.to_string()));
                }
            }
        }

        for row in section.select(&rows) {
            let key = first_text(row, &header_cell);
            let value = row.select(&data_cell).next().map(element_text);
            if let (Some(key), Some(value)) = (key, value) {
                details.insert(key, Value::String(value));
            }
        }

        let mut fields = ExtractedFields::new();
        let outcome = if details.is_empty() {
            Err(FieldError::Missing)
        } else {
            Ok(Value::Object(details))
        };
        fields.record("details", outcome);

        Ok(fields)
    }
}

/// Link texts of category and tag lists
pub struct TagsSection;

impl SectionExtractor for TagsSection {
    fn extract(&self, section: ElementRef<'_>, _base: &Url) -> Result<ExtractedFields, ExtractError> {
        let links = selector("a")?;
        let mut tags: Vec<String> = Vec::new();

        for text in section.select(&links).map(element_text) {
            if !text.is_empty() && !tags.contains(&text) {
                tags.push(text);
            }
        }

        let mut fields = ExtractedFields::new();
        let outcome = if tags.is_empty() {
            Err(FieldError::Missing)
        } else {
            Ok(tags)
        };
        fields.record("tags", outcome);

        Ok(fields)
    }
}
