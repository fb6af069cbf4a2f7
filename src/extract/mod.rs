//! Structured extraction from fetched documents
//!
//! This module turns markup into records:
//! - Index parsers enumerate crawl targets on a listing page
//! - Detail parsers read the fields of a single target page
//! - Section extractors handle one table-of-contents section each, selected
//!   through the closed [`SectionKind`] enumeration
//!
//! Every field is extracted on its own; a missing or malformed field is
//! recorded in [`ExtractedFields`] instead of failing the whole document.

mod events;
mod fields;
mod page;
mod sections;

pub use events::{EventDetailParser, EventIndexParser};
pub use fields::{ExtractedFields, FieldError};
pub use page::PageMetadataParser;
pub use sections::{section_fragment, table_of_contents, SectionExtractor, SectionKind};

use crate::crawler::CrawlTarget;
use crate::ExtractError;
use scraper::{ElementRef, Selector};
use url::Url;

/// Enumerates the targets listed on an index page, in document order
pub trait IndexParser: Send + Sync {
    fn parse_index(&self, html: &str, base: &Url) -> Result<Vec<CrawlTarget>, ExtractError>;
}

/// Reads the fields of one target page
pub trait DetailParser: Send + Sync {
    fn parse_detail(&self, html: &str, url: &Url) -> Result<ExtractedFields, ExtractError>;
}

/// Parses a CSS selector, naming it in the error
pub(crate) fn selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::Selector {
        selector: css.to_string(),
        message: e.to_string(),
    })
}

/// Returns the whitespace-collapsed text content of an element
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Returns the text of the first non-empty match under `scope`
pub(crate) fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .map(element_text)
        .find(|text| !text.is_empty())
}

/// Returns the first non-empty value of `attr` among matches under `scope`
pub(crate) fn first_attr(scope: ElementRef<'_>, selector: &Selector, attr: &str) -> Option<String> {
    scope
        .select(selector)
        .filter_map(|element| element.value().attr(attr))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}
