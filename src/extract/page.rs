//! Generic single-page extraction
//!
//! Reads the document-level metadata every page has (title, description,
//! preview image, canonical link), then walks the table of contents and
//! runs the extractor of every section kind it recognizes.

use crate::extract::{
    first_attr, first_text, section_fragment, selector, table_of_contents, DetailParser,
    ExtractedFields, FieldError, SectionKind,
};
use crate::url::{clean_image_url, resolve_link};
use crate::ExtractError;
use scraper::Html;
use std::collections::HashSet;
use url::Url;

#[derive(Debug, Clone, Default)]
pub struct PageMetadataParser;

impl DetailParser for PageMetadataParser {
    fn parse_detail(&self, html: &str, url: &Url) -> Result<ExtractedFields, ExtractError> {
        if html.trim().is_empty() {
            return Err(ExtractError::Empty(url.to_string()));
        }

        let document = Html::parse_document(html);
        let root = document.root_element();
        let mut fields = ExtractedFields::new();
        fields.insert("url", url.as_str());

        let title = selector("title")?;
        let heading = selector("h1")?;
        fields.record(
            "title",
            first_text(root, &title)
                .or_else(|| first_text(root, &heading))
                .ok_or(FieldError::Missing),
        );

        let description =
            selector("meta[name='description'], meta[property='og:description']")?;
        fields.record(
            "description",
            first_attr(root, &description, "content").ok_or(FieldError::Missing),
        );

        let og_image = selector("meta[property='og:image'], meta[name='og:image']")?;
        let image = match first_attr(root, &og_image, "content") {
            Some(src) => clean_image_url(&src, url)
                .map(String::from)
                .ok_or_else(|| FieldError::Malformed(format!("unusable image '{}'", src))),
            None => Err(FieldError::Missing),
        };
        fields.record("image_url", image);

        let canonical = selector("link[rel='canonical']")?;
        if let Some(href) = first_attr(root, &canonical, "href") {
            let resolved = resolve_link(&href, url)
                .map(String::from)
                .ok_or_else(|| FieldError::Malformed(format!("unusable link '{}'", href)));
            fields.record("canonical_url", resolved);
        }

        let mut seen: HashSet<SectionKind> = HashSet::new();
        for id in table_of_contents(&document)? {
            let Some(kind) = SectionKind::from_id(&id) else {
                tracing::trace!("No extractor for section '{}'", id);
                continue;
            };
            if !seen.insert(kind) {
                continue;
            }
            let Some(fragment) = section_fragment(&document, &id)? else {
                continue;
            };

            let section = kind.extractor().extract(fragment.root_element(), url)?;
            fields.nest(kind.as_str(), section);
        }

        fields.log_problems(url.as_str());
        Ok(fields)
    }
}
