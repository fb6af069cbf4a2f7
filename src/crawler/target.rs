use crate::crawler::Record;
use serde_json::Value;
use url::Url;

/// Category used when an index entry does not declare one
pub const DEFAULT_CATEGORY: &str = "Event";

/// A sub-page discovered on an index page
///
/// Identity is the URL; everything else is what the index page told us.
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlTarget {
    pub url: Url,
    pub title: String,
    pub category: String,
    /// Additional index-derived fields (banner, dates, ...)
    pub fields: Record,
}

impl CrawlTarget {
    pub fn new(url: Url, title: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            url,
            title: title.into(),
            category: category.into(),
            fields: Record::new(),
        }
    }

    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Flattens the target into the record that seeds its result entry
    pub fn to_record(&self) -> Record {
        let mut record = self.fields.clone();
        record.insert("url".to_string(), Value::String(self.url.to_string()));
        record.insert("title".to_string(), Value::String(self.title.clone()));
        record.insert(
            "category".to_string(),
            Value::String(self.category.clone()),
        );
        record
    }
}
