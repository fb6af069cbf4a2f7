//! Collected records, their merge rules and category grouping

use crate::crawler::target::{CrawlTarget, DEFAULT_CATEGORY};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, HashSet};

/// A structured record: field name to JSON value
pub type Record = serde_json::Map<String, Value>;

/// Returns the identity URL of a record
///
/// Older published data keys the URL as `article_url`.
pub fn record_url(record: &Record) -> Option<&str> {
    record
        .get("url")
        .or_else(|| record.get("article_url"))
        .and_then(Value::as_str)
}

fn record_category(record: &Record) -> String {
    record
        .get("category")
        .and_then(Value::as_str)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_CATEGORY)
        .to_string()
}

/// Copies every field of `fresh` over `existing`; other fields survive
fn overlay(existing: &mut Record, fresh: &Record) {
    for (key, value) in fresh {
        existing.insert(key.clone(), value.clone());
    }
}

/// Records of one crawl keyed by target URL, in discovery order
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    order: Vec<String>,
    records: HashMap<String, Record>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds one entry per target with its index-derived fields
    pub fn from_targets(targets: &[CrawlTarget]) -> Self {
        let mut set = Self::new();
        for target in targets {
            set.insert(target.url.as_str(), target.to_record());
        }
        set
    }

    /// Inserts or replaces the record for `url`
    pub fn insert(&mut self, url: &str, record: Record) {
        if self.records.insert(url.to_string(), record).is_none() {
            self.order.push(url.to_string());
        }
    }

    /// Overlays `fields` onto the entry for `url`
    ///
    /// Returns false when no entry exists for the URL.
    pub fn merge_fields(&mut self, url: &str, fields: &Record) -> bool {
        match self.records.get_mut(url) {
            Some(existing) => {
                overlay(existing, fields);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, url: &str) -> Option<&Record> {
        self.records.get(url)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterates records in discovery order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Record)> {
        self.order
            .iter()
            .filter_map(|url| self.records.get(url).map(|r| (url.as_str(), r)))
    }

    /// Groups records by their `category` field, keeping discovery order
    pub fn group_by_category(&self) -> GroupedResults {
        let mut grouped = GroupedResults::default();
        for (_, record) in self.iter() {
            grouped.push(record.clone());
        }
        grouped
    }
}

/// Records grouped by category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupedResults(BTreeMap<String, Vec<Record>>);

impl GroupedResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record to the group named by its category
    pub fn push(&mut self, record: Record) {
        self.0
            .entry(record_category(&record))
            .or_default()
            .push(record);
    }

    pub fn get(&self, category: &str) -> Option<&[Record]> {
        self.0.get(category).map(Vec::as_slice)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn total_records(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_records() == 0
    }

    /// Every identity URL across all groups
    pub fn urls(&self) -> HashSet<String> {
        self.0
            .values()
            .flatten()
            .filter_map(record_url)
            .map(str::to_string)
            .collect()
    }

    /// Finds the record for `url` as `(category, index)`
    fn position(&self, url: &str) -> Option<(String, usize)> {
        self.0.iter().find_map(|(category, records)| {
            records
                .iter()
                .position(|r| record_url(r) == Some(url))
                .map(|idx| (category.clone(), idx))
        })
    }

    /// Combines previously known results with freshly crawled ones
    ///
    /// - A fresh record whose URL is unknown is appended to its category.
    /// - A fresh record whose URL is known overlays the known record: fresh
    ///   values win for shared keys, keys only the known record has survive.
    ///   If the category changed, the record moves to the new group.
    /// - Known records without a fresh counterpart are untouched.
    pub fn merged_with(&self, fresh: &GroupedResults) -> GroupedResults {
        let mut merged = self.clone();

        for record in fresh.0.values().flatten() {
            let existing = record_url(record).and_then(|url| merged.position(url));

            match existing {
                Some((category, idx)) => {
                    let target_category = record_category(record);
                    if category == target_category {
                        if let Some(known) =
                            merged.0.get_mut(&category).and_then(|r| r.get_mut(idx))
                        {
                            overlay(known, record);
                        }
                    } else if let Some(records) = merged.0.get_mut(&category) {
                        let mut known = records.remove(idx);
                        if records.is_empty() {
                            merged.0.remove(&category);
                        }
                        overlay(&mut known, record);
                        merged.push(known);
                    }
                }
                None => merged.push(record.clone()),
            }
        }

        merged
    }

    /// Flattens into `{"results": [...]}` with the category on each record
    pub fn to_flat(&self) -> Value {
        let results: Vec<Value> = self
            .0
            .iter()
            .flat_map(|(category, records)| {
                records.iter().map(move |record| {
                    let mut flat = record.clone();
                    flat.insert("category".to_string(), Value::String(category.clone()));
                    Value::Object(flat)
                })
            })
            .collect();

        json!({ "results": results })
    }
}
