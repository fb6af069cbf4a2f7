//! Previously published results
//!
//! Known results let a crawl skip targets that were already harvested and
//! are merged back into the final output. They are optional: when the source
//! cannot be fetched or decoded the crawl runs against an empty set.

use crate::crawler::results::{GroupedResults, Record};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Category-grouped records from an earlier run
pub type KnownResults = GroupedResults;

/// Decodes known results from either published shape
///
/// Accepts the grouped form `{"<category>": [record, ...]}` as well as the
/// flattened form `{"results": [{"category": ..., ...}, ...]}`.
pub fn known_results_from_value(value: Value) -> Option<KnownResults> {
    if let Some(Value::Array(results)) = value.get("results") {
        let mut known = KnownResults::new();
        for entry in results {
            if let Value::Object(record) = entry {
                known.push(record.clone());
            }
        }
        return Some(known);
    }

    let Value::Object(groups) = value else {
        return None;
    };

    let mut known = KnownResults::new();
    for (category, records) in groups {
        let Value::Array(records) = records else {
            continue;
        };
        for entry in records {
            if let Value::Object(record) = entry {
                let mut record: Record = record;
                record
                    .entry("category".to_string())
                    .or_insert_with(|| Value::String(category.clone()));
                known.push(record);
            }
        }
    }
    Some(known)
}

/// Fetches known results from a JSON URL
///
/// Never fails: any problem is logged and an empty set is returned.
pub async fn fetch_known_results(client: &Client, url: &str, timeout: Duration) -> KnownResults {
    let response = match client.get(url).timeout(timeout).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Could not fetch known results from {}: {}", url, e);
            return KnownResults::new();
        }
    };

    if !response.status().is_success() {
        tracing::warn!(
            "Known results source {} returned HTTP {}",
            url,
            response.status().as_u16()
        );
        return KnownResults::new();
    }

    let value = match response.json::<Value>().await {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Known results from {} are not JSON: {}", url, e);
            return KnownResults::new();
        }
    };

    match known_results_from_value(value) {
        Some(known) => {
            tracing::info!(
                "Loaded {} known results from {}",
                known.total_records(),
                url
            );
            known
        }
        None => {
            tracing::warn!("Known results from {} have an unexpected shape", url);
            KnownResults::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_grouped_shape() {
        let known = known_results_from_value(json!({
            "Raid Battles": [{"article_url": "https://example.com/a/", "title": "A"}],
            "Event": [{"article_url": "https://example.com/b/"}]
        }))
        .unwrap();

        assert_eq!(known.total_records(), 2);
        assert_eq!(
            known.get("Raid Battles").unwrap()[0]["category"],
            "Raid Battles"
        );
        assert!(known.urls().contains("https://example.com/b/"));
    }

    #[test]
    fn test_flat_shape() {
        let known = known_results_from_value(json!({
            "results": [
                {"category": "Raid", "url": "https://example.com/a/"},
                {"category": "Raid", "url": "https://example.com/b/"},
                "ignored"
            ]
        }))
        .unwrap();

        assert_eq!(known.get("Raid").unwrap().len(), 2);
    }

    #[test]
    fn test_unexpected_shape() {
        assert!(known_results_from_value(json!([1, 2, 3])).is_none());
    }
}
