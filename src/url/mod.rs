//! URL handling module for Page-Harvest
//!
//! This module derives file-system-safe names from target URLs (cache keys and
//! snapshot slugs) and resolves links and image references found in scraped
//! documents.

mod image;
mod resolve;
mod slug;

pub use image::clean_image_url;
pub use resolve::resolve_link;
pub use slug::{cache_key, slug_from_url, snapshot_name};
