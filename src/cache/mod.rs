//! Cache module for previously fetched content
//!
//! This module provides the on-disk cache consulted before any network or
//! browser work, and the refresh tiers that decide how long entries stay fresh.

mod store;
mod tier;

pub use store::{metadata_path, CacheEntry, CacheMetadata, CacheStore};
pub use tier::RefreshTier;
