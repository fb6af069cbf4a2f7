//! Integration tests for Page-Harvest
//!
//! These tests use wiremock to serve pages over real HTTP and exercise the
//! fetch orchestrator, the crawl coordinator and the job runner end-to-end.

mod crawl_tests;
mod fetch_tests;
