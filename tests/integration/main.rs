//! Integration tests for Archive-Mirror
//!
//! These run the real reqwest-backed client against wiremock servers.

mod crawl_tests;
