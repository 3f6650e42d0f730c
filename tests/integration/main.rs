//! End-to-end crawl tests against mock HTTP servers

mod crawl_tests;
