//! End-to-end crawl tests against mock storefronts

mod crawl_tests;
