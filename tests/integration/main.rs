//! Integration tests for catalog-sync

mod fake_driver;
mod http_tests;
mod pipeline_tests;
