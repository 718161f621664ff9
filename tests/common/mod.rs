//! Common test utilities
//!
//! This module is shared across all integration tests

pub mod fixtures;

#[allow(unused_imports)]
pub use fixtures::{carousel, highlight_item, post_item, reel_item, story_item, story_reel, user};

/// Route library logs to the test output. Safe to call from every test.
#[allow(dead_code)]
pub fn init_test_logging() {
    let _ = pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}
