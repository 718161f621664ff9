//! Mock implementations of the extraction backend
//!
//! Lets the downloader run end to end without gallery-dl or network access.

pub mod mock_extractor;

pub use mock_extractor::{MockExtractor, MockOutcome};
