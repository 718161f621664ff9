//! Mock extraction backend
//!
//! Returns canned raw items (or a canned failure) and records every request
//! it receives. In download mode it writes one small file per item into the
//! request's output directory, like gallery-dl does.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};

use igdora::download::gallery_dl_errors::GalleryDlErrorType;
use igdora::download::{ContentExtractor, ExtractionError, ExtractionRequest, RawRecord};

/// What the mock answers with.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    Items(Vec<Value>),
    /// gallery-dl exited non-zero with this stderr
    Failed { code: i32, kind: GalleryDlErrorType, stderr: String },
    NoContent,
    BinaryNotFound,
}

pub struct MockExtractor {
    outcome: MockOutcome,
    requests: Arc<Mutex<Vec<ExtractionRequest>>>,
}

impl MockExtractor {
    pub fn new(outcome: MockOutcome) -> Self {
        Self {
            outcome,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_items(items: Vec<Value>) -> Self {
        Self::new(MockOutcome::Items(items))
    }

    /// Handle to the recorded requests, usable after the mock is boxed.
    pub fn requests(&self) -> Arc<Mutex<Vec<ExtractionRequest>>> {
        Arc::clone(&self.requests)
    }
}

#[async_trait]
impl ContentExtractor for MockExtractor {
    fn name(&self) -> &str {
        "mock"
    }

    async fn extract(&self, request: &ExtractionRequest) -> Result<Vec<RawRecord>, ExtractionError> {
        self.requests.lock().unwrap().push(request.clone());

        match &self.outcome {
            MockOutcome::Items(items) => {
                let mut records = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    let mut record = RawRecord::new(item.clone());
                    if let Some(dir) = &request.output_dir {
                        let ext = item.get("extension").and_then(Value::as_str).unwrap_or("jpg");
                        let path = dir.join(format!("{}.{}", index + 1, ext));
                        tokio::fs::write(&path, b"media").await.unwrap();
                        record = record.with_local_path(path);
                    }
                    records.push(record);
                }
                Ok(records)
            }
            MockOutcome::Failed { code, kind, stderr } => Err(ExtractionError::Failed {
                code: Some(*code),
                kind: *kind,
                stderr: stderr.clone(),
            }),
            MockOutcome::NoContent => Err(ExtractionError::NoContent),
            MockOutcome::BinaryNotFound => Err(ExtractionError::BinaryNotFound("gallery-dl".to_string())),
        }
    }
}
