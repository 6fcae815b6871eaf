// src/ingest/types.rs
use anyhow::Result;

use crate::model::{ContentItem, LocationInfo};

/// What the pipeline asks every content source for.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub query: String,
    /// Upper bound per source; adapters may return fewer.
    pub limit: usize,
    /// Set in location-aware mode; sources shape their own query from it.
    pub location: Option<LocationInfo>,
}

impl FetchRequest {
    pub fn new(query: impl Into<String>, limit: usize) -> Self {
        Self {
            query: query.into(),
            limit,
            location: None,
        }
    }

    pub fn with_location(mut self, location: LocationInfo) -> Self {
        self.location = Some(location);
        self
    }
}

#[async_trait::async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch(&self, req: &FetchRequest) -> Result<Vec<ContentItem>>;
    fn name(&self) -> &'static str;
}
