//! Common test utilities and helpers

#![allow(dead_code)]

use agrotile::collector::{CollectorOptions, Provider, ProviderSet, VariableCollector};
use agrotile::config::PipelineConfig;
use agrotile::enrichment::RecommendationService;
use agrotile::pipeline::AreaPipeline;
use agrotile::storage::MemoryStore;
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Collector options with a short timeout so failing tests stay fast
pub fn fast_options() -> CollectorOptions {
    CollectorOptions {
        concurrency: 4,
        timeout: Duration::from_millis(500),
    }
}

pub fn collector(providers: Vec<Arc<dyn Provider>>) -> VariableCollector {
    VariableCollector::new(
        ProviderSet::new(providers).expect("distinct providers"),
        fast_options(),
    )
}

/// Pipeline wired to an in-memory store
pub fn pipeline_with(
    collector: VariableCollector,
    recommender: Arc<dyn RecommendationService>,
) -> (AreaPipeline, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let pipeline = AreaPipeline::new(
        PipelineConfig::default(),
        store.clone(),
        collector,
        recommender,
    );
    (pipeline, store)
}

/// Temporary directory holding JSON input files
pub struct JsonFiles {
    dir: TempDir,
}

impl JsonFiles {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: TempDir::new()?,
        })
    }

    pub fn write(&self, name: &str, value: &serde_json::Value) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        std::fs::write(&path, serde_json::to_string_pretty(value)?)?;
        Ok(path)
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}
