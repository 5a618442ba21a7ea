//! Shared state for the upload server.

use std::collections::VecDeque;
use std::sync::Arc;

use log::debug;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::ghostscript::Compress;
use crate::job::{BatchSummary, FileJob};
use crate::level::CompressionLevel;
use crate::server::ServerConfig;
use crate::workspace::Workspace;

pub type SharedCompressor = Arc<dyn Compress + Send + Sync>;

/// A processed batch. Its files live as long as the workspace does.
#[derive(Debug)]
pub struct FinishedBatch {
    pub id: Uuid,
    pub level: CompressionLevel,
    pub jobs: Vec<FileJob>,
    pub summary: BatchSummary,
    workspace: Workspace,
}

impl FinishedBatch {
    pub fn new(
        level: CompressionLevel,
        jobs: Vec<FileJob>,
        summary: BatchSummary,
        workspace: Workspace,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            level,
            jobs,
            summary,
            workspace,
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }
}

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    compressor: SharedCompressor,
    /// Oldest first.
    batches: Mutex<VecDeque<Arc<FinishedBatch>>>,
}

impl AppState {
    pub fn new(config: ServerConfig, compressor: SharedCompressor) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                compressor,
                batches: Mutex::new(VecDeque::new()),
            }),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    pub fn compressor(&self) -> SharedCompressor {
        Arc::clone(&self.inner.compressor)
    }

    /// Keeps `batch` for download, evicting the oldest batches past capacity.
    pub fn insert_batch(&self, batch: FinishedBatch) -> Arc<FinishedBatch> {
        let batch = Arc::new(batch);
        let capacity = self.inner.config.retained_batches.max(1);
        let mut evicted = Vec::new();
        {
            let mut batches = self.inner.batches.lock();
            batches.push_back(Arc::clone(&batch));
            while batches.len() > capacity {
                if let Some(old) = batches.pop_front() {
                    evicted.push(old);
                }
            }
        }
        // workspaces are deleted here, after the lock is released
        for old in evicted {
            debug!("Evicting batch {}", old.id);
        }
        batch
    }

    pub fn batch(&self, id: Uuid) -> Option<Arc<FinishedBatch>> {
        self.inner
            .batches
            .lock()
            .iter()
            .find(|b| b.id == id)
            .cloned()
    }

    pub fn batch_count(&self) -> usize {
        self.inner.batches.lock().len()
    }
}
