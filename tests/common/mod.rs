//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates a file-backed database in a temp
//! directory (so the spawned queue worker and the test body share one view),
//! plus [`StubProvider`] for driving the dispatcher without real providers.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use stellar::events::{self, EventSender};
use stellar::generation::{
    GeneratedMedia, GenerationDispatcher, GenerationProvider, MediaStorage, ProviderRegistry,
    ProviderSelection,
};
use stellar::queue::{RetryPolicies, RetryPolicy, TaskQueue, WorkerContext};
use stellar_common::GenerationError;
use stellar_db::pool::{init_pool, DbPool};

/// What a [`StubProvider`] does when asked to generate.
#[derive(Clone, Copy, Debug)]
pub enum StubOutcome {
    Succeed,
    FailApi,
    FailTimeout,
}

/// A minimal in-memory provider used for driving the dispatcher in tests.
#[derive(Debug)]
pub struct StubProvider {
    provider_name: &'static str,
    configured: bool,
    outcome: StubOutcome,
    calls: Arc<AtomicU32>,
}

impl StubProvider {
    pub fn new(provider_name: &'static str, outcome: StubOutcome) -> Self {
        Self {
            provider_name,
            configured: true,
            outcome,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Shared counter of generate calls, for asserting (non-)invocation.
    pub fn call_counter(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.calls)
    }

    /// Mark the provider as lacking credentials.
    pub fn set_configured(&mut self, configured: bool) {
        self.configured = configured;
    }

    fn generate(&self, bytes: &[u8], format: &str) -> Result<GeneratedMedia, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.outcome {
            StubOutcome::Succeed => Ok(GeneratedMedia {
                bytes: bytes.to_vec(),
                format: format.to_string(),
            }),
            StubOutcome::FailApi => {
                Err(GenerationError::api_request().with_message("stub upstream exploded"))
            }
            StubOutcome::FailTimeout => Err(GenerationError::job_timeout()),
        }
    }
}

#[async_trait]
impl GenerationProvider for StubProvider {
    fn name(&self) -> &'static str {
        self.provider_name
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn generate_image(&self, _prompt: &str) -> Result<GeneratedMedia, GenerationError> {
        self.generate(b"stub-image", "png")
    }

    async fn generate_video(&self, _prompt: &str) -> Result<GeneratedMedia, GenerationError> {
        self.generate(b"stub-video", "mp4")
    }
}

/// Test harness wrapping a file-backed pool and media dir in a temp dir.
pub struct TestHarness {
    pub pool: DbPool,
    pub media_dir: PathBuf,
    pub event_tx: EventSender,
    _tmp: TempDir,
}

impl TestHarness {
    pub fn new() -> Self {
        let tmp = tempfile::tempdir().expect("failed to create temp dir");
        let db_path = tmp.path().join("stellar.db");
        let pool = init_pool(&db_path.to_string_lossy()).expect("failed to init pool");
        let media_dir = tmp.path().join("media");
        let (event_tx, _) = events::channel();

        Self {
            pool,
            media_dir,
            event_tx,
            _tmp: tmp,
        }
    }

    /// Build a dispatcher over the given providers, selecting the image and
    /// video providers by registry name.
    pub fn dispatcher(
        &self,
        providers: Vec<Arc<dyn GenerationProvider>>,
        image: &str,
        video: &str,
    ) -> GenerationDispatcher {
        let mut registry = ProviderRegistry::new();
        for provider in providers {
            registry.register(provider);
        }

        GenerationDispatcher::with_events(
            self.pool.clone(),
            Arc::new(registry),
            MediaStorage::new(self.media_dir.clone()),
            ProviderSelection {
                image: image.to_string(),
                video: video.to_string(),
            },
            self.event_tx.clone(),
        )
    }

    /// Start a task queue around the dispatcher, using `policy` for both
    /// task kinds (tests want short delays).
    pub fn queue(&self, dispatcher: GenerationDispatcher, policy: RetryPolicy) -> TaskQueue {
        let ctx = WorkerContext {
            pool: self.pool.clone(),
            dispatcher: Arc::new(dispatcher),
            event_tx: Some(self.event_tx.clone()),
        };
        TaskQueue::start(
            ctx,
            RetryPolicies {
                generation: policy,
                audit: policy,
            },
        )
    }
}

/// A fast retry policy for tests.
pub fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        delay: Duration::from_millis(25),
    }
}

/// Poll `condition` until it holds, panicking after ~2 seconds.
pub async fn wait_for<F: Fn() -> bool>(what: &str, condition: F) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}
