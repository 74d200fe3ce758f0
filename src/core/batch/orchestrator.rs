//! Batch orchestrator
//!
//! Fans documents out to a bounded worker pool. Each document is read, fingerprinted, parsed
//! on a blocking thread, handed to the sink and finally recorded with the tracker. Whatever
//! goes wrong for one document ends up as a `Failed` outcome for that document only.
//!
//! On shutdown the orchestrator stops dispatching and waits for in-flight documents; a parse
//! is never interrupted halfway. In strict mode (`continue_on_error = false`) the first
//! failure has the same effect.

use super::discovery;
use super::outcome::{
    DocumentOutcome, FailedDocument, ProcessedDocument, SkippedDocument, WorkState,
};
use super::progress::ProgressCounters;
use super::report::BatchReport;
use super::settings::BatchSettings;
use crate::adapters::output::DocumentSink;
use crate::core::assemble::{DocumentAssembler, ParsedDocument};
use crate::core::state::{calculate_fingerprint, FingerprintRecord, FingerprintTracker};
use crate::domain::{Result, Severity, SourceId, SplError};
use crate::{log_batch_progress, log_document_parsed, log_error_with_context};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Semaphore};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

/// Single-document parse step run by each worker
///
/// [`DocumentAssembler`] is the production implementation. The call runs on a blocking
/// thread and must not touch shared mutable state.
pub trait DocumentParser: Send + Sync {
    /// Parse one document
    ///
    /// # Errors
    ///
    /// Returns an error when the document as a whole cannot be built.
    fn parse(&self, bytes: &[u8], source: SourceId) -> Result<ParsedDocument>;
}

impl DocumentParser for DocumentAssembler {
    fn parse(&self, bytes: &[u8], source: SourceId) -> Result<ParsedDocument> {
        self.assemble(bytes, source)
    }
}

/// Everything a worker needs, cheap to clone into each task
#[derive(Clone)]
struct Worker {
    parser: Arc<dyn DocumentParser>,
    tracker: Arc<FingerprintTracker>,
    sink: Option<Arc<dyn DocumentSink + Send + Sync>>,
    dedup: bool,
    timeout: Option<Duration>,
}

impl Worker {
    async fn process(&self, path: PathBuf, source: SourceId) -> DocumentOutcome {
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                return DocumentOutcome::Failed(FailedDocument::from_error(
                    source,
                    &SplError::Io(format!("Failed to read {}: {e}", path.display())),
                ))
            }
        };

        let fingerprint = calculate_fingerprint(&bytes);
        if self.dedup && self.tracker.is_unchanged(&source, &fingerprint).await {
            tracing::debug!(
                source = %source,
                fingerprint = %fingerprint.short(),
                "Skipping unchanged document"
            );
            return DocumentOutcome::SkippedDuplicate(SkippedDocument {
                source,
                fingerprint,
            });
        }

        let parsed = match self.parse(bytes, source.clone()).await {
            Ok(parsed) => parsed,
            Err(failed) => return DocumentOutcome::Failed(failed),
        };
        log_document_parsed!(parsed);

        if let Some(sink) = &self.sink {
            if let Err(e) = sink.write(&parsed).await {
                log_error_with_context!(e, "Failed to write parsed document");
                return DocumentOutcome::Failed(FailedDocument::from_error(source, &e));
            }
        }

        let record = FingerprintRecord::new(source.clone(), fingerprint.clone())
            .with_document(&parsed.document);
        if let Err(e) = self.tracker.record(record).await {
            log_error_with_context!(e, "Failed to record fingerprint");
            return DocumentOutcome::Failed(FailedDocument::from_error(source, &e));
        }

        DocumentOutcome::Succeeded(ProcessedDocument {
            source,
            fingerprint,
            document_id: parsed.document.id.clone(),
            errors: parsed.diagnostics.count(Severity::Error),
            warnings: parsed.diagnostics.count(Severity::Warning),
        })
    }

    async fn parse(
        &self,
        bytes: Vec<u8>,
        source: SourceId,
    ) -> std::result::Result<ParsedDocument, FailedDocument> {
        let parser = self.parser.clone();
        let task_source = source.clone();
        let handle = tokio::task::spawn_blocking(move || parser.parse(&bytes, task_source));

        let joined = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    // The blocking thread runs to completion; its result is discarded.
                    return Err(FailedDocument::from_error(
                        source,
                        &SplError::Timeout {
                            seconds: limit.as_secs(),
                        },
                    ));
                }
            },
            None => handle.await,
        };

        match joined {
            Ok(Ok(parsed)) => Ok(parsed),
            Ok(Err(e)) => Err(FailedDocument::from_error(source, &e)),
            Err(e) => Err(FailedDocument::worker_panic(source, panic_message(e))),
        }
    }
}

fn panic_message(error: JoinError) -> String {
    if !error.is_panic() {
        return "worker task was cancelled".to_string();
    }
    let payload = error.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("worker panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("worker panicked: {message}")
    } else {
        "worker panicked".to_string()
    }
}

/// Outcomes gathered while the run progresses
#[derive(Default)]
struct Collected {
    succeeded: usize,
    failures: Vec<FailedDocument>,
    skipped: Vec<SkippedDocument>,
}

impl Collected {
    fn push(&mut self, joined: std::result::Result<DocumentOutcome, JoinError>) {
        match joined {
            Ok(DocumentOutcome::Succeeded(_)) => self.succeeded += 1,
            Ok(DocumentOutcome::Failed(failed)) => {
                tracing::warn!(
                    source = %failed.source,
                    kind = %failed.kind,
                    error = %failed.message,
                    "Document failed"
                );
                self.failures.push(failed);
            }
            Ok(DocumentOutcome::SkippedDuplicate(skipped)) => self.skipped.push(skipped),
            Err(e) => {
                log_error_with_context!(e, "Worker task aborted");
                if let Ok(source) = SourceId::new("<unknown>") {
                    self.failures
                        .push(FailedDocument::worker_panic(source, panic_message(e)));
                }
            }
        }
    }
}

/// Resolves once shutdown is signalled; never resolves if the sender is gone
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

fn spawn_ticker(counters: Arc<ProgressCounters>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let snapshot = counters.snapshot();
            log_batch_progress!(snapshot);
        }
    })
}

/// Batch orchestrator over one fingerprint tracker and an optional sink
pub struct BatchOrchestrator {
    settings: BatchSettings,
    worker: Worker,
    shutdown: watch::Receiver<bool>,
}

impl BatchOrchestrator {
    /// Create an orchestrator parsing with [`DocumentAssembler`]
    ///
    /// # Arguments
    ///
    /// * `settings` - Worker count, dedup, timeout and failure policy
    /// * `tracker` - Fingerprint tracker owned by this run
    /// * `shutdown` - Receiver that flips to `true` when dispatching must stop
    pub fn new(
        settings: BatchSettings,
        tracker: Arc<FingerprintTracker>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let worker = Worker {
            parser: Arc::new(DocumentAssembler::new(settings.validation)),
            tracker,
            sink: None,
            dedup: settings.dedup_enabled(),
            timeout: settings.document_timeout,
        };
        Self {
            settings,
            worker,
            shutdown,
        }
    }

    /// Hand every successfully parsed document to `sink`
    pub fn with_sink(mut self, sink: Arc<dyn DocumentSink + Send + Sync>) -> Self {
        self.worker.sink = Some(sink);
        self
    }

    /// Replace the parse step
    pub fn with_parser(mut self, parser: Arc<dyn DocumentParser>) -> Self {
        self.worker.parser = parser;
        self
    }

    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    /// Discover files below `dir` and process them
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read or the tracker cannot be loaded.
    pub async fn run_directory(
        &self,
        dir: &Path,
        pattern: &str,
        recursive: bool,
    ) -> Result<BatchReport> {
        let paths = discovery::discover(dir, pattern, recursive)?;
        self.run(paths).await
    }

    /// Process the given files
    ///
    /// Per-document problems never fail the run; they are reported in the returned
    /// [`BatchReport`].
    ///
    /// # Errors
    ///
    /// Returns an error only if the fingerprint table cannot be loaded.
    pub async fn run(&self, paths: Vec<PathBuf>) -> Result<BatchReport> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let total = paths.len();

        let tracked = self.worker.tracker.load().await?;
        tracing::info!(
            run_id = %run_id,
            total,
            workers = self.settings.workers,
            dedup = self.worker.dedup,
            tracked,
            timeout_secs = ?self.settings.document_timeout.map(|t| t.as_secs_f64()),
            continue_on_error = self.settings.continue_on_error,
            "Starting batch"
        );

        let counters = Arc::new(ProgressCounters::new(total));
        let ticker = spawn_ticker(counters.clone(), self.settings.progress_interval);
        let semaphore = Arc::new(Semaphore::new(self.settings.workers));
        let mut shutdown = self.shutdown.clone();
        let mut tasks: JoinSet<DocumentOutcome> = JoinSet::new();
        let mut collected = Collected::default();
        let mut interrupted = false;
        let mut stopped_early = false;

        for (position, path) in paths.into_iter().enumerate() {
            while let Some(joined) = tasks.try_join_next() {
                collected.push(joined);
            }
            if self.must_stop(&collected) {
                stopped_early = true;
                break;
            }
            if *shutdown.borrow() {
                interrupted = true;
                break;
            }

            let permit = tokio::select! {
                biased;
                _ = wait_for_shutdown(&mut shutdown) => {
                    interrupted = true;
                    break;
                }
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            // A failure may have completed while waiting for the permit.
            while let Some(joined) = tasks.try_join_next() {
                collected.push(joined);
            }
            if self.must_stop(&collected) {
                stopped_early = true;
                break;
            }

            let source = match SourceId::from_path(&path) {
                Ok(source) => source,
                Err(message) => {
                    let error = SplError::InvalidFormat {
                        field_path: "source".to_string(),
                        message,
                    };
                    log_error_with_context!(error, "Input path has no usable name");
                    if let Ok(placeholder) = SourceId::new(format!("<input #{position}>")) {
                        counters.begin();
                        counters.finish(WorkState::Failed);
                        collected.push(Ok(DocumentOutcome::Failed(FailedDocument::from_error(
                            placeholder,
                            &error,
                        ))));
                    }
                    continue;
                }
            };

            let worker = self.worker.clone();
            let counters = counters.clone();
            tasks.spawn(async move {
                let _permit = permit;
                counters.begin();
                let outcome = worker.process(path, source).await;
                counters.finish(outcome.state());
                outcome
            });
        }

        if interrupted {
            tracing::warn!(
                in_flight = tasks.len(),
                "Shutdown requested, draining in-flight documents"
            );
        } else if stopped_early {
            tracing::warn!(
                in_flight = tasks.len(),
                "Stopping after failure, draining in-flight documents"
            );
        }

        while let Some(joined) = tasks.join_next().await {
            collected.push(joined);
        }
        ticker.abort();

        let snapshot = counters.snapshot();
        log_batch_progress!(snapshot);

        let report = BatchReport::new(
            run_id,
            started_at,
            total,
            collected.succeeded,
            collected.failures,
            collected.skipped,
        )
        .with_interrupted(interrupted)
        .with_stopped_early(stopped_early);
        report.log_summary();

        Ok(report)
    }

    fn must_stop(&self, collected: &Collected) -> bool {
        !self.settings.continue_on_error && !collected.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::output::MemorySink;
    use crate::adapters::tracker::MemoryFingerprintStore;
    use crate::domain::ErrorKind;
    use tempfile::TempDir;

    const VALID: &str = r#"<document xmlns="urn:hl7-org:v3">
  <id root="a8f5e2c1-3b4d-4e6f-9a7b-1c2d3e4f5a6b"/>
  <setId root="0b6c5d4e-3f2a-4b1c-8d9e-0f1a2b3c4d5e"/>
  <versionNumber value="1"/>
  <component><structuredBody><component><section>
    <id root="1f0c1a2b-0000-4000-8000-000000000001"/>
    <code code="34071-1" codeSystem="2.16.840.1.113883.6.1"/>
    <text><paragraph>Keep out of reach of children.</paragraph></text>
  </section></component></structuredBody></component>
</document>"#;

    fn tracker() -> Arc<FingerprintTracker> {
        Arc::new(FingerprintTracker::new_with_store(Arc::new(
            MemoryFingerprintStore::new(),
        )))
    }

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_success_and_failure_are_isolated() {
        let dir = TempDir::new().unwrap();
        let paths = vec![
            write(&dir, "a.xml", VALID),
            write(&dir, "b.xml", "<document><broken></document>"),
        ];
        let (_tx, rx) = watch::channel(false);
        let sink = Arc::new(MemorySink::new());
        let orchestrator =
            BatchOrchestrator::new(BatchSettings::new(2), tracker(), rx).with_sink(sink.clone());

        let report = orchestrator.run(paths).await.unwrap();

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.failures[0].kind, ErrorKind::MalformedMarkup);
        assert!(report.failures[0].source.as_str().ends_with("b.xml"));
        assert_eq!(sink.len().await, 1);
    }

    #[tokio::test]
    async fn test_missing_file_fails_with_io() {
        let dir = TempDir::new().unwrap();
        let (_tx, rx) = watch::channel(false);
        let orchestrator = BatchOrchestrator::new(BatchSettings::new(1), tracker(), rx);

        let report = orchestrator
            .run(vec![dir.path().join("absent.xml")])
            .await
            .unwrap();
        assert_eq!(report.failures[0].kind, ErrorKind::Io);
    }

    #[tokio::test]
    async fn test_unnamed_input_is_a_failure() {
        let dir = TempDir::new().unwrap();
        let paths = vec![PathBuf::from(""), write(&dir, "a.xml", VALID)];
        let (_tx, rx) = watch::channel(false);
        let orchestrator = BatchOrchestrator::new(BatchSettings::new(1), tracker(), rx);

        let report = orchestrator.run(paths).await.unwrap();

        assert_eq!(report.total, 2);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.not_processed, 0);
        assert_eq!(report.failures[0].kind, ErrorKind::InvalidFormat);
        assert_eq!(report.failures[0].source.as_str(), "<input #0>");
    }

    #[tokio::test]
    async fn test_unnamed_input_stops_strict_run() {
        let dir = TempDir::new().unwrap();
        let paths = vec![PathBuf::from("  "), write(&dir, "a.xml", VALID)];
        let (_tx, rx) = watch::channel(false);
        let settings = BatchSettings::new(1).with_continue_on_error(false);
        let orchestrator = BatchOrchestrator::new(settings, tracker(), rx);

        let report = orchestrator.run(paths).await.unwrap();

        assert!(report.stopped_early);
        assert_eq!(report.failed, 1);
        assert_eq!(report.not_processed, 1);
    }

    #[tokio::test]
    async fn test_second_run_skips_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "a.xml", VALID);
        let tracker = tracker();
        let (_tx, rx) = watch::channel(false);
        let orchestrator = BatchOrchestrator::new(BatchSettings::new(1), tracker, rx);

        let first = orchestrator.run(vec![path.clone()]).await.unwrap();
        assert_eq!(first.succeeded, 1);

        let second = orchestrator.run(vec![path]).await.unwrap();
        assert_eq!(second.succeeded, 0);
        assert_eq!(second.skipped, 1);
    }

    #[tokio::test]
    async fn test_shutdown_before_start_dispatches_nothing() {
        let dir = TempDir::new().unwrap();
        let paths = vec![write(&dir, "a.xml", VALID), write(&dir, "b.xml", VALID)];
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();
        let orchestrator = BatchOrchestrator::new(BatchSettings::new(1), tracker(), rx);

        let report = orchestrator.run(paths).await.unwrap();
        assert!(report.interrupted);
        assert_eq!(report.processed(), 0);
        assert_eq!(report.not_processed, 2);
    }
}
