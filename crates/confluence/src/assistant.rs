//! Run orchestration: the per-dataset pipeline, progress streaming, and
//! cancellation.
//!
//! One core drives every run and always produces progress events through a
//! channel. The streaming API hands the receiver to the caller; the
//! blocking API drains the same channel to completion, so the pipeline
//! logic exists exactly once.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::anomaly::{self, AnomalyConfig};
use crate::enrich::Enricher;
use crate::error::{ConfluenceError, Result};
use crate::input::{DataSource, Dataset};
use crate::mapping::{MappingConfig, SemanticFieldMapper};
use crate::profile::{ColumnProfiler, ColumnStats, SchemaInference, SchemaRecognizer};
use crate::report::{AssistantReport, DatasetReport, Enrichment};

/// Event channel depth; progress producers never run far ahead of readers.
const EVENT_BUFFER: usize = 32;

/// Execution options for a run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Maximum datasets processed concurrently.
    pub concurrency: usize,
    /// Optional per-run deadline, checked at dataset boundaries.
    pub deadline: Option<Duration>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            deadline: None,
        }
    }
}

/// Events emitted while a run executes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    /// A dataset finished; `percent` is completed/total.
    Progress { message: String, percent: f64 },
    /// Terminal: the run finished and this is the full report.
    Complete { report: AssistantReport },
    /// Terminal: the run could not produce a report.
    Error { message: String },
}

/// Cooperative cancellation signal for a run.
///
/// Checked between dataset boundaries only: an in-flight dataset completes
/// or fails, the rest are skipped.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Create a fresh handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// True once cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// The analysis engine: profiles every dataset of a source, maps columns
/// onto reference fields, runs the anomaly ensemble, and aggregates one
/// report per run.
#[derive(Clone)]
pub struct Assistant {
    source: Arc<dyn DataSource>,
    mapping: MappingConfig,
    anomaly: AnomalyConfig,
    enricher: Option<Arc<dyn Enricher>>,
    options: RunOptions,
}

impl Assistant {
    /// Create an assistant over a data source with default configuration.
    pub fn new(source: impl DataSource + 'static) -> Self {
        Self {
            source: Arc::new(source),
            mapping: MappingConfig::default(),
            anomaly: AnomalyConfig::default(),
            enricher: None,
            options: RunOptions::default(),
        }
    }

    /// Set the mapping configuration.
    pub fn with_mapping(mut self, mapping: MappingConfig) -> Self {
        self.mapping = mapping;
        self
    }

    /// Set the anomaly-detection configuration.
    pub fn with_anomaly(mut self, anomaly: AnomalyConfig) -> Self {
        self.anomaly = anomaly;
        self
    }

    /// Add an enrichment backend.
    ///
    /// Enrichment failures are logged and omitted; they never block a run.
    pub fn with_enricher(mut self, enricher: impl Enricher + 'static) -> Self {
        self.enricher = Some(Arc::new(enricher));
        self
    }

    /// Set execution options.
    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Run to completion and return the final report.
    pub async fn run(&self) -> Result<AssistantReport> {
        self.run_cancellable(CancelHandle::new()).await
    }

    /// Run to completion, honoring a cancellation handle.
    ///
    /// On cancellation the returned report is partial and carries the
    /// `cancelled` marker.
    pub async fn run_cancellable(&self, cancel: CancelHandle) -> Result<AssistantReport> {
        // Configuration errors abort before any dataset is touched.
        self.mapping.validate()?;

        let mut events = self.stream(cancel);
        let mut report = None;
        while let Some(event) = events.recv().await {
            match event {
                RunEvent::Progress { .. } => {}
                RunEvent::Complete { report: r } => report = Some(r),
                RunEvent::Error { message } => return Err(ConfluenceError::RunFailed(message)),
            }
        }
        report.ok_or_else(|| {
            ConfluenceError::RunFailed("stream ended without a terminal event".to_string())
        })
    }

    /// Start a run and stream its events.
    ///
    /// Emits one `Progress` event per completed dataset, then exactly one
    /// terminal event (`Complete` or `Error`). Must be called from within
    /// a tokio runtime.
    pub fn stream(&self, cancel: CancelHandle) -> mpsc::Receiver<RunEvent> {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let assistant = self.clone();
        tokio::spawn(async move {
            match assistant.execute(&tx, cancel).await {
                Ok(report) => {
                    let _ = tx.send(RunEvent::Complete { report }).await;
                }
                Err(e) => {
                    let _ = tx
                        .send(RunEvent::Error {
                            message: e.to_string(),
                        })
                        .await;
                }
            }
        });
        rx
    }

    async fn execute(
        &self,
        tx: &mpsc::Sender<RunEvent>,
        cancel: CancelHandle,
    ) -> Result<AssistantReport> {
        self.mapping.validate()?;

        let source = Arc::clone(&self.source);
        let datasets = tokio::task::spawn_blocking(move || source.load())
            .await
            .map_err(|e| ConfluenceError::RunFailed(format!("dataset loading panicked: {e}")))??;

        let total = datasets.len();
        let deadline = self.options.deadline.map(|d| Instant::now() + d);
        let semaphore = Arc::new(Semaphore::new(self.options.concurrency.max(1)));
        let completed = Arc::new(AtomicUsize::new(0));
        let mut tasks: JoinSet<(usize, DatasetReport)> = JoinSet::new();
        let mut cancelled = false;

        // Completion order is free; input order is restored through slots.
        let mut slots: Vec<Option<DatasetReport>> = Vec::new();
        slots.resize_with(total, || None);

        for (index, dataset) in datasets.into_iter().enumerate() {
            if stop_requested(&cancel, deadline) {
                cancelled = true;
                break;
            }

            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                break;
            };

            // The wait for a permit is a dataset boundary too.
            if stop_requested(&cancel, deadline) {
                cancelled = true;
                break;
            }

            let mapping = self.mapping.clone();
            let anomaly = self.anomaly.clone();
            let enricher = self.enricher.clone();
            let tx = tx.clone();
            let completed = Arc::clone(&completed);

            tasks.spawn(async move {
                let report = process_dataset(dataset, mapping, anomaly, enricher).await;
                drop(permit);

                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                let percent = done as f64 / total as f64 * 100.0;
                let message = format!("processed dataset '{}' ({done}/{total})", report.name);
                let _ = tx.send(RunEvent::Progress { message, percent }).await;

                (index, report)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, report)) => slots[index] = Some(report),
                Err(e) => tracing::warn!(error = %e, "dataset task failed to join"),
            }
        }

        let mut report = AssistantReport::new(self.source.info());
        report.cancelled = cancelled;
        report.datasets = slots.into_iter().flatten().collect();
        Ok(report)
    }
}

fn stop_requested(cancel: &CancelHandle, deadline: Option<Instant>) -> bool {
    cancel.is_cancelled() || deadline.is_some_and(|d| Instant::now() >= d)
}

/// The per-dataset pipeline: recognize and profile, then map and detect
/// (independent, run concurrently), then aggregate and optionally enrich.
async fn process_dataset(
    dataset: Dataset,
    mapping: MappingConfig,
    anomaly_config: AnomalyConfig,
    enricher: Option<Arc<dyn Enricher>>,
) -> DatasetReport {
    let name = dataset.name.clone();
    let dataset = Arc::new(dataset);

    let profiled = {
        let dataset = Arc::clone(&dataset);
        tokio::task::spawn_blocking(move || profile_dataset(&dataset)).await
    };
    let (inferences, stats) = match profiled {
        Ok(parts) => parts,
        Err(e) => {
            tracing::warn!(dataset = %name, error = %e, "profiling failed");
            return DatasetReport::failed(&name, format!("profiling failed: {e}"));
        }
    };
    let inferences = Arc::new(inferences);

    let mapping_task = {
        let dataset = Arc::clone(&dataset);
        tokio::task::spawn_blocking(move || {
            SemanticFieldMapper::new(mapping).map_columns(&dataset.headers)
        })
    };
    let anomaly_task = {
        let dataset = Arc::clone(&dataset);
        let inferences = Arc::clone(&inferences);
        tokio::task::spawn_blocking(move || {
            anomaly::detect_all(&dataset, &inferences, &anomaly_config)
        })
    };

    let (mappings, anomalies) = tokio::join!(mapping_task, anomaly_task);
    let mappings = match mappings {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!(dataset = %name, error = %e, "mapping failed");
            return DatasetReport::failed(&name, format!("mapping failed: {e}"));
        }
    };
    let anomalies = match anomalies {
        Ok(a) => a,
        Err(e) => {
            // detector failure degrades to an empty result set, not an error
            tracing::warn!(dataset = %name, error = %e, "anomaly detection failed");
            Vec::new()
        }
    };

    let enrichment = match enricher {
        Some(enricher) => {
            let dataset = Arc::clone(&dataset);
            let inferences = Arc::clone(&inferences);
            let flagged: Vec<IndexMap<String, String>> = anomalies
                .iter()
                .flat_map(|a| a.preview.iter().cloned())
                .take(5)
                .collect();
            tokio::task::spawn_blocking(move || {
                enrich_dataset(enricher.as_ref(), &dataset, &inferences, &flagged)
            })
            .await
            .unwrap_or_default()
        }
        None => Enrichment::default(),
    };

    DatasetReport::assemble(
        &dataset,
        (*inferences).clone(),
        stats,
        mappings,
        anomalies,
        enrichment,
    )
}

/// Recognize and profile every column of a dataset.
fn profile_dataset(dataset: &Dataset) -> (Vec<SchemaInference>, Vec<ColumnStats>) {
    let recognizer = SchemaRecognizer::new();
    let profiler = ColumnProfiler::new();

    let mut inferences = Vec::with_capacity(dataset.column_count());
    let mut stats = Vec::with_capacity(dataset.column_count());
    for idx in 0..dataset.column_count() {
        let values: Vec<&str> = dataset.column_values(idx).collect();
        let inference = recognizer.infer_column(&values);
        stats.push(profiler.profile(&values, inference.primitive_type));
        inferences.push(inference);
    }
    (inferences, stats)
}

/// Collect enrichment text for one dataset. Backend failures are logged
/// and leave the corresponding fields empty.
fn enrich_dataset(
    enricher: &dyn Enricher,
    dataset: &Dataset,
    inferences: &[SchemaInference],
    flagged_previews: &[IndexMap<String, String>],
) -> Enrichment {
    let mut enrichment = Enrichment::default();

    let schema: Vec<(String, String)> = dataset
        .headers
        .iter()
        .zip(inferences)
        .map(|(name, inference)| (name.clone(), inference.primitive_type.label().to_string()))
        .collect();
    let sample_rows: Vec<IndexMap<String, String>> = (0..dataset.row_count().min(3))
        .map(|row| dataset.row_preview(row))
        .collect();

    match enricher.summarize_dataset(&dataset.name, &schema, &sample_rows) {
        Ok(summary) if !summary.is_empty() => enrichment.summary = Some(summary),
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(dataset = %dataset.name, backend = enricher.name(), error = %e,
                "dataset summary unavailable");
        }
    }

    for (idx, header) in dataset.headers.iter().enumerate() {
        let samples: Vec<String> = dataset
            .column_values(idx)
            .filter(|v| !Dataset::is_missing_value(v))
            .take(5)
            .map(|s| s.to_string())
            .collect();
        match enricher.describe_column(header, &samples) {
            Ok(description) if !description.is_empty() => {
                enrichment.descriptions.insert(header.clone(), description);
            }
            Ok(_) => {}
            Err(e) => {
                // backend is down; no point asking for the remaining columns
                tracing::warn!(dataset = %dataset.name, backend = enricher.name(), error = %e,
                    "column descriptions unavailable");
                break;
            }
        }
    }

    if !flagged_previews.is_empty() {
        match enricher.explain_anomalies(&dataset.name, flagged_previews) {
            Ok(text) if !text.is_empty() => enrichment.anomaly_explanation = Some(text),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(dataset = %dataset.name, backend = enricher.name(), error = %e,
                    "anomaly explanation unavailable");
            }
        }
    }

    enrichment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::MemorySource;

    fn numbered_dataset(name: &str, rows: usize) -> Dataset {
        Dataset::new(
            name,
            vec!["id".to_string(), "value".to_string()],
            (0..rows)
                .map(|i| vec![format!("r{i}"), format!("{}", i % 7)])
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_empty_source_yields_empty_report() {
        let assistant = Assistant::new(MemorySource::new(Vec::new()));
        let report = assistant.run().await.unwrap();
        assert!(report.datasets.is_empty());
        assert!(!report.cancelled);
    }

    #[tokio::test]
    async fn test_invalid_config_aborts_before_work() {
        let source = MemorySource::new(vec![numbered_dataset("a", 20)]);
        let assistant = Assistant::new(source)
            .with_mapping(MappingConfig::new(vec!["x".to_string()]).with_threshold(2.0));
        let err = assistant.run().await.unwrap_err();
        assert!(matches!(err, ConfluenceError::InvalidMappingConfig(_)));
    }

    #[tokio::test]
    async fn test_report_preserves_input_order() {
        let source = MemorySource::new(vec![
            numbered_dataset("first", 30),
            numbered_dataset("second", 15),
            numbered_dataset("third", 40),
        ]);
        let assistant = Assistant::new(source).with_options(RunOptions {
            concurrency: 3,
            deadline: None,
        });
        let report = assistant.run().await.unwrap();
        let names: Vec<&str> = report.datasets.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_stream_emits_progress_then_complete() {
        let source = MemorySource::new(vec![
            numbered_dataset("a", 12),
            numbered_dataset("b", 12),
        ]);
        let assistant = Assistant::new(source);
        let mut events = assistant.stream(CancelHandle::new());

        let mut progress = 0;
        let mut complete = 0;
        while let Some(event) = events.recv().await {
            match event {
                RunEvent::Progress { percent, .. } => {
                    assert!(percent > 0.0 && percent <= 100.0);
                    progress += 1;
                }
                RunEvent::Complete { report } => {
                    complete += 1;
                    assert_eq!(report.datasets.len(), 2);
                }
                RunEvent::Error { message } => panic!("unexpected error: {message}"),
            }
        }
        assert_eq!(progress, 2);
        assert_eq!(complete, 1);
    }

    #[tokio::test]
    async fn test_deadline_in_past_cancels_everything() {
        let source = MemorySource::new(vec![numbered_dataset("a", 20)]);
        let assistant = Assistant::new(source).with_options(RunOptions {
            concurrency: 1,
            deadline: Some(Duration::ZERO),
        });
        let report = assistant.run().await.unwrap();
        assert!(report.cancelled);
        assert!(report.datasets.is_empty());
    }

    /// Enricher that cancels the run while the first dataset is in flight.
    struct CancellingEnricher {
        handle: CancelHandle,
    }

    impl Enricher for CancellingEnricher {
        fn describe_column(&self, _: &str, _: &[String]) -> Result<String> {
            Ok(String::new())
        }
        fn summarize_dataset(
            &self,
            _: &str,
            _: &[(String, String)],
            _: &[IndexMap<String, String>],
        ) -> Result<String> {
            self.handle.cancel();
            Ok(String::new())
        }
        fn explain_anomalies(
            &self,
            _: &str,
            _: &[IndexMap<String, String>],
        ) -> Result<String> {
            Ok(String::new())
        }
        fn name(&self) -> &str {
            "cancelling"
        }
    }

    #[tokio::test]
    async fn test_cancel_after_first_dataset_keeps_partial_report() {
        let handle = CancelHandle::new();
        let source = MemorySource::new(vec![
            numbered_dataset("a", 20),
            numbered_dataset("b", 20),
            numbered_dataset("c", 20),
        ]);
        let assistant = Assistant::new(source)
            .with_enricher(CancellingEnricher {
                handle: handle.clone(),
            })
            .with_options(RunOptions {
                concurrency: 1,
                deadline: None,
            });

        let report = assistant.run_cancellable(handle).await.unwrap();
        assert!(report.cancelled);
        assert_eq!(report.datasets.len(), 1);
        assert_eq!(report.datasets[0].name, "a");
    }
}
