use crate::utils::{copy_into_extension_folder, destination_for, list_files_recursive, CopyResult};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Configuration for a sort run
#[derive(Debug, Clone)]
pub struct SortConfig {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Copies allowed in flight at once; 0 means unbounded
    pub max_concurrency: usize,
}

impl SortConfig {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(source: P, output: Q) -> Self {
        Self {
            source: source.into(),
            output: output.into(),
            max_concurrency: 64,
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }
}

/// Errors that stop a run before or while discovering files
#[derive(Debug, Error)]
pub enum SortError {
    #[error("Source folder {0:?} does not exist")]
    SourceNotFound(PathBuf),

    #[error("Source folder {0:?} is not a directory")]
    SourceNotDirectory(PathBuf),

    #[error("Failed to create output folder {path:?}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to walk source folder: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Source walk task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Check that the source exists and is a directory
pub fn validate_source<P: AsRef<Path>>(source: P) -> Result<(), SortError> {
    let source = source.as_ref();
    if !source.exists() {
        return Err(SortError::SourceNotFound(source.to_path_buf()));
    }
    if !source.is_dir() {
        return Err(SortError::SourceNotDirectory(source.to_path_buf()));
    }
    Ok(())
}

/// Destinations planned for more than one source file
pub fn find_collisions(files: &[PathBuf], output: &Path) -> Vec<Collision> {
    let mut by_destination: HashMap<PathBuf, Vec<PathBuf>> = HashMap::new();

    for file in files {
        if let Ok(destination) = destination_for(file, output) {
            by_destination.entry(destination).or_default().push(file.clone());
        }
    }

    let mut collisions: Vec<Collision> = by_destination
        .into_iter()
        .filter(|(_, sources)| sources.len() > 1)
        .map(|(destination, sources)| Collision {
            destination: destination.to_string_lossy().to_string(),
            sources: sources
                .iter()
                .map(|s| s.to_string_lossy().to_string())
                .collect(),
        })
        .collect();

    collisions.sort_by(|a, b| a.destination.cmp(&b.destination));
    collisions
}

/// Validate inputs, walk the source and copy every file into its extension
/// folder under the output root. Per-file failures end up in the report.
pub async fn sort_files_by_extension(config: &SortConfig) -> Result<SortReport, SortError> {
    let started_at = Utc::now();
    validate_source(&config.source)?;

    tokio::fs::create_dir_all(&config.output)
        .await
        .map_err(|source| SortError::OutputDir {
            path: config.output.clone(),
            source,
        })?;

    let source = config.source.clone();
    let files = tokio::task::spawn_blocking(move || list_files_recursive(source)).await??;
    info!("Discovered {} files in {}", files.len(), config.source.display());

    let collisions = find_collisions(&files, &config.output);
    for collision in &collisions {
        warn!(
            "{} source files share destination {}; last write wins",
            collision.sources.len(),
            collision.destination
        );
    }

    let results = copy_all(files, &config.output, config.max_concurrency).await;

    let mut report = create_sort_report(config, results, collisions);
    report.started_at = started_at;
    report.finished_at = Utc::now();

    info!(
        "Sort completed. Discovered: {}, Copied: {}, Errors: {}",
        report.files_discovered,
        report.successful_copies,
        report.errors.len()
    );

    Ok(report)
}

/// Spawn one task per file and wait for all of them
async fn copy_all(files: Vec<PathBuf>, output: &Path, max_concurrency: usize) -> Vec<CopyResult> {
    let semaphore = (max_concurrency > 0).then(|| Arc::new(Semaphore::new(max_concurrency)));
    debug!("Copying with concurrency limit {:?}", semaphore.as_ref().map(|_| max_concurrency));

    let handles: Vec<(PathBuf, JoinHandle<CopyResult>)> = files
        .into_iter()
        .map(|file| {
            let semaphore = semaphore.clone();
            let output = output.to_path_buf();
            let task_file = file.clone();
            let handle = tokio::spawn(async move {
                let _permit = match semaphore {
                    Some(semaphore) => match semaphore.acquire_owned().await {
                        Ok(permit) => Some(permit),
                        Err(e) => {
                            return CopyResult::Error {
                                source: task_file,
                                destination: output,
                                error: format!("Concurrency limiter closed: {}", e),
                            }
                        }
                    },
                    None => None,
                };
                let result = copy_into_extension_folder(task_file, output).await;
                log_copy_result(&result);
                result
            });
            (file, handle)
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for (file, handle) in handles {
        let result = handle.await.unwrap_or_else(|e| {
            let result = CopyResult::Error {
                source: file,
                destination: output.to_path_buf(),
                error: format!("Copy task failed: {}", e),
            };
            log_copy_result(&result);
            result
        });
        results.push(result);
    }

    results
}

fn log_copy_result(result: &CopyResult) {
    match result {
        CopyResult::Success {
            source,
            destination,
        } => info!("Copied {} to {}", source.display(), destination.display()),
        CopyResult::Error { source, error, .. } => {
            error!("Failed to copy {}: {}", source.display(), error)
        }
    }
}

fn create_sort_report(
    config: &SortConfig,
    results: Vec<CopyResult>,
    collisions: Vec<Collision>,
) -> SortReport {
    let mut report = SortReport::empty(&config.source, &config.output);
    report.files_discovered = results.len();
    report.collisions = collisions;

    for result in results {
        match result {
            CopyResult::Success { .. } => report.successful_copies += 1,
            CopyResult::Error {
                source,
                destination,
                error,
            } => report.errors.push(CopyError {
                source: source.to_string_lossy().to_string(),
                destination: destination.to_string_lossy().to_string(),
                error,
            }),
        }
    }

    report
}

/// Summary of a sort run
#[derive(Debug, Clone, Serialize)]
pub struct SortReport {
    pub source: String,
    pub output: String,
    pub files_discovered: usize,
    pub successful_copies: usize,
    pub errors: Vec<CopyError>,
    pub collisions: Vec<Collision>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SortReport {
    pub fn empty(source: &Path, output: &Path) -> Self {
        let now = Utc::now();
        Self {
            source: source.to_string_lossy().to_string(),
            output: output.to_string_lossy().to_string(),
            files_discovered: 0,
            successful_copies: 0,
            errors: Vec::new(),
            collisions: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }

    pub fn total_processed(&self) -> usize {
        self.successful_copies + self.errors.len()
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.total_processed();
        if total == 0 {
            0.0
        } else {
            self.successful_copies as f64 / total as f64
        }
    }

    /// Write the report to `path` as pretty-printed JSON
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize report")?;
        std::fs::write(path, json).with_context(|| format!("Failed to write report: {:?}", path))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CopyError {
    pub source: String,
    pub destination: String,
    pub error: String,
}

/// Several source files mapped to the same destination path
#[derive(Debug, Clone, Serialize)]
pub struct Collision {
    pub destination: String,
    pub sources: Vec<String>,
}
