use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use snafu::prelude::*;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::mapping::{NamingPolicy, PathMapper};
use crate::sync::{ConversionObserver, ConversionOutcome, ConvertError};
use crate::transform::{TransformOptions, TreeTransformer};

/// An absolute source path and the destination it is converted into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPair {
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl SyncPair {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

/// Tally of one batch pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub written: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl BatchReport {
    fn record(&mut self, outcome: ConversionOutcome) {
        match outcome {
            ConversionOutcome::Written => self.written += 1,
            ConversionOutcome::Unchanged => self.unchanged += 1,
        }
    }

    pub fn converted(&self) -> usize {
        self.written + self.unchanged
    }
}

pub struct Synchronizer {
    mapper: PathMapper,
    transformer: TreeTransformer,
    observer: Rc<dyn ConversionObserver>,
}

impl Synchronizer {
    pub fn new(
        naming: NamingPolicy,
        transform_options: TransformOptions,
        observer: Rc<dyn ConversionObserver>,
    ) -> Self {
        Self {
            mapper: PathMapper::new(naming),
            transformer: TreeTransformer::new(transform_options),
            observer,
        }
    }

    pub fn mapper(&self) -> &PathMapper {
        &self.mapper
    }

    pub(crate) fn transformer(&self) -> &TreeTransformer {
        &self.transformer
    }

    pub(crate) fn observer(&self) -> &dyn ConversionObserver {
        self.observer.as_ref()
    }

    /// One batch pass over `pair`.
    ///
    /// A directory source is mirrored into a directory destination and per-file
    /// failures are logged and counted. A single file source fails on the first
    /// error, and so does a source that does not exist.
    pub async fn sync(&self, pair: &SyncPair) -> Result<BatchReport, SyncError> {
        let SyncPair {
            source,
            destination,
        } = pair;

        if !source.exists() {
            return Err(ConvertError::NotFoundError {
                path: source.clone(),
            })
            .context(ConversionSnafu);
        }

        if source.is_dir() {
            if !destination.is_dir() {
                warn!(
                    "Destination {} is not a directory, skipping directory {}",
                    destination.display(),
                    source.display()
                );
                return Ok(BatchReport::default());
            }
            return self.sync_directory(source, destination).await;
        }

        if !self.mapper.is_eligible(source) {
            warn!("{} is not a YAML file, nothing to convert", source.display());
            return Ok(BatchReport::default());
        }

        let target =
            self.mapper
                .single_file_destination(source, destination, destination.is_dir());
        let outcome = self
            .convert_one(source, &target)
            .await
            .context(ConversionSnafu)?;

        let mut report = BatchReport::default();
        report.record(outcome);
        Ok(report)
    }

    async fn sync_directory(
        &self,
        source_root: &Path,
        destination_root: &Path,
    ) -> Result<BatchReport, SyncError> {
        let files =
            list_files_recursive(source_root).context(ListDirectorySnafu { path: source_root })?;
        debug!("Found {} files under {}", files.len(), source_root.display());

        let mut report = BatchReport::default();
        let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::new();

        for file in files.iter().filter(|file| self.mapper.is_eligible(file)) {
            let Some(target) = self.mapper.mirror(source_root, destination_root, file) else {
                debug!("{} is outside {}, skipping", file.display(), source_root.display());
                continue;
            };

            if let Some(previous) = claimed.insert(target.clone(), file.clone()) {
                warn!(
                    "{} overwrites the output of {} at {}",
                    file.display(),
                    previous.display(),
                    target.display()
                );
            }

            match self.convert_one(file, &target).await {
                Ok(outcome) => report.record(outcome),
                Err(err) => {
                    error!("{}", snafu::Report::from_error(err));
                    report.failed += 1;
                }
            }
        }

        info!(
            "Synchronized {}: {} written, {} unchanged, {} failed",
            source_root.display(),
            report.written,
            report.unchanged,
            report.failed
        );
        Ok(report)
    }
}

/// All regular files below `root`, siblings in file name order. Symbolic
/// links are not followed.
pub fn list_files_recursive(root: &Path) -> Result<Vec<PathBuf>, walkdir::Error> {
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) if entry.file_type().is_file() => Some(Ok(entry.into_path())),
            Ok(_) => None,
            Err(err) => Some(Err(err)),
        })
        .collect()
}

#[derive(Debug, Snafu)]
pub enum SyncError {
    #[snafu(display("Conversion failed"))]
    ConversionError { source: ConvertError },
    #[snafu(display("Failed to list files under {}", path.display()))]
    ListDirectoryError {
        path: PathBuf,
        source: walkdir::Error,
    },
}
