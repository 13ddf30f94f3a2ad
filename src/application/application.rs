use std::path::PathBuf;
use std::rc::Rc;

use futures::future::try_join_all;
use snafu::Snafu;
use snafu::prelude::*;
use tracing::{debug, info, warn};

use crate::application::{RuntimeConfig, RuntimeConfigError};
use crate::cli::Cli;
use crate::sync::{ConsoleObserver, ConversionObserver, SyncError, Synchronizer, WatchError};

pub struct Application;

impl Application {
    pub async fn run(cli: Cli) -> Result<(), ApplicationError> {
        let config = RuntimeConfig::try_from(cli).context(ConfigSnafu)?;
        debug!("Runtime config: {:?}", config);

        Self::run_with(config, Rc::new(ConsoleObserver::new())).await
    }

    /// Batch pass over every pair, then watch mode if requested
    pub async fn run_with(
        config: RuntimeConfig,
        observer: Rc<dyn ConversionObserver>,
    ) -> Result<(), ApplicationError> {
        let synchronizer = Synchronizer::new(config.naming, config.transform, observer);

        let mut failed = 0;
        for pair in &config.pairs {
            let report = synchronizer.sync(pair).await.context(BatchSnafu {
                path: pair.source.clone(),
            })?;
            info!(
                "{} file(s) converted from {}",
                report.converted(),
                pair.source.display()
            );
            failed += report.failed;
        }

        if !config.watch {
            ensure!(failed == 0, BatchFailuresSnafu { failed });
            return Ok(());
        }

        if failed > 0 {
            warn!("{failed} file(s) failed to convert, watching anyway");
        }
        info!("Entering watch mode for {} path(s)", config.pairs.len());

        let watches = config
            .pairs
            .iter()
            .map(|pair| synchronizer.watch(pair, config.max_concurrent));
        try_join_all(watches).await.context(WatchModeSnafu)?;

        Ok(())
    }
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("Critical failure encountered during configuration stage"))]
    ConfigError { source: RuntimeConfigError },
    #[snafu(display("Failed to synchronize {}", path.display()))]
    BatchError { path: PathBuf, source: SyncError },
    #[snafu(display("{} file(s) failed to convert", failed))]
    BatchFailuresError { failed: usize },
    #[snafu(display("Critical failure encountered in watch mode"))]
    WatchModeError { source: WatchError },
}
