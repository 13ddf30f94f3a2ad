//! Keeps destination XML files in step with their YAML sources.
//!
//! [`Synchronizer::sync`] performs one batch pass over a [`SyncPair`];
//! [`Synchronizer::watch`] then reacts to filesystem changes below the
//! source, converting each touched file again. Both go through
//! [`Synchronizer::convert_one`].

mod converter;
mod observer;
mod synchronizer;
mod watch;

pub use converter::{ConversionOutcome, ConvertError};
pub use observer::{ConsoleObserver, ConversionObserver};
pub use synchronizer::{SyncError, SyncPair, Synchronizer};
pub use watch::WatchError;

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;
    use std::path::{Path, PathBuf};
    use std::rc::Rc;

    use super::*;
    use crate::mapping::NamingPolicy;
    use crate::transform::TransformOptions;

    type Record = (PathBuf, PathBuf, ConversionOutcome);

    #[derive(Debug, Default)]
    pub(crate) struct RecordingObserver {
        records: RefCell<Vec<Record>>,
    }

    impl RecordingObserver {
        pub(crate) fn records(&self) -> Vec<Record> {
            self.records.borrow().clone()
        }
    }

    impl ConversionObserver for RecordingObserver {
        fn converted(&self, source: &Path, destination: &Path, outcome: ConversionOutcome) {
            self.records.borrow_mut().push((
                source.to_path_buf(),
                destination.to_path_buf(),
                outcome,
            ));
        }
    }

    pub(crate) fn synchronizer(observer: &Rc<RecordingObserver>) -> Synchronizer {
        Synchronizer::new(
            NamingPolicy::default(),
            TransformOptions::default(),
            observer.clone(),
        )
    }
}
