use std::io;
use std::path::{Path, PathBuf};
use std::string::FromUtf8Error;

use compio::fs;
use derive_more::Display;
use snafu::prelude::*;
use tracing::{debug, info};

use crate::document::{DocumentError, GenericNode};
use crate::sync::Synchronizer;
use crate::transform::SchemaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ConversionOutcome {
    #[display("written")]
    Written,
    /// The destination already held the same bytes, nothing was written
    #[display("unchanged")]
    Unchanged,
}

impl Synchronizer {
    /// Converts one YAML file and writes the XML to `destination`,
    /// creating missing parent directories.
    pub async fn convert_one(
        &self,
        source: &Path,
        destination: &Path,
    ) -> Result<ConversionOutcome, ConvertError> {
        debug!("Converting {} to {}", source.display(), destination.display());

        let bytes = match fs::read(source).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return NotFoundSnafu { path: source }.fail();
            }
            Err(err) => return Err(err).context(ReadSnafu { path: source }),
        };
        let text = String::from_utf8(bytes).context(InvalidUtf8Snafu { path: source })?;
        let document = GenericNode::parse(&text).context(ParseSnafu { path: source })?;
        let xml = self
            .transformer()
            .transform_to_xml(&document)
            .context(SchemaViolationSnafu { path: source })?;

        let outcome = if Self::holds_same_content(destination, xml.as_bytes()).await {
            ConversionOutcome::Unchanged
        } else {
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent)
                    .await
                    .context(CreateDirSnafu { path: parent })?;
            }
            fs::write(destination, xml.into_bytes())
                .await
                .0
                .context(WriteSnafu { path: destination })?;
            ConversionOutcome::Written
        };

        info!(
            "{} -> {} ({outcome})",
            source.display(),
            destination.display()
        );
        self.observer().converted(source, destination, outcome);
        Ok(outcome)
    }

    async fn holds_same_content(destination: &Path, content: &[u8]) -> bool {
        match fs::read(destination).await {
            Ok(existing) => existing == content,
            Err(_) => false,
        }
    }
}

#[derive(Debug, Snafu)]
pub enum ConvertError {
    #[snafu(display("\"{}\" is not found", path.display()))]
    NotFoundError { path: PathBuf },
    #[snafu(display("Failed to read {}", path.display()))]
    ReadError { path: PathBuf, source: io::Error },
    #[snafu(display("{} is not valid UTF-8", path.display()))]
    InvalidUtf8Error {
        path: PathBuf,
        source: FromUtf8Error,
    },
    #[snafu(display("Failed to parse {}", path.display()))]
    ParseError {
        path: PathBuf,
        source: DocumentError,
    },
    #[snafu(display("{} does not fit the layout structure", path.display()))]
    SchemaViolationError { path: PathBuf, source: SchemaError },
    #[snafu(display("Failed to create directory {}", path.display()))]
    CreateDirError { path: PathBuf, source: io::Error },
    #[snafu(display("Failed to write {}", path.display()))]
    WriteError { path: PathBuf, source: io::Error },
}

#[cfg(test)]
impl ConvertError {
    pub fn path(&self) -> &Path {
        match self {
            ConvertError::NotFoundError { path }
            | ConvertError::ReadError { path, .. }
            | ConvertError::InvalidUtf8Error { path, .. }
            | ConvertError::ParseError { path, .. }
            | ConvertError::SchemaViolationError { path, .. }
            | ConvertError::CreateDirError { path, .. }
            | ConvertError::WriteError { path, .. } => path,
        }
    }
}
