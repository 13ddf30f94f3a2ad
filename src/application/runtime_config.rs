use std::env;
use std::num::NonZeroUsize;
use std::path::Path;

use snafu::prelude::*;
use tracing::warn;

use crate::cli::Cli;
use crate::mapping::{NamingPolicy, resolve_absolute};
use crate::sync::SyncPair;
use crate::transform::TransformOptions;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub pairs: Vec<SyncPair>,
    pub watch: bool,
    pub transform: TransformOptions,
    pub naming: NamingPolicy,
    pub max_concurrent: NonZeroUsize,
}

impl RuntimeConfig {
    /// Pairs `-i` inputs with `-o` outputs by position, then adds every bare
    /// path as its own output. All paths are made absolute against `cwd`.
    pub fn from_cli(cli: Cli, cwd: &Path) -> Self {
        if cli.outputs.len() > cli.inputs.len() {
            warn!(
                "{} output(s) have no matching input and are ignored",
                cli.outputs.len() - cli.inputs.len()
            );
        }

        let explicit = cli.inputs.iter().enumerate().map(|(index, input)| {
            let output = cli.outputs.get(index).map_or(cwd, |output| output.as_path());
            SyncPair::new(resolve_absolute(input, cwd), resolve_absolute(output, cwd))
        });

        let in_place = cli.paths.iter().map(|path| {
            let source = resolve_absolute(path, cwd);
            let destination = match source.parent() {
                Some(parent) if source.is_file() => parent.to_path_buf(),
                _ => source.clone(),
            };
            SyncPair::new(source, destination)
        });

        Self {
            pairs: explicit.chain(in_place).collect(),
            watch: cli.watch,
            transform: TransformOptions { strict: cli.strict },
            naming: cli.naming,
            max_concurrent: cli.max_concurrent,
        }
    }
}

impl TryFrom<Cli> for RuntimeConfig {
    type Error = RuntimeConfigError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let cwd = env::current_dir().context(CurrentDirSnafu)?;
        Ok(Self::from_cli(cli, &cwd))
    }
}

#[derive(Debug, Snafu)]
pub enum RuntimeConfigError {
    #[snafu(display("Failed to obtain current dir"))]
    CurrentDirError { source: std::io::Error },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn config(args: &[&str], cwd: &Path) -> RuntimeConfig {
        let cli = Cli::try_parse_from(std::iter::once("actorframe").chain(args.iter().copied()))
            .expect("Arguments should parse");
        RuntimeConfig::from_cli(cli, cwd)
    }

    #[test]
    fn inputs_pair_with_outputs_in_order() {
        let cwd = Path::new("/work");
        let config = config(&["-i", "a", "-o", "/abs/x", "-i", "b", "-o", "y"], cwd);
        assert_eq!(
            config.pairs,
            vec![
                SyncPair::new("/work/a", "/abs/x"),
                SyncPair::new("/work/b", "/work/y"),
            ]
        );
    }

    #[test]
    fn missing_output_defaults_to_cwd() {
        let cwd = Path::new("/work");
        let config = config(&["-i", "layouts", "-i", "../other"], cwd);
        assert_eq!(
            config.pairs,
            vec![
                SyncPair::new("/work/layouts", "/work"),
                SyncPair::new("/other", "/work"),
            ]
        );
    }

    #[test]
    fn bare_paths_convert_next_to_themselves() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let cwd = temp_dir.path();
        std::fs::create_dir(cwd.join("screens")).unwrap();
        std::fs::write(cwd.join("menu.yaml"), "Name: menu").unwrap();

        let config = config(&["screens", "menu.yaml"], cwd);

        assert_eq!(
            config.pairs,
            vec![
                SyncPair::new(cwd.join("screens"), cwd.join("screens")),
                SyncPair::new(cwd.join("menu.yaml"), PathBuf::from(cwd)),
            ]
        );
    }

    #[test]
    fn flags_reach_the_config() {
        let config = config(
            &["-i", "a", "-w", "--strict", "--naming", "preserve-stem"],
            Path::new("/work"),
        );
        assert!(config.watch);
        assert!(config.transform.strict);
        assert_eq!(config.naming, NamingPolicy::PreserveStem);
    }
}
