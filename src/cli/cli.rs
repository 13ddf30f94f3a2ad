use std::env;
use std::ffi::OsString;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process;

use clap::error::ErrorKind;
use clap::{ArgAction, Parser};

use crate::application::data::LogLevel;
use crate::mapping::NamingPolicy;

/// Converts YAML layout files into ActorFrame XML
#[derive(Parser, Debug, Clone)]
#[command(version, about, arg_required_else_help = true, disable_version_flag = true)]
pub struct Cli {
    /// Paths converted next to themselves: a file into its own directory,
    /// a directory into itself
    pub paths: Vec<PathBuf>,

    /// Input file or directory
    #[clap(long = "input", short = 'i', value_name = "PATH")]
    pub inputs: Vec<PathBuf>,

    /// Output file or directory, paired in order with the inputs.
    /// Defaults to the current directory
    #[clap(long = "output", short = 'o', value_name = "PATH")]
    pub outputs: Vec<PathBuf>,

    /// Keep running and convert files again as they change
    #[clap(long, short)]
    pub watch: bool,

    /// Fail on documents that do not fit the layer layout instead of rendering
    /// the offending parts empty
    #[clap(long)]
    pub strict: bool,

    /// How files found in an input directory are named in the output directory
    #[clap(long, default_value = "clear-stem", value_enum)]
    pub naming: NamingPolicy,

    /// Upper bound on conversions running at once in watch mode
    #[clap(long, default_value = "16")]
    pub max_concurrent: NonZeroUsize,

    #[clap(long, short, default_value = "warn", value_enum)]
    pub log_level: LogLevel,

    /// Print version
    #[clap(long, short = 'v', action = ArgAction::Version)]
    version: Option<bool>,
}

impl Cli {
    /// Parses the process arguments. Help and version output end the
    /// process with status 1.
    pub fn parse_or_exit() -> Self {
        match Self::try_parse_from(with_long_watch(env::args_os())) {
            Ok(cli) => cli,
            Err(err) => match err.kind() {
                ErrorKind::DisplayHelp
                | ErrorKind::DisplayVersion
                | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                    let _ = err.print();
                    process::exit(1);
                }
                _ => err.exit(),
            },
        }
    }
}

/// Spells the single-dash `-watch` as `--watch`. Clap would otherwise read
/// it as the cluster `-w -a -t -c -h`.
fn with_long_watch(args: impl IntoIterator<Item = OsString>) -> impl Iterator<Item = OsString> {
    args.into_iter().map(|arg| {
        if arg == "-watch" {
            OsString::from("--watch")
        } else {
            arg
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repeated_inputs_and_outputs() {
        let cli = Cli::try_parse_from([
            "actorframe", "-i", "a", "--input", "b", "-o", "x", "--watch",
        ])
        .unwrap();
        assert_eq!(cli.inputs, vec![PathBuf::from("a"), PathBuf::from("b")]);
        assert_eq!(cli.outputs, vec![PathBuf::from("x")]);
        assert!(cli.watch);
        assert!(cli.paths.is_empty());
    }

    #[test]
    fn bare_arguments_are_paths() {
        let cli = Cli::try_parse_from(["actorframe", "layouts", "menu.yaml"]).unwrap();
        assert_eq!(
            cli.paths,
            vec![PathBuf::from("layouts"), PathBuf::from("menu.yaml")]
        );
        assert!(!cli.watch);
        assert_eq!(cli.naming, NamingPolicy::ClearStem);
        assert_eq!(cli.max_concurrent.get(), 16);
    }

    #[test]
    fn accepts_optional_behaviour_flags() {
        let cli = Cli::try_parse_from([
            "actorframe",
            "-i",
            "a",
            "--strict",
            "--naming",
            "preserve-stem",
            "--max-concurrent",
            "2",
            "-l",
            "debug",
        ])
        .unwrap();
        assert!(cli.strict);
        assert_eq!(cli.naming, NamingPolicy::PreserveStem);
        assert_eq!(cli.max_concurrent.get(), 2);
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let result = Cli::try_parse_from(["actorframe", "a", "--max-concurrent", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn short_v_prints_version() {
        let err = Cli::try_parse_from(["actorframe", "-v"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayVersion);
    }

    #[test]
    fn no_arguments_asks_for_help() {
        let err = Cli::try_parse_from(["actorframe"]).unwrap_err();
        assert_eq!(
            err.kind(),
            ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
        );
    }

    #[test]
    fn single_dash_watch_is_accepted() {
        let args = ["actorframe", "-i", "layouts", "-watch"].map(OsString::from);
        let cli = Cli::try_parse_from(with_long_watch(args)).unwrap();
        assert!(cli.watch);
        assert_eq!(cli.inputs, vec![PathBuf::from("layouts")]);
    }

    #[test]
    fn other_arguments_pass_through_unchanged() {
        let args = ["actorframe", "-w", "watch", "--watch"].map(OsString::from);
        let rewritten: Vec<OsString> = with_long_watch(args.clone()).collect();
        assert_eq!(rewritten, args.to_vec());
    }
}
