// ABOUTME: Command line surface of the direnvoy binary
// ABOUTME: clap derive definitions for global flags and subcommands

use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "direnvoy",
    version,
    about = "Imports directory-scoped environments via direnv"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to the config file (defaults to ~/.config/direnvoy/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Import the directory's declaration file and print what changed
    Import {
        /// Project directory
        #[arg(default_value = ".")]
        dir: PathBuf,
    },

    /// Import the directory's environment, then run a command in it
    Exec {
        /// Project directory
        dir: PathBuf,

        /// Command and arguments to run
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<OsString>,
    },

    /// Approve the directory's declaration file, then import it
    Allow {
        /// Project directory
        #[arg(default_value = ".")]
        dir: PathBuf,
    },

    /// Show whether the directory has a declaration file
    Status {
        /// Project directory
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exec_collects_trailing_args() {
        let cli = Cli::parse_from(["direnvoy", "exec", "/proj", "make", "-j4", "test"]);
        match cli.command {
            Command::Exec { dir, command } => {
                assert_eq!(dir, PathBuf::from("/proj"));
                assert_eq!(command, ["make", "-j4", "test"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_import_defaults_to_current_directory() {
        let cli = Cli::parse_from(["direnvoy", "import"]);
        match cli.command {
            Command::Import { dir } => assert_eq!(dir, PathBuf::from(".")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_verbosity_accumulates() {
        let cli = Cli::parse_from(["direnvoy", "-vv", "status"]);
        assert_eq!(cli.verbose, 2);
    }
}
