//! Command-line argument parsing for penlight
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// penlight - run scripted eye examinations against a simulated world
#[derive(Parser, Debug)]
#[command(name = "penlight")]
#[command(version)]
#[command(about = "Skill-gated, interruptible pen light eye examinations", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress all output except the final report)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a scenario script
    Run {
        /// Scenario TOML file
        scenario: PathBuf,

        /// Override the dice seed
        #[arg(long)]
        seed: Option<u64>,

        /// Pace ticks against the wall clock
        #[arg(long)]
        realtime: bool,

        /// Print interface payloads as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Parse and validate a scenario without running it
    Check {
        /// Scenario TOML file
        scenario: PathBuf,
    },

    /// Display current configuration
    Config,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }

    /// Reject contradictory flags
    pub fn validate(&self) -> Result<(), String> {
        if self.quiet && self.verbose > 0 {
            return Err("Cannot combine --quiet with --verbose.".to_string());
        }
        Ok(())
    }
}

impl Verbosity {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
            Verbosity::VeryVerbose => "very_verbose",
        }
    }

    /// Parse the config file spelling
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "quiet" => Some(Verbosity::Quiet),
            "normal" => Some(Verbosity::Normal),
            "verbose" => Some(Verbosity::Verbose),
            "very_verbose" => Some(Verbosity::VeryVerbose),
            _ => None,
        }
    }

    /// Check if should show detailed events
    pub fn show_events(&self) -> bool {
        matches!(self, Verbosity::Verbose | Verbosity::VeryVerbose)
    }

    /// Tracing filter directive for this level
    pub fn filter_directive(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "warn",
            Verbosity::Verbose => "info",
            Verbosity::VeryVerbose => "debug",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(verbose: u8, quiet: bool) -> Args {
        Args {
            config: None,
            verbose,
            quiet,
            command: Commands::Config,
        }
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(args(0, true).verbosity(), Verbosity::Quiet);
        assert_eq!(args(0, false).verbosity(), Verbosity::Normal);
        assert_eq!(args(1, false).verbosity(), Verbosity::Verbose);
        assert_eq!(args(3, false).verbosity(), Verbosity::VeryVerbose);
    }

    #[test]
    fn test_validate_quiet_and_verbose() {
        assert!(args(0, true).validate().is_ok());
        assert!(args(1, true).validate().is_err());
    }

    #[test]
    fn test_parse_run_command() {
        let parsed = Args::try_parse_from(["penlight", "-v", "run", "demo.toml", "--seed", "9"]).unwrap();
        assert_eq!(parsed.verbosity(), Verbosity::Verbose);
        match parsed.command {
            Commands::Run {
                scenario,
                seed,
                realtime,
                json,
            } => {
                assert_eq!(scenario, PathBuf::from("demo.toml"));
                assert_eq!(seed, Some(9));
                assert!(!realtime);
                assert!(!json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_verbosity_methods() {
        assert!(!Verbosity::Normal.show_events());
        assert!(Verbosity::Verbose.show_events());
        assert_eq!(Verbosity::from_name("verbose"), Some(Verbosity::Verbose));
        assert_eq!(Verbosity::from_name("loud"), None);
        assert_eq!(Verbosity::VeryVerbose.filter_directive(), "debug");
        assert_eq!(Verbosity::Quiet.as_str(), "quiet");
    }
}
