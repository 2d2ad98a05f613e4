//! CLI module for deep-research
//!
//! Provides command-line interface parsing for the deep-research binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod init;
pub mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// deep-research - iterative multi-source research assistant
#[derive(Parser, Debug)]
#[command(
    name = "deep-research",
    author = "Dirmacs <build@dirmacs.com>",
    version,
    about = "Iterative multi-source research with a local LLM",
    long_about = "Runs a research loop over web, video, encyclopedia and academic sources,\n\
                  keeps a running summary with a local LLM, and delivers the final report\n\
                  by email and chat webhook.",
    after_help = "EXAMPLES:\n    \
                  deep-research init                          # Write research.toml and .env.example\n    \
                  deep-research run \"quantum computing\"       # Research a topic\n    \
                  deep-research run \"rust async\" --max-loops 0 # Single cycle\n    \
                  deep-research config --validate             # Check the configuration"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "research.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Research a topic and print the final report
    Run {
        /// Research topic
        topic: String,

        /// Override `research.max_loops`
        #[arg(long)]
        max_loops: Option<u32>,

        /// Also write the report to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the run result as JSON instead of the rendered report
        #[arg(long)]
        json: bool,
    },

    /// Show configuration information
    Config {
        /// Show the full configuration
        #[arg(short = 'f', long)]
        full: bool,

        /// Validate the configuration file
        #[arg(long)]
        validate: bool,
    },

    /// Write a starter research.toml and .env.example
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite existing files
        #[arg(short, long)]
        force: bool,

        /// Web search backend to configure
        #[arg(long, value_enum, default_value_t = SearchBackend::Tavily)]
        search: SearchBackend,
    },
}

/// Web search backend written into a new research.toml
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SearchBackend {
    Tavily,
    Perplexity,
    Duckduckgo,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_with_overrides() {
        let cli = Cli::try_parse_from([
            "deep-research",
            "--config",
            "custom.toml",
            "run",
            "quantum computing",
            "--max-loops",
            "0",
        ])
        .unwrap();

        assert_eq!(cli.config, PathBuf::from("custom.toml"));
        match cli.command {
            Commands::Run {
                topic, max_loops, ..
            } => {
                assert_eq!(topic, "quantum computing");
                assert_eq!(max_loops, Some(0));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_default_config_path() {
        let cli = Cli::try_parse_from(["deep-research", "config", "--validate"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("research.toml"));
        assert!(matches!(cli.command, Commands::Config { validate: true, .. }));
    }

    #[test]
    fn test_init_search_backend_is_closed() {
        let cli = Cli::try_parse_from(["deep-research", "init", "--search", "perplexity"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Init { search: SearchBackend::Perplexity, .. }
        ));

        let cli = Cli::try_parse_from(["deep-research", "init"]).unwrap();
        assert!(matches!(cli.command, Commands::Init { search: SearchBackend::Tavily, .. }));

        assert!(Cli::try_parse_from(["deep-research", "init", "--search", "bing"]).is_err());
    }

    #[test]
    fn test_run_requires_topic() {
        assert!(Cli::try_parse_from(["deep-research", "run"]).is_err());
    }
}
