use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stackscope")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Profile a codebase and fingerprint its technology stack")]
#[command(long_about = "Counts code, comment and blank lines per language, classifies the \
    languages as frontend, backend, desktop or other, and detects frameworks and components \
    (with versions) from declarative YAML rules.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE", env = "STACKSCOPE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a project and display its stack profile
    Analyze {
        /// Path to the project directory to analyze
        #[arg(value_name = "PROJECT_PATH")]
        path: PathBuf,

        /// Directory of rules that extend or override the built-in ones
        #[arg(long, value_name = "DIR")]
        rules: Option<PathBuf>,

        /// Write the report as JSON to this file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Print the report in JSON format
        #[arg(short, long, conflicts_with = "summary")]
        json: bool,

        /// Print a condensed summary
        #[arg(short, long)]
        summary: bool,
    },

    /// Show detectable frameworks and components
    Support {
        /// Show only frameworks
        #[arg(long)]
        frameworks: bool,

        /// Show only components
        #[arg(long)]
        components: bool,

        /// Directory of rules that extend or override the built-in ones
        #[arg(long, value_name = "DIR")]
        rules: Option<PathBuf>,
    },
}

impl Cli {
    /// Initialize logging based on verbosity level
    pub fn init_logging(&self) {
        if self.quiet {
            return;
        }

        let level = match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };

        env_logger::Builder::from_default_env()
            .filter_level(level)
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_analyze() {
        let args = ["stackscope", "-vv", "analyze", "./app", "--summary", "--rules", "r"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Analyze { path, rules, summary, json, .. } => {
                assert_eq!(path, PathBuf::from("./app"));
                assert_eq!(rules, Some(PathBuf::from("r")));
                assert!(summary);
                assert!(!json);
            }
            Commands::Support { .. } => panic!("expected analyze"),
        }

        let conflicting = ["stackscope", "analyze", ".", "--json", "--summary"];
        assert!(Cli::try_parse_from(conflicting).is_err());
    }
}
