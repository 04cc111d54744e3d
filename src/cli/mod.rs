//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};

/// Skip-aware test execution engine
#[derive(Parser, Debug)]
#[command(name = "skipaware")]
#[command(author = "hephaex@gmail.com")]
#[command(version)]
#[command(about = "Run test suites with generative tests, tag selection and post-mortem debugging")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (searched in standard locations when omitted)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the built-in suites
    Run(RunArgs),

    /// List suites and their cases
    List(ListArgs),

    /// Inspect or clear the restart ledger
    Ledger(LedgerArgs),

    /// View stored runs
    Results(ResultsArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only print the final report
    #[arg(short, long)]
    pub quiet: bool,

    /// Stop on first failure or error
    #[arg(short = 'x', long = "exitfirst")]
    pub exit_first: bool,

    /// Offer post-mortem debugging of failures after the run
    #[arg(long)]
    pub pdb: bool,

    /// Only run cases whose tags match this expression
    #[arg(short = 'm', long = "match")]
    pub tag_match: Option<String>,

    /// Only run cases or named sub-tests containing this text
    #[arg(short = 'k', long)]
    pub pattern: Option<String>,

    /// Skip cases that succeeded in the previous exit-first run
    #[arg(short, long)]
    pub restart: bool,

    /// Restart ledger location
    #[arg(long)]
    pub restart_file: Option<String>,

    /// Run profile (ci, debug, quick or one from the config file)
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Suites to run (all when omitted)
    #[arg(short, long, value_delimiter = ',')]
    pub suite: Vec<String>,

    /// Report format (text, json, json-pretty, summary)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Export the run to a file (.json or .csv)
    #[arg(short, long)]
    pub export: Option<String>,

    /// Store the run in the results directory
    #[arg(long)]
    pub save: bool,

    /// Disable colored status line
    #[arg(long)]
    pub no_color: bool,
}

/// Arguments for list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Show tags and descriptions
    #[arg(short, long)]
    pub detailed: bool,

    /// Only list cases whose tags match this expression
    #[arg(short = 'm', long = "match")]
    pub tag_match: Option<String>,
}

/// Arguments for ledger command
#[derive(Parser, Debug)]
pub struct LedgerArgs {
    #[command(subcommand)]
    pub action: LedgerAction,

    /// Restart ledger location
    #[arg(long, global = true)]
    pub restart_file: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum LedgerAction {
    /// Print recorded case ids
    Show,

    /// Remove the ledger file
    Clear,
}

/// Arguments for results command
#[derive(Parser, Debug)]
pub struct ResultsArgs {
    /// Show the most recent run in full
    #[arg(short, long)]
    pub latest: bool,

    /// Show a specific run
    #[arg(long)]
    pub id: Option<String>,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,

    /// Export the selected run to a file (.json or .csv)
    #[arg(short, long)]
    pub export: Option<String>,
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write an example configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "./skipaware.yaml")]
        output: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration
    Show {
        /// Show environment variable overrides instead
        #[arg(long)]
        env: bool,

        /// Output format (yaml, json)
        #[arg(short, long, default_value = "yaml")]
        format: String,
    },

    /// Validate a configuration file
    Validate {
        /// File to validate (standard locations when omitted)
        file: Option<String>,
    },

    /// List run profiles
    Profiles {
        /// Show every field
        #[arg(short, long)]
        detailed: bool,
    },

    /// Describe the SKIPAWARE_* environment variables
    Env,
}
