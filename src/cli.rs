use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// File integrity tool that records hash transitions in an append-only ledger
#[derive(Parser, Debug)]
#[command(name = "fileward", version, about, long_about = None)]
pub struct Cli {
    /// Change to this directory before doing anything else
    #[arg(short = 'C', global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Increase log verbosity (-v for info, -vv for debug)
    #[arg(
        short,
        long,
        global = true,
        action = ArgAction::Count,
        conflicts_with = "log_level"
    )]
    pub verbose: u8,

    /// Explicit log level (error, warn, info, debug, trace). Takes precedence over RUST_LOG.
    #[arg(long, global = true, value_name = "LEVEL", verbatim_doc_comment)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one monitoring pass over a file
    Check {
        /// File to monitor
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Ledger file recording hash transitions
        #[arg(long, value_name = "PATH", default_value = "hash_record.txt")]
        ledger: PathBuf,

        /// Directory holding first-observation copies
        #[arg(long, value_name = "DIR", default_value = "original_backup")]
        original_dir: PathBuf,

        /// Directory holding changed-revision copies
        #[arg(long, value_name = "DIR", default_value = "changed_files")]
        changed_dir: PathBuf,
    },

    /// Show the recorded hash history for a filename
    History {
        /// Base name as recorded in the ledger
        #[arg(value_name = "FILENAME")]
        filename: String,

        /// Ledger file recording hash transitions
        #[arg(long, value_name = "PATH", default_value = "hash_record.txt")]
        ledger: PathBuf,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
