use clap::{Parser, Subcommand};
use std::path::PathBuf;


#[derive(Subcommand, Clone, Copy, Debug, Eq, PartialEq)]
pub enum Command {
    /// Index transactions into the partitioned table store
    Transactions,
    /// Upload raw blocks into the blob store
    Blocks
}


#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Importer config file
    #[arg(short, long, value_name = "FILE", global = true, default_value = "importer.json")]
    pub config: PathBuf,

    /// Overrides the checkpoint file from the config
    #[arg(long, value_name = "FILE", global = true)]
    pub progress_file: Option<PathBuf>,

    /// Overrides the number of write workers
    #[arg(long, value_name = "N", global = true)]
    pub workers: Option<usize>,

    /// Whether the logs should be structured in JSON format
    #[arg(long, global = true)]
    pub json_log: bool,

    /// Port to use for built-in prometheus metrics server
    #[arg(long, global = true)]
    pub prom_port: Option<u16>,
}
