use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "arbor",
    about = "Arbor: content-addressed directory snapshots and references",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Node configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// State directory; overrides `data_dir` from the config file
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create, inspect, or delete directory versions
    #[command(subcommand)]
    Directory(DirectoryCommand),
    /// Create, inspect, or delete references
    #[command(subcommand)]
    Reference(ReferenceCommand),
}

#[derive(Subcommand)]
pub enum DirectoryCommand {
    /// Create a directory version from a JSON file
    Create(FileArgs),
    /// Show a directory version
    Show(IdArgs),
    /// Check whether a directory version exists
    Exists(IdArgs),
    /// Show the recursive size of a directory version
    Size(IdArgs),
    /// List every directory version in the subtree
    List(ListArgs),
    /// Delete a directory version
    Delete(IdArgs),
}

#[derive(Subcommand)]
pub enum ReferenceCommand {
    /// Create (or overwrite) a reference from a JSON file
    Create(FileArgs),
    /// Show a reference
    Show(IdArgs),
    /// Delete a reference
    Delete(IdArgs),
}

#[derive(Args)]
pub struct FileArgs {
    /// JSON document to read, `-` for stdin
    pub path: PathBuf,
}

#[derive(Args)]
pub struct IdArgs {
    pub id: String,
}

#[derive(Args)]
pub struct ListArgs {
    pub id: String,
    /// Recompute instead of reading the cached listing
    #[arg(long)]
    pub force: bool,
}
