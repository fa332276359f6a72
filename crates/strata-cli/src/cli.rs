use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "strata",
    about = "Strata: inspect and package project settings",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Project directory searched for settings
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Load this archive instead of searching
    #[arg(long, global = true)]
    pub main_pack: Option<PathBuf>,

    /// Loader configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Treat a feature tag as active (repeatable)
    #[arg(short = 'f', long = "feature", global = true)]
    pub features: Vec<String>,

    /// Search parent directories for the project
    #[arg(long, global = true)]
    pub upwards: bool,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print a setting's stored value
    Get(NameArgs),
    /// Print a setting's value after feature overrides
    Resolve(NameArgs),
    /// List settings in insertion order
    List(ListArgs),
    /// Convert a real path to a project:// path
    Localize(PathArgs),
    /// Convert a project:// or user:// path to a real path
    Globalize(PathArgs),
    /// Build an archive from a directory
    Pack(PackArgs),
    /// Append an archive to an executable
    Embed(EmbedArgs),
    /// Check the project's features against this build
    Features(FeaturesArgs),
    /// Write customized settings to a file
    Save(SaveArgs),
}

#[derive(Args)]
pub struct NameArgs {
    pub name: String,
}

#[derive(Args)]
pub struct ListArgs {
    /// Only list settings whose name starts with this prefix
    #[arg(long)]
    pub prefix: Option<String>,
}

#[derive(Args)]
pub struct PathArgs {
    pub path: String,
}

#[derive(Args)]
pub struct PackArgs {
    /// Directory to archive
    pub source: PathBuf,
    /// Archive to write
    pub output: PathBuf,
    #[arg(long, default_value = "3")]
    pub level: i32,
}

#[derive(Args)]
pub struct EmbedArgs {
    pub executable: PathBuf,
    pub archive: PathBuf,
    pub output: PathBuf,
}

#[derive(Args)]
pub struct FeaturesArgs {
    /// Check against a 64-bit-real build
    #[arg(long)]
    pub double_precision: bool,
    /// Drop unsupported features and print the trimmed list
    #[arg(long)]
    pub trim: bool,
}

#[derive(Args)]
pub struct SaveArgs {
    pub path: String,
}
