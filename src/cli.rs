use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "reqverify",
    version,
    about = "Requirement verification fragment assembly and reporting tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Assemble fragment JSON files into a verification report
    Assemble(AssembleArgs),
    /// Re-render a persisted report JSON as markdown
    Render(RenderArgs),
    /// Block until expected .done marker files appear on disk
    WaitDone(WaitDoneArgs),
}

#[derive(Args, Debug, Clone)]
pub struct AssembleArgs {
    /// Directory containing fragment JSON files
    #[arg(long)]
    pub fragments_dir: PathBuf,

    /// Path to the specification the fragments verify against
    #[arg(long)]
    pub spec_path: String,

    /// Path to the implementation root
    #[arg(long)]
    pub impl_path: String,

    /// Project name for the report header
    #[arg(long)]
    pub project_name: String,

    /// Output path for the JSON report (markdown is written alongside)
    #[arg(long)]
    pub output: PathBuf,

    /// Previous report JSON; switches to re-verification mode
    #[arg(long)]
    pub previous: Option<PathBuf>,

    /// Spec version string recorded in the report metadata
    #[arg(long, default_value = "")]
    pub spec_version: String,
}

#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    /// Persisted report JSON to render
    #[arg(long)]
    pub report: PathBuf,

    /// Markdown output path; defaults to the report path with .md extension
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct WaitDoneArgs {
    /// Directory to watch for .done files (use with --count)
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Number of .done files expected (required with --dir)
    #[arg(long)]
    pub count: Option<usize>,

    /// Specific marker file paths to wait for
    #[arg(long, num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// Maximum wait time in seconds
    #[arg(long, default_value_t = 600.0)]
    pub timeout: f64,

    /// Poll interval in seconds
    #[arg(long, default_value_t = 2.0)]
    pub interval: f64,
}
