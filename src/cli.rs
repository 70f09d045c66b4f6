use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "profiles")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Render, diff and converge profile installations", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: ~/.config/profiles/config.toml)
    #[arg(long, global = true, env = "PROFILES_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the objects an instance expands into
    Render(RenderArgs),

    /// Show what a reconcile would create or update
    Diff(ManifestArgs),

    /// Store the instance and converge its objects
    Reconcile(ManifestArgs),

    /// Show readiness of an instance's objects
    Status(ManifestArgs),

    /// Delete a stored instance and every object it owns
    Delete(DeleteArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct ManifestArgs {
    /// ProfileDefinition manifest (YAML or JSON)
    #[arg(short, long)]
    pub definition: PathBuf,

    /// ProfileInstance manifest (YAML or JSON)
    #[arg(short, long)]
    pub instance: PathBuf,
}

#[derive(Args)]
pub struct RenderArgs {
    #[command(flatten)]
    pub manifests: ManifestArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub output: OutputFormat,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Instance name
    pub name: String,

    /// Instance namespace (default: the configured namespace)
    #[arg(short, long)]
    pub namespace: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Yaml,
    Json,
}
