//! CLI argument definitions using clap derive

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Bunch - dependency bundle cache
///
/// Keys installed dependencies by a fingerprint of the lockfile and stores
/// them in an S3-compatible bucket, so CI only reinstalls when the lockfile
/// changes.
#[derive(Parser, Debug)]
#[command(name = "bunch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "BUNCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local .bunch.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Pack the installed dependencies and upload them under the lockfile's key
    #[command(visible_alias = "publish")]
    Upload(UploadArgs),

    /// Download and unpack the dependencies cached for the lockfile
    #[command(visible_alias = "fetch")]
    Download(DownloadArgs),

    /// Print the fingerprint and artifact key for a lockfile
    Key(KeyArgs),

    /// Show whether a directory holds a downloaded bundle
    Status(StatusArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Which bundle a command works on
#[derive(Args, Debug, Clone, Default)]
pub struct BundleArgs {
    /// Key prefix (defaults to the project directory name)
    #[arg(long)]
    pub prefix: Option<String>,

    /// Bundle directory (defaults to the ecosystem's install directory)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Lockfile the key is derived from (detected when omitted)
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Platform discriminator (defaults to {os}-{arch})
    #[arg(long)]
    pub platform: Option<String>,
}

/// Object store access
#[derive(Args, Debug, Clone, Default)]
pub struct StoreArgs {
    /// S3 access key
    #[arg(long, env = "S3_KEY", hide_env_values = true)]
    pub s3_key: Option<String>,

    /// S3 secret key
    #[arg(long, env = "S3_SECRET", hide_env_values = true)]
    pub s3_secret: Option<String>,

    /// S3 bucket name
    #[arg(long, env = "S3_BUCKET")]
    pub s3_bucket: Option<String>,

    /// S3-compatible endpoint (e.g. http://localhost:9000 for MinIO)
    #[arg(long, env = "S3_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Signing region
    #[arg(long, env = "S3_REGION")]
    pub region: Option<String>,
}

/// Arguments for the upload command
#[derive(Parser, Debug)]
pub struct UploadArgs {
    #[command(flatten)]
    pub bundle: BundleArgs,

    #[command(flatten)]
    pub store: StoreArgs,

    /// Overwrite an artifact that already exists remotely
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the download command
#[derive(Parser, Debug)]
pub struct DownloadArgs {
    #[command(flatten)]
    pub bundle: BundleArgs,

    #[command(flatten)]
    pub store: StoreArgs,
}

/// Arguments for the key command
#[derive(Parser, Debug)]
pub struct KeyArgs {
    #[command(flatten)]
    pub bundle: BundleArgs,

    /// Bucket used to build the URL
    #[arg(long, env = "S3_BUCKET")]
    pub s3_bucket: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the status command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Directory to inspect (defaults to the ecosystem's install directory)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for key and status
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON output
    Json,
}
