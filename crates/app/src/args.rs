pub use clap::Parser;

use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "solcipher", version)]
#[command(about = "Share files end-to-end encrypted, with access recorded on Solana")]
pub struct Args {
    /// Path to the solcipher state directory (defaults to ~/.solcipher)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    /// Log level for stderr output; RUST_LOG overrides it
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: LevelFilter,

    #[command(subcommand)]
    pub command: crate::Command,
}
