mod args;
mod clients;
mod logging;
mod op;
mod ops;
mod state;

use args::Args;
use clap::{Parser, Subcommand};
use op::Op;
use ops::{Cleanup, Init, Register, Upload, Version, View, WalletAddress};
use state::EnvOverrides;

command_enum! {
    (Init, Init),
    (Address, WalletAddress),
    (Upload, Upload),
    (Register, Register),
    (View, View),
    (Cleanup, Cleanup),
    (Version, Version),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let guard = logging::init_logging(args.log_level);

    // environment is read once; everything downstream gets it explicitly
    let ctx = op::OpContext::new(args.config_path, EnvOverrides::from_env());

    match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("Error: {}", e);
            drop(guard);
            std::process::exit(1);
        }
    }
}
