// CLI modules
mod args;
mod config;
mod op;
mod ops;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use args::Args;
use op::Op;
use ops::{Publish, Version};

command_enum! {
    (Publish, Publish),
    (Version, Version),
}

#[tokio::main]
async fn main() {
    // Quiet by default; RUST_LOG opts into diagnostics on stderr
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let ctx = op::OpContext::new(config::EnvConfig::load());

    match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
