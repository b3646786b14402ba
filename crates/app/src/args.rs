pub use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "quay")]
#[command(about = "Publish a directory tree as a web app on content-addressed storage")]
pub struct Args {
    #[command(subcommand)]
    pub command: crate::Command,
}
