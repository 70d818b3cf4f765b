use clap::Parser;
use keygate::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Auth(args) => cli::auth::run(args).await,
        Command::Items(args) => cli::items::run(args).await,
        Command::Standalone(args) => cli::standalone::run(args).await,
    }
}
