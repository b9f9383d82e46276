use clap::Parser;
use user_admin_api::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => cli::serve::run(args).await,
        Command::CreateUser(args) => cli::create_user::run(args).await,
    }
}
