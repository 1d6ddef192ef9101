use crate::demo::{run_demo, run_draft, DemoArgs, DraftArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use multa_desk::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Multa Desk",
    about = "Run the traffic-fine appeal back office or draft documents from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Fill the written-warning request from a reviewed field file and export it
    Draft(DraftArgs),
    /// Walk through upload, review, drafting, billing and feedback with sample data
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Draft(args) => run_draft(args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}
