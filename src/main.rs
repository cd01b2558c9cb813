use anyhow::Result;
use clap::Parser;
use docforge::cli;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    // Logging may not be up yet (bad config), so report on stderr directly.
    if let Err(err) = cli::dispatch(args).await {
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
    Ok(())
}
