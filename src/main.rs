use clap::Parser;
use wx_ingestor::cli::{run, Cli};
use wx_ingestor::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli).await
}
