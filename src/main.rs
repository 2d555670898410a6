use anyhow::Result;
use charchat::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
