#[tokio::main]
async fn main() -> anyhow::Result<()> {
    lineage_cli::run().await?;
    Ok(())
}
