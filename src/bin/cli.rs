use miette::Result;

#[tokio::main]
async fn main() -> Result<()> {
    mcp_workshop::install_crypto_provider();
    mcp_workshop::cli::run().await
}
