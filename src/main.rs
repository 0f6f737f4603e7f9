#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = eit_rust::run().await {
        eprintln!("eit-rust fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
