#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = examcreate_rust::run().await {
        eprintln!("examcreate-rust fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
