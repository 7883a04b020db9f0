#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = examcreate_rust::run_worker().await {
        eprintln!("examcreate-worker fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
