//! Collection stage entry point.

use danmu_insight::{collector, config, storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    println!("🚀 Collecting data for video {}", config::BV_ID);
    let client = collector::http_client()?;

    // cid resolution failure is fatal: nothing is written.
    let cid = collector::resolve_cid(&client, config::BV_ID).await?;

    let danmu = collector::fetch_danmu(&client, cid).await;
    if !danmu.is_empty() {
        if let Err(e) = storage::save_danmu(config::DANMU_SAVE_PATH, &danmu) {
            eprintln!("❌ Danmu save failed: {:#}", e);
        }
    }

    let replies = collector::fetch_replies(&client, cid).await;
    if !replies.is_empty() {
        if let Err(e) = storage::save_replies(config::REPLY_SAVE_PATH, &replies) {
            eprintln!("❌ Reply save failed: {:#}", e);
        }
    }

    println!("✅ Collection finished: {} danmu, {} replies", danmu.len(), replies.len());
    Ok(())
}
