//! Analysis stage entry point.
//!
//! Reads the danmu file written by the collect stage plus the pre-existing
//! word-frequency report, and overwrites both JSON artifacts.

use anyhow::Context;

use danmu_insight::{analyzer, config, storage};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    storage::require_file(config::DANMU_SAVE_PATH, "collect")?;
    let lines = storage::load_danmu_lines(config::DANMU_SAVE_PATH)?;
    println!("📖 Read {} danmu lines from {}", lines.len(), config::DANMU_SAVE_PATH);

    let summary = analyzer::analyze_lines(&lines);
    println!(
        "🧠 Scored {} lines, avg sentiment {:.3}",
        summary.total_danmu, summary.avg_sentiment_score
    );
    for (class, fraction) in &summary.sentiment_distribution {
        println!("   {}: {:.1}%", class, fraction * 100.0);
    }
    storage::write_json_artifact(config::SENTIMENT_JSON_PATH, &summary)?;

    let report = std::fs::read_to_string(config::WORD_FREQ_REPORT_PATH)
        .with_context(|| format!("failed to read report {}", config::WORD_FREQ_REPORT_PATH))?;
    let entries = analyzer::parse_word_freq_report(&report);
    println!("📖 Parsed {} word-frequency entries", entries.len());
    storage::write_json_artifact(config::WORD_FREQ_JSON_PATH, &entries)?;

    println!("✅ Analysis finished");
    Ok(())
}
