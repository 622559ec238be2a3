//! Analysis stage: per-line sentiment aggregation and word-report parsing.
//!
//! Consumes the danmu text file written by the collector and a pre-existing
//! tab-separated word-frequency report, and produces the two JSON artifacts
//! the server loads. Lines carry no real timestamps, so a synthetic time axis
//! `(i - 1) % 1000` stands in for them; it only exists to feed the trend
//! chart on the front-end.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config;
use crate::sentiment::{self, SentimentClass};
use crate::storage;

/// One scored danmu line.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SentimentRecord {
    pub content: String,
    pub sentiment_score: f64,
    pub sentiment_type: SentimentClass,
    pub time: u32,
}

/// One point of the positivity trend over the synthetic time axis.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrendPoint {
    pub bin_start: u32,
    pub bin_end: u32,
    pub positive_ratio: f64,
}

/// The sentiment artifact, written whole each run.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SentimentSummary {
    pub total_danmu: usize,
    /// Class name to fraction of all lines, 3 decimal places.
    pub sentiment_distribution: BTreeMap<String, f64>,
    pub avg_sentiment_score: f64,
    /// First 100 records, synthetic time attached.
    pub sample_danmu: Vec<SentimentRecord>,
    pub positive_trend: Vec<TrendPoint>,
}

/// One row of the word-frequency artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WordFreqEntry {
    pub word: String,
    pub freq: i64,
    pub pos: String,
}

/// Synthetic time for the 1-based line index `i`.
pub fn synthetic_time(index: usize) -> u32 {
    ((index - 1) % config::TIME_MODULUS as usize) as u32
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Scores every raw danmu line and aggregates the sentiment artifact.
pub fn analyze_lines(lines: &[String]) -> SentimentSummary {
    let records: Vec<SentimentRecord> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let content = storage::parse_line_content(line);
            let score = sentiment::score_text(&content);
            SentimentRecord {
                sentiment_type: sentiment::classify(score),
                sentiment_score: score,
                time: synthetic_time(i + 1),
                content,
            }
        })
        .collect();

    let total = records.len();
    let mut distribution = BTreeMap::new();
    for class in [
        SentimentClass::Positive,
        SentimentClass::Neutral,
        SentimentClass::Negative,
    ] {
        let count = records.iter().filter(|r| r.sentiment_type == class).count();
        let fraction = if total > 0 {
            round3(count as f64 / total as f64)
        } else {
            0.0
        };
        distribution.insert(class.as_str().to_string(), fraction);
    }

    let avg = if total > 0 {
        round3(records.iter().map(|r| r.sentiment_score).sum::<f64>() / total as f64)
    } else {
        0.0
    };

    let trend = positive_trend(&records);
    let sample: Vec<SentimentRecord> =
        records.into_iter().take(config::SAMPLE_LIMIT).collect();

    SentimentSummary {
        total_danmu: total,
        sentiment_distribution: distribution,
        avg_sentiment_score: avg,
        sample_danmu: sample,
        positive_trend: trend,
    }
}

/// Buckets records into fixed-width bins over [0, 1000) and computes the
/// per-bin fraction of positive lines, 0.0 for empty bins.
pub fn positive_trend(records: &[SentimentRecord]) -> Vec<TrendPoint> {
    let bins = config::TIME_MODULUS / config::TREND_BIN_WIDTH;
    (0..bins)
        .map(|bin| {
            let start = bin * config::TREND_BIN_WIDTH;
            let end = start + config::TREND_BIN_WIDTH;
            let in_bin: Vec<&SentimentRecord> = records
                .iter()
                .filter(|r| r.time >= start && r.time < end)
                .collect();
            let ratio = if in_bin.is_empty() {
                0.0
            } else {
                let positive = in_bin
                    .iter()
                    .filter(|r| r.sentiment_type == SentimentClass::Positive)
                    .count();
                round3(positive as f64 / in_bin.len() as f64)
            };
            TrendPoint {
                bin_start: start,
                bin_end: end,
                positive_ratio: ratio,
            }
        })
        .collect()
}

/// Parses the tab-separated word-frequency report.
///
/// The first two lines are banner text and always dropped, as is any repeated
/// column-header line (one containing both 词语 and 词频). Remaining non-blank
/// lines need at least two tab fields with an integer second field; anything
/// else is silently skipped. A missing third field means the POS tag is
/// "unknown".
pub fn parse_word_freq_report(text: &str) -> Vec<WordFreqEntry> {
    text.lines()
        .skip(2)
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !(line.contains("词语") && line.contains("词频")))
        .filter_map(|line| {
            let parts: Vec<&str> = line.trim().split('\t').collect();
            if parts.len() < 2 {
                return None;
            }
            let freq: i64 = parts[1].trim().parse().ok()?;
            Some(WordFreqEntry {
                word: parts[0].to_string(),
                freq,
                pos: parts
                    .get(2)
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(contents: &[&str]) -> Vec<String> {
        contents
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{}. {}", i + 1, c))
            .collect()
    }

    #[test]
    fn synthetic_time_wraps_at_modulus() {
        assert_eq!(synthetic_time(1), 0);
        assert_eq!(synthetic_time(1001), 0);
        assert_eq!(synthetic_time(1500), 499);
    }

    #[test]
    fn summary_counts_and_distribution_sum_to_one() {
        let summary = analyze_lines(&lines(&["太好看了", "今天星期三", "太垃圾了"]));
        assert_eq!(summary.total_danmu, 3);
        assert_eq!(summary.sentiment_distribution["positive"], 0.333);
        assert_eq!(summary.sentiment_distribution["neutral"], 0.333);
        assert_eq!(summary.sentiment_distribution["negative"], 0.333);
        assert_eq!(summary.sample_danmu.len(), 3);
        assert_eq!(summary.sample_danmu[0].time, 0);
        assert_eq!(summary.sample_danmu[2].time, 2);
    }

    #[test]
    fn sample_is_capped_at_one_hundred() {
        let many: Vec<String> = (1..=150).map(|i| format!("{}. 弹幕{}", i, i)).collect();
        let summary = analyze_lines(&many);
        assert_eq!(summary.total_danmu, 150);
        assert_eq!(summary.sample_danmu.len(), 100);
    }

    #[test]
    fn empty_input_produces_zeroed_summary() {
        let summary = analyze_lines(&[]);
        assert_eq!(summary.total_danmu, 0);
        assert_eq!(summary.avg_sentiment_score, 0.0);
        assert_eq!(summary.sentiment_distribution["positive"], 0.0);
        assert_eq!(summary.positive_trend.len(), 20);
    }

    #[test]
    fn trend_has_twenty_bins_with_empty_bins_at_zero() {
        // 60 positive lines land in bins [0,50) and [50,100); the rest empty.
        let many: Vec<String> = (1..=60).map(|i| format!("{}. 太好看了", i)).collect();
        let summary = analyze_lines(&many);
        let trend = &summary.positive_trend;
        assert_eq!(trend.len(), 20);
        assert_eq!(trend[0].bin_start, 0);
        assert_eq!(trend[0].bin_end, 50);
        assert_eq!(trend[0].positive_ratio, 1.0);
        assert_eq!(trend[1].positive_ratio, 1.0);
        assert_eq!(trend[2].positive_ratio, 0.0);
        assert_eq!(trend[19].bin_end, 1000);
    }

    #[test]
    fn report_rows_parse_word_freq_and_pos() {
        let report = "高频词统计报告\n====================\n词语\t词频\t词性\n研究\t120\t名词\n学习\t80\n";
        let entries = parse_word_freq_report(report);
        assert_eq!(
            entries[0],
            WordFreqEntry {
                word: "研究".to_string(),
                freq: 120,
                pos: "名词".to_string()
            }
        );
        assert_eq!(entries[1].pos, "unknown");
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn report_drops_non_numeric_and_short_rows() {
        let report = "banner\n====\n研究\tabc\t名词\n单列\n正常\t5\n";
        let entries = parse_word_freq_report(report);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].word, "正常");
    }

    #[test]
    fn repeated_column_header_is_dropped_anywhere() {
        let report = "banner\n====\n研究\t120\n词语\t词频\t词性\n学习\t80\n";
        let entries = parse_word_freq_report(report);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].word, "研究");
        assert_eq!(entries[1].word, "学习");
    }
}
