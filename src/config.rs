//! Embedded configuration.
//!
//! Every stage runs with no flags and no environment variables; the video id,
//! file paths and tuning knobs live here as constants.

use std::time::Duration;

/// Target video BV id (taken from the video page URL).
pub const BV_ID: &str = "BV1w7UsBZErd";

// File handoff between the three stages. The collector writes the two text
// files, the analyzer writes the two JSON artifacts, the server reads
// everything except the reply file.
pub const DANMU_SAVE_PATH: &str = "bilibili_danmu.txt";
pub const REPLY_SAVE_PATH: &str = "bilibili_comment.txt";
pub const WORD_FREQ_REPORT_PATH: &str = "word_freq_report.txt";
pub const WORD_FREQ_JSON_PATH: &str = "word_freq_data.json";
pub const SENTIMENT_JSON_PATH: &str = "sentiment_data.json";
pub const INDEX_HTML_PATH: &str = "static/index.html";

pub const BIND_ADDR: &str = "0.0.0.0:5000";

// Bilibili endpoints. The reply API calls the cid "oid".
pub const VIEW_API_URL: &str = "https://api.bilibili.com/x/web-interface/view";
pub const REPLY_API_URL: &str = "https://api.bilibili.com/x/v2/reply/main";
pub const DANMU_XML_URL: &str = "https://comment.bilibili.com";

// Browser-like headers, the view/reply APIs 403 plain clients.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const REFERER: &str = "https://www.bilibili.com/";

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Hard cap on reply pages, the natural stop is an empty page.
pub const MAX_REPLY_PAGES: u32 = 100;
/// Courtesy delay between successful reply pages.
pub const PAGE_SLEEP: Duration = Duration::from_secs(1);
/// Base backoff after a failed page fetch; doubles per attempt.
pub const RETRY_SLEEP: Duration = Duration::from_secs(3);
/// Attempts per page before the pagination loop gives up.
pub const MAX_PAGE_ATTEMPTS: u32 = 3;

// Sentiment classification thresholds, strict comparisons:
// score > 0.6 is positive, score < 0.4 is negative, everything else neutral.
pub const POSITIVE_THRESHOLD: f64 = 0.6;
pub const NEGATIVE_THRESHOLD: f64 = 0.4;

/// Sample size carried in the sentiment artifact.
pub const SAMPLE_LIMIT: usize = 100;
/// Synthetic time axis: line i maps to (i - 1) % TIME_MODULUS.
pub const TIME_MODULUS: u32 = 1000;
/// Trend bin width over the synthetic [0, 1000) axis, 20 bins.
pub const TREND_BIN_WIDTH: u32 = 50;

pub const SEARCH_DEFAULT_LIMIT: usize = 50;
/// Word-frequency endpoint never returns more entries than this.
pub const TOP_WORDS_LIMIT: usize = 100;
