//! Lexicon-based sentiment scoring for danmu text.
//!
//! Scores a line in [0, 1] (1 = most positive) by counting occurrences of
//! positive and negative lexicon phrases and Laplace-smoothing the ratio, so a
//! line with no sentiment words lands exactly on the neutral 0.5. Phrase
//! containment is used instead of word splitting because danmu are mostly
//! unsegmented Chinese.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config;

static POSITIVE_PHRASES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "好看", "好听", "好评", "太好", "真好", "最好", "厉害", "牛逼", "牛批",
        "太牛", "真牛", "强", "赞", "棒", "神仙", "封神", "绝了", "绝绝",
        "爱了", "喜欢", "可爱", "好笑", "笑死", "哈哈", "震撼", "感动", "泪目",
        "支持", "加油", "期待", "精彩", "优秀", "舒服", "治愈", "上头", "666",
        "awsl", "yyds", "good", "great", "nice", "love", "amazing", "best",
        "awesome", "perfect", "wonderful",
    ]
});

static NEGATIVE_PHRASES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "难看", "难听", "差评", "太差", "真差", "垃圾", "辣鸡", "拉胯", "离谱",
        "无语", "尴尬", "恶心", "讨厌", "失望", "难受", "难过", "生气", "气死",
        "吐了", "劝退", "避雷", "水平不行", "看不下去", "浪费", "无聊", "坑",
        "烂", "毒", "骗", "假", "bad", "terrible", "awful", "hate", "worst",
        "boring", "trash", "garbage", "fake",
    ]
});

/// Sentiment class derived from a score via fixed thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SentimentClass {
    Positive,
    Neutral,
    Negative,
}

impl SentimentClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentClass::Positive => "positive",
            SentimentClass::Neutral => "neutral",
            SentimentClass::Negative => "negative",
        }
    }
}

/// Scores `text` in [0, 1]. Empty or whitespace-only text is the neutral 0.5,
/// mirroring the scorer-exception default.
pub fn score_text(text: &str) -> f64 {
    let text = text.trim();
    if text.is_empty() {
        return 0.5;
    }

    let lowered = text.to_lowercase();
    let positive: usize = POSITIVE_PHRASES
        .iter()
        .map(|p| lowered.matches(p).count())
        .sum();
    let negative: usize = NEGATIVE_PHRASES
        .iter()
        .map(|p| lowered.matches(p).count())
        .sum();

    // Laplace smoothing keeps sentiment-free text at exactly 0.5 and a single
    // hit at 2/3 or 1/3, clear of both thresholds.
    (positive as f64 + 1.0) / ((positive + negative) as f64 + 2.0)
}

/// Applies the fixed thresholds: > 0.6 positive, < 0.4 negative, else neutral.
pub fn classify(score: f64) -> SentimentClass {
    if score > config::POSITIVE_THRESHOLD {
        SentimentClass::Positive
    } else if score < config::NEGATIVE_THRESHOLD {
        SentimentClass::Negative
    } else {
        SentimentClass::Neutral
    }
}
