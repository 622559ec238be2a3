//! Read-only HTTP API over the precomputed artifacts.
//!
//! Everything the handlers serve is loaded once at startup into an immutable
//! [`AppState`] and shared behind an `Arc`; nothing mutates after load, so
//! concurrent requests need no locking. The sentiment artifact is kept as raw
//! JSON and returned verbatim.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::analyzer::WordFreqEntry;
use crate::config;
use crate::storage;

/// Immutable per-process context, built once at startup.
pub struct AppState {
    pub word_freq: Vec<WordFreqEntry>,
    pub sentiment: serde_json::Value,
    /// Parsed content of every danmu line, file order, index = position + 1.
    pub danmu_contents: Vec<String>,
}

/// Loads the three artifacts, enforcing the stage sequencing contract.
pub fn load_state() -> anyhow::Result<AppState> {
    storage::require_file(config::WORD_FREQ_JSON_PATH, "analyze")?;
    storage::require_file(config::SENTIMENT_JSON_PATH, "analyze")?;
    storage::require_file(config::DANMU_SAVE_PATH, "collect")?;

    let word_freq: Vec<WordFreqEntry> =
        storage::read_json_artifact(config::WORD_FREQ_JSON_PATH)?;
    let sentiment: serde_json::Value =
        storage::read_json_artifact(config::SENTIMENT_JSON_PATH)?;
    let danmu_contents: Vec<String> = storage::load_danmu_lines(config::DANMU_SAVE_PATH)?
        .iter()
        .map(|line| storage::parse_line_content(line))
        .collect();

    println!(
        "📦 Loaded {} word entries, {} danmu lines",
        word_freq.len(),
        danmu_contents.len()
    );
    Ok(AppState {
        word_freq,
        sentiment,
        danmu_contents,
    })
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WordFrequencyResponse {
    pub status: String,
    pub data: Vec<WordFreqEntry>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SentimentDataResponse {
    pub status: String,
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchParams {
    /// Substring to look for, matched literally.
    #[serde(default)]
    pub keyword: String,
    /// Maximum number of hits returned, default 50.
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SearchHit {
    /// 1-based line number in the danmu file.
    pub index: usize,
    pub content: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResponse {
    pub status: String,
    pub keyword: String,
    /// True match count over the whole file, which can exceed `data.len()`.
    pub total: usize,
    pub data: Vec<SearchHit>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    pub status: String,
    pub message: String,
}

impl ApiError {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            status: "error".to_string(),
            message: message.to_string(),
        })
    }
}

/// Top word-frequency entries, capped at 100, stored order.
#[utoipa::path(
    get,
    path = "/api/word-frequency",
    tag = "danmu",
    responses((status = 200, description = "Top word-frequency entries", body = WordFrequencyResponse))
)]
pub async fn word_frequency(State(state): State<Arc<AppState>>) -> Json<WordFrequencyResponse> {
    let top: Vec<WordFreqEntry> = state
        .word_freq
        .iter()
        .take(config::TOP_WORDS_LIMIT)
        .cloned()
        .collect();
    Json(WordFrequencyResponse {
        status: "success".to_string(),
        data: top,
    })
}

/// The sentiment artifact, verbatim.
#[utoipa::path(
    get,
    path = "/api/sentiment-data",
    tag = "danmu",
    responses((status = 200, description = "Sentiment summary artifact", body = SentimentDataResponse))
)]
pub async fn sentiment_data(State(state): State<Arc<AppState>>) -> Json<SentimentDataResponse> {
    Json(SentimentDataResponse {
        status: "success".to_string(),
        data: state.sentiment.clone(),
    })
}

/// Literal substring search over danmu contents, file order.
#[utoipa::path(
    get,
    path = "/api/search",
    tag = "danmu",
    params(SearchParams),
    responses(
        (status = 200, description = "Matches with true total", body = SearchResponse),
        (status = 200, description = "Missing keyword", body = ApiError)
    )
)]
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, Json<ApiError>> {
    if params.keyword.is_empty() {
        return Err(ApiError::new("keyword parameter is required"));
    }
    let limit = params.limit.unwrap_or(config::SEARCH_DEFAULT_LIMIT);

    let pattern =
        Regex::new(&regex::escape(&params.keyword)).map_err(|_| ApiError::new("bad keyword"))?;

    let mut total = 0;
    let mut hits = Vec::new();
    for (i, content) in state.danmu_contents.iter().enumerate() {
        if pattern.is_match(content) {
            total += 1;
            if hits.len() < limit {
                hits.push(SearchHit {
                    index: i + 1,
                    content: content.clone(),
                });
            }
        }
    }

    Ok(Json(SearchResponse {
        status: "success".to_string(),
        keyword: params.keyword,
        total,
        data: hits,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_danmu(contents: &[&str]) -> Arc<AppState> {
        Arc::new(AppState {
            word_freq: Vec::new(),
            sentiment: serde_json::json!({}),
            danmu_contents: contents.iter().map(|s| s.to_string()).collect(),
        })
    }

    fn state_with_words(count: usize) -> Arc<AppState> {
        Arc::new(AppState {
            word_freq: (0..count)
                .map(|i| WordFreqEntry {
                    word: format!("词{}", i),
                    freq: (count - i) as i64,
                    pos: "unknown".to_string(),
                })
                .collect(),
            sentiment: serde_json::json!({}),
            danmu_contents: Vec::new(),
        })
    }

    #[tokio::test]
    async fn word_frequency_is_capped_at_one_hundred() {
        let Json(body) = word_frequency(State(state_with_words(250))).await;
        assert_eq!(body.status, "success");
        assert_eq!(body.data.len(), 100);
        // Stored order, not re-sorted.
        assert_eq!(body.data[0].word, "词0");
    }

    #[tokio::test]
    async fn word_frequency_returns_all_when_under_cap() {
        let Json(body) = word_frequency(State(state_with_words(7))).await;
        assert_eq!(body.data.len(), 7);
    }

    #[tokio::test]
    async fn sentiment_data_returns_artifact_verbatim() {
        let artifact = serde_json::json!({"total_danmu": 3, "avg_sentiment_score": 0.512});
        let state = Arc::new(AppState {
            word_freq: Vec::new(),
            sentiment: artifact.clone(),
            danmu_contents: Vec::new(),
        });
        let Json(body) = sentiment_data(State(state)).await;
        assert_eq!(body.data, artifact);
    }

    #[tokio::test]
    async fn search_caps_hits_but_reports_true_total() {
        let state = state_with_danmu(&["I love cats", "dogs are great", "I love dogs"]);
        let params = SearchParams {
            keyword: "love".to_string(),
            limit: Some(1),
        };
        let Json(body) = search(State(state), Query(params)).await.unwrap();
        assert_eq!(body.status, "success");
        assert_eq!(body.keyword, "love");
        // Two matches exist in the file; only one is returned.
        assert_eq!(body.total, 2);
        assert_eq!(body.data.len(), 1);
        assert_eq!(body.data[0].index, 1);
        assert_eq!(body.data[0].content, "I love cats");
    }

    #[tokio::test]
    async fn search_matches_literally_not_as_regex() {
        let state = state_with_danmu(&["price is 3.5", "price is 345"]);
        let params = SearchParams {
            keyword: "3.5".to_string(),
            limit: None,
        };
        let Json(body) = search(State(state), Query(params)).await.unwrap();
        assert_eq!(body.total, 1);
        assert_eq!(body.data[0].index, 1);
    }

    #[tokio::test]
    async fn empty_keyword_is_a_structured_error() {
        let state = state_with_danmu(&["anything"]);
        let params = SearchParams {
            keyword: String::new(),
            limit: None,
        };
        let Json(err) = search(State(state), Query(params)).await.unwrap_err();
        assert_eq!(err.status, "error");
        assert!(!err.message.is_empty());
    }

    #[tokio::test]
    async fn search_uses_default_limit_of_fifty() {
        let contents: Vec<String> = (0..80).map(|i| format!("弹幕 {}", i)).collect();
        let refs: Vec<&str> = contents.iter().map(String::as_str).collect();
        let state = state_with_danmu(&refs);
        let params = SearchParams {
            keyword: "弹幕".to_string(),
            limit: None,
        };
        let Json(body) = search(State(state), Query(params)).await.unwrap();
        assert_eq!(body.total, 80);
        assert_eq!(body.data.len(), 50);
    }
}
