//! Collection stage: cid resolution, danmu XML fetch, reply pagination.
//!
//! All requests go through one reqwest client with browser-like headers (the
//! view/reply APIs reject plain clients) and a 10 second timeout. The reply
//! pagination loop is generic over a per-page fetch closure so its termination
//! rules can be exercised without a network.

use std::future::Future;

use anyhow::{anyhow, Context, Result};
use chrono::{Local, TimeZone};
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::header::{HeaderMap, HeaderValue, REFERER, USER_AGENT};
use serde::Deserialize;
use tokio::time::sleep;

use crate::config;

/// One threaded comment-section message.
#[derive(Debug, Clone)]
pub struct Reply {
    pub author: String,
    pub message: String,
    pub published_at: String,
    pub likes: u64,
    pub reply_count: u64,
}

/// One parsed page of the reply API.
#[derive(Debug)]
pub struct ReplyPage {
    pub code: i64,
    pub message: String,
    pub replies: Vec<Reply>,
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    code: i64,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ViewData {
    cid: u64,
}

#[derive(Debug, Deserialize)]
struct ReplyData {
    #[serde(default)]
    replies: Option<Vec<RawReply>>,
}

#[derive(Debug, Deserialize)]
struct RawReply {
    #[serde(default)]
    member: Option<RawMember>,
    #[serde(default)]
    content: Option<RawContent>,
    #[serde(default)]
    ctime: i64,
    #[serde(default)]
    like: u64,
    #[serde(default)]
    rcount: u64,
}

#[derive(Debug, Deserialize)]
struct RawMember {
    #[serde(default)]
    uname: String,
}

#[derive(Debug, Deserialize)]
struct RawContent {
    #[serde(default)]
    message: String,
}

/// Builds the shared HTTP client.
pub fn http_client() -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(config::USER_AGENT));
    headers.insert(REFERER, HeaderValue::from_static(config::REFERER));

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(config::REQUEST_TIMEOUT)
        .build()
        .context("failed to build HTTP client")
}

/// Resolves the internal cid for a BV id. Any failure here is fatal to the
/// whole collection run.
pub async fn resolve_cid(client: &reqwest::Client, bv_id: &str) -> Result<u64> {
    let response = client
        .get(config::VIEW_API_URL)
        .query(&[("bvid", bv_id)])
        .send()
        .await
        .context("view API request failed")?
        .error_for_status()
        .context("view API returned an HTTP error")?;

    let envelope: ApiEnvelope<ViewData> = response
        .json()
        .await
        .context("view API returned malformed JSON")?;

    if envelope.code != 0 {
        return Err(anyhow!("view API error {}: {}", envelope.code, envelope.message));
    }

    let cid = envelope
        .data
        .map(|d| d.cid)
        .ok_or_else(|| anyhow!("view API response has no cid"))?;

    println!("✅ Resolved cid {} for {}", cid, bv_id);
    Ok(cid)
}

/// Fetches the danmu XML stream. Any failure yields an empty list so the run
/// can continue to the reply stage.
pub async fn fetch_danmu(client: &reqwest::Client, cid: u64) -> Vec<String> {
    let url = format!("{}/{}.xml", config::DANMU_XML_URL, cid);
    let body = match fetch_danmu_xml(client, &url).await {
        Ok(body) => body,
        Err(e) => {
            eprintln!("⚠️ Danmu fetch failed: {:#}", e);
            return Vec::new();
        }
    };

    match parse_danmu_xml(&body) {
        Ok(danmu) => {
            println!("✅ Fetched {} danmu", danmu.len());
            danmu
        }
        Err(e) => {
            eprintln!("⚠️ Danmu XML parse failed: {:#}", e);
            Vec::new()
        }
    }
}

async fn fetch_danmu_xml(client: &reqwest::Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .await
        .context("danmu request failed")?
        .error_for_status()
        .context("danmu endpoint returned an HTTP error")?;
    response.text().await.context("danmu body read failed")
}

/// Extracts the text of every `<d>` element, trimmed, empties dropped.
pub fn parse_danmu_xml(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut danmu = Vec::new();
    let mut in_d = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                in_d = e.name().as_ref() == b"d";
            }
            Ok(Event::End(_)) => {
                in_d = false;
            }
            Ok(Event::Text(t)) if in_d => {
                let text = t.unescape().context("bad danmu text node")?;
                let text = text.trim();
                if !text.is_empty() {
                    danmu.push(text.to_string());
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(anyhow!("danmu XML parse error: {}", e)),
        }
    }
    Ok(danmu)
}

/// Fetches all reply pages for a cid.
pub async fn fetch_replies(client: &reqwest::Client, cid: u64) -> Vec<Reply> {
    paginate_replies(|page| fetch_reply_page(client, cid, page)).await
}

async fn fetch_reply_page(client: &reqwest::Client, cid: u64, page: u32) -> Result<ReplyPage> {
    // The trailing millisecond timestamp busts intermediate caches.
    let cache_bust = chrono::Utc::now().timestamp_millis().to_string();
    let next = page.to_string();
    let oid = cid.to_string();
    let response = client
        .get(config::REPLY_API_URL)
        .query(&[
            ("jsonp", "jsonp"),
            ("next", next.as_str()),
            ("type", "1"),
            ("oid", oid.as_str()),
            ("mode", "3"),
            ("plat", "1"),
            ("_", cache_bust.as_str()),
        ])
        .send()
        .await
        .context("reply API request failed")?
        .error_for_status()
        .context("reply API returned an HTTP error")?;

    let body = response
        .text()
        .await
        .context("reply API body read failed")?;
    parse_reply_page(&body)
}

/// Parses one reply API response body into a [`ReplyPage`].
pub fn parse_reply_page(body: &str) -> Result<ReplyPage> {
    let envelope: ApiEnvelope<ReplyData> =
        serde_json::from_str(body).context("reply API returned malformed JSON")?;

    let replies = envelope
        .data
        .and_then(|d| d.replies)
        .unwrap_or_default()
        .into_iter()
        .map(|raw| Reply {
            author: raw
                .member
                .map(|m| m.uname)
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| "未知用户".to_string()),
            message: raw
                .content
                .map(|c| c.message.trim().to_string())
                .unwrap_or_default(),
            published_at: format_publish_time(raw.ctime),
            likes: raw.like,
            reply_count: raw.rcount,
        })
        .collect();

    Ok(ReplyPage {
        code: envelope.code,
        message: envelope.message,
        replies,
    })
}

fn format_publish_time(ctime: i64) -> String {
    Local
        .timestamp_opt(ctime, 0)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "1970-01-01 00:00:00".to_string())
}

/// Drives the pagination loop over a per-page fetch.
///
/// Stops on the first empty page (natural end), on a non-zero API code, when
/// the page cap is reached, or after `MAX_PAGE_ATTEMPTS` consecutive failures
/// on one page (backoff doubles per attempt). Replies with empty message text
/// are dropped; termination is judged on the raw page, not the filtered one.
pub async fn paginate_replies<F, Fut>(mut fetch_page: F) -> Vec<Reply>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<ReplyPage>>,
{
    let mut collected = Vec::new();
    let mut page: u32 = 0;
    let mut attempts: u32 = 0;

    while page < config::MAX_REPLY_PAGES {
        match fetch_page(page).await {
            Ok(reply_page) => {
                attempts = 0;
                if reply_page.code != 0 {
                    eprintln!(
                        "⚠️ Reply API error {} on page {}: {}",
                        reply_page.code, page, reply_page.message
                    );
                    break;
                }
                if reply_page.replies.is_empty() {
                    println!("✅ All reply pages fetched");
                    break;
                }
                collected.extend(
                    reply_page
                        .replies
                        .into_iter()
                        .filter(|r| !r.message.is_empty()),
                );
                println!(
                    "📄 Fetched reply page {}, {} replies so far",
                    page + 1,
                    collected.len()
                );
                page += 1;
                sleep(config::PAGE_SLEEP).await;
            }
            Err(e) => {
                attempts += 1;
                if attempts >= config::MAX_PAGE_ATTEMPTS {
                    eprintln!(
                        "❌ Giving up on reply page {} after {} attempts: {:#}",
                        page, attempts, e
                    );
                    break;
                }
                let backoff = config::RETRY_SLEEP * (1u32 << (attempts - 1));
                eprintln!(
                    "⚠️ Reply page {} failed (attempt {}), retrying in {:?}: {:#}",
                    page, attempts, backoff, e
                );
                sleep(backoff).await;
            }
        }
    }

    collected
}
