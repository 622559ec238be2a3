//! On-disk formats shared by the three stages.
//!
//! Danmu are stored one per line as `"<n>. <content>"`, replies as delimited
//! labeled blocks, analysis results as pretty-printed JSON. Every save is a
//! full overwrite; each file is rendered to a buffer first so a failed write
//! never leaves a partially-formatted file behind mid-record.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::collector::Reply;

/// Writes the danmu file, 1-based index, period-space separator.
pub fn save_danmu(path: &str, danmu: &[String]) -> Result<()> {
    let mut buf = String::new();
    for (idx, content) in danmu.iter().enumerate() {
        let _ = writeln!(buf, "{}. {}", idx + 1, content);
    }
    fs::write(path, buf).with_context(|| format!("failed to write danmu file {}", path))?;
    println!("💾 Saved {} danmu to {}", danmu.len(), path);
    Ok(())
}

/// Writes the reply file as human-readable labeled blocks.
pub fn save_replies(path: &str, replies: &[Reply]) -> Result<()> {
    let mut buf = String::new();
    for (idx, reply) in replies.iter().enumerate() {
        let _ = writeln!(buf, "===== 评论 {} =====", idx + 1);
        let _ = writeln!(buf, "用户名：{}", reply.author);
        let _ = writeln!(buf, "发布时间：{}", reply.published_at);
        let _ = writeln!(buf, "点赞数：{} | 回复数：{}", reply.likes, reply.reply_count);
        let _ = writeln!(buf, "评论内容：{}", reply.message);
        let _ = writeln!(buf);
    }
    fs::write(path, buf).with_context(|| format!("failed to write reply file {}", path))?;
    println!("💾 Saved {} replies to {}", replies.len(), path);
    Ok(())
}

/// Reads the danmu file as raw lines, order preserved.
pub fn load_danmu_lines(path: &str) -> Result<Vec<String>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read danmu file {}", path))?;
    Ok(text.lines().map(str::to_string).collect())
}

/// Strips the leading line number from a raw danmu line.
///
/// Content is everything after the first literal `.`, trimmed; a line without
/// a `.` is returned whole, trimmed. Content that itself starts with a dotted
/// number ("3.5 stars") loses its head to the same rule; that quirk is part of
/// the file contract and is kept.
pub fn parse_line_content(line: &str) -> String {
    match line.find('.') {
        Some(pos) => line[pos + 1..].trim().to_string(),
        None => line.trim().to_string(),
    }
}

pub fn write_json_artifact<T: Serialize>(path: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("failed to serialize artifact {}", path))?;
    fs::write(path, json).with_context(|| format!("failed to write artifact {}", path))?;
    println!("💾 Wrote artifact {}", path);
    Ok(())
}

pub fn read_json_artifact<T: DeserializeOwned>(path: &str) -> Result<T> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read artifact {}", path))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse artifact {}", path))
}

/// Existence check used by the server startup sequencing contract.
pub fn require_file(path: &str, produced_by: &str) -> Result<()> {
    if Path::new(path).exists() {
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "{} not found — run the {} stage first",
            path,
            produced_by
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> String {
        std::env::temp_dir()
            .join(format!("danmu_insight_{}_{}", std::process::id(), name))
            .to_string_lossy()
            .into_owned()
    }

    #[test]
    fn line_without_dot_is_returned_trimmed() {
        assert_eq!(parse_line_content("  just text  "), "just text");
    }

    #[test]
    fn line_with_index_prefix_is_stripped() {
        assert_eq!(parse_line_content("12. hello world"), "hello world");
    }

    #[test]
    fn content_with_early_dot_is_truncated_at_it() {
        // Known quirk of the line format: the first dot always wins.
        assert_eq!(parse_line_content("3.5 stars!"), "5 stars!");
    }

    #[test]
    fn danmu_round_trip_preserves_order_and_indexing() {
        let path = temp_path("danmu_roundtrip.txt");
        let danmu = vec!["第一条".to_string(), "second".to_string()];
        save_danmu(&path, &danmu).unwrap();

        let lines = load_danmu_lines(&path).unwrap();
        assert_eq!(lines, vec!["1. 第一条", "2. second"]);
        assert_eq!(parse_line_content(&lines[1]), "second");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn reply_blocks_are_delimited_and_labeled() {
        let path = temp_path("replies.txt");
        let replies = vec![Reply {
            author: "alice".to_string(),
            message: "不错".to_string(),
            published_at: "2024-01-01 12:00:00".to_string(),
            likes: 7,
            reply_count: 2,
        }];
        save_replies(&path, &replies).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("===== 评论 1 =====\n"));
        assert!(text.contains("用户名：alice\n"));
        assert!(text.contains("点赞数：7 | 回复数：2\n"));
        assert!(text.ends_with("评论内容：不错\n\n"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_file_error_names_the_producing_stage() {
        let err = require_file("definitely_missing.json", "analyze").unwrap_err();
        assert!(err.to_string().contains("analyze"));
    }
}
