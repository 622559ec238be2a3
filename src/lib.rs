//! Bilibili danmu/reply scraping, sentiment analytics, and a read-only API.
//!
//! Three stages connected only through files on disk, run strictly in
//! sequence: `collect` writes the raw text files, `analyze` writes the JSON
//! artifacts, the default binary serves them over HTTP.

pub mod analyzer;
pub mod api;
pub mod collector;
pub mod config;
pub mod sentiment;
pub mod storage;
