//! # Club Arena
//!
//! Leaderboards and charts for a Lichess club's arena tournament series.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (tournaments, leaderboards, aliases)
//! - **fetch**: Lichess API client and NDJSON decoding
//! - **ingest**: Tournament listing, result caching and extraction
//! - **calculate**: Leaderboard aggregation
//! - **storage**: Filesystem operations (result cache, JSONL tables)
//! - **chart**: SVG chart rendering
//! - **sync**: End-to-end refresh pipeline
//! - **config**: Configuration loading and validation

pub mod calculate;
pub mod chart;
pub mod config;
pub mod fetch;
pub mod ingest;
pub mod models;
pub mod storage;
pub mod sync;

pub use models::*;
