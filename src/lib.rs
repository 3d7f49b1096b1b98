//! Social feed backend library.
//!
//! Users register and sign in, publish public or private posts, comment with
//! one level of replies, and like posts or comments. Like counts, comment
//! counts and the viewer's like state are derived from SQLite on every read.

// Allow raw string hashes for safety - they're harmless and prevent issues if content changes
#![allow(clippy::needless_raw_string_hashes)]

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod web;
