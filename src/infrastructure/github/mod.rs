//! GitHub 연동 모듈.

mod client;
mod retry;

pub use client::GitHubClient;
