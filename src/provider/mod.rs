pub mod api_football;
pub mod client;
pub mod models;

#[cfg(test)]
pub(crate) mod fake;

pub use api_football::{ApiFootballClient, FootballApi};
pub use client::{delay, fetch_with_retry, RetryPolicy};
