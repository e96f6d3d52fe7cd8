//! Outbound HTTP: the shared reqwest client and the JSON REST client built on it.

pub mod client;
pub mod rest;

pub use client::HttpClient;
pub use rest::{ApiError, Listing, Query, Record, RestClient};
