//! HTTP transport for the control-plane API

pub mod client;

pub use client::{join_url, HttpClient, HttpClientBuilder, RawResponse, API_VERSION_HEADER};
