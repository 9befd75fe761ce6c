mod client;
mod basic;
pub mod auth;

pub use client::HttpClient;
pub use basic::BasicClient;

use anyhow::{Context, Result};
use tracing::debug;

pub async fn fetch_bytes<C: HttpClient>(
    client: &C,
    url: &str,
) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(
        reqwest::Method::GET,
        url.parse()?,
    );

    let resp = client.execute(req).await?.error_for_status()?;
    Ok(resp.bytes().await?.to_vec())
}

/// Loads the contents of a local file path or fetches it over HTTP.
#[tracing::instrument(skip(client))]
pub async fn load_source<C: HttpClient>(client: &C, source: &str) -> Result<Vec<u8>> {
    let bytes = if source.starts_with("http://") || source.starts_with("https://") {
        fetch_bytes(client, source)
            .await
            .with_context(|| format!("Failed to fetch '{source}'"))?
    } else {
        tokio::fs::read(source)
            .await
            .with_context(|| format!("Failed to read '{source}'"))?
    };
    debug!(bytes = bytes.len(), "Source loaded");
    Ok(bytes)
}
