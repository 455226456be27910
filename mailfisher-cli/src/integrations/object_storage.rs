use crate::config::StorageConfig;
use anyhow::{bail, Context, Result};
use std::path::Path;

/// Bucket URL for an object key
pub fn object_url(storage: &StorageConfig, key: &str) -> String {
    format!(
        "{}/{}/{}",
        storage.endpoint.trim_end_matches('/'),
        storage.bucket.trim_matches('/'),
        key
    )
}

/// PUTs the file under its file name
pub async fn upload_file(storage: &StorageConfig, path: &Path) -> Result<String> {
    let key = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{:?} has no file name", path))?;
    let body = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {:?}", path))?;

    let url = object_url(storage, &key);
    let client = reqwest::Client::new();
    let mut request = client
        .put(&url)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body(body);
    if let Some(token) = &storage.token {
        request = request.bearer_auth(token);
    }

    let response = request.send().await.context("upload request")?;
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        bail!("upload to {} failed: {} {}", url, status, text);
    }

    Ok(url)
}
