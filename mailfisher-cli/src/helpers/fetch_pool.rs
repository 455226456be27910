use crate::integrations::MailSource;
use shared_types::RawMessage;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Fetches every id with at most `workers` requests in flight. A failed fetch
/// is logged and skipped; results keep the order of `ids`.
pub async fn fetch_messages(
    source: Arc<dyn MailSource>,
    ids: Vec<String>,
    fetch_body: bool,
    workers: usize,
) -> Vec<RawMessage> {
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let mut tasks = JoinSet::new();

    for (index, id) in ids.into_iter().enumerate() {
        let source = source.clone();
        let semaphore = semaphore.clone();

        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            let fetch_id = id.clone();
            let result =
                tokio::task::spawn_blocking(move || source.fetch(&fetch_id, fetch_body)).await;
            (index, id, result)
        });
    }

    let mut fetched = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, _, Ok(Ok(message)))) => fetched.push((index, message)),
            Ok((_, id, Ok(Err(e)))) => {
                tracing::warn!("Failed to fetch message {}: {}", id, e);
            }
            Ok((_, id, Err(e))) => {
                tracing::error!("Fetch worker for message {} panicked: {}", id, e);
            }
            Err(e) => {
                tracing::error!("Fetch task failed: {}", e);
            }
        }
    }

    fetched.sort_by_key(|(index, _)| *index);
    tracing::info!("Fetched {} messages", fetched.len());
    fetched.into_iter().map(|(_, message)| message).collect()
}
